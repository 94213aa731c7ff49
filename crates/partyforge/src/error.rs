//! One error type across every layer.

use partyforge_game::GameError;
use partyforge_protocol::ProtocolError;
use partyforge_room::RoomError;

/// Top-level error wrapping each crate's own error.
///
/// Handlers that touch several layers return this and let `?` convert.
#[derive(Debug, thiserror::Error)]
pub enum PartyError {
    /// Bad id, unknown event name, or a codec failure.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The room does not exist.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A game rule rejected the request.
    #[error(transparent)]
    Game(#[from] GameError),
}
