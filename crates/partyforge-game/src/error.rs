//! Error types for game operations.

use partyforge_protocol::PlayerId;

/// Caller-facing rule violations. None of these leave the game in a
/// different state than before the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// `start` was called outside the lobby.
    #[error("game already started")]
    AlreadyStarted,

    /// The operation needs a game in progress.
    #[error("game not in progress")]
    NotInProgress,

    /// The game is in progress but its round clock never started.
    #[error("round not started")]
    RoundNotStarted,

    /// No player with this id has joined the room.
    #[error("player {0} not found")]
    PlayerNotFound(PlayerId),

    /// The current explainer tried to guess their own word.
    #[error("explainer cannot guess")]
    ExplainerCannotGuess,

    /// Not enough players to begin.
    #[error("need at least {needed} players, have {found}")]
    InsufficientPlayers { needed: usize, found: usize },
}
