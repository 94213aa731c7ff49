//! Error types for the protocol layer.

/// Errors that can occur in the protocol layer.
///
/// Each crate in Partyforge defines its own error enum, so a
/// `ProtocolError` always means a problem with identifiers or with
/// encoding, never with rooms or game rules.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// An identifier received from outside (URL segment, cookie value)
    /// does not have the shape of a generated id.
    #[error("invalid id {value:?}: {reason}")]
    InvalidId { value: String, reason: String },

    /// An event name that is not one of the known [`RoomEvent`](crate::RoomEvent)s.
    #[error("unknown room event {0:?}")]
    UnknownEvent(String),
}
