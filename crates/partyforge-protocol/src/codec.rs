//! Turning room snapshots into bytes.
//!
//! Nothing in Partyforge renders. A collaborator that ships state to
//! viewers (an SSE stream, a JSON endpoint, a test harness) takes the
//! `Serialize` snapshot types from `partyforge-game` and a [`Codec`], and
//! labels the payload with [`Codec::content_type`].

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Payload format for snapshots and event lists.
///
/// Stateless and shareable: one instance serves every handler task.
pub trait Codec: Send + Sync + 'static {
    /// MIME type of the payloads this codec produces.
    fn content_type(&self) -> &'static str;

    /// Serializes `value`.
    ///
    /// # Errors
    /// [`ProtocolError::Encode`] when the value cannot be represented.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Reads back a payload, e.g. a canvas update posted by the explainer.
    ///
    /// # Errors
    /// [`ProtocolError::Decode`] for malformed input or a shape mismatch.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// JSON snapshots via `serde_json`. Requires the default `json` feature.
///
/// ```rust
/// use partyforge_protocol::{Codec, JsonCodec, RoomEvent};
///
/// let payload = JsonCodec.encode(&[RoomEvent::Round, RoomEvent::Scores]).unwrap();
/// assert_eq!(payload, br#"["round","scores"]"#);
/// assert_eq!(JsonCodec.content_type(), "application/json");
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
