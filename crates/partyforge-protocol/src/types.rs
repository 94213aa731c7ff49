//! Core vocabulary types: identifiers and room events.
//!
//! Identifiers travel through URLs and cookies in the collaborator layer,
//! so they are plain lowercase strings. Events are sent to viewers as bare
//! names and mapped 1:1 to partial re-renders.

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Length of every generated identifier.
///
/// 16 symbols from a 32-symbol alphabet carry 80 bits of entropy, which is
/// enough that guessing a live room or player id is infeasible.
pub const ID_LEN: usize = 16;

/// Lowercase base32 alphabet. URL-safe and case-insensitive friendly.
pub const ID_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz234567";

/// Draws a fresh identifier from the thread-local CSPRNG.
///
/// `rand::rng()` is a ChaCha-based generator reseeded from the OS; ids must
/// not be predictable from earlier ones.
fn random_id() -> String {
    let alphabet = ID_ALPHABET.as_bytes();
    let mut rng = rand::rng();
    (0..ID_LEN)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
        .collect()
}

fn validate_id(value: &str) -> Result<(), ProtocolError> {
    if value.len() != ID_LEN {
        return Err(ProtocolError::InvalidId {
            value: value.to_string(),
            reason: format!("expected {ID_LEN} chars, got {}", value.len()),
        });
    }
    if let Some((index, ch)) = value
        .chars()
        .enumerate()
        .find(|(_, ch)| !ID_ALPHABET.contains(*ch))
    {
        return Err(ProtocolError::InvalidId {
            value: value.to_string(),
            reason: format!("invalid character {ch:?} at position {index}"),
        });
    }
    Ok(())
}

/// Identifier of one room (one game session).
///
/// Newtype over `String` so a `PlayerId` can never be passed where a room
/// is expected. `#[serde(transparent)]` keeps the JSON form a bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Generates a fresh, unguessable room id.
    pub fn generate() -> Self {
        Self(random_id())
    }

    /// Parses an id received from outside, rejecting anything that could
    /// not have been produced by [`RoomId::generate`].
    pub fn parse(value: &str) -> Result<Self, ProtocolError> {
        validate_id(value)?;
        Ok(Self(value.to_string()))
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomId {
    type Err = ProtocolError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

/// Identifier of one participant within a room.
///
/// Opaque to the core: whoever holds it acts as that player. The
/// collaborator layer keeps it in a per-room cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Generates a fresh, unguessable player id.
    pub fn generate() -> Self {
        Self(random_id())
    }

    /// Parses an id received from outside.
    pub fn parse(value: &str) -> Result<Self, ProtocolError> {
        validate_id(value)?;
        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PlayerId {
    type Err = ProtocolError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

// ---------------------------------------------------------------------------
// RoomEvent: what changed?
// ---------------------------------------------------------------------------

/// A named change notification published to a room's viewers.
///
/// Events carry no payload. A viewer that receives one re-fetches the
/// matching part of the room state, which is why a dropped event is
/// harmless: the next one triggers the same full re-fetch.
///
/// `#[serde(rename_all = "lowercase")]` makes `WordHint` travel as
/// `"wordhint"`, the name the collaborator layer routes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomEvent {
    /// Round number, timer, winner, or status changed.
    Round,
    /// Point totals changed.
    Scores,
    /// Roster or per-player progress changed.
    Players,
    /// The explainer's canvas changed.
    Canvas,
    /// More letters of the secret word were revealed to guessers.
    WordHint,
    /// Lobby controls changed (e.g. the game left the lobby).
    Lobby,
}

impl RoomEvent {
    /// Every event, in a stable order.
    pub const ALL: [RoomEvent; 6] = [
        Self::Round,
        Self::Scores,
        Self::Players,
        Self::Canvas,
        Self::WordHint,
        Self::Lobby,
    ];

    /// The wire name of this event.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Round => "round",
            Self::Scores => "scores",
            Self::Players => "players",
            Self::Canvas => "canvas",
            Self::WordHint => "wordhint",
            Self::Lobby => "lobby",
        }
    }
}

impl fmt::Display for RoomEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomEvent {
    type Err = ProtocolError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == value)
            .ok_or_else(|| ProtocolError::UnknownEvent(value.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
