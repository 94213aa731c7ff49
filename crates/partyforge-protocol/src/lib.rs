//! Shared vocabulary for Partyforge.
//!
//! This crate defines what every other layer agrees on:
//!
//! - **Identity** ([`RoomId`], [`PlayerId`]): short, URL-safe,
//!   unguessable identifiers drawn from a cryptographically secure RNG.
//! - **Events** ([`RoomEvent`]): the named change notifications a room
//!   fans out to its viewers (`"round"`, `"scores"`, ...).
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how collaborators turn
//!   snapshots into bytes for whatever transport they run.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! ```text
//! Game (rules)  → Room (registry, loop, fan-out) → Protocol (ids, events)
//! ```
//!
//! Nothing here knows about rooms or games; it only names things.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ID_ALPHABET, ID_LEN, PlayerId, RoomEvent, RoomId};
