//! Room registry and event fan-out for Partyforge.
//!
//! Each room pairs one game state with a [`Broadcaster`] that notifies
//! live viewers, and optionally one background timing loop that advances
//! the game on a wall-clock schedule.
//!
//! # Key types
//!
//! - [`RoomStore`]: creates and looks up rooms, publishes events, runs
//!   at most one timing loop per room
//! - [`Room`]: a registered room: id, state, broadcaster
//! - [`Broadcaster`] / [`Subscription`]: bounded, drop-on-lag fan-out
//! - [`RoundDriven`] / [`Tick`]: what a state must tell the loop on
//!   every wake-up

mod broadcaster;
mod error;
mod runner;
mod store;

pub use broadcaster::{Broadcaster, SUBSCRIBER_CAPACITY, SubscriberId, Subscription};
pub use error::RoomError;
pub use runner::{RoundDriven, Tick};
pub use store::{Room, RoomStore};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks a mutex, recovering the guard if a previous holder panicked.
///
/// Every critical section in this crate leaves its data consistent before
/// anything that could panic runs, so a poisoned lock still guards valid
/// state.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
