//! Per-room background loop.
//!
//! A room that runs on a clock gets one task that repeatedly asks its
//! state what to do at `now`, publishes whatever changed, and sleeps
//! until the state's next deadline. Three things cut the sleep short:
//! the deadline itself, a [`RoomStore::wake`] call, or cancellation.
//!
//! The state never spawns anything or knows about the task. Everything
//! it needs to say fits in one [`Tick`].

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Instant;

use partyforge_protocol::{RoomEvent, RoomId};
use tokio::sync::{Notify, watch};

use crate::store::LoopEntry;
use crate::{Room, RoomStore};

/// What the loop should do after one evaluation of the room state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    /// Published to the room's viewers before the loop sleeps or stops.
    pub events: Vec<RoomEvent>,
    /// When to evaluate again. `None` stops the loop.
    pub next: Option<Instant>,
}

impl Tick {
    /// Re-evaluate at `until`.
    pub fn sleep_until(until: Instant) -> Self {
        Self {
            events: Vec::new(),
            next: Some(until),
        }
    }

    /// Nothing left to time; end the loop.
    pub fn stop() -> Self {
        Self {
            events: Vec::new(),
            next: None,
        }
    }

    pub fn with_events(mut self, events: impl IntoIterator<Item = RoomEvent>) -> Self {
        self.events.extend(events);
        self
    }
}

/// Room state that knows how to advance itself on a clock.
pub trait RoundDriven: Send + Sync + 'static {
    /// Applies whatever is due at `now` and says when to come back.
    ///
    /// Called from the loop task only, never concurrently with itself,
    /// but concurrently with request handlers touching the same state.
    fn tick(&self, now: Instant) -> Tick;
}

impl<T: Send + Sync + 'static> RoomStore<T> {
    /// Starts the room's loop unless one is already running.
    ///
    /// `access` fetches the state on every iteration (returning `None`
    /// ends the loop); `tick` evaluates it. Returns `true` if a new task
    /// was spawned. When a loop already exists it is woken instead, and
    /// marked so that a stop it is about to report is ignored once: a
    /// restart racing the loop's own shutdown always ends with a live
    /// loop.
    ///
    /// The running loop keeps the `access` and `tick` it was started
    /// with. Closures passed to a call that returns `false` are dropped
    /// unused; cancel the loop first to swap them.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn run_loop<S, A, F>(&self, id: &RoomId, access: A, tick: F) -> bool
    where
        S: Send + 'static,
        A: Fn() -> Option<S> + Send + 'static,
        F: FnMut(&S, Instant) -> Tick + Send + 'static,
    {
        let mut registry = self.write();
        if let Some(entry) = registry.loops.get_mut(id) {
            entry.rearm = true;
            entry.wake.notify_one();
            tracing::debug!(room_id = %id, "room loop already running, new tick ignored");
            return false;
        }

        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let wake = Arc::new(Notify::new());
        let (cancel_tx, cancel_rx) = watch::channel(false);
        // Spawned under the write lock: the task cannot retire itself
        // before its entry exists.
        tokio::spawn(drive(
            self.clone(),
            id.clone(),
            generation,
            Arc::clone(&wake),
            cancel_rx,
            access,
            tick,
        ));
        registry.loops.insert(
            id.clone(),
            LoopEntry {
                generation,
                cancel: cancel_tx,
                wake,
                rearm: false,
            },
        );
        tracing::info!(room_id = %id, generation, "room loop spawned");
        true
    }
}

impl<T: RoundDriven> RoomStore<T> {
    /// Starts the room's loop driven by [`RoundDriven::tick`].
    ///
    /// See [`run_loop`](Self::run_loop). The loop ends by itself once the
    /// state stops asking for wake-ups or the room disappears.
    pub fn ensure_round_loop(&self, id: &RoomId) -> bool {
        let store = self.clone();
        let room_id = id.clone();
        self.run_loop(
            id,
            move || store.get(&room_id),
            |room: &Arc<Room<T>>, now| room.state().tick(now),
        )
    }
}

/// Removes the loop's entry however the task ends, including by panic
/// or runtime shutdown.
struct LoopGuard<T> {
    store: RoomStore<T>,
    id: RoomId,
    generation: u64,
}

impl<T> Drop for LoopGuard<T> {
    fn drop(&mut self) {
        self.store.release_loop(&self.id, self.generation);
    }
}

async fn drive<T, S, A, F>(
    store: RoomStore<T>,
    id: RoomId,
    generation: u64,
    wake: Arc<Notify>,
    mut cancel: watch::Receiver<bool>,
    access: A,
    mut tick: F,
) where
    T: Send + Sync + 'static,
    A: Fn() -> Option<S>,
    F: FnMut(&S, Instant) -> Tick,
{
    let _guard = LoopGuard {
        store: store.clone(),
        id: id.clone(),
        generation,
    };
    tracing::debug!(room_id = %id, generation, "room loop started");

    loop {
        if *cancel.borrow() {
            break;
        }

        let now = tokio::time::Instant::now().into_std();
        let outcome = match access() {
            Some(state) => {
                match panic::catch_unwind(AssertUnwindSafe(|| tick(&state, now))) {
                    Ok(outcome) => outcome,
                    Err(_) => {
                        tracing::error!(room_id = %id, "room tick panicked, stopping loop");
                        break;
                    }
                }
            }
            None => {
                tracing::debug!(room_id = %id, "room state gone");
                Tick::stop()
            }
        };

        store.publish_all(&id, outcome.events);

        let Some(until) = outcome.next else {
            if store.retire_loop(&id, generation) {
                break;
            }
            tracing::debug!(room_id = %id, "room loop re-armed");
            continue;
        };

        tokio::select! {
            // Also fires when the entry (and its sender) is removed.
            _ = cancel.changed() => break,
            _ = tokio::time::sleep_until(tokio::time::Instant::from_std(until)) => {}
            _ = wake.notified() => {
                tracing::trace!(room_id = %id, "room loop woken");
            }
        }
    }

    tracing::debug!(room_id = %id, generation, "room loop stopped");
}
