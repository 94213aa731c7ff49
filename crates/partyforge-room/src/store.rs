//! Room registry: creates, tracks, and publishes to rooms.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use partyforge_protocol::{RoomEvent, RoomId};
use tokio::sync::{Notify, watch};

use crate::{Broadcaster, RoomError};

/// A registered room: its id, its game state, and its viewers.
///
/// The state is shared by reference. Its type is responsible for its own
/// interior locking; the store never locks it.
pub struct Room<T> {
    id: RoomId,
    state: T,
    broadcaster: Arc<Broadcaster>,
}

impl<T> Room<T> {
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn state(&self) -> &T {
        &self.state
    }

    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }
}

impl<T: fmt::Debug> fmt::Debug for Room<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Room")
            .field("id", &self.id)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Bookkeeping for one running room loop.
pub(crate) struct LoopEntry {
    /// Distinguishes this loop from a later one registered under the same
    /// room after a cancel.
    pub(crate) generation: u64,
    pub(crate) cancel: watch::Sender<bool>,
    pub(crate) wake: Arc<Notify>,
    /// Set when a start request arrives while the loop is winding down.
    /// The loop checks it before retiring and keeps running instead.
    pub(crate) rearm: bool,
}

pub(crate) struct Registry<T> {
    pub(crate) rooms: HashMap<RoomId, Arc<Room<T>>>,
    /// Broadcasters live apart from rooms so viewers can subscribe to a
    /// room id before (or without) the room being created.
    pub(crate) hubs: HashMap<RoomId, Arc<Broadcaster>>,
    pub(crate) loops: HashMap<RoomId, LoopEntry>,
}

pub(crate) struct Inner<T> {
    pub(crate) registry: RwLock<Registry<T>>,
    pub(crate) next_generation: AtomicU64,
}

/// Shared registry of rooms holding game state of type `T`.
///
/// Cheap to clone: clones share the same rooms. Lookups take a read lock;
/// creating rooms, broadcasters, or loops takes the write lock briefly.
/// No lock is ever held across an `.await`.
pub struct RoomStore<T> {
    pub(crate) inner: Arc<Inner<T>>,
}

impl<T> Clone for RoomStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for RoomStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for RoomStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.read();
        f.debug_struct("RoomStore")
            .field("rooms", &registry.rooms.len())
            .field("loops", &registry.loops.len())
            .finish()
    }
}

impl<T> RoomStore<T> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                registry: RwLock::new(Registry {
                    rooms: HashMap::new(),
                    hubs: HashMap::new(),
                    loops: HashMap::new(),
                }),
                next_generation: AtomicU64::new(0),
            }),
        }
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, Registry<T>> {
        self.inner
            .registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, Registry<T>> {
        self.inner
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers `state` under `id` and returns the new room.
    ///
    /// If a broadcaster was already handed out for `id`, the room adopts
    /// it so early subscribers keep receiving. Registering an id twice
    /// replaces the previous room.
    pub fn create(&self, id: RoomId, state: T) -> Arc<Room<T>> {
        let mut registry = self.write();
        let broadcaster = Arc::clone(
            registry
                .hubs
                .entry(id.clone())
                .or_insert_with(|| Arc::new(Broadcaster::new())),
        );
        let room = Arc::new(Room {
            id: id.clone(),
            state,
            broadcaster,
        });
        if registry.rooms.insert(id.clone(), Arc::clone(&room)).is_some() {
            tracing::warn!(room_id = %id, "room replaced");
        } else {
            tracing::info!(room_id = %id, "room created");
        }
        room
    }

    /// Looks up a room.
    pub fn get(&self, id: &RoomId) -> Option<Arc<Room<T>>> {
        self.read().rooms.get(id).cloned()
    }

    /// Looks up a room, failing with [`RoomError::NotFound`].
    pub fn room(&self, id: &RoomId) -> Result<Arc<Room<T>>, RoomError> {
        self.get(id).ok_or_else(|| RoomError::NotFound(id.clone()))
    }

    /// Returns the broadcaster for `id`, creating it if absent.
    pub fn broadcaster(&self, id: &RoomId) -> Arc<Broadcaster> {
        if let Some(hub) = self.read().hubs.get(id) {
            return Arc::clone(hub);
        }
        let mut registry = self.write();
        Arc::clone(
            registry
                .hubs
                .entry(id.clone())
                .or_insert_with(|| Arc::new(Broadcaster::new())),
        )
    }

    /// Publishes one event to the room's viewers. Returns how many
    /// subscribers accepted it.
    pub fn publish(&self, id: &RoomId, event: RoomEvent) -> usize {
        let hub = self.read().hubs.get(id).cloned();
        match hub {
            Some(hub) => hub.publish(event),
            None => 0,
        }
    }

    /// Publishes several events in order.
    pub fn publish_all(&self, id: &RoomId, events: impl IntoIterator<Item = RoomEvent>) {
        let hub = self.read().hubs.get(id).cloned();
        let Some(hub) = hub else {
            return;
        };
        for event in events {
            hub.publish(event);
        }
    }

    /// Number of registered rooms.
    pub fn room_count(&self) -> usize {
        self.read().rooms.len()
    }

    /// Lists all registered room ids.
    pub fn room_ids(&self) -> Vec<RoomId> {
        self.read().rooms.keys().cloned().collect()
    }

    /// Asks the room's loop to re-evaluate now.
    ///
    /// Wakes coalesce into a single pending wake-up, so a burst of calls
    /// costs the loop one extra evaluation. Returns `false` (and does nothing) when
    /// no loop is running for the room.
    pub fn wake(&self, id: &RoomId) -> bool {
        match self.read().loops.get(id) {
            Some(entry) => {
                entry.wake.notify_one();
                true
            }
            None => false,
        }
    }

    /// Stops the room's loop, if any. Safe to call repeatedly.
    ///
    /// Returns whether a loop was registered. The task observes the
    /// cancellation at its next suspension point.
    pub fn cancel_loop(&self, id: &RoomId) -> bool {
        let entry = self.write().loops.remove(id);
        match entry {
            Some(entry) => {
                let _ = entry.cancel.send(true);
                tracing::info!(room_id = %id, "room loop cancelled");
                true
            }
            None => false,
        }
    }

    /// Whether a loop is currently registered for the room.
    pub fn has_loop(&self, id: &RoomId) -> bool {
        self.read().loops.contains_key(id)
    }

    /// Called by a loop that wants to stop. Returns `false` if a start
    /// request arrived in the meantime and the loop must keep going.
    pub(crate) fn retire_loop(&self, id: &RoomId, generation: u64) -> bool {
        let mut registry = self.write();
        let Some(entry) = registry.loops.get_mut(id) else {
            return true;
        };
        if entry.generation != generation {
            return true;
        }
        if entry.rearm {
            entry.rearm = false;
            return false;
        }
        registry.loops.remove(id);
        true
    }

    /// Drops the loop's entry if it still belongs to `generation`.
    pub(crate) fn release_loop(&self, id: &RoomId, generation: u64) {
        let mut registry = self.write();
        if registry
            .loops
            .get(id)
            .is_some_and(|entry| entry.generation == generation)
        {
            registry.loops.remove(id);
        }
    }
}
