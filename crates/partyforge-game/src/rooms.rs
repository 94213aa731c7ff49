//! Game-aware room registry.

use std::sync::Arc;

use partyforge_protocol::{RoomEvent, RoomId};
use partyforge_room::{Broadcaster, Room, RoomError, RoomStore, RoundDriven};

use crate::words::WordSource;

/// A game type that can live in a [`GameRooms`] registry.
pub trait PartyGame: RoundDriven + Sized {
    type Config: Clone + Default + Send + Sync + 'static;

    /// Builds a game in the lobby. Implementations validate `config`.
    fn create(id: RoomId, config: Self::Config, words: Arc<dyn WordSource>) -> Self;
}

/// Rooms of one game type, sharing one word source.
///
/// Cheap to clone. This is what request handlers hold.
pub struct GameRooms<G> {
    store: RoomStore<G>,
    words: Arc<dyn WordSource>,
}

impl<G> Clone for GameRooms<G> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            words: Arc::clone(&self.words),
        }
    }
}

impl<G: PartyGame> GameRooms<G> {
    pub fn new(words: Arc<dyn WordSource>) -> Self {
        Self {
            store: RoomStore::new(),
            words,
        }
    }

    /// Creates a room holding a new game under a fresh random id.
    pub fn create_room(&self, config: G::Config) -> RoomId {
        let id = RoomId::generate();
        let game = G::create(id.clone(), config, Arc::clone(&self.words));
        self.store.create(id.clone(), game);
        id
    }

    pub fn get(&self, id: &RoomId) -> Option<Arc<Room<G>>> {
        self.store.get(id)
    }

    /// Like [`get`](Self::get), failing with [`RoomError::NotFound`].
    pub fn room(&self, id: &RoomId) -> Result<Arc<Room<G>>, RoomError> {
        self.store.room(id)
    }

    /// The room's broadcaster, for viewers to subscribe to.
    pub fn broadcaster(&self, id: &RoomId) -> Arc<Broadcaster> {
        self.store.broadcaster(id)
    }

    pub fn publish(&self, id: &RoomId, event: RoomEvent) -> usize {
        self.store.publish(id, event)
    }

    pub fn publish_all(&self, id: &RoomId, events: impl IntoIterator<Item = RoomEvent>) {
        self.store.publish_all(id, events);
    }

    /// Starts the room's round loop; call after the game leaves the
    /// lobby. Idempotent.
    pub fn ensure_round_loop(&self, id: &RoomId) -> bool {
        self.store.ensure_round_loop(id)
    }

    /// Makes the round loop re-evaluate now, e.g. after a correct guess
    /// ended the round early.
    pub fn wake(&self, id: &RoomId) -> bool {
        self.store.wake(id)
    }

    pub fn cancel_loop(&self, id: &RoomId) -> bool {
        self.store.cancel_loop(id)
    }

    pub fn has_loop(&self, id: &RoomId) -> bool {
        self.store.has_loop(id)
    }

    pub fn room_count(&self) -> usize {
        self.store.room_count()
    }

    /// The underlying generic store.
    pub fn store(&self) -> &RoomStore<G> {
        &self.store
    }
}
