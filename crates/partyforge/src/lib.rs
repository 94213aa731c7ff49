//! # Partyforge
//!
//! Server-authoritative core for real-time party word games.
//!
//! A room holds one game. Request handlers call the game's operations
//! (join, start, guess), publish [`RoomEvent`]s to the room's viewers, and
//! ask the room's round loop to start or wake up. The loop owns the clock:
//! it advances rounds at their deadlines and publishes what changed. How
//! events and snapshots reach browsers is left to the caller.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Instant;
//!
//! use partyforge::prelude::*;
//!
//! # async fn run() -> Result<(), PartyError> {
//! partyforge::telemetry::init();
//!
//! let rooms: GameRooms<UnscrambleGame> = GameRooms::new(Arc::new(WordList::builtin()));
//! let id = rooms.create_room(UnscrambleConfig::default());
//! let mut viewer = rooms.broadcaster(&id).subscribe();
//!
//! let room = rooms.room(&id)?;
//! let alice = room.state().add_player("alice");
//! room.state().start(Instant::now())?;
//! rooms.publish(&id, RoomEvent::Lobby);
//! rooms.ensure_round_loop(&id);
//!
//! if room.state().submit_guess(&alice.id, "planet", Instant::now())? {
//!     rooms.publish_all(&id, UNSCRAMBLE_ROUND_EVENTS);
//!     rooms.wake(&id);
//! }
//! while let Some(event) = viewer.recv().await {
//!     let snapshot = room.state().snapshot(Instant::now(), Some(&alice.id));
//!     println!("{event}: round {}", snapshot.current_round);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! | Crate | Provides |
//! |---|---|
//! | `partyforge-protocol` | ids, room events, codecs |
//! | `partyforge-rounds` | the round timing state machine |
//! | `partyforge-room` | room registry, broadcasters, round loops |
//! | `partyforge-game` | unscramble and explain rules |

mod error;
pub mod telemetry;

pub use error::PartyError;

pub use partyforge_game as game;
pub use partyforge_protocol as protocol;
pub use partyforge_room as room;
pub use partyforge_rounds as rounds;

pub use partyforge_protocol::{PlayerId, RoomEvent, RoomId};

/// Everything a request handler usually needs.
pub mod prelude {
    pub use crate::PartyError;
    pub use partyforge_game::{
        CanvasItem, EXPLAIN_ROUND_EVENTS, ExplainConfig, ExplainGame, ExplainSnapshot, GameError,
        GameRooms, GameStatus, PartyGame, Player, UNSCRAMBLE_ROUND_EVENTS, UnscrambleConfig,
        UnscrambleGame, UnscrambleSnapshot, WordList, WordSource,
    };
    pub use partyforge_protocol::{Codec, JsonCodec, PlayerId, RoomEvent, RoomId};
    pub use partyforge_room::{Broadcaster, Room, RoomError, RoomStore, RoundDriven, Subscription, Tick};
}
