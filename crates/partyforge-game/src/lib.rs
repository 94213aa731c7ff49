//! Party game rules for Partyforge rooms.
//!
//! Two games share one skeleton: a roster, pre-drawn round data, a
//! [`TimedRounds`](partyforge_rounds::TimedRounds) schedule, and one lock
//! around all of it.
//!
//! - [`UnscrambleGame`]: everyone unscrambles the same word; first
//!   correct guess wins the round
//! - [`ExplainGame`]: one explainer describes a word with emojis while
//!   the rest guess; letters are revealed as time runs out
//!
//! Both implement [`RoundDriven`](partyforge_room::RoundDriven), so a
//! [`GameRooms`] registry can run their round loops.
//!
//! # Handler flow
//!
//! ```ignore
//! let room = rooms.room(&room_id)?;
//! if room.state().submit_guess(&player_id, &text, Instant::now())? {
//!     rooms.publish_all(&room_id, UNSCRAMBLE_ROUND_EVENTS);
//!     rooms.wake(&room_id);
//! }
//! ```

mod config;
mod error;
mod explain;
mod player;
mod rooms;
mod scoring;
mod snapshot;
mod unscramble;
mod words;

pub use config::{
    DEFAULT_ROUND_DURATION, DEFAULT_ROUNDS, ExplainConfig, MAX_DURATION, UnscrambleConfig,
};
pub use error::GameError;
pub use explain::{
    CanvasItem, EMOJI_PALETTE, EXPLAIN_ROUND_EVENTS, EmojiRound, ExplainGame, ExplainSnapshot,
    PlayerInfo,
};
pub use player::Player;
pub use rooms::{GameRooms, PartyGame};
pub use scoring::{MAX_EXPLAINER_POINTS, MAX_GUESSER_POINTS, explainer_points, guesser_points};
pub use snapshot::{GameStatus, PlayerProgress, ScoreEntry, resolve_winner};
pub use unscramble::{ScrambledWord, UNSCRAMBLE_ROUND_EVENTS, UnscrambleGame, UnscrambleSnapshot};
pub use words::{FALLBACK_LANG, WordList, WordSource};
