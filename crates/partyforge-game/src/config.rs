//! Per-game configuration.

use std::time::Duration;

use partyforge_rounds::DEFAULT_COOLDOWN;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::explain::EMOJI_PALETTE;
use crate::words::FALLBACK_LANG;

/// Default number of rounds per game.
pub const DEFAULT_ROUNDS: u32 = 5;

/// Default length of one round.
pub const DEFAULT_ROUND_DURATION: Duration = Duration::from_secs(60);

/// Longest accepted round or cooldown.
pub const MAX_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

// ---------------------------------------------------------------------------
// UnscrambleConfig
// ---------------------------------------------------------------------------

/// Settings for an [`UnscrambleGame`](crate::UnscrambleGame).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnscrambleConfig {
    pub rounds: u32,
    pub round_duration: Duration,
    /// Pause between rounds. Zero is allowed.
    pub cooldown: Duration,
    /// Word list language; unknown languages fall back to English.
    pub lang: String,
    /// Shorter words are too easy to unscramble.
    pub min_word_len: usize,
}

impl Default for UnscrambleConfig {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
            round_duration: DEFAULT_ROUND_DURATION,
            cooldown: DEFAULT_COOLDOWN,
            lang: FALLBACK_LANG.to_string(),
            min_word_len: 6,
        }
    }
}

impl UnscrambleConfig {
    /// A default config with the given round count and length.
    pub fn with_rounds(rounds: u32, round_duration: Duration) -> Self {
        Self {
            rounds,
            round_duration,
            ..Default::default()
        }
    }

    /// Replaces out-of-range values with usable ones, warning for each.
    ///
    /// Called by [`UnscrambleGame::new`](crate::UnscrambleGame::new).
    pub fn validated(mut self) -> Self {
        self.rounds = valid_rounds(self.rounds);
        self.round_duration = valid_duration(self.round_duration);
        self.cooldown = valid_cooldown(self.cooldown);
        self.lang = valid_lang(self.lang);
        self.min_word_len = valid_min_word_len(self.min_word_len);
        self
    }
}

// ---------------------------------------------------------------------------
// ExplainConfig
// ---------------------------------------------------------------------------

/// Settings for an [`ExplainGame`](crate::ExplainGame).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplainConfig {
    pub rounds: u32,
    pub round_duration: Duration,
    pub cooldown: Duration,
    pub lang: String,
    pub min_word_len: usize,
    /// How many emojis the explainer may pick from each round.
    pub emojis_per_round: usize,
    /// Players needed to start: one explainer plus at least one guesser.
    pub min_players: usize,
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            rounds: DEFAULT_ROUNDS,
            round_duration: DEFAULT_ROUND_DURATION,
            cooldown: DEFAULT_COOLDOWN,
            lang: FALLBACK_LANG.to_string(),
            min_word_len: 5,
            emojis_per_round: Self::DEFAULT_EMOJIS_PER_ROUND,
            min_players: Self::MIN_PLAYERS,
        }
    }
}

impl ExplainConfig {
    pub const DEFAULT_EMOJIS_PER_ROUND: usize = 8;

    /// Lowest accepted `min_players`.
    pub const MIN_PLAYERS: usize = 2;

    pub fn with_rounds(rounds: u32, round_duration: Duration) -> Self {
        Self {
            rounds,
            round_duration,
            ..Default::default()
        }
    }

    /// Replaces out-of-range values with usable ones, warning for each.
    ///
    /// Called by [`ExplainGame::new`](crate::ExplainGame::new). Rules:
    /// - `emojis_per_round` of 0 becomes the default; above the palette
    ///   size it is capped.
    /// - `min_players` is raised to [`Self::MIN_PLAYERS`].
    pub fn validated(mut self) -> Self {
        self.rounds = valid_rounds(self.rounds);
        self.round_duration = valid_duration(self.round_duration);
        self.cooldown = valid_cooldown(self.cooldown);
        self.lang = valid_lang(self.lang);
        self.min_word_len = valid_min_word_len(self.min_word_len);

        if self.emojis_per_round == 0 {
            warn!(
                default = Self::DEFAULT_EMOJIS_PER_ROUND,
                "emojis_per_round is zero, using default"
            );
            self.emojis_per_round = Self::DEFAULT_EMOJIS_PER_ROUND;
        } else if self.emojis_per_round > EMOJI_PALETTE.len() {
            warn!(
                emojis_per_round = self.emojis_per_round,
                max = EMOJI_PALETTE.len(),
                "emojis_per_round exceeds palette, clamping"
            );
            self.emojis_per_round = EMOJI_PALETTE.len();
        }
        if self.min_players < Self::MIN_PLAYERS {
            warn!(
                min_players = self.min_players,
                min = Self::MIN_PLAYERS,
                "min_players too low, raising"
            );
            self.min_players = Self::MIN_PLAYERS;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Shared rules
// ---------------------------------------------------------------------------

fn valid_rounds(rounds: u32) -> u32 {
    if rounds == 0 {
        warn!("rounds is zero, playing one round");
        return 1;
    }
    rounds
}

fn valid_duration(duration: Duration) -> Duration {
    if duration.is_zero() {
        warn!(
            default_secs = DEFAULT_ROUND_DURATION.as_secs(),
            "round_duration is zero, using default"
        );
        return DEFAULT_ROUND_DURATION;
    }
    if duration > MAX_DURATION {
        warn!(
            round_duration_secs = duration.as_secs(),
            max_secs = MAX_DURATION.as_secs(),
            "round_duration too long, clamping"
        );
        return MAX_DURATION;
    }
    duration
}

fn valid_cooldown(cooldown: Duration) -> Duration {
    if cooldown > MAX_DURATION {
        warn!(
            cooldown_secs = cooldown.as_secs(),
            max_secs = MAX_DURATION.as_secs(),
            "cooldown too long, clamping"
        );
        return MAX_DURATION;
    }
    cooldown
}

fn valid_lang(lang: String) -> String {
    let trimmed = lang.trim();
    if trimmed.is_empty() {
        return FALLBACK_LANG.to_string();
    }
    trimmed.to_lowercase()
}

fn valid_min_word_len(min_word_len: usize) -> usize {
    if min_word_len == 0 {
        warn!("min_word_len is zero, using 1");
        return 1;
    }
    min_word_len
}
