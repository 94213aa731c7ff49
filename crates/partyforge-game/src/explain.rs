//! Emoji explain: each round one player (the explainer) arranges emojis
//! on a canvas to describe a secret word while the others guess it.
//! Letters of the word are revealed to guessers at 50 % and 75 % of the
//! round.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Instant, SystemTime};

use partyforge_protocol::{PlayerId, RoomEvent, RoomId};
use partyforge_room::{RoundDriven, Tick};
use partyforge_rounds::{RoundPhase, RoundTransition, TimedRounds};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::player::{Player, Roster};
use crate::rooms::PartyGame;
use crate::scoring::{explainer_points, guesser_points, normalize_guess};
use crate::snapshot::{GameStatus, ScoreEntry, millis, resolve_winner};
use crate::words::{WordSource, word_pool};
use crate::{ExplainConfig, GameError};

/// Events published when time alone moves an explain game to a new round.
pub const EXPLAIN_ROUND_EVENTS: [RoomEvent; 5] = [
    RoomEvent::Round,
    RoomEvent::Scores,
    RoomEvent::Players,
    RoomEvent::WordHint,
    RoomEvent::Canvas,
];

/// Emojis an explainer's per-round selection is drawn from.
pub const EMOJI_PALETTE: &[&str] = &[
    // faces and people
    "😀", "😂", "😍", "🥰", "😎", "🤔", "😱", "🥳", "😴", "🤯", "🥺", "😭", "🤩", "😏", "🤫",
    "👶", "👧", "👦", "👩", "👨", "👴", "👵", "🧙", "👸", "🤴", "🦸", "🧛", "🧜", "🧝",
    // body
    "👀", "👂", "🦶", "🦷", "🧠", "👍", "👎", "✌️", "🤞", "👊", "🙌", "🤝", "🫶",
    // animals
    "🐶", "🐱", "🐻", "🐼", "🐨", "🦁", "🐯", "🦊", "🐸", "🐔", "🐧", "🦆", "🦅", "🦋", "🐝",
    "🐙", "🦈", "🐳", "🦓", "🦒", "🦘", "🐘", "🦏", "🐪", "🦙", "🐑", "🐄", "🐎", "🐖", "🐓",
    "🐍", "🦎", "🐢", "🦜", "🦩", "🦚", "🦫", "🦦", "🦥", "🐿️",
    // nature and weather
    "🌸", "🌺", "🌻", "🌲", "🌴", "🌵", "🍄", "🌍", "🌊", "🏔️", "🌋", "🏜️", "🌈", "☀️", "🌙",
    "⭐", "❄️", "🌪️", "⚡", "🔥", "💧", "🌱",
    // food and drink
    "🍎", "🍕", "🍔", "🌮", "🍣", "🍩", "🎂", "🍦", "🍇", "🍓", "🍌", "🥑", "🥕", "🌽", "🍞",
    "☕", "🍺", "🍷", "🧃", "🍵",
    // activities
    "⚽", "🏀", "🎾", "🏊", "🚴", "🏋️", "🎯", "🎮", "🎸", "🎵", "🎭", "🎨", "🎬", "🎤", "💃",
    "🏄", "🧗", "🤸", "🥊", "⛷️", "🎿",
    // objects and places
    "🏠", "🏰", "🗼", "🗽", "⛩️", "🚗", "✈️", "🚀", "🚢", "🚂", "🚁", "🛸", "📷", "💡", "🔑",
    "📚", "🎁", "🎈", "🏆", "💰", "⏰", "📱", "💻", "🔭", "🧪", "🔬", "⚙️", "🧲", "🪄", "🗺️",
    "🛒", "🛏️", "🪞", "🪑", "🚪", "🪟", "🏺", "🖼️", "🧸", "🎀",
    // symbols
    "❤️", "💔", "💯", "❓", "❗", "✏️", "✂️", "🔍", "🔒", "💬",
];

// ---------------------------------------------------------------------------
// Round data and canvas
// ---------------------------------------------------------------------------

/// One round's secret word and the emojis the explainer may use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmojiRound {
    pub word: String,
    pub emojis: Vec<String>,
}

/// One emoji placed on the explainer's canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasItem {
    pub id: String,
    pub emoji: String,
    pub x: f64,
    pub y: f64,
}

fn build_rounds(words: &dyn WordSource, config: &ExplainConfig) -> Vec<EmojiRound> {
    let pool = word_pool(words, &config.lang, config.min_word_len);
    if pool.is_empty() {
        warn!(lang = %config.lang, "no words available, rounds cannot be solved");
    }
    let mut rng = rand::rng();
    (0..config.rounds)
        .map(|_| EmojiRound {
            word: if pool.is_empty() {
                String::new()
            } else {
                pool[rng.random_range(0..pool.len())].clone()
            },
            emojis: pick_emojis(config.emojis_per_round, &mut rng),
        })
        .collect()
}

/// `count` distinct palette emojis in random order.
fn pick_emojis<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<String> {
    let mut palette: Vec<&str> = EMOJI_PALETTE.to_vec();
    palette.shuffle(rng);
    palette.into_iter().take(count).map(str::to_string).collect()
}

/// `word` with every letter outside `revealed` replaced by `_`.
fn mask_word(word: &str, revealed: &BTreeSet<usize>) -> String {
    word.chars()
        .enumerate()
        .map(|(index, ch)| if revealed.contains(&index) { ch } else { '_' })
        .collect()
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// A player as listed in an explain snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    pub is_explainer: bool,
}

/// A resolved, viewer-relative view of an explain game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplainSnapshot {
    pub id: RoomId,
    pub status: GameStatus,
    pub current_round: u32,
    pub rounds: u32,
    pub round_duration_ms: u64,
    pub remaining_ms: u64,
    pub next_round_in_ms: Option<u64>,
    pub round_over: bool,
    pub word_length: usize,
    /// Masked word for guessers (`"p__n__"`); the whole word once the
    /// round is over.
    pub revealed_word: String,
    /// The secret, for the explainer only.
    pub word: Option<String>,
    pub explainer_id: Option<PlayerId>,
    pub explainer_name: Option<String>,
    pub round_emojis: Vec<String>,
    pub canvas: Vec<CanvasItem>,
    /// Sorted by name.
    pub players: Vec<PlayerInfo>,
    pub scores: Vec<ScoreEntry>,
    pub round_winner: Option<String>,
    pub winner: Option<String>,
    pub is_explainer: bool,
    pub is_guesser: bool,
    pub is_owner: bool,
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

struct ExplainState {
    config: ExplainConfig,
    status: GameStatus,
    rounds: TimedRounds,
    round_data: Vec<EmojiRound>,
    roster: Roster,
    explainer: Option<PlayerId>,
    word: String,
    emojis: Vec<String>,
    canvas: Vec<CanvasItem>,
    revealed: BTreeSet<usize>,
    round_winner: Option<PlayerId>,
}

impl ExplainState {
    fn round_live(&self) -> bool {
        self.status.is_in_progress() && self.rounds.phase() == RoundPhase::Active
    }

    fn round_over(&self) -> bool {
        match self.status {
            GameStatus::Lobby => false,
            GameStatus::InProgress => self.rounds.phase() == RoundPhase::CoolingDown,
            GameStatus::Finished => true,
        }
    }

    fn check_players(&self) -> Result<(), GameError> {
        let (needed, found) = (self.config.min_players, self.roster.len());
        if found < needed {
            return Err(GameError::InsufficientPlayers { needed, found });
        }
        Ok(())
    }

    fn begin(&mut self, now: Instant) {
        self.status = GameStatus::InProgress;
        self.rounds.start(now);
        self.start_round();
    }

    /// Rotates the explainer and loads the current round's word.
    fn start_round(&mut self) {
        let round = self.rounds.current_round();
        self.explainer = self.roster.explainer_for_round(round);
        let data = (round as usize)
            .checked_sub(1)
            .and_then(|index| self.round_data.get(index))
            .cloned();
        let (word, emojis) = data.map_or_else(Default::default, |d| (d.word, d.emojis));
        self.word = word;
        self.emojis = emojis;
        self.canvas.clear();
        self.revealed.clear();
        self.round_winner = None;
    }

    fn advance(&mut self, id: &RoomId, now: Instant) -> bool {
        if !self.status.is_in_progress() || !self.rounds.is_started() {
            return false;
        }
        let mut changed = false;
        loop {
            match self.rounds.advance(now) {
                RoundTransition::Idle => return changed,
                RoundTransition::RoundEnded => changed = true,
                RoundTransition::NextRound => {
                    self.start_round();
                    debug!(
                        room_id = %id,
                        round = self.rounds.current_round(),
                        "explain round started"
                    );
                    changed = true;
                }
                RoundTransition::Finished => {
                    self.status = GameStatus::Finished;
                    info!(room_id = %id, "explain game finished");
                    return true;
                }
            }
        }
    }

    /// Reveals one random hidden letter once half the round has passed
    /// and another at three quarters. Never hides a letter again.
    fn reveal(&mut self, now: Instant) -> bool {
        if !self.round_live() || self.word.is_empty() {
            return false;
        }
        let elapsed = self.rounds.elapsed(now);
        let duration = self.rounds.duration();
        let wanted = if elapsed >= duration / 4 * 3 {
            2
        } else if elapsed >= duration / 2 {
            1
        } else {
            0
        };
        let len = self.word.chars().count();
        let mut rng = rand::rng();
        let mut changed = false;
        while self.revealed.len() < wanted.min(len) {
            let hidden: Vec<usize> = (0..len).filter(|i| !self.revealed.contains(i)).collect();
            let index = hidden[rng.random_range(0..hidden.len())];
            self.revealed.insert(index);
            changed = true;
        }
        changed
    }

    /// Like the round schedule's next wake, but also stopping at the two
    /// reveal marks of a live round.
    fn next_timer(&self, now: Instant) -> Option<Instant> {
        if !self.status.is_in_progress() {
            return None;
        }
        let mut next = self.rounds.next_wake(now)?;
        if self.rounds.phase() == RoundPhase::Active {
            if let Some(started) = self.rounds.round_started() {
                let duration = self.rounds.duration();
                for mark in [started + duration / 2, started + duration / 4 * 3] {
                    if now < mark && mark < next {
                        next = mark;
                    }
                }
            }
        }
        Some(next)
    }

    fn masked_word(&self) -> String {
        mask_word(&self.word, &self.revealed)
    }
}

/// One explain room's state behind its lock.
pub struct ExplainGame {
    id: RoomId,
    created_at: SystemTime,
    words: Arc<dyn WordSource>,
    state: Mutex<ExplainState>,
}

impl ExplainGame {
    pub fn new(id: RoomId, config: ExplainConfig, words: Arc<dyn WordSource>) -> Self {
        let config = config.validated();
        let round_data = build_rounds(words.as_ref(), &config);
        let rounds = TimedRounds::new(config.rounds, config.round_duration, config.cooldown);
        Self {
            id,
            created_at: SystemTime::now(),
            words,
            state: Mutex::new(ExplainState {
                config,
                status: GameStatus::Lobby,
                rounds,
                round_data,
                roster: Roster::default(),
                explainer: None,
                word: String::new(),
                emojis: Vec::new(),
                canvas: Vec::new(),
                revealed: BTreeSet::new(),
                round_winner: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ExplainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    pub fn config(&self) -> ExplainConfig {
        self.lock().config.clone()
    }

    pub fn status(&self) -> GameStatus {
        self.lock().status
    }

    pub fn current_round(&self) -> u32 {
        self.lock().rounds.current_round()
    }

    /// Joins a new player in any status. Late joiners enter the explainer
    /// rotation from the next round on.
    pub fn add_player(&self, name: &str) -> Player {
        let player = self.lock().roster.add(name);
        info!(room_id = %self.id, player_id = %player.id, "player joined");
        player
    }

    /// Leaves the lobby and starts round one at `now`.
    ///
    /// # Errors
    /// [`GameError::AlreadyStarted`] outside the lobby, or
    /// [`GameError::InsufficientPlayers`].
    pub fn start(&self, now: Instant) -> Result<(), GameError> {
        let mut state = self.lock();
        if !state.status.is_lobby() {
            return Err(GameError::AlreadyStarted);
        }
        state.check_players()?;
        state.begin(now);
        info!(room_id = %self.id, rounds = state.rounds.rounds(), "explain game started");
        Ok(())
    }

    /// Starts over with fresh words and zeroed scores.
    ///
    /// # Errors
    /// [`GameError::InsufficientPlayers`].
    pub fn restart(&self, now: Instant) -> Result<(), GameError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.check_players()?;
        state.round_data = build_rounds(self.words.as_ref(), &state.config);
        state.roster.reset_points();
        state.begin(now);
        info!(room_id = %self.id, "explain game restarted");
        Ok(())
    }

    pub fn advance_if_needed(&self, now: Instant) -> bool {
        self.lock().advance(&self.id, now)
    }

    /// Reveals letters due at `now`; returns whether any were.
    pub fn reveal_letters_if_needed(&self, now: Instant) -> bool {
        let mut state = self.lock();
        state.advance(&self.id, now);
        state.reveal(now)
    }

    /// When the room loop should next look at this game, including the
    /// letter-reveal marks.
    pub fn next_timer(&self, now: Instant) -> Option<Instant> {
        self.lock().next_timer(now)
    }

    /// Replaces the canvas. Only the current explainer may, and only
    /// while the game is in progress; returns whether it applied.
    pub fn update_canvas(&self, player_id: &PlayerId, items: Vec<CanvasItem>, now: Instant) -> bool {
        let mut state = self.lock();
        state.advance(&self.id, now);
        if !state.status.is_in_progress() || state.explainer.as_ref() != Some(player_id) {
            return false;
        }
        state.canvas = items;
        true
    }

    /// Checks a guess against the secret word.
    ///
    /// The round's first correct guess pays the guesser and the
    /// explainer by time remaining and ends the round.
    ///
    /// # Errors
    /// [`GameError::NotInProgress`], [`GameError::RoundNotStarted`],
    /// [`GameError::PlayerNotFound`], or
    /// [`GameError::ExplainerCannotGuess`].
    pub fn submit_guess(
        &self,
        player_id: &PlayerId,
        text: &str,
        now: Instant,
    ) -> Result<bool, GameError> {
        let mut guard = self.lock();
        let state = &mut *guard;
        if !state.status.is_in_progress() {
            return Err(GameError::NotInProgress);
        }
        if !state.rounds.is_started() {
            return Err(GameError::RoundNotStarted);
        }
        state.advance(&self.id, now);
        if !state.status.is_in_progress() {
            return Ok(false);
        }
        if !state.roster.contains(player_id) {
            return Err(GameError::PlayerNotFound(player_id.clone()));
        }
        if state.explainer.as_ref() == Some(player_id) {
            return Err(GameError::ExplainerCannotGuess);
        }
        if !state.round_live() || state.round_winner.is_some() {
            return Ok(false);
        }

        let guess = normalize_guess(text);
        if guess.is_empty() || state.word.is_empty() || guess != state.word {
            return Ok(false);
        }

        let fraction = state.rounds.remaining_fraction(now);
        let (guesser_award, explainer_award) = (guesser_points(fraction), explainer_points(fraction));
        if let Some(guesser) = state.roster.get_mut(player_id) {
            guesser.points += guesser_award;
        }
        if let Some(explainer_id) = state.explainer.clone() {
            if let Some(explainer) = state.roster.get_mut(&explainer_id) {
                explainer.points += explainer_award;
            }
        }
        state.round_winner = Some(player_id.clone());
        state.rounds.end_round(now);
        debug!(
            room_id = %self.id,
            player_id = %player_id,
            round = state.rounds.current_round(),
            guesser_award,
            explainer_award,
            "round solved"
        );
        Ok(true)
    }

    /// The current explainer.
    pub fn explainer(&self) -> Option<PlayerId> {
        self.lock().explainer.clone()
    }

    pub fn word_length(&self) -> usize {
        self.lock().word.chars().count()
    }

    /// The word as guessers currently see it.
    pub fn revealed_word(&self) -> String {
        self.lock().masked_word()
    }

    pub fn canvas(&self) -> Vec<CanvasItem> {
        self.lock().canvas.clone()
    }

    pub fn round_emojis(&self) -> Vec<String> {
        self.lock().emojis.clone()
    }

    pub fn current_round_data(&self) -> Option<EmojiRound> {
        let state = self.lock();
        if state.word.is_empty() {
            return None;
        }
        Some(EmojiRound {
            word: state.word.clone(),
            emojis: state.emojis.clone(),
        })
    }

    pub fn is_owner(&self, player_id: &PlayerId) -> bool {
        self.lock().roster.is_owner(player_id)
    }

    pub fn player_name(&self, player_id: &PlayerId) -> Option<String> {
        self.lock().roster.name(player_id)
    }

    pub fn player(&self, player_id: &PlayerId) -> Option<Player> {
        self.lock().roster.get(player_id).cloned()
    }

    pub fn player_names(&self) -> Vec<String> {
        self.lock().roster.names()
    }

    pub fn player_count(&self) -> usize {
        self.lock().roster.len()
    }

    /// A consistent view for `viewer` at `now`, after applying any due
    /// transition and letter reveal.
    pub fn snapshot(&self, now: Instant, viewer: Option<&PlayerId>) -> ExplainSnapshot {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.advance(&self.id, now);
        state.reveal(now);

        let explainer = state.explainer.clone();
        let is_explainer = viewer.is_some() && viewer == explainer.as_ref();
        let round_over = state.round_over();

        let mut players: Vec<PlayerInfo> = state
            .roster
            .players()
            .map(|p| PlayerInfo {
                id: p.id.clone(),
                name: p.name.clone(),
                is_explainer: Some(&p.id) == explainer.as_ref(),
            })
            .collect();
        players.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));

        let scores = state.roster.scores();
        let winner = if state.status.is_finished() {
            resolve_winner(&scores)
        } else {
            None
        };

        ExplainSnapshot {
            id: self.id.clone(),
            status: state.status,
            current_round: state.rounds.current_round(),
            rounds: state.rounds.rounds(),
            round_duration_ms: millis(state.rounds.duration()),
            remaining_ms: millis(state.rounds.remaining(now)),
            next_round_in_ms: state
                .rounds
                .next_round_at()
                .map(|at| millis(at.saturating_duration_since(now))),
            round_over,
            word_length: state.word.chars().count(),
            revealed_word: if round_over {
                state.word.clone()
            } else {
                state.masked_word()
            },
            word: is_explainer.then(|| state.word.clone()),
            explainer_name: explainer.as_ref().and_then(|id| state.roster.name(id)),
            explainer_id: explainer,
            round_emojis: state.emojis.clone(),
            canvas: state.canvas.clone(),
            players,
            scores,
            round_winner: state
                .round_winner
                .as_ref()
                .and_then(|id| state.roster.name(id)),
            winner,
            is_explainer,
            is_guesser: viewer.is_some_and(|id| state.roster.contains(id)) && !is_explainer,
            is_owner: viewer.is_some_and(|id| state.roster.is_owner(id)),
        }
    }
}

impl RoundDriven for ExplainGame {
    fn tick(&self, now: Instant) -> Tick {
        let mut state = self.lock();
        let advanced = state.advance(&self.id, now);
        let revealed = state.reveal(now);
        let tick = match state.next_timer(now) {
            Some(at) => Tick::sleep_until(at),
            None => Tick::stop(),
        };
        if advanced {
            tick.with_events(EXPLAIN_ROUND_EVENTS)
        } else if revealed {
            tick.with_events([RoomEvent::WordHint])
        } else {
            tick
        }
    }
}

impl PartyGame for ExplainGame {
    type Config = ExplainConfig;

    fn create(id: RoomId, config: Self::Config, words: Arc<dyn WordSource>) -> Self {
        Self::new(id, config, words)
    }
}

impl fmt::Debug for ExplainGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ExplainGame")
            .field("id", &self.id)
            .field("status", &state.status)
            .field("current_round", &state.rounds.current_round())
            .field("players", &state.roster.len())
            .finish_non_exhaustive()
    }
}
