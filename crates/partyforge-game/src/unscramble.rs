//! Word-unscramble: every player races to rebuild the same scrambled
//! word. The first correct guess wins the round and ends it early.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Instant, SystemTime};

use partyforge_protocol::{PlayerId, RoomEvent, RoomId};
use partyforge_room::{RoundDriven, Tick};
use partyforge_rounds::{RoundPhase, RoundTransition, TimedRounds};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::player::{Player, Roster};
use crate::rooms::PartyGame;
use crate::scoring::{guesser_points, normalize_guess};
use crate::snapshot::{GameStatus, PlayerProgress, ScoreEntry, millis, resolve_winner};
use crate::words::{WordSource, word_pool};
use crate::{GameError, UnscrambleConfig};

/// Events published when time alone moves an unscramble game forward.
pub const UNSCRAMBLE_ROUND_EVENTS: [RoomEvent; 3] =
    [RoomEvent::Round, RoomEvent::Scores, RoomEvent::Players];

/// Reshuffles allowed when a scramble comes out equal to its word.
const MAX_SCRAMBLE_ATTEMPTS: usize = 8;

// ---------------------------------------------------------------------------
// Round data
// ---------------------------------------------------------------------------

/// One round's secret and the form shown to players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrambledWord {
    pub word: String,
    pub scrambled: String,
}

/// Picks `config.rounds` words (cycling if the pool is short) and
/// scrambles each one.
fn build_rounds(words: &dyn WordSource, config: &UnscrambleConfig) -> Vec<ScrambledWord> {
    let mut pool = word_pool(words, &config.lang, config.min_word_len);
    if pool.is_empty() {
        warn!(lang = %config.lang, "no words available, rounds cannot be solved");
        return Vec::new();
    }
    let mut rng = rand::rng();
    pool.shuffle(&mut rng);
    (0..config.rounds as usize)
        .map(|index| {
            let word = pool[index % pool.len()].clone();
            let scrambled = scramble(&word, &mut rng);
            ScrambledWord { word, scrambled }
        })
        .collect()
}

/// A uniformly random permutation of `word`'s letters, reshuffled when
/// it happens to equal the word itself.
fn scramble<R: Rng + ?Sized>(word: &str, rng: &mut R) -> String {
    let mut letters: Vec<char> = word.chars().collect();
    for _ in 0..MAX_SCRAMBLE_ATTEMPTS {
        letters.shuffle(rng);
        let candidate: String = letters.iter().collect();
        if candidate != word {
            return candidate;
        }
    }
    // Only words like "aaaa" get here.
    letters.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// A resolved, viewer-relative view of an unscramble game.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnscrambleSnapshot {
    pub id: RoomId,
    pub status: GameStatus,
    pub current_round: u32,
    pub rounds: u32,
    pub round_duration_ms: u64,
    /// Time left in the live round; zero between rounds.
    pub remaining_ms: u64,
    /// Set during the cooldown between rounds.
    pub next_round_in_ms: Option<u64>,
    /// The current round has been solved or timed out.
    pub round_over: bool,
    pub scrambled: Option<String>,
    /// The answer, shown once the round is over.
    pub word: Option<String>,
    pub word_length: usize,
    pub round_winner: Option<String>,
    /// How long the winner took, measured from the round start.
    pub solved_in_ms: Option<u64>,
    pub players: Vec<String>,
    pub progress: Vec<PlayerProgress>,
    pub scores: Vec<ScoreEntry>,
    /// Final result, once finished.
    pub winner: Option<String>,
    pub viewer_name: Option<String>,
    pub is_owner: bool,
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

struct UnscrambleState {
    config: UnscrambleConfig,
    status: GameStatus,
    rounds: TimedRounds,
    round_data: Vec<ScrambledWord>,
    roster: Roster,
    round_winner: Option<PlayerId>,
    solved_at: Option<Instant>,
}

impl UnscrambleState {
    fn current(&self) -> Option<&ScrambledWord> {
        let round = self.rounds.current_round() as usize;
        round.checked_sub(1).and_then(|index| self.round_data.get(index))
    }

    /// In progress and the round has neither been solved nor timed out.
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

    fn begin(&mut self, now: Instant) {
        self.status = GameStatus::InProgress;
        self.rounds.start(now);
        self.clear_round();
    }

    fn clear_round(&mut self) {
        self.round_winner = None;
        self.solved_at = None;
        self.roster.reset_progress();
    }

    /// Applies every transition due at `now`. Returns whether anything
    /// changed.
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
                    self.clear_round();
                    changed = true;
                }
                RoundTransition::Finished => {
                    self.status = GameStatus::Finished;
                    info!(room_id = %id, "unscramble game finished");
                    return true;
                }
            }
        }
    }

    fn next_timer(&self, now: Instant) -> Option<Instant> {
        if !self.status.is_in_progress() {
            return None;
        }
        self.rounds.next_wake(now)
    }
}

/// One unscramble room's state behind its lock.
///
/// Every method takes the lock once, applies any round transition due at
/// `now`, then acts. Nothing inside is reachable without the lock.
pub struct UnscrambleGame {
    id: RoomId,
    created_at: SystemTime,
    words: Arc<dyn WordSource>,
    state: Mutex<UnscrambleState>,
}

impl UnscrambleGame {
    /// Creates a game in the lobby with its round data already drawn.
    pub fn new(id: RoomId, config: UnscrambleConfig, words: Arc<dyn WordSource>) -> Self {
        let config = config.validated();
        let round_data = build_rounds(words.as_ref(), &config);
        let rounds = TimedRounds::new(config.rounds, config.round_duration, config.cooldown);
        Self {
            id,
            created_at: SystemTime::now(),
            words,
            state: Mutex::new(UnscrambleState {
                config,
                status: GameStatus::Lobby,
                rounds,
                round_data,
                roster: Roster::default(),
                round_winner: None,
                solved_at: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, UnscrambleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    pub fn config(&self) -> UnscrambleConfig {
        self.lock().config.clone()
    }

    pub fn status(&self) -> GameStatus {
        self.lock().status
    }

    pub fn current_round(&self) -> u32 {
        self.lock().rounds.current_round()
    }

    /// Joins a new player. Allowed in any status; the first player owns
    /// the room.
    pub fn add_player(&self, name: &str) -> Player {
        let player = self.lock().roster.add(name);
        info!(room_id = %self.id, player_id = %player.id, "player joined");
        player
    }

    /// Leaves the lobby and starts round one at `now`.
    ///
    /// # Errors
    /// [`GameError::AlreadyStarted`] outside the lobby.
    pub fn start(&self, now: Instant) -> Result<(), GameError> {
        let mut state = self.lock();
        if !state.status.is_lobby() {
            return Err(GameError::AlreadyStarted);
        }
        state.begin(now);
        info!(room_id = %self.id, rounds = state.rounds.rounds(), "unscramble game started");
        Ok(())
    }

    /// Starts over from round one with fresh words and zeroed scores,
    /// keeping the room id and roster. Allowed in any status.
    pub fn restart(&self, now: Instant) {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.round_data = build_rounds(self.words.as_ref(), &state.config);
        state.roster.reset_points();
        state.begin(now);
        info!(room_id = %self.id, "unscramble game restarted");
    }

    /// Applies any round transition due at `now`.
    pub fn advance_if_needed(&self, now: Instant) -> bool {
        self.lock().advance(&self.id, now)
    }

    /// When the room loop should next look at this game; `None` unless
    /// in progress.
    pub fn next_timer(&self, now: Instant) -> Option<Instant> {
        self.lock().next_timer(now)
    }

    /// Checks a guess against the current word.
    ///
    /// Returns `Ok(true)` for the round's first correct guess, which
    /// awards time-based points and ends the round. Every other guess,
    /// including a correct one after the round was won or timed out,
    /// returns `Ok(false)`.
    ///
    /// # Errors
    /// [`GameError::NotInProgress`], [`GameError::RoundNotStarted`], or
    /// [`GameError::PlayerNotFound`].
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
        if !state.round_live() || state.round_winner.is_some() {
            return Ok(false);
        }
        if !state.roster.contains(player_id) {
            return Err(GameError::PlayerNotFound(player_id.clone()));
        }

        let guess = normalize_guess(text);
        let Some(word) = state.current().map(|round| round.word.clone()) else {
            return Ok(false);
        };
        if guess.is_empty() || guess != word {
            return Ok(false);
        }

        let points = guesser_points(state.rounds.remaining_fraction(now));
        if let Some(player) = state.roster.get_mut(player_id) {
            player.points += points;
            player.progress = word.chars().count();
        }
        state.round_winner = Some(player_id.clone());
        state.solved_at = Some(now);
        state.rounds.end_round(now);
        debug!(
            room_id = %self.id,
            player_id = %player_id,
            round = state.rounds.current_round(),
            points,
            "round solved"
        );
        Ok(true)
    }

    /// Records how many letters a player has in place, clamped to the
    /// word length. Ignored outside a live round or for unknown players;
    /// returns whether it was stored.
    pub fn update_progress(&self, player_id: &PlayerId, correct: usize, now: Instant) -> bool {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.advance(&self.id, now);
        if !state.round_live() {
            return false;
        }
        let Some(len) = state.current().map(|round| round.word.chars().count()) else {
            return false;
        };
        match state.roster.get_mut(player_id) {
            Some(player) => {
                player.progress = correct.min(len);
                true
            }
            None => false,
        }
    }

    /// Counts the letters of `attempt` already in their final position,
    /// stores that as the player's progress, and returns it. `None` when
    /// progress could not be recorded (see
    /// [`update_progress`](Self::update_progress)).
    pub fn check_attempt(&self, player_id: &PlayerId, attempt: &str, now: Instant) -> Option<usize> {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.advance(&self.id, now);
        if !state.round_live() {
            return None;
        }
        let attempt = normalize_guess(attempt);
        let correct = state
            .current()?
            .word
            .chars()
            .zip(attempt.chars())
            .filter(|(expected, given)| expected == given)
            .count();
        state.roster.get_mut(player_id)?.progress = correct;
        Some(correct)
    }

    /// The current round's word and scramble, if a round is running.
    pub fn current_round_data(&self) -> Option<ScrambledWord> {
        self.lock().current().cloned()
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

    /// All display names, sorted.
    pub fn player_names(&self) -> Vec<String> {
        self.lock().roster.names()
    }

    pub fn player_count(&self) -> usize {
        self.lock().roster.len()
    }

    /// A consistent view for `viewer` at `now`, after applying any due
    /// transition.
    pub fn snapshot(&self, now: Instant, viewer: Option<&PlayerId>) -> UnscrambleSnapshot {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.advance(&self.id, now);

        let scores = state.roster.scores();
        let winner = if state.status.is_finished() {
            resolve_winner(&scores)
        } else {
            None
        };
        let round_over = state.round_over();
        let current = state.current();

        UnscrambleSnapshot {
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
            scrambled: current.map(|round| round.scrambled.clone()),
            word: current.filter(|_| round_over).map(|round| round.word.clone()),
            word_length: current.map_or(0, |round| round.word.chars().count()),
            round_winner: state
                .round_winner
                .as_ref()
                .and_then(|id| state.roster.name(id)),
            solved_in_ms: state
                .solved_at
                .zip(state.rounds.round_started())
                .map(|(solved, started)| millis(solved.saturating_duration_since(started))),
            players: state.roster.names(),
            progress: state.roster.progress(),
            scores,
            winner,
            viewer_name: viewer.and_then(|id| state.roster.name(id)),
            is_owner: viewer.is_some_and(|id| state.roster.is_owner(id)),
        }
    }
}

impl RoundDriven for UnscrambleGame {
    fn tick(&self, now: Instant) -> Tick {
        let mut state = self.lock();
        let advanced = state.advance(&self.id, now);
        let tick = match state.next_timer(now) {
            Some(at) => Tick::sleep_until(at),
            None => Tick::stop(),
        };
        if advanced {
            tick.with_events(UNSCRAMBLE_ROUND_EVENTS)
        } else {
            tick
        }
    }
}

impl PartyGame for UnscrambleGame {
    type Config = UnscrambleConfig;

    fn create(id: RoomId, config: Self::Config, words: Arc<dyn WordSource>) -> Self {
        Self::new(id, config, words)
    }
}

impl fmt::Debug for UnscrambleGame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("UnscrambleGame")
            .field("id", &self.id)
            .field("status", &state.status)
            .field("current_round", &state.rounds.current_round())
            .field("players", &state.roster.len())
            .finish_non_exhaustive()
    }
}
