//! Round timing state machine for Partyforge.
//!
//! [`TimedRounds`] tracks a fixed number of timed rounds separated by a
//! cooldown. It holds no game data (players, words, scores): a game
//! composes it and reacts to the [`RoundTransition`] returned by
//! [`TimedRounds::advance`].
//!
//! # Phases
//!
//! ```text
//! Inactive ──start──→ Active ──deadline──→ CoolingDown ──cooldown──→ Active (next round)
//!                                               │
//!                                               └── cooldown, last round ──→ Finished
//! ```
//!
//! The machine is pure: every method takes `now` explicitly and nothing
//! reads the clock. That keeps transitions deterministic and lets the
//! room loop, request handlers, and tests drive it with the same code.
//!
//! # Integration
//!
//! The room loop asks [`TimedRounds::next_wake`] how long to sleep, then
//! calls `advance` when it wakes:
//!
//! ```ignore
//! loop {
//!     let transition = rounds.advance(now);
//!     if transition.advanced() { /* reset round state, publish */ }
//!     sleep_until(rounds.next_wake(now)?).await;
//! }
//! ```

use std::time::{Duration, Instant};

use tracing::{debug, trace};

/// The usual pause between the end of one round and the start of the next.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(5);

/// Upper bound on a round or cooldown. Longer values are capped so that
/// deadline arithmetic on `Instant` cannot overflow.
pub const MAX_SPAN: Duration = Duration::from_secs(365 * 24 * 60 * 60);

// ---------------------------------------------------------------------------
// Transition / phase
// ---------------------------------------------------------------------------

/// What a call to [`TimedRounds::advance`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundTransition {
    /// Nothing is due yet (or the schedule was never started).
    Idle,
    /// The active round hit its deadline; cooldown has begun.
    RoundEnded,
    /// Cooldown elapsed and the next round began.
    NextRound,
    /// Cooldown after the last round elapsed. Terminal: every later call
    /// reports `Finished` again and changes nothing.
    Finished,
}

impl RoundTransition {
    /// `true` for every transition except [`RoundTransition::Idle`].
    pub fn advanced(self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// `true` once the schedule is exhausted.
    pub fn finished(self) -> bool {
        matches!(self, Self::Finished)
    }
}

/// Where the schedule currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// [`TimedRounds::start`] has not been called.
    Inactive,
    /// A round is live and accepting play.
    Active,
    /// The round ended; waiting out the cooldown.
    CoolingDown,
    /// All rounds played and the final cooldown elapsed.
    Finished,
}

// ---------------------------------------------------------------------------
// TimedRounds
// ---------------------------------------------------------------------------

/// Timing state for a sequence of rounds.
///
/// Invariants:
/// - `current_round` is 0 before [`start`](Self::start) and in
///   `1..=rounds` afterwards.
/// - `round_ended_at` is `None` while the round is live and is set once
///   when the round ends (at its deadline, or early via
///   [`end_round`](Self::end_round)).
/// - Cooldown is measured from `round_ended_at`, not from whenever the
///   caller happens to call `advance`.
#[derive(Debug, Clone)]
pub struct TimedRounds {
    duration: Duration,
    cooldown: Duration,
    rounds: u32,
    current_round: u32,
    round_started: Option<Instant>,
    round_ended_at: Option<Instant>,
    finished: bool,
}

impl TimedRounds {
    /// Creates an inert schedule. Nothing happens until [`start`](Self::start).
    ///
    /// `duration` and `cooldown` are capped at [`MAX_SPAN`].
    pub fn new(rounds: u32, duration: Duration, cooldown: Duration) -> Self {
        Self {
            duration: duration.min(MAX_SPAN),
            cooldown: cooldown.min(MAX_SPAN),
            rounds,
            current_round: 0,
            round_started: None,
            round_ended_at: None,
            finished: false,
        }
    }

    /// Begins round one at `now`.
    ///
    /// Resets the whole schedule, so calling it on a running or finished
    /// schedule starts over. Games that must reject a second start check
    /// their own status first.
    pub fn start(&mut self, now: Instant) {
        self.current_round = 1;
        self.round_started = Some(now);
        self.round_ended_at = None;
        self.finished = false;
        debug!(rounds = self.rounds, "round schedule started");
    }

    /// Applies whatever transition is due at `now`.
    ///
    /// At most one transition happens per call. Calling again with the
    /// same `now` after a transition returns `Idle` (or `Finished` again
    /// once terminal), so repeated calls never double-advance.
    pub fn advance(&mut self, now: Instant) -> RoundTransition {
        let Some(started) = self.round_started else {
            return RoundTransition::Idle;
        };
        if self.finished {
            return RoundTransition::Finished;
        }

        let Some(ended_at) = self.round_ended_at else {
            let deadline = started + self.duration;
            if now >= deadline {
                // The deadline, not `now`: cooldown runs from the deadline
                // however late this call is.
                self.round_ended_at = Some(deadline);
                debug!(round = self.current_round, "round reached its deadline");
                return RoundTransition::RoundEnded;
            }
            return RoundTransition::Idle;
        };

        if now < ended_at + self.cooldown {
            return RoundTransition::Idle;
        }

        if self.current_round >= self.rounds {
            self.finished = true;
            debug!(rounds = self.rounds, "round schedule finished");
            return RoundTransition::Finished;
        }

        self.current_round += 1;
        self.round_started = Some(now);
        self.round_ended_at = None;
        debug!(round = self.current_round, "next round started");
        RoundTransition::NextRound
    }

    /// Ends the live round at `now`, ahead of its deadline.
    ///
    /// Used when a correct guess settles the round early. Returns `false`
    /// (and changes nothing) unless a round is currently live.
    pub fn end_round(&mut self, now: Instant) -> bool {
        if self.phase() != RoundPhase::Active {
            return false;
        }
        self.round_ended_at = Some(now);
        trace!(round = self.current_round, "round ended early");
        true
    }

    /// The earliest instant at which [`advance`](Self::advance) could
    /// produce a transition.
    ///
    /// Returns `None` only when the schedule was never started. A wake
    /// time already in the past comes back as `now`, so the caller
    /// re-checks immediately instead of computing a negative sleep.
    pub fn next_wake(&self, now: Instant) -> Option<Instant> {
        let started = self.round_started?;
        let next = match self.round_ended_at {
            None => started + self.duration,
            Some(ended_at) => ended_at + self.cooldown,
        };
        Some(next.max(now))
    }

    /// The current phase, derived from the stored timestamps.
    ///
    /// This does not look at the clock: a round past its deadline still
    /// reports `Active` until `advance` observes it.
    pub fn phase(&self) -> RoundPhase {
        if self.round_started.is_none() {
            RoundPhase::Inactive
        } else if self.finished {
            RoundPhase::Finished
        } else if self.round_ended_at.is_some() {
            RoundPhase::CoolingDown
        } else {
            RoundPhase::Active
        }
    }

    /// Time left in the live round at `now`; zero outside an active round.
    pub fn remaining(&self, now: Instant) -> Duration {
        match (self.phase(), self.deadline()) {
            (RoundPhase::Active, Some(deadline)) => deadline.saturating_duration_since(now),
            _ => Duration::ZERO,
        }
    }

    /// Fraction of the live round still remaining at `now`, in `0.0..=1.0`.
    pub fn remaining_fraction(&self, now: Instant) -> f64 {
        if self.duration.is_zero() {
            return 0.0;
        }
        (self.remaining(now).as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Time elapsed since the current round started; zero before start.
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.round_started
            .map(|started| now.saturating_duration_since(started))
            .unwrap_or_default()
    }

    /// When the current round's natural deadline falls.
    pub fn deadline(&self) -> Option<Instant> {
        self.round_started.map(|started| started + self.duration)
    }

    /// When the next round will begin, while cooling down between rounds.
    pub fn next_round_at(&self) -> Option<Instant> {
        if self.finished {
            return None;
        }
        self.round_ended_at.map(|ended_at| ended_at + self.cooldown)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn round_started(&self) -> Option<Instant> {
        self.round_started
    }

    pub fn round_ended_at(&self) -> Option<Instant> {
        self.round_ended_at
    }

    /// Whether [`start`](Self::start) has been called.
    pub fn is_started(&self) -> bool {
        self.round_started.is_some()
    }
}
