//! Pieces shared by both games' snapshots.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lifecycle of a game.
///
/// ```text
/// Lobby ──start──→ InProgress ──last cooldown──→ Finished
///                      ↑                            │
///                      └──────────restart───────────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Lobby,
    InProgress,
    Finished,
}

impl GameStatus {
    pub fn is_lobby(self) -> bool {
        matches!(self, Self::Lobby)
    }

    pub fn is_in_progress(self) -> bool {
        matches!(self, Self::InProgress)
    }

    pub fn is_finished(self) -> bool {
        matches!(self, Self::Finished)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lobby => write!(f, "lobby"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

/// A player's total points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub name: String,
    pub points: u32,
}

/// A player's correct-letter count this round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProgress {
    pub name: String,
    pub correct: usize,
}

/// Highest points first, ties by name.
pub(crate) fn sort_scores(scores: &mut [ScoreEntry]) {
    scores.sort_by(|a, b| b.points.cmp(&a.points).then_with(|| a.name.cmp(&b.name)));
}

/// Most correct letters first, ties by name.
pub(crate) fn sort_progress(progress: &mut [PlayerProgress]) {
    progress.sort_by(|a, b| b.correct.cmp(&a.correct).then_with(|| a.name.cmp(&b.name)));
}

/// The final result line for sorted `scores`: the top scorer's name,
/// `"Tie: a, b"` when several share the top score, or `"No winner"` when
/// nobody scored. `None` for an empty room.
pub fn resolve_winner(scores: &[ScoreEntry]) -> Option<String> {
    let top = scores.first()?.points;
    if top == 0 {
        return Some("No winner".to_string());
    }
    let winners: Vec<&str> = scores
        .iter()
        .take_while(|entry| entry.points == top)
        .map(|entry| entry.name.as_str())
        .collect();
    match winners.as_slice() {
        [single] => Some((*single).to_string()),
        many => Some(format!("Tie: {}", many.join(", "))),
    }
}

pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
