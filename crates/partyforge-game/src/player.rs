//! Players and the per-room roster.

use std::collections::HashMap;
use std::time::SystemTime;

use partyforge_protocol::PlayerId;

use crate::snapshot::{PlayerProgress, ScoreEntry, sort_progress, sort_scores};

/// One participant in a room.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub joined_at: SystemTime,
    /// Accumulated over the whole game.
    pub points: u32,
    /// Letters placed correctly this round; reset every round.
    pub progress: usize,
}

/// Players keyed by id, plus the room owner (the first to join).
#[derive(Debug, Default)]
pub(crate) struct Roster {
    players: HashMap<PlayerId, Player>,
    owner: Option<PlayerId>,
}

impl Roster {
    /// Adds a player under a fresh id. The first player becomes owner.
    pub(crate) fn add(&mut self, name: &str) -> Player {
        let player = Player {
            id: PlayerId::generate(),
            name: name.to_string(),
            joined_at: SystemTime::now(),
            points: 0,
            progress: 0,
        };
        if self.owner.is_none() {
            self.owner = Some(player.id.clone());
        }
        self.players.insert(player.id.clone(), player.clone());
        player
    }

    pub(crate) fn get(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &PlayerId) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    pub(crate) fn contains(&self, id: &PlayerId) -> bool {
        self.players.contains_key(id)
    }

    pub(crate) fn len(&self) -> usize {
        self.players.len()
    }

    pub(crate) fn is_owner(&self, id: &PlayerId) -> bool {
        self.owner.as_ref() == Some(id)
    }

    pub(crate) fn name(&self, id: &PlayerId) -> Option<String> {
        self.players.get(id).map(|player| player.name.clone())
    }

    /// Display names, sorted.
    pub(crate) fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.players.values().map(|p| p.name.clone()).collect();
        names.sort();
        names
    }

    pub(crate) fn players(&self) -> impl Iterator<Item = &Player> {
        self.players.values()
    }

    /// The player who explains round `round` (1-based): players are
    /// taken in id order, wrapping around.
    pub(crate) fn explainer_for_round(&self, round: u32) -> Option<PlayerId> {
        if self.players.is_empty() {
            return None;
        }
        let mut ids: Vec<&PlayerId> = self.players.keys().collect();
        ids.sort();
        let index = (round.saturating_sub(1) as usize) % ids.len();
        Some(ids[index].clone())
    }

    pub(crate) fn reset_progress(&mut self) {
        for player in self.players.values_mut() {
            player.progress = 0;
        }
    }

    pub(crate) fn reset_points(&mut self) {
        for player in self.players.values_mut() {
            player.points = 0;
            player.progress = 0;
        }
    }

    /// Points per player, best first.
    pub(crate) fn scores(&self) -> Vec<ScoreEntry> {
        let mut scores: Vec<ScoreEntry> = self
            .players
            .values()
            .map(|p| ScoreEntry {
                name: p.name.clone(),
                points: p.points,
            })
            .collect();
        sort_scores(&mut scores);
        scores
    }

    /// Progress per player, furthest first.
    pub(crate) fn progress(&self) -> Vec<PlayerProgress> {
        let mut progress: Vec<PlayerProgress> = self
            .players
            .values()
            .map(|p| PlayerProgress {
                name: p.name.clone(),
                correct: p.progress,
            })
            .collect();
        sort_progress(&mut progress);
        progress
    }
}
