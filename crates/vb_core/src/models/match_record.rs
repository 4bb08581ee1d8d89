//! Set and match records: the structured log the reporting layer consumes.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::court::RotationState;
use super::rally::{PointOutcome, Rally};
use crate::config::MatchConfig;

/// Points in one set, ours first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SetScore {
    pub ours: u32,
    pub opponents: u32,
}

impl SetScore {
    pub fn new(ours: u32, opponents: u32) -> Self {
        Self { ours, opponents }
    }

    pub fn with_point(self, outcome: PointOutcome) -> Self {
        match outcome {
            PointOutcome::WeWon => Self { ours: self.ours + 1, ..self },
            PointOutcome::WeLost => Self { opponents: self.opponents + 1, ..self },
        }
    }
}

impl fmt::Display for SetScore {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}-{}", self.ours, self.opponents)
    }
}

/// Winner of a set or of the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Winner {
    Us,
    Opponent,
    #[default]
    Undecided,
}

impl Winner {
    pub fn is_decided(&self) -> bool {
        !matches!(self, Winner::Undecided)
    }
}

/// Audit record of an out-of-band score override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreCorrection {
    pub set_index: u8,
    /// Sealed rallies in the set when the correction was applied.
    pub after_rally: usize,
    pub from: SetScore,
    pub to: SetScore,
}

/// One set of the match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRecord {
    /// 1-based set number.
    pub index: u8,
    pub starting_rotation: RotationState,
    /// Point number of the first tracked rally (greater than 1 for resumed sets).
    #[serde(default = "first_point")]
    pub starting_point: u32,
    /// Rotation snapshot per sealed rally, aligned with `rallies`.
    pub rotation_history: Vec<RotationState>,
    pub rallies: Vec<Rally>,
    /// Live score while the set is open, final score once sealed.
    pub final_score: SetScore,
    pub winner: Winner,
    #[serde(default)]
    pub corrections: Vec<ScoreCorrection>,
}

fn first_point() -> u32 {
    1
}

impl SetRecord {
    pub fn new(index: u8, starting_rotation: RotationState) -> Self {
        Self {
            index,
            starting_rotation,
            starting_point: 1,
            rotation_history: Vec::new(),
            rallies: Vec::new(),
            final_score: SetScore::default(),
            winner: Winner::Undecided,
            corrections: Vec::new(),
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.winner.is_decided()
    }

    /// Point number the next rally in this set will carry.
    pub fn next_point(&self) -> u32 {
        self.rallies.last().map(|r| r.point + 1).unwrap_or(self.starting_point)
    }

    /// True when a manual correction was applied after the last sealed rally.
    pub fn corrected_since_last_rally(&self) -> bool {
        self.corrections.last().is_some_and(|c| c.after_rally == self.rallies.len())
    }
}

/// The whole tracked match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub config: MatchConfig,
    pub sets: Vec<SetRecord>,
    pub sets_won_by_us: u8,
    pub sets_won_by_opponent: u8,
    pub winner: Winner,
}

impl Match {
    pub fn is_complete(&self) -> bool {
        self.winner.is_decided()
    }

    pub fn current_set(&self) -> Option<&SetRecord> {
        self.sets.last()
    }

    /// All sealed rallies, in order, with their set number.
    pub fn rallies(&self) -> impl Iterator<Item = (u8, &Rally)> {
        self.sets.iter().flat_map(|set| set.rallies.iter().map(move |r| (set.index, r)))
    }

    pub fn total_rallies(&self) -> usize {
        self.sets.iter().map(|s| s.rallies.len()).sum()
    }
}
