//! Score Keeper: per-set score and set-completion detection.

use serde::{Deserialize, Serialize};

use crate::config::MatchRules;
use crate::models::{PointOutcome, SetScore, Winner};

/// Set winner under "first to `target`, ahead by `margin`". No upper bound.
pub fn set_winner(score: SetScore, target: u32, margin: u32) -> Winner {
    if score.ours >= target && score.ours >= score.opponents + margin {
        Winner::Us
    } else if score.opponents >= target && score.opponents >= score.ours + margin {
        Winner::Opponent
    } else {
        Winner::Undecided
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreKeeper {
    score: SetScore,
    target: u32,
    margin: u32,
}

impl ScoreKeeper {
    pub fn new(target: u32, margin: u32) -> Self {
        Self { score: SetScore::default(), target, margin }
    }

    /// Keeper for set `set_index` (the deciding set may have its own target).
    pub fn for_set(rules: &MatchRules, set_index: u8) -> Self {
        Self::new(rules.points_for_set(set_index), rules.win_margin)
    }

    pub fn score(&self) -> SetScore {
        self.score
    }

    pub fn target(&self) -> u32 {
        self.target
    }

    pub fn apply_point(&mut self, outcome: PointOutcome) -> SetScore {
        self.score = self.score.with_point(outcome);
        self.score
    }

    /// Manual override. Returns the replaced score for the audit record.
    pub fn correct(&mut self, ours: u32, opponents: u32) -> SetScore {
        std::mem::replace(&mut self.score, SetScore::new(ours, opponents))
    }

    pub fn winner(&self) -> Winner {
        set_winner(self.score, self.target, self.margin)
    }

    /// Rewind to an earlier score (undo, resume).
    pub(crate) fn restore(&mut self, score: SetScore) {
        self.score = score;
    }
}
