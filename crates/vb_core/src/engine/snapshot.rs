//! Read-only views handed out by the controller.

use serde::{Deserialize, Serialize};

use super::libero::LineupAssignment;
use crate::models::{Action, PointOutcome, Rotation, RotationState, ServingPhase, SetScore, Winner};

/// Current state of a tracked match.
///
/// Owned copy: building one twice without a mutation in between yields equal
/// values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub lineup: LineupAssignment,
    pub rotation: Rotation,
    pub serving_phase: ServingPhase,
    pub score: SetScore,
    pub set_index: u8,
    /// Point number of the rally being recorded.
    pub point: u32,
    pub sets_won_by_us: u8,
    pub sets_won_by_opponent: u8,
    pub match_winner: Winner,
    /// Actions of the rally in progress.
    pub rally_actions: Vec<Action>,
}

impl MatchSnapshot {
    pub fn is_complete(&self) -> bool {
        self.match_winner.is_decided()
    }

    pub fn state(&self) -> RotationState {
        RotationState::new(self.rotation, self.serving_phase)
    }
}

/// Everything that changed when a rally was sealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RallyResult {
    pub set_index: u8,
    pub point: u32,
    pub outcome: PointOutcome,
    /// State the rally was played in.
    pub rotation: RotationState,
    /// State the next rally will be played in (a new set's opening state
    /// when this rally ended the set).
    pub next_state: RotationState,
    /// Set score after the point.
    pub score: SetScore,
    pub rally_length: usize,
    /// Sealed by the unresolved-rally policy rather than a terminal action.
    pub unresolved: bool,
    pub set_winner: Winner,
    pub match_winner: Winner,
}

impl RallyResult {
    pub fn is_side_out(&self) -> bool {
        self.outcome.is_won() && self.rotation.phase.is_receiving()
    }

    pub fn ended_set(&self) -> bool {
        self.set_winner.is_decided()
    }
}

/// Reply to `record_action`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RallyStatus {
    InProgress,
    Sealed(RallyResult),
}

impl RallyStatus {
    pub fn is_sealed(&self) -> bool {
        matches!(self, RallyStatus::Sealed(_))
    }

    pub fn result(&self) -> Option<&RallyResult> {
        match self {
            RallyStatus::Sealed(result) => Some(result),
            RallyStatus::InProgress => None,
        }
    }

    pub fn into_result(self) -> Option<RallyResult> {
        match self {
            RallyStatus::Sealed(result) => Some(result),
            RallyStatus::InProgress => None,
        }
    }
}
