use serde::{Deserialize, Serialize};

use super::action::Action;
use super::court::{RotationState, ServingPhase};
use super::match_record::SetScore;

/// Result of a finished rally, from our side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(test, derive(strum_macros::EnumIter))]
pub enum PointOutcome {
    WeWon,
    WeLost,
}

impl PointOutcome {
    pub fn is_won(&self) -> bool {
        matches!(self, PointOutcome::WeWon)
    }

    /// Phase of the next rally: the winner serves.
    pub fn next_phase(&self) -> ServingPhase {
        match self {
            PointOutcome::WeWon => ServingPhase::Serving,
            PointOutcome::WeLost => ServingPhase::Receiving,
        }
    }
}

/// One point: the ordered actions plus the rotational state it was played in.
///
/// `rotation` is captured when the rally opens, before any outcome is known.
/// Once `outcome` is set the rally is sealed and accepts no more actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rally {
    /// 1-based point number within the set.
    pub point: u32,
    pub rotation: RotationState,
    pub actions: Vec<Action>,
    pub outcome: Option<PointOutcome>,
    /// Score when the rally was sealed, before its point was applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_before: Option<SetScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score_after: Option<SetScore>,
    /// Sealed by the unresolved-rally policy rather than by a terminal action.
    #[serde(default)]
    pub closed_without_terminal: bool,
}

impl Rally {
    pub fn open(point: u32, rotation: RotationState) -> Self {
        Self {
            point,
            rotation,
            actions: Vec::new(),
            outcome: None,
            score_before: None,
            score_after: None,
            closed_without_terminal: false,
        }
    }

    pub fn phase(&self) -> ServingPhase {
        self.rotation.phase
    }

    pub fn is_sealed(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Number of recorded actions (the `Rally_Length` column).
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn terminal_action(&self) -> Option<&Action> {
        if self.is_sealed() && !self.closed_without_terminal {
            self.actions.last()
        } else {
            None
        }
    }
}
