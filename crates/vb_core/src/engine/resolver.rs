//! Point Outcome Resolver
//!
//! Outcome determination is a fixed lookup over (action type, outcome): no
//! inference from earlier actions in the rally. Only the terminal action
//! decides the point.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::models::{
    Action, ActionKind, AttackOutcome, BlockOutcome, DigOutcome, FreeBallOutcome, PointOutcome,
    Rally, ReceiveOutcome, ServeOutcome, SetOutcome,
};

/// Classification of a single action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resolution {
    Continue,
    Terminal(PointOutcome),
}

impl Resolution {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Resolution::Terminal(_))
    }

    pub fn outcome(&self) -> Option<PointOutcome> {
        match self {
            Resolution::Terminal(outcome) => Some(*outcome),
            Resolution::Continue => None,
        }
    }
}

const WON: Resolution = Resolution::Terminal(PointOutcome::WeWon);
const LOST: Resolution = Resolution::Terminal(PointOutcome::WeLost);
const CONTINUE: Resolution = Resolution::Continue;

/// Total classification of every action kind.
pub fn classify(kind: &ActionKind) -> Resolution {
    match kind {
        ActionKind::Serve(outcome) => match outcome {
            ServeOutcome::Ace => WON,
            ServeOutcome::Good => CONTINUE,
            ServeOutcome::Error => LOST,
        },
        ActionKind::Receive(outcome) => match outcome {
            ReceiveOutcome::Perfect | ReceiveOutcome::Good | ReceiveOutcome::Poor => CONTINUE,
            ReceiveOutcome::Error => LOST,
        },
        ActionKind::Set(outcome) => match outcome {
            SetOutcome::Exceptional | SetOutcome::Good | SetOutcome::Poor => CONTINUE,
            SetOutcome::Error => LOST,
        },
        ActionKind::Attack { outcome, .. } => match outcome {
            AttackOutcome::Kill => WON,
            AttackOutcome::Defended => CONTINUE,
            AttackOutcome::Blocked
            | AttackOutcome::Out
            | AttackOutcome::Net
            | AttackOutcome::Error => LOST,
        },
        ActionKind::Block(outcome) => match outcome {
            BlockOutcome::Kill => WON,
            BlockOutcome::Touch | BlockOutcome::Missed => CONTINUE,
            BlockOutcome::Error => LOST,
        },
        ActionKind::Dig(outcome) => match outcome {
            DigOutcome::Perfect | DigOutcome::Good | DigOutcome::Poor => CONTINUE,
            DigOutcome::Error => LOST,
        },
        ActionKind::FreeBall(outcome) => match outcome {
            FreeBallOutcome::Good => CONTINUE,
            FreeBallOutcome::Error => LOST,
        },
        ActionKind::OpponentError(_) => WON,
        ActionKind::TeamError => LOST,
    }
}

/// Rally state: in progress until a terminal action arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RallyState {
    InProgress,
    Terminal(PointOutcome),
}

impl RallyState {
    pub fn of(rally: &Rally) -> Self {
        match rally.outcome {
            Some(outcome) => RallyState::Terminal(outcome),
            None => RallyState::InProgress,
        }
    }
}

/// Append `action` to an open rally and classify it.
///
/// Fails with `InvalidState` if the rally is already sealed; the rally is left
/// untouched in that case. A terminal classification seals the rally.
pub fn append(rally: &mut Rally, action: Action) -> Result<Resolution> {
    if let RallyState::Terminal(outcome) = RallyState::of(rally) {
        return Err(EngineError::invalid_state(format!(
            "rally {} is already sealed ({:?})",
            rally.point, outcome
        )));
    }
    let resolution = classify(action.kind());
    rally.actions.push(action);
    if let Resolution::Terminal(outcome) = resolution {
        rally.outcome = Some(outcome);
    }
    Ok(resolution)
}
