//! Live match state engine.
//!
//! Leaf to root: position table, libero policy, rotation tracker, point
//! outcome resolver, score keeper, match controller.

pub mod controller;
pub mod libero;
pub mod position_table;
pub mod resolver;
pub mod rotation;
pub mod score;
pub mod shared;
pub mod snapshot;
mod undo;

pub use controller::{MatchController, ResumeState};
pub use libero::{libero_active, LineupAssignment, LineupSlot};
pub use position_table::{chart, position_of, role_at, setter_position};
pub use resolver::{classify, RallyState, Resolution};
pub use rotation::RotationTracker;
pub use score::{set_winner, ScoreKeeper};
pub use shared::SharedMatch;
pub use snapshot::{MatchSnapshot, RallyResult, RallyStatus};
