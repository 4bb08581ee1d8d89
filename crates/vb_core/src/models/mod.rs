pub mod action;
pub mod court;
pub mod match_record;
pub mod rally;

pub use action::{
    Action, ActionKind, ActionType, Actor, AttackOutcome, AttackType, BlockOutcome, DigOutcome,
    FreeBallOutcome, OpponentErrorKind, ReceiveOutcome, ServeOutcome, SetOutcome,
};
pub use court::{CourtPosition, Role, Rotation, RotationState, ServingPhase};
pub use match_record::{Match, ScoreCorrection, SetRecord, SetScore, Winner};
pub use rally::{PointOutcome, Rally};
