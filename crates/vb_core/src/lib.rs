//! # vb_core - Live Volleyball Match State Engine
//!
//! Tracks a volleyball match rally by rally: rotation and court positions,
//! libero substitution, point outcomes from recorded actions, score, set and
//! match completion.
//!
//! ## Features
//! - Deterministic: the same action stream always yields the same match log
//! - Closed outcome enums per action type, validated at ingestion
//! - Undo, manual score correction and resume from exported tables
//! - CSV export in the dashboard's Individual/Team events layout
//!
//! ## Usage
//! ```
//! use vb_core::{Action, ActionKind, MatchConfig, MatchController, Role, ServeOutcome};
//!
//! let mut tracker = MatchController::new(MatchConfig::default()).unwrap();
//! let ace = Action::by(Role::Setter, ActionKind::Serve(ServeOutcome::Ace)).unwrap();
//! let status = tracker.record_action(ace).unwrap();
//! assert!(status.is_sealed());
//! assert_eq!(tracker.current_snapshot().score.ours, 1);
//! ```

// Doc formatting lints - purely cosmetic
#![allow(clippy::doc_lazy_continuation)]

pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod import;
pub mod ingest;
pub mod models;

pub use config::{MatchConfig, MatchRules, ServeStart, UnresolvedRallyPolicy};
pub use engine::{
    LineupAssignment, MatchController, MatchSnapshot, RallyResult, RallyStatus, ResumeState,
    SharedMatch,
};
pub use error::{EngineError, Result, ValidationError};
pub use export::{export_file_stem, live_file_stem, ExportError, ExportTables};
pub use import::{ImportedMatch, RotationValue};
pub use ingest::{parse_record, read_action_csv, ActionRecord};
pub use models::{
    Action, ActionKind, ActionType, Actor, AttackOutcome, AttackType, BlockOutcome, CourtPosition,
    DigOutcome, FreeBallOutcome, Match, OpponentErrorKind, PointOutcome, Rally, ReceiveOutcome,
    Role, Rotation, RotationState, ScoreCorrection, ServeOutcome, ServingPhase, SetOutcome,
    SetRecord, SetScore, Winner,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
