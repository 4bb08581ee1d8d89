use thiserror::Error;

use crate::models::ActionType;

/// Engine-level failures.
///
/// Every mutating operation either applies completely or returns one of these
/// before touching any state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Malformed value passed to a pure function or constructor (caller bug).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation not allowed in the current lifecycle state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Ingestion-level rejection, carries the offending field.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Match state lock poisoned")]
    LockPoisoned,
}

impl EngineError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        EngineError::InvalidArgument(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        EngineError::InvalidState(msg.into())
    }

    /// Errors that can only come from a programming mistake on the caller side.
    pub fn is_caller_bug(&self) -> bool {
        match self {
            EngineError::InvalidArgument(_) => true,
            EngineError::InvalidState(_) => true,
            EngineError::Validation(_) => false, // user data, report and fix the row
            EngineError::LockPoisoned => false,
        }
    }
}

/// Rejections raised while turning raw recorded rows into engine actions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("Unknown action `{value}`")]
    UnknownAction { value: String },

    #[error("`{value}` is not a valid outcome for {action}")]
    UnknownOutcome { action: ActionType, value: String },

    #[error("Attack type is required for attacks")]
    MissingAttackType,

    #[error("Unknown attack type `{value}`")]
    UnknownAttackType { value: String },

    #[error("Attack type `{value}` given for non-attack action {action}")]
    UnexpectedAttackType { action: ActionType, value: String },

    #[error("Unknown position `{value}`")]
    UnknownPosition { value: String },

    #[error("Libero cannot be recorded on {action}")]
    LiberoRestricted { action: ActionType },

    #[error("{action} cannot be recorded for {actor}")]
    ActorMismatch { action: ActionType, actor: String },

    #[error("Invalid value `{value}` in column `{field}`")]
    InvalidField { field: &'static str, value: String },

    #[error("Row {row}: {source}")]
    AtRow {
        row: usize,
        #[source]
        source: Box<ValidationError>,
    },
}

impl ValidationError {
    /// Attach the 1-based data row the error was found on.
    pub fn at_row(self, row: usize) -> Self {
        match self {
            // keep the innermost row
            ValidationError::AtRow { .. } => self,
            other => ValidationError::AtRow { row, source: Box::new(other) },
        }
    }

    /// Column name of the offending field, as it appears in the tracker tables.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField { field } => *field,
            ValidationError::UnknownAction { .. } => "Action",
            ValidationError::UnknownOutcome { .. } => "Outcome",
            ValidationError::MissingAttackType => "Attack_Type",
            ValidationError::UnknownAttackType { .. } => "Attack_Type",
            ValidationError::UnexpectedAttackType { .. } => "Attack_Type",
            ValidationError::UnknownPosition { .. } => "Position",
            ValidationError::LiberoRestricted { .. } => "Position",
            ValidationError::ActorMismatch { .. } => "Player",
            ValidationError::InvalidField { field, .. } => *field,
            ValidationError::AtRow { source, .. } => source.field(),
        }
    }

    pub fn row(&self) -> Option<usize> {
        match self {
            ValidationError::AtRow { row, .. } => Some(*row),
            _ => None,
        }
    }
}

impl From<csv::Error> for EngineError {
    fn from(err: csv::Error) -> Self {
        // the header is record 0, so the record index is the 1-based data row
        let row = err.position().map(|p| p.record() as usize);
        let source = ValidationError::InvalidField { field: "record", value: err.to_string() };
        match row {
            Some(row) => EngineError::Validation(source.at_row(row)),
            None => EngineError::Validation(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
