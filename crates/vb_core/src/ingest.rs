//! Ingestion of recorded action rows.
//!
//! Rows come from the tracker sheet (or a CSV export of it) as raw strings.
//! Everything is validated here, before the engine sees an `Action`, and
//! every rejection names the offending column.
//!
//! Columns: `Player, Position, Action, Outcome, Attack_Type, Timestamp, Notes`.
//! `Position` holds a role code (`S`, `OPP`, `MB1`, `MB2`, `OH1`, `OH2`, `L`
//! and their long spellings), `OPPONENT` for opponent faults or `TEAM` for
//! whole-team faults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Read;

use crate::error::{Result, ValidationError};
use crate::models::{Action, ActionKind, ActionType, Actor, AttackType, Role};

/// One raw row. Empty cells deserialize as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRecord {
    #[serde(rename = "Player", default)]
    pub player: Option<String>,
    #[serde(rename = "Position", default)]
    pub position: Option<String>,
    #[serde(rename = "Action", default)]
    pub action: Option<String>,
    #[serde(rename = "Outcome", default)]
    pub outcome: Option<String>,
    #[serde(rename = "Attack_Type", default)]
    pub attack_type: Option<String>,
    /// RFC 3339.
    #[serde(rename = "Timestamp", default)]
    pub timestamp: Option<String>,
    #[serde(rename = "Notes", default)]
    pub notes: Option<String>,
}

impl ActionRecord {
    pub fn new(position: &str, action: &str, outcome: &str) -> Self {
        Self {
            position: Some(position.to_string()),
            action: Some(action.to_string()),
            outcome: Some(outcome.to_string()),
            ..Self::default()
        }
    }

    pub fn with_attack_type(mut self, attack_type: &str) -> Self {
        self.attack_type = Some(attack_type.to_string());
        self
    }

    pub fn with_player(mut self, player: &str) -> Self {
        self.player = Some(player.to_string());
        self
    }
}

const OPPONENT_LABELS: [&str; 2] = ["OPPONENT", "OPP_TEAM"];
const TEAM_LABELS: [&str; 2] = ["TEAM", "OUR_TEAM"];

/// Trimmed, `None` when blank.
fn cell(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn is_label(value: &str, labels: &[&str]) -> bool {
    labels.iter().any(|l| value.eq_ignore_ascii_case(l))
}

fn parse_actor(record: &ActionRecord, kind: &ActionKind) -> std::result::Result<Actor, ValidationError> {
    let player = cell(&record.player);
    let position = match cell(&record.position) {
        Some(position) => position,
        // synthetic rows may leave the position blank
        None => match kind {
            ActionKind::OpponentError(_) => return Ok(Actor::Opponent),
            ActionKind::TeamError => return Ok(Actor::Team),
            _ => return Err(ValidationError::MissingField { field: "Position" }),
        },
    };

    if is_label(position, &OPPONENT_LABELS) {
        return Ok(Actor::Opponent);
    }
    if is_label(position, &TEAM_LABELS) {
        return Ok(Actor::Team);
    }
    let role = Role::from_code(position)
        .ok_or_else(|| ValidationError::UnknownPosition { value: position.to_string() })?;
    Ok(match player {
        Some(name) if !is_label(name, &OPPONENT_LABELS) && !is_label(name, &TEAM_LABELS) => {
            Actor::named(role, name)
        }
        _ => Actor::player(role),
    })
}

/// Turn one raw row into a validated `Action`.
pub fn parse_record(record: &ActionRecord) -> std::result::Result<Action, ValidationError> {
    let action_name = cell(&record.action).ok_or(ValidationError::MissingField { field: "Action" })?;
    let action = ActionType::from_name(action_name)
        .ok_or_else(|| ValidationError::UnknownAction { value: action_name.to_string() })?;
    let outcome = cell(&record.outcome).ok_or(ValidationError::MissingField { field: "Outcome" })?;
    let attack_type = cell(&record.attack_type)
        .map(|value| {
            AttackType::from_name(value)
                .ok_or_else(|| ValidationError::UnknownAttackType { value: value.to_string() })
        })
        .transpose()?;

    let kind = ActionKind::parse(action, outcome, attack_type)?;
    let actor = parse_actor(record, &kind)?;
    let mut parsed = Action::new(actor, kind)?;

    if let Some(timestamp) = cell(&record.timestamp) {
        let at = DateTime::parse_from_rfc3339(timestamp).map_err(|_| ValidationError::InvalidField {
            field: "Timestamp",
            value: timestamp.to_string(),
        })?;
        parsed = parsed.at(at.with_timezone(&Utc));
    }
    if let Some(notes) = cell(&record.notes) {
        parsed = parsed.with_notes(notes);
    }
    Ok(parsed)
}

/// Read and validate a whole action CSV (header row required).
///
/// Stops at the first bad row; the error carries its 1-based data row.
pub fn read_action_csv<R: Read>(reader: R) -> Result<Vec<Action>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).flexible(true).from_reader(reader);
    let mut actions = Vec::new();
    for (i, record) in reader.deserialize::<ActionRecord>().enumerate() {
        let record = record?;
        let action = parse_record(&record).map_err(|e| e.at_row(i + 1))?;
        actions.push(action);
    }
    tracing::debug!("Read {} actions", actions.len());
    Ok(actions)
}
