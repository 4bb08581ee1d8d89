//! Flattened tables for the reporting dashboard.
//!
//! Two tables, one row per action and one row per sealed rally, with the
//! column names the dashboard loader expects.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{Match, Rally};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// `Point Won` is written as `yes`/`no`; reading also accepts `true`/`1`.
pub(crate) mod yes_no {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "yes" } else { "no" })
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(matches!(raw.trim().to_ascii_lowercase().as_str(), "yes" | "true" | "1"))
    }
}

/// One row of the Individual-events table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndividualEventRow {
    #[serde(rename = "Set")]
    pub set: u8,
    #[serde(rename = "Point")]
    pub point: u32,
    #[serde(rename = "Rotation")]
    pub rotation: u8,
    #[serde(rename = "Player")]
    pub player: String,
    #[serde(rename = "Position")]
    pub position: String,
    #[serde(rename = "Action")]
    pub action: String,
    #[serde(rename = "Outcome")]
    pub outcome: String,
    #[serde(rename = "Attack_Type")]
    pub attack_type: String,
    #[serde(rename = "Notes")]
    pub notes: String,
}

/// One row of the Team-events table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamEventRow {
    #[serde(rename = "Set")]
    pub set: u8,
    #[serde(rename = "Point")]
    pub point: u32,
    #[serde(rename = "Rotation")]
    pub rotation: u8,
    /// `serving` or `receiving`: the phase the rally was played in.
    #[serde(rename = "Point_Type")]
    pub point_type: String,
    #[serde(rename = "Point Won", with = "yes_no")]
    pub point_won: bool,
    #[serde(rename = "Our_Score")]
    pub our_score: u32,
    #[serde(rename = "Opponent_Score")]
    pub opponent_score: u32,
    #[serde(rename = "Rally_Length")]
    pub rally_length: usize,
}

impl TeamEventRow {
    fn from_rally(set: u8, rally: &Rally) -> Option<Self> {
        let outcome = rally.outcome?;
        let score = rally.score_after.unwrap_or_default();
        Some(Self {
            set,
            point: rally.point,
            rotation: rally.rotation.rotation.get(),
            point_type: rally.phase().as_str().to_string(),
            point_won: outcome.is_won(),
            our_score: score.ours,
            opponent_score: score.opponents,
            rally_length: rally.len(),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportTables {
    pub individual: Vec<IndividualEventRow>,
    pub team: Vec<TeamEventRow>,
}

impl ExportTables {
    /// Flatten every sealed rally of `record`.
    ///
    /// Opponent and whole-team fault rows only exist to close rallies; they
    /// stay out of the Individual-events table but their rallies still get a
    /// Team-events row.
    pub fn from_match(record: &Match) -> Self {
        let mut tables = Self::default();
        for (set, rally) in record.rallies() {
            let Some(team_row) = TeamEventRow::from_rally(set, rally) else {
                continue;
            };
            for action in rally.actions.iter().filter(|a| !a.is_synthetic()) {
                tables.individual.push(IndividualEventRow {
                    set,
                    point: rally.point,
                    rotation: team_row.rotation,
                    player: action.actor().player_label(),
                    position: action.actor().position_label().to_string(),
                    action: action.action_type().name().to_string(),
                    outcome: action.kind().outcome_name().to_string(),
                    attack_type: action.kind().attack_type().map(|t| t.name().to_string()).unwrap_or_default(),
                    notes: action.notes().unwrap_or_default().to_string(),
                });
            }
            tables.team.push(team_row);
        }
        tables
    }

    pub fn write_individual<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        write_rows(writer, &self.individual)
    }

    pub fn write_team<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        write_rows(writer, &self.team)
    }

    /// Write `<stem>_individual.csv` and `<stem>_team.csv` into `dir`.
    pub fn write_csv(&self, dir: &Path, stem: &str) -> Result<(PathBuf, PathBuf), ExportError> {
        std::fs::create_dir_all(dir)?;
        let individual_path = dir.join(format!("{}_individual.csv", stem));
        let team_path = dir.join(format!("{}_team.csv", stem));
        self.write_individual(File::create(&individual_path)?)?;
        self.write_team(File::create(&team_path)?)?;
        tracing::info!(
            "Exported {} individual and {} team rows to {}",
            self.individual.len(),
            self.team.len(),
            dir.display()
        );
        Ok((individual_path, team_path))
    }
}

fn write_rows<W: Write, T: Serialize>(writer: W, rows: &[T]) -> Result<(), ExportError> {
    let mut writer = csv::Writer::from_writer(writer);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Full match log as pretty JSON.
pub fn write_match_json<W: Write>(writer: W, record: &Match) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, record)?;
    Ok(())
}

/// Opponent name as used in file names: letters, digits, `-` and `_`,
/// spaces turned into `_`. Blank names become `Match`.
fn clean_opponent(opponent: &str) -> String {
    let kept: String = opponent
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    let kept = kept.trim();
    if kept.is_empty() {
        "Match".to_string()
    } else {
        kept.replace(' ', "_")
    }
}

/// `YYYY-MM-DD_<Opponent>_event_tracker`
pub fn export_file_stem(opponent: &str, date: NaiveDate) -> String {
    format!("{}_{}_event_tracker", date.format("%Y-%m-%d"), clean_opponent(opponent))
}

/// `<Opponent>_YYYY-MM-DD_live`, the rolling in-match backup.
pub fn live_file_stem(opponent: &str, date: NaiveDate) -> String {
    format!("{}_{}_live", clean_opponent(opponent), date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MatchConfig, ServeStart};
    use crate::engine::MatchController;
    use crate::models::{Action, ActionKind, Actor, OpponentErrorKind, ReceiveOutcome, Role, Rotation, SetOutcome};

    fn sample_match() -> Match {
        let mut c = MatchController::new(MatchConfig::new(Rotation::new(2).unwrap(), ServeStart::WeReceive))
            .unwrap();
        let pass = Action::new(Actor::named(Role::Libero, "Kim"), ActionKind::Receive(ReceiveOutcome::Good))
            .unwrap()
            .with_notes("tight pass");
        c.record_action(pass).unwrap();
        c.record_action(Action::by(Role::Setter, ActionKind::Set(SetOutcome::Error)).unwrap()).unwrap();
        c.record_opponent_error(OpponentErrorKind::AttackError).unwrap();
        c.match_record().clone()
    }

    #[test]
    fn test_tables_from_match() {
        let tables = ExportTables::from_match(&sample_match());
        assert_eq!(tables.team.len(), 2);
        // the opponent fault row is dropped
        assert_eq!(tables.individual.len(), 2);

        let first = &tables.individual[0];
        assert_eq!((first.set, first.point, first.rotation), (1, 1, 2));
        assert_eq!(first.player, "Kim");
        assert_eq!(first.position, "L");
        assert_eq!(first.notes, "tight pass");
        assert_eq!(first.attack_type, "");

        let lost = &tables.team[0];
        assert_eq!(lost.point_type, "receiving");
        assert!(!lost.point_won);
        assert_eq!((lost.our_score, lost.opponent_score, lost.rally_length), (0, 1, 2));

        let won = &tables.team[1];
        assert_eq!(won.point, 2);
        assert_eq!(won.rotation, 2);
        assert!(won.point_won);
        assert_eq!(won.rally_length, 1);
    }

    #[test]
    fn test_team_csv_header_and_values() {
        let tables = ExportTables::from_match(&sample_match());
        let mut out = Vec::new();
        tables.write_team(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Set,Point,Rotation,Point_Type,Point Won,Our_Score,Opponent_Score,Rally_Length")
        );
        assert_eq!(lines.next(), Some("1,1,2,receiving,no,0,1,2"));
        assert_eq!(lines.next(), Some("1,2,2,receiving,yes,1,1,1"));
    }

    #[test]
    fn test_individual_csv_snapshot() {
        let tables = ExportTables::from_match(&sample_match());
        let mut out = Vec::new();
        tables.write_individual(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        insta::assert_snapshot!(text, @r"
        Set,Point,Rotation,Player,Position,Action,Outcome,Attack_Type,Notes
        1,1,2,Kim,L,receive,good,,tight pass
        1,1,2,S,S,set,error,,
        ");
    }

    #[test]
    fn test_write_csv_files() {
        let dir = tempfile::tempdir().unwrap();
        let tables = ExportTables::from_match(&sample_match());
        let (individual, team) = tables.write_csv(dir.path(), "match").unwrap();
        assert!(individual.ends_with("match_individual.csv"));
        let text = std::fs::read_to_string(team).unwrap();
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn test_file_stems() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        assert_eq!(export_file_stem("St. Mary's  VC", date), "2024-03-02_St_Marys__VC_event_tracker");
        assert_eq!(live_file_stem("  ", date), "Match_2024-03-02_live");
    }
}
