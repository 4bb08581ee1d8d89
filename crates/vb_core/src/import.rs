//! Reading exported tables back in, and deriving where to resume.
//!
//! Older sheets may lack the `Rotation` column. Those rows get a rotation
//! estimated by cycling 1-6 over the row index, tagged
//! `RotationValue::Estimated` so it is never mistaken for a tracked value.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

use crate::config::{MatchConfig, MatchRules, ServeStart};
use crate::engine::{set_winner, ResumeState};
use crate::error::{EngineError, Result, ValidationError};
use crate::export::yes_no;
use crate::models::{Rotation, RotationState, ServingPhase, SetScore, Winner};

/// Rotation of an imported row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", content = "rotation", rename_all = "snake_case")]
pub enum RotationValue {
    Tracked(Rotation),
    /// Reconstructed as `(row index % 6) + 1`.
    Estimated(Rotation),
}

impl RotationValue {
    fn from_column(value: Option<u8>, row_index: usize) -> std::result::Result<Self, ValidationError> {
        match value {
            Some(raw) => Rotation::new(raw)
                .map(RotationValue::Tracked)
                .map_err(|_| ValidationError::InvalidField { field: "Rotation", value: raw.to_string() }),
            None => Ok(RotationValue::Estimated(Rotation::ALL[row_index % 6])),
        }
    }

    pub fn rotation(&self) -> Rotation {
        match self {
            RotationValue::Tracked(r) | RotationValue::Estimated(r) => *r,
        }
    }

    pub fn is_estimated(&self) -> bool {
        matches!(self, RotationValue::Estimated(_))
    }
}

#[derive(Debug, Deserialize)]
struct RawIndividualRow {
    #[serde(rename = "Set")]
    set: u8,
    #[serde(rename = "Point")]
    point: u32,
    #[serde(rename = "Rotation", default)]
    rotation: Option<u8>,
    #[serde(rename = "Player", default)]
    player: Option<String>,
    #[serde(rename = "Position", default)]
    position: Option<String>,
    #[serde(rename = "Action", default)]
    action: Option<String>,
    #[serde(rename = "Outcome", default)]
    outcome: Option<String>,
    #[serde(rename = "Attack_Type", default)]
    attack_type: Option<String>,
    #[serde(rename = "Notes", default)]
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTeamRow {
    #[serde(rename = "Set")]
    set: u8,
    #[serde(rename = "Point")]
    point: u32,
    #[serde(rename = "Rotation", default)]
    rotation: Option<u8>,
    #[serde(rename = "Point_Type", default)]
    point_type: Option<String>,
    #[serde(rename = "Point Won", with = "yes_no", default)]
    point_won: bool,
    #[serde(rename = "Our_Score")]
    our_score: u32,
    #[serde(rename = "Opponent_Score")]
    opponent_score: u32,
    #[serde(rename = "Rally_Length", default)]
    rally_length: Option<usize>,
}

/// Individual-events row, kept as recorded (names are not re-validated).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedIndividualRow {
    pub set: u8,
    pub point: u32,
    pub rotation: RotationValue,
    pub player: String,
    pub position: String,
    pub action: String,
    pub outcome: String,
    pub attack_type: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedTeamRow {
    pub set: u8,
    pub point: u32,
    pub rotation: RotationValue,
    pub phase: ServingPhase,
    pub point_won: bool,
    pub score: SetScore,
    pub rally_length: Option<usize>,
}

fn check_set(set: u8) -> std::result::Result<u8, ValidationError> {
    if (1..=MatchRules::MAX_SETS).contains(&set) {
        Ok(set)
    } else {
        Err(ValidationError::InvalidField { field: "Set", value: set.to_string() })
    }
}

fn parse_phase(value: Option<&str>) -> std::result::Result<ServingPhase, ValidationError> {
    // blank means serving
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(ServingPhase::Serving);
    };
    let lower = value.to_ascii_lowercase();
    if lower.contains("receiving") {
        Ok(ServingPhase::Receiving)
    } else if lower.contains("serving") {
        Ok(ServingPhase::Serving)
    } else {
        Err(ValidationError::InvalidField { field: "Point_Type", value: value.to_string() })
    }
}

/// Both tables of a previously tracked match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedMatch {
    pub individual: Vec<ImportedIndividualRow>,
    pub team: Vec<ImportedTeamRow>,
}

impl ImportedMatch {
    pub fn from_csv_readers<I: Read, T: Read>(individual: I, team: T) -> Result<Self> {
        Ok(Self { individual: read_individual(individual)?, team: read_team(team)? })
    }

    pub fn has_estimated_rotations(&self) -> bool {
        self.team.iter().any(|r| r.rotation.is_estimated())
            || self.individual.iter().any(|r| r.rotation.is_estimated())
    }

    fn set_rows(&self, set: u8) -> impl Iterator<Item = &ImportedTeamRow> {
        self.team.iter().filter(move |r| r.set == set)
    }

    /// Starting rotation and serve start of the recorded match, taken from
    /// the first rally of set 1. Estimated rotations are not trusted.
    pub fn inferred_config(&self, base: &MatchConfig) -> MatchConfig {
        let mut config = base.clone();
        let mut first_set = self.set_rows(1);
        let Some(first) = first_set.next() else {
            return config;
        };
        if let RotationValue::Tracked(rotation) = first.rotation {
            config.setter_start_rotation = rotation;
        }
        if let Some(point_one) = self.set_rows(1).find(|r| r.point == 1) {
            config.serve_start = ServeStart::from_phase(point_one.phase);
        }
        config
    }

    /// Sets won so far, counting only sets whose final row decides them.
    pub fn sets_won(&self, config: &MatchConfig) -> (u8, u8) {
        let mut won = (0u8, 0u8);
        let sets: BTreeSet<u8> = self.team.iter().map(|r| r.set).collect();
        for set in sets {
            if let Some(last) = self.set_rows(set).last() {
                match self.set_result(set, last.score, config) {
                    Winner::Us => won.0 += 1,
                    Winner::Opponent => won.1 += 1,
                    Winner::Undecided => {}
                }
            }
        }
        won
    }

    fn set_result(&self, set: u8, score: SetScore, config: &MatchConfig) -> Winner {
        set_winner(score, config.rules.points_for_set(set), config.rules.win_margin)
    }

    /// Where tracking continues after the last Team-events row.
    pub fn resume_state(&self, config: &MatchConfig) -> Result<ResumeState> {
        let last = self
            .team
            .last()
            .ok_or_else(|| EngineError::invalid_argument("no team events to resume from"))?;
        let max_sets = config.rules.max_sets();
        if let Some(row) = self.team.iter().find(|r| r.set > max_sets) {
            return Err(EngineError::invalid_argument(format!(
                "set {} is beyond the {} sets these rules allow",
                row.set, max_sets
            )));
        }
        let (sets_won_by_us, sets_won_by_opponent) = self.sets_won(config);

        if self.set_result(last.set, last.score, config).is_decided() {
            let set_index = last
                .set
                .checked_add(1)
                .ok_or_else(|| EngineError::invalid_argument("set number out of range"))?;
            return Ok(ResumeState {
                set_index,
                score: SetScore::default(),
                next_point: 1,
                state: config.opening_state(set_index),
                sets_won_by_us,
                sets_won_by_opponent,
            });
        }

        if last.rotation.is_estimated() {
            tracing::warn!("Resuming from an estimated rotation ({})", last.rotation.rotation());
        }
        let rotation = last.rotation.rotation();
        let state = if last.point_won {
            let rotation = if last.phase.is_receiving() { rotation.next() } else { rotation };
            RotationState::new(rotation, ServingPhase::Serving)
        } else {
            RotationState::new(rotation, ServingPhase::Receiving)
        };
        Ok(ResumeState {
            set_index: last.set,
            score: last.score,
            next_point: last
                .point
                .checked_add(1)
                .ok_or_else(|| EngineError::invalid_argument("point number out of range"))?,
            state,
            sets_won_by_us,
            sets_won_by_opponent,
        })
    }
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new().trim(csv::Trim::All).flexible(true).from_reader(reader)
}

fn read_individual<R: Read>(reader: R) -> Result<Vec<ImportedIndividualRow>> {
    let mut rows = Vec::new();
    for (i, raw) in csv_reader(reader).deserialize::<RawIndividualRow>().enumerate() {
        let raw = raw?;
        let set = check_set(raw.set).map_err(|e| e.at_row(i + 1))?;
        let rotation = RotationValue::from_column(raw.rotation, i).map_err(|e| e.at_row(i + 1))?;
        rows.push(ImportedIndividualRow {
            set,
            point: raw.point,
            rotation,
            player: raw.player.unwrap_or_default(),
            position: raw.position.unwrap_or_default(),
            action: raw.action.unwrap_or_default(),
            outcome: raw.outcome.unwrap_or_default(),
            attack_type: raw.attack_type,
            notes: raw.notes,
        });
    }
    Ok(rows)
}

fn team_row(raw: RawTeamRow, row_index: usize) -> std::result::Result<ImportedTeamRow, ValidationError> {
    Ok(ImportedTeamRow {
        set: check_set(raw.set)?,
        point: raw.point,
        rotation: RotationValue::from_column(raw.rotation, row_index)?,
        phase: parse_phase(raw.point_type.as_deref())?,
        point_won: raw.point_won,
        score: SetScore::new(raw.our_score, raw.opponent_score),
        rally_length: raw.rally_length,
    })
}

fn read_team<R: Read>(reader: R) -> Result<Vec<ImportedTeamRow>> {
    let mut rows = Vec::new();
    for (i, raw) in csv_reader(reader).deserialize::<RawTeamRow>().enumerate() {
        rows.push(team_row(raw?, i).map_err(|e| e.at_row(i + 1))?);
    }
    Ok(rows)
}

/// Opponent and date encoded in an exported file name.
///
/// Understands `YYYY-MM-DD_<Opponent>_event_tracker` and
/// `<Opponent>_YYYY-MM-DD_live` (or `_event_tracker`), with any extension.
pub fn parse_file_name(path: &Path) -> (Option<String>, Option<NaiveDate>) {
    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
        return (None, None);
    };
    let parts: Vec<&str> = stem.split('_').collect();
    let Some(date_at) = parts.iter().position(|p| NaiveDate::parse_from_str(p, "%Y-%m-%d").is_ok()) else {
        return (None, None);
    };
    let date = NaiveDate::parse_from_str(parts[date_at], "%Y-%m-%d").ok();

    let is_suffix = |p: &&str| matches!(*p, "event" | "tracker" | "live" | "individual" | "team");
    let name_parts: Vec<&str> = if date_at == 0 {
        parts[1..].iter().copied().take_while(|p| !is_suffix(p)).collect()
    } else {
        parts[..date_at].to_vec()
    };
    let opponent = Some(name_parts.join(" ")).filter(|n| !n.trim().is_empty());
    (opponent, date)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEAM: &str = "\
Set,Point,Rotation,Point_Type,Point Won,Our_Score,Opponent_Score,Rally_Length
1,1,3,receiving,no,0,1,4
1,2,3,receiving,yes,1,1,2
1,3,4,serving,yes,2,1,1
";

    const INDIVIDUAL: &str = "\
Set,Point,Rotation,Player,Position,Action,Outcome,Attack_Type,Notes
1,1,3,Ana,OH1,attack,out,normal,
1,3,4,Kim,S,serve,ace,,
";

    fn imported(team: &str) -> ImportedMatch {
        ImportedMatch::from_csv_readers(INDIVIDUAL.as_bytes(), team.as_bytes()).unwrap()
    }

    #[test]
    fn test_reads_both_tables() {
        let m = imported(TEAM);
        assert_eq!(m.individual.len(), 2);
        assert_eq!(m.individual[0].attack_type.as_deref(), Some("normal"));
        assert_eq!(m.individual[1].attack_type, None);
        assert_eq!(m.team[1].score, SetScore::new(1, 1));
        assert!(!m.has_estimated_rotations());
    }

    #[test]
    fn test_resume_after_win_while_serving() {
        let state = imported(TEAM).resume_state(&MatchConfig::default()).unwrap();
        assert_eq!(state.set_index, 1);
        assert_eq!(state.next_point, 4);
        assert_eq!(state.score, SetScore::new(2, 1));
        assert_eq!(state.state, RotationState::new(Rotation::new(4).unwrap(), ServingPhase::Serving));
    }

    #[test]
    fn test_resume_after_side_out_rotates() {
        let team = "\
Set,Point,Rotation,Point_Type,Point Won,Our_Score,Opponent_Score,Rally_Length
2,5,6,receiving,yes,3,2,3
";
        let state = imported(team).resume_state(&MatchConfig::default()).unwrap();
        assert_eq!(state.state.rotation, Rotation::FIRST);
        assert_eq!(state.state.phase, ServingPhase::Serving);
    }

    #[test]
    fn test_resume_after_finished_set() {
        let team = "\
Set,Point,Rotation,Point_Type,Point Won,Our_Score,Opponent_Score,Rally_Length
1,45,2,serving,yes,25,20,5
";
        let config = MatchConfig::default().with_serve_alternation(true);
        let state = imported(team).resume_state(&config).unwrap();
        assert_eq!(state.set_index, 2);
        assert_eq!(state.sets_won_by_us, 1);
        assert_eq!(state.score, SetScore::default());
        assert_eq!(state.state, config.opening_state(2));
    }

    #[test]
    fn test_missing_rotation_is_estimated() {
        let team = "\
Set,Point,Point_Type,Point Won,Our_Score,Opponent_Score,Rally_Length
1,1,serving,yes,1,0,1
1,2,serving,yes,2,0,1
";
        let m = imported(team);
        assert_eq!(m.team[0].rotation, RotationValue::Estimated(Rotation::FIRST));
        assert_eq!(m.team[1].rotation, RotationValue::Estimated(Rotation::new(2).unwrap()));
        assert!(m.has_estimated_rotations());
        // estimated values never override the configured start
        assert_eq!(m.inferred_config(&MatchConfig::default()).setter_start_rotation, Rotation::FIRST);
    }

    #[test]
    fn test_inferred_config() {
        let config = imported(TEAM).inferred_config(&MatchConfig::default());
        assert_eq!(config.setter_start_rotation.get(), 3);
        assert_eq!(config.serve_start, ServeStart::WeReceive);
    }

    #[test]
    fn test_bad_rows_are_located() {
        let team = "\
Set,Point,Rotation,Point_Type,Point Won,Our_Score,Opponent_Score,Rally_Length
1,1,9,serving,yes,1,0,1
";
        let err = ImportedMatch::from_csv_readers(INDIVIDUAL.as_bytes(), team.as_bytes()).unwrap_err();
        match err {
            EngineError::Validation(e) => {
                assert_eq!(e.row(), Some(1));
                assert_eq!(e.field(), "Rotation");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_set_column_is_checked() {
        for bad in ["0", "255"] {
            let team = format!(
                "Set,Point,Rotation,Point_Type,Point Won,Our_Score,Opponent_Score,Rally_Length\n\
                 {},1,1,serving,yes,25,0,1\n",
                bad
            );
            let err = ImportedMatch::from_csv_readers(INDIVIDUAL.as_bytes(), team.as_bytes()).unwrap_err();
            match err {
                EngineError::Validation(e) => {
                    assert_eq!(e.row(), Some(1));
                    assert_eq!(e.field(), "Set");
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_set_beyond_rules_is_refused() {
        let team = "\
Set,Point,Rotation,Point_Type,Point Won,Our_Score,Opponent_Score,Rally_Length
4,1,1,serving,yes,25,0,1
";
        let rules = MatchRules { sets_to_win: 2, ..MatchRules::default() };
        let config = MatchConfig::default().with_rules(rules);
        assert!(matches!(imported(team).resume_state(&config), Err(EngineError::InvalidArgument(_))));
    }

    #[test]
    fn test_unparseable_cell_uses_data_row() {
        let team = "\
Set,Point,Rotation,Point_Type,Point Won,Our_Score,Opponent_Score,Rally_Length
one,1,1,serving,yes,1,0,1
";
        let err = ImportedMatch::from_csv_readers(INDIVIDUAL.as_bytes(), team.as_bytes()).unwrap_err();
        match err {
            EngineError::Validation(e) => assert_eq!(e.row(), Some(1)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_interleaved_sets_count_once() {
        let team = "\
Set,Point,Rotation,Point_Type,Point Won,Our_Score,Opponent_Score,Rally_Length
1,1,1,serving,yes,24,0,1
2,1,1,serving,yes,1,0,1
1,25,1,serving,yes,25,0,1
";
        let m = imported(team);
        assert_eq!(m.sets_won(&MatchConfig::default()), (1, 0));
    }

    #[test]
    fn test_empty_team_table() {
        let team = "Set,Point,Rotation,Point_Type,Point Won,Our_Score,Opponent_Score,Rally_Length\n";
        assert!(matches!(
            imported(team).resume_state(&MatchConfig::default()),
            Err(EngineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_parse_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 2);
        assert_eq!(
            parse_file_name(Path::new("2024-03-02_North_Shore_event_tracker.xlsx")),
            (Some("North Shore".to_string()), date)
        );
        assert_eq!(
            parse_file_name(Path::new("/tmp/Eagles_2024-03-02_live_team.csv")),
            (Some("Eagles".to_string()), date)
        );
        assert_eq!(parse_file_name(Path::new("notes.csv")), (None, None));
    }
}
