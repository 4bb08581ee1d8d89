//! Match Replay Library
//!
//! Action CSV → engine → Individual/Team events CSV (+ optional JSON log)
//! Team events CSV → resume state

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use vb_core::export::write_match_json;
use vb_core::{
    export_file_stem, read_action_csv, ExportTables, ImportedMatch, MatchConfig, MatchController,
    MatchSnapshot, RallyStatus, ResumeState,
};

/// Outcome of one replay run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplaySummary {
    pub actions: usize,
    pub rallies_sealed: usize,
    /// Rallies closed by the unresolved-rally policy at the end of the stream.
    pub closed_open_rally: bool,
    pub snapshot: MatchSnapshot,
    pub individual_csv: PathBuf,
    pub team_csv: PathBuf,
    pub match_json: Option<PathBuf>,
}

/// Replay options beyond the input file.
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub out_dir: PathBuf,
    pub opponent: String,
    pub date: NaiveDate,
    pub write_json: bool,
    /// Close a trailing rally without terminal action per the configured policy.
    pub close_trailing_rally: bool,
}

/// Load a match configuration, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<MatchConfig> {
    let Some(path) = path else {
        return Ok(MatchConfig::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    MatchConfig::from_json(&json).with_context(|| format!("Invalid match config: {}", path.display()))
}

/// Replay an action CSV through a fresh match and export the tables.
pub fn replay_match(actions_csv: &Path, config: MatchConfig, options: &ReplayOptions) -> Result<ReplaySummary> {
    // 1. Read and validate the action stream
    let file = File::open(actions_csv)
        .with_context(|| format!("Failed to open action CSV: {}", actions_csv.display()))?;
    let actions = read_action_csv(file)
        .with_context(|| format!("Invalid action CSV: {}", actions_csv.display()))?;
    let action_count = actions.len();

    // 2. Run every action through the engine
    let mut tracker = MatchController::new(config)?;
    let mut rallies_sealed = 0;
    for (i, action) in actions.into_iter().enumerate() {
        let status = tracker
            .record_action(action)
            .with_context(|| format!("Action on row {} rejected", i + 1))?;
        if let RallyStatus::Sealed(result) = status {
            rallies_sealed += 1;
            tracing::debug!("Rally sealed: {:?}", result);
        }
    }

    // 3. Optionally close what is left open
    let mut closed_open_rally = false;
    if options.close_trailing_rally && !tracker.is_complete() && !tracker.open_rally().is_empty() {
        tracker.close_rally().context("Failed to close trailing rally")?;
        rallies_sealed += 1;
        closed_open_rally = true;
    }

    // 4. Export
    let stem = export_file_stem(&options.opponent, options.date);
    let tables = ExportTables::from_match(tracker.match_record());
    let (individual_csv, team_csv) = tables
        .write_csv(&options.out_dir, &stem)
        .with_context(|| format!("Failed to write tables to {}", options.out_dir.display()))?;

    let match_json = if options.write_json {
        let path = options.out_dir.join(format!("{}.json", stem));
        let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
        write_match_json(file, tracker.match_record())?;
        Some(path)
    } else {
        None
    };

    Ok(ReplaySummary {
        actions: action_count,
        rallies_sealed,
        closed_open_rally,
        snapshot: tracker.current_snapshot(),
        individual_csv,
        team_csv,
        match_json,
    })
}

/// Resume information derived from exported tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeReport {
    pub resume: ResumeState,
    pub config: MatchConfig,
    pub opponent: Option<String>,
    pub date: Option<NaiveDate>,
    pub estimated_rotations: bool,
}

/// Read a Team-events CSV (and optionally the Individual-events CSV) and
/// work out where tracking continues.
pub fn resume_from_tables(team_csv: &Path, individual_csv: Option<&Path>, base: &MatchConfig) -> Result<ResumeReport> {
    let team = File::open(team_csv)
        .with_context(|| format!("Failed to open team CSV: {}", team_csv.display()))?;
    let imported = match individual_csv {
        Some(path) => {
            let individual = File::open(path)
                .with_context(|| format!("Failed to open individual CSV: {}", path.display()))?;
            ImportedMatch::from_csv_readers(individual, team)
        }
        None => ImportedMatch::from_csv_readers(std::io::empty(), team),
    }
    .with_context(|| format!("Invalid tables: {}", team_csv.display()))?;

    let config = imported.inferred_config(base);
    let resume = imported.resume_state(&config)?;
    // fail here rather than when tracking restarts
    MatchController::resume(config.clone(), &resume).context("Tables describe a state that cannot be resumed")?;

    let (opponent, date) = vb_core::import::parse_file_name(team_csv);
    Ok(ResumeReport {
        resume,
        config,
        opponent,
        date,
        estimated_rotations: imported.has_estimated_rotations(),
    })
}
