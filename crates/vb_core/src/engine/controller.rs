//! Match Controller
//!
//! Owns one tracked match and coordinates the rotation tracker, the resolver
//! and the score keeper rally by rally.
//!
//! ## Rally flow
//! 1. `record_action` appends to the open rally
//! 2. A terminal action seals it: point applied, rotation advanced with the
//!    phase the rally was played in
//! 3. A decided set is sealed, then either the match or a new set starts
//!
//! Every operation checks its preconditions first and only then mutates, so a
//! rejected call leaves the match exactly as it was.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::libero::LineupAssignment;
use super::resolver::{self, Resolution};
use super::rotation::RotationTracker;
use super::score::ScoreKeeper;
use super::snapshot::{MatchSnapshot, RallyResult, RallyStatus};
use crate::config::{MatchConfig, UnresolvedRallyPolicy};
use crate::error::{EngineError, Result};
use crate::models::{
    Action, Match, OpponentErrorKind, PointOutcome, Rally, Rotation, RotationState, ScoreCorrection,
    SetRecord, SetScore, Winner,
};

/// Where to pick a match up again (see `import::ImportedMatch::resume_state`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeState {
    pub set_index: u8,
    pub score: SetScore,
    /// Point number of the next rally.
    pub next_point: u32,
    /// State the next rally is played in.
    pub state: RotationState,
    pub sets_won_by_us: u8,
    pub sets_won_by_opponent: u8,
}

#[derive(Debug, Clone)]
pub struct MatchController {
    pub(super) record: Match,
    pub(super) tracker: RotationTracker,
    pub(super) scores: ScoreKeeper,
    /// Rally being recorded. Never sealed while stored here.
    pub(super) open_rally: Rally,
}

impl MatchController {
    /// Start tracking a new match at set 1, 0-0.
    pub fn new(config: MatchConfig) -> Result<Self> {
        config.validate()?;
        let tracker = RotationTracker::for_set(&config, 1);
        let scores = ScoreKeeper::for_set(&config.rules, 1);
        let state = tracker.state();
        info!(
            "Tracking new match: setter rotation {}, {:?}",
            config.setter_start_rotation, config.serve_start
        );
        Ok(Self {
            record: Match {
                config,
                sets: vec![SetRecord::new(1, state)],
                sets_won_by_us: 0,
                sets_won_by_opponent: 0,
                winner: Winner::Undecided,
            },
            tracker,
            scores,
            open_rally: Rally::open(1, state),
        })
    }

    /// Continue a match tracked elsewhere (e.g. an imported live file).
    pub fn resume(config: MatchConfig, resume: &ResumeState) -> Result<Self> {
        config.validate()?;
        let rules = &config.rules;
        if resume.set_index == 0 || resume.set_index > rules.max_sets() {
            return Err(EngineError::invalid_argument(format!(
                "set {} outside 1-{}",
                resume.set_index,
                rules.max_sets()
            )));
        }
        if resume.sets_won_by_us >= rules.sets_to_win || resume.sets_won_by_opponent >= rules.sets_to_win {
            return Err(EngineError::invalid_argument("resume state describes a finished match"));
        }
        if u32::from(resume.sets_won_by_us) + u32::from(resume.sets_won_by_opponent)
            != u32::from(resume.set_index) - 1
        {
            return Err(EngineError::invalid_argument(format!(
                "set {} cannot follow {}-{} in sets",
                resume.set_index, resume.sets_won_by_us, resume.sets_won_by_opponent
            )));
        }
        if resume.next_point == 0 {
            return Err(EngineError::invalid_argument("next_point must be at least 1"));
        }

        let mut scores = ScoreKeeper::for_set(rules, resume.set_index);
        scores.restore(resume.score);
        if scores.winner().is_decided() {
            return Err(EngineError::invalid_argument(format!(
                "score {} already decides set {}",
                resume.score, resume.set_index
            )));
        }

        let mut set = SetRecord::new(resume.set_index, resume.state);
        set.starting_point = resume.next_point;
        set.final_score = resume.score;
        info!(
            "Resuming set {} at {} (rotation {}, {})",
            resume.set_index, resume.score, resume.state.rotation, resume.state.phase
        );
        Ok(Self {
            record: Match {
                config,
                sets: vec![set],
                sets_won_by_us: resume.sets_won_by_us,
                sets_won_by_opponent: resume.sets_won_by_opponent,
                winner: Winner::Undecided,
            },
            tracker: RotationTracker::new(resume.state),
            scores,
            open_rally: Rally::open(resume.next_point, resume.state),
        })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.record.config
    }

    /// Full structured log: sets, rallies, rotation history, corrections.
    pub fn match_record(&self) -> &Match {
        &self.record
    }

    pub fn open_rally(&self) -> &Rally {
        &self.open_rally
    }

    pub fn is_complete(&self) -> bool {
        self.record.is_complete()
    }

    pub fn current_snapshot(&self) -> MatchSnapshot {
        let state = self.tracker.state();
        MatchSnapshot {
            lineup: LineupAssignment::compute(state),
            rotation: state.rotation,
            serving_phase: state.phase,
            score: self.scores.score(),
            set_index: self.current_set_index(),
            point: self.open_rally.point,
            sets_won_by_us: self.record.sets_won_by_us,
            sets_won_by_opponent: self.record.sets_won_by_opponent,
            match_winner: self.record.winner,
            rally_actions: self.open_rally.actions.clone(),
        }
    }

    /// Append an action to the open rally; a terminal action seals it.
    pub fn record_action(&mut self, action: Action) -> Result<RallyStatus> {
        self.ensure_in_play()?;
        debug!(
            "Set {} point {}: {} {} {}",
            self.current_set_index(),
            self.open_rally.point,
            action.actor(),
            action.action_type(),
            action.kind().outcome_name()
        );
        match resolver::append(&mut self.open_rally, action)? {
            Resolution::Continue => Ok(RallyStatus::InProgress),
            Resolution::Terminal(outcome) => Ok(RallyStatus::Sealed(self.seal_rally(outcome, false))),
        }
    }

    pub fn record_opponent_error(&mut self, kind: OpponentErrorKind) -> Result<RallyStatus> {
        self.record_action(Action::opponent_error(kind))
    }

    pub fn record_team_error(&mut self) -> Result<RallyStatus> {
        self.record_action(Action::team_error())
    }

    /// End the open rally although no terminal action was recorded.
    ///
    /// Governed by `MatchConfig::unresolved_rally_policy`.
    pub fn close_rally(&mut self) -> Result<RallyResult> {
        self.ensure_in_play()?;
        if self.open_rally.is_empty() {
            return Err(EngineError::invalid_state("no rally in progress"));
        }
        match self.record.config.unresolved_rally_policy {
            UnresolvedRallyPolicy::Reject => Err(EngineError::invalid_state(format!(
                "rally {} has no terminal action",
                self.open_rally.point
            ))),
            UnresolvedRallyPolicy::CountAsLoss => {
                warn!(
                    "Closing rally {} without a terminal action, counted as lost",
                    self.open_rally.point
                );
                Ok(self.seal_rally(PointOutcome::WeLost, true))
            }
        }
    }

    /// Manual score override between rallies.
    ///
    /// Recorded as a `ScoreCorrection`. May decide (and seal) the set.
    pub fn correct_score(&mut self, ours: u32, opponents: u32) -> Result<ScoreCorrection> {
        self.ensure_in_play()?;
        if !self.open_rally.is_empty() {
            return Err(EngineError::invalid_state("cannot correct the score during a rally"));
        }
        let from = self.scores.correct(ours, opponents);
        let to = self.scores.score();
        let set = self.current_set_mut();
        let correction = ScoreCorrection { set_index: set.index, after_rally: set.rallies.len(), from, to };
        set.final_score = to;
        set.corrections.push(correction);
        warn!("Set {} score corrected from {} to {}", correction.set_index, from, to);
        self.settle_set();
        Ok(correction)
    }

    /// Pick the setter rotation for a set that has just opened.
    ///
    /// Set 1 always starts from `MatchConfig::setter_start_rotation`. Later
    /// sets may start elsewhere, as long as nothing has been recorded in them
    /// yet. The serving phase the set opened with is kept. Undoing back into
    /// the previous set discards the choice.
    pub fn set_next_set_rotation(&mut self, rotation: Rotation) -> Result<()> {
        self.ensure_in_play()?;
        let set = self
            .record
            .sets
            .last()
            .ok_or_else(|| EngineError::invalid_state("no set in progress"))?;
        if set.index == 1 {
            return Err(EngineError::invalid_state("set 1 starts from the configured rotation"));
        }
        if set.next_point() != 1 || !set.corrections.is_empty() || !self.open_rally.is_empty() {
            return Err(EngineError::invalid_state(format!("set {} is already under way", set.index)));
        }

        let state = RotationState::new(rotation, set.starting_rotation.phase);
        let set = self.current_set_mut();
        set.starting_rotation = state;
        let set_index = set.index;
        self.tracker.restore(state);
        self.open_rally.rotation = state;
        info!("Set {} will start in rotation {}, {}", set_index, state.rotation, state.phase);
        Ok(())
    }

    fn ensure_in_play(&self) -> Result<()> {
        if self.record.is_complete() {
            return Err(EngineError::invalid_state(format!(
                "match already won by {:?}",
                self.record.winner
            )));
        }
        Ok(())
    }

    pub(super) fn current_set_index(&self) -> u8 {
        self.record.sets.last().map(|s| s.index).unwrap_or(1)
    }

    pub(super) fn current_set_mut(&mut self) -> &mut SetRecord {
        if self.record.sets.is_empty() {
            self.record.sets.push(SetRecord::new(1, self.tracker.state()));
        }
        let last = self.record.sets.len() - 1;
        &mut self.record.sets[last]
    }

    /// Apply the outcome of the open rally. Infallible: callers have
    /// validated everything beforehand.
    fn seal_rally(&mut self, outcome: PointOutcome, unresolved: bool) -> RallyResult {
        let played_in = self.open_rally.rotation;
        let score_before = self.scores.score();
        let score = self.scores.apply_point(outcome);
        let rotation_after = self.tracker.advance(outcome, played_in.phase);

        let point = self.open_rally.point;
        let mut rally = std::mem::replace(&mut self.open_rally, Rally::open(point + 1, rotation_after));
        rally.outcome = Some(outcome);
        rally.score_before = Some(score_before);
        rally.score_after = Some(score);
        rally.closed_without_terminal = unresolved;
        let rally_length = rally.len();

        let set = self.current_set_mut();
        let set_index = set.index;
        set.rotation_history.push(played_in);
        set.rallies.push(rally);
        set.final_score = score;
        debug!(
            "Set {} point {} {:?}: {} (rotation {} {} -> {} {})",
            set_index,
            point,
            outcome,
            score,
            played_in.rotation,
            played_in.phase,
            rotation_after.rotation,
            rotation_after.phase
        );

        let (set_winner, match_winner) = self.settle_set();
        RallyResult {
            set_index,
            point,
            outcome,
            rotation: played_in,
            next_state: self.tracker.state(),
            score,
            rally_length,
            unresolved,
            set_winner,
            match_winner,
        }
    }

    /// Seal the current set if its score is decided, then either seal the
    /// match or open the next set. Returns (set winner, match winner).
    fn settle_set(&mut self) -> (Winner, Winner) {
        let set_winner = self.scores.winner();
        if !set_winner.is_decided() {
            return (Winner::Undecided, Winner::Undecided);
        }
        let score = self.scores.score();
        let set = self.current_set_mut();
        set.winner = set_winner;
        set.final_score = score;
        let set_index = set.index;
        match set_winner {
            Winner::Us => self.record.sets_won_by_us += 1,
            Winner::Opponent => self.record.sets_won_by_opponent += 1,
            Winner::Undecided => {}
        }
        info!(
            "Set {} won by {:?} {} (sets {}-{})",
            set_index, set_winner, score, self.record.sets_won_by_us, self.record.sets_won_by_opponent
        );

        let sets_to_win = self.record.config.rules.sets_to_win;
        let match_winner = if self.record.sets_won_by_us >= sets_to_win {
            Winner::Us
        } else if self.record.sets_won_by_opponent >= sets_to_win {
            Winner::Opponent
        } else {
            Winner::Undecided
        };

        if match_winner.is_decided() {
            self.record.winner = match_winner;
            info!(
                "Match won by {:?} {}-{}",
                match_winner, self.record.sets_won_by_us, self.record.sets_won_by_opponent
            );
        } else {
            self.start_set(set_index + 1);
        }
        (set_winner, match_winner)
    }

    fn start_set(&mut self, index: u8) {
        self.tracker = RotationTracker::for_set(&self.record.config, index);
        self.scores = ScoreKeeper::for_set(&self.record.config.rules, index);
        let state = self.tracker.state();
        self.record.sets.push(SetRecord::new(index, state));
        self.open_rally = Rally::open(1, state);
        info!("Set {} started: rotation {}, {}", index, state.rotation, state.phase);
    }
}
