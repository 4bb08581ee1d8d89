//! Match configuration and rule constants.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::models::{Rotation, RotationState, ServingPhase};

/// Who serves the first point of the match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServeStart {
    #[default]
    WeServe,
    WeReceive,
}

impl ServeStart {
    pub fn phase(self) -> ServingPhase {
        match self {
            ServeStart::WeServe => ServingPhase::Serving,
            ServeStart::WeReceive => ServingPhase::Receiving,
        }
    }

    pub fn from_phase(phase: ServingPhase) -> Self {
        match phase {
            ServingPhase::Serving => ServeStart::WeServe,
            ServingPhase::Receiving => ServeStart::WeReceive,
        }
    }
}

/// What happens when a rally is closed without a kill, ace or error.
///
/// Counting such rallies as lost is a product decision rather than a rule of
/// the game, hence a setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedRallyPolicy {
    #[default]
    CountAsLoss,
    Reject,
}

/// Scoring rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRules {
    #[serde(default = "MatchRules::default_points_to_win_set")]
    pub points_to_win_set: u32,
    #[serde(default = "MatchRules::default_win_margin")]
    pub win_margin: u32,
    #[serde(default = "MatchRules::default_sets_to_win")]
    pub sets_to_win: u8,
    /// Target for the last possible set; `None` uses `points_to_win_set`.
    #[serde(default)]
    pub deciding_set_points: Option<u32>,
}

impl MatchRules {
    pub const SET_WIN_SCORE: u32 = 25;
    pub const SET_WIN_MARGIN: u32 = 2;
    pub const MATCH_WIN_SETS: u8 = 3;
    pub const MAX_SETS_TO_WIN: u8 = 3;
    /// Most sets any valid rule set can play.
    pub const MAX_SETS: u8 = Self::MAX_SETS_TO_WIN * 2 - 1;

    fn default_points_to_win_set() -> u32 {
        Self::SET_WIN_SCORE
    }

    fn default_win_margin() -> u32 {
        Self::SET_WIN_MARGIN
    }

    fn default_sets_to_win() -> u8 {
        Self::MATCH_WIN_SETS
    }

    /// Best-of-five by default.
    pub fn max_sets(&self) -> u8 {
        self.sets_to_win * 2 - 1
    }

    pub fn points_for_set(&self, set_index: u8) -> u32 {
        if set_index == self.max_sets() {
            self.deciding_set_points.unwrap_or(self.points_to_win_set)
        } else {
            self.points_to_win_set
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.points_to_win_set == 0 {
            return Err(EngineError::invalid_argument("points_to_win_set must be positive"));
        }
        if self.win_margin == 0 {
            return Err(EngineError::invalid_argument("win_margin must be at least 1"));
        }
        if self.sets_to_win == 0 || self.sets_to_win > Self::MAX_SETS_TO_WIN {
            return Err(EngineError::invalid_argument(format!(
                "sets_to_win must be 1-{}, got {}",
                Self::MAX_SETS_TO_WIN,
                self.sets_to_win
            )));
        }
        if self.deciding_set_points == Some(0) {
            return Err(EngineError::invalid_argument("deciding_set_points must be positive"));
        }
        Ok(())
    }
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            points_to_win_set: Self::SET_WIN_SCORE,
            win_margin: Self::SET_WIN_MARGIN,
            sets_to_win: Self::MATCH_WIN_SETS,
            deciding_set_points: None,
        }
    }
}

/// Configuration for one tracked match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Rotation (setter's starting slot) at the start of every set.
    #[serde(default)]
    pub setter_start_rotation: Rotation,
    #[serde(default)]
    pub serve_start: ServeStart,
    #[serde(default)]
    pub rules: MatchRules,
    /// Even-numbered sets start with the opposite of `serve_start`.
    #[serde(default)]
    pub alternate_serve_each_set: bool,
    #[serde(default)]
    pub unresolved_rally_policy: UnresolvedRallyPolicy,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self::new(Rotation::FIRST, ServeStart::WeServe)
    }
}

impl MatchConfig {
    pub fn new(setter_start_rotation: Rotation, serve_start: ServeStart) -> Self {
        Self {
            setter_start_rotation,
            serve_start,
            rules: MatchRules::default(),
            alternate_serve_each_set: false,
            unresolved_rally_policy: UnresolvedRallyPolicy::default(),
        }
    }

    /// Checked constructor from raw values.
    pub fn from_raw(setter_start_rotation: u8, serve_start: ServeStart) -> Result<Self> {
        Ok(Self::new(Rotation::new(setter_start_rotation)?, serve_start))
    }

    pub fn with_rules(mut self, rules: MatchRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_serve_alternation(mut self, enabled: bool) -> Self {
        self.alternate_serve_each_set = enabled;
        self
    }

    pub fn with_unresolved_rally_policy(mut self, policy: UnresolvedRallyPolicy) -> Self {
        self.unresolved_rally_policy = policy;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.rules.validate()
    }

    /// Serve/receive phase for the first rally of a set.
    pub fn opening_phase(&self, set_index: u8) -> ServingPhase {
        let phase = self.serve_start.phase();
        if self.alternate_serve_each_set && set_index % 2 == 0 {
            phase.opposite()
        } else {
            phase
        }
    }

    /// Rotational state at the start of a set.
    pub fn opening_state(&self, set_index: u8) -> RotationState {
        RotationState::new(self.setter_start_rotation, self.opening_phase(set_index))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: MatchConfig = serde_json::from_str(json)
            .map_err(|e| EngineError::invalid_argument(format!("match config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}
