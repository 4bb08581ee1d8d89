//! Undo of the last recorded action.
//!
//! Extracted from the controller; same invariants apply:
//! - an action still in the open rally is simply dropped
//! - otherwise the last sealed rally is reopened and everything its seal
//!   changed (score, rotation, set and match seals, the set it opened) is
//!   rolled back
//! - a manual correction is a barrier: it is never rolled back implicitly

use tracing::warn;

use super::controller::MatchController;
use super::score::ScoreKeeper;
use crate::error::{EngineError, Result};
use crate::models::{Action, Winner};

impl MatchController {
    /// Remove the last recorded action.
    ///
    /// Returns the removed action, or `None` when the undone rally had been
    /// closed without a terminal action (its actions stay in the reopened
    /// rally).
    pub fn undo_last_action(&mut self) -> Result<Option<Action>> {
        if !self.record.is_complete() {
            if let Some(action) = self.open_rally.actions.pop() {
                warn!(
                    "Undo: dropped {} {} from rally {}",
                    action.action_type(),
                    action.kind().outcome_name(),
                    self.open_rally.point
                );
                return Ok(Some(action));
            }
        }

        let (set_pos, drop_empty_set) = self.undo_target()?;

        // everything below is infallible
        if drop_empty_set {
            self.record.sets.pop();
        }
        if self.record.winner.is_decided() {
            self.record.winner = Winner::Undecided;
        }
        let rules = self.record.config.rules.clone();
        match self.record.sets[set_pos].winner {
            Winner::Us => self.record.sets_won_by_us = self.record.sets_won_by_us.saturating_sub(1),
            Winner::Opponent => {
                self.record.sets_won_by_opponent = self.record.sets_won_by_opponent.saturating_sub(1)
            }
            Winner::Undecided => {}
        }
        let set = &mut self.record.sets[set_pos];
        set.winner = Winner::Undecided;

        let Some(mut rally) = set.rallies.pop() else {
            return Err(EngineError::invalid_state("nothing to undo"));
        };
        set.rotation_history.pop();
        let score_before = rally.score_before.unwrap_or_default();
        set.final_score = score_before;
        let set_index = set.index;

        self.scores = ScoreKeeper::for_set(&rules, set_index);
        self.scores.restore(score_before);
        self.tracker.restore(rally.rotation);

        rally.outcome = None;
        rally.score_before = None;
        rally.score_after = None;
        let removed = if rally.closed_without_terminal {
            rally.closed_without_terminal = false;
            None
        } else {
            rally.actions.pop()
        };
        warn!("Undo: reopened set {} rally {} at {}", set_index, rally.point, score_before);
        self.open_rally = rally;
        Ok(removed)
    }

    /// Locate the set holding the rally to reopen, checking nothing blocks
    /// the undo. Returns its position in `sets` and whether the empty set
    /// after it has to go.
    fn undo_target(&self) -> Result<(usize, bool)> {
        let sets = &self.record.sets;
        let Some(last) = sets.len().checked_sub(1) else {
            return Err(EngineError::invalid_state("nothing to undo"));
        };
        let current = &sets[last];

        let (set_pos, drop_empty_set) = if !current.rallies.is_empty() || current.is_sealed() {
            (last, false)
        } else if last > 0 {
            if !current.corrections.is_empty() {
                return Err(EngineError::invalid_state(format!(
                    "set {} has a manual correction",
                    current.index
                )));
            }
            (last - 1, true)
        } else {
            return Err(EngineError::invalid_state("nothing to undo"));
        };

        let set = &sets[set_pos];
        if set.rallies.is_empty() {
            return Err(EngineError::invalid_state(format!("set {} has no rallies to undo", set.index)));
        }
        if set.corrected_since_last_rally() {
            return Err(EngineError::invalid_state(format!(
                "score of set {} was corrected after the last rally",
                set.index
            )));
        }
        Ok((set_pos, drop_empty_set))
    }
}

#[cfg(test)]
mod tests {
    use crate::config::{MatchConfig, ServeStart};
    use crate::engine::MatchController;
    use crate::error::EngineError;
    use crate::models::{
        Action, ActionKind, Role, Rotation, ServeOutcome, ServingPhase, SetScore, Winner,
    };

    fn ace() -> Action {
        Action::by(Role::Opposite, ActionKind::Serve(ServeOutcome::Ace)).unwrap()
    }

    fn good_serve() -> Action {
        Action::by(Role::Opposite, ActionKind::Serve(ServeOutcome::Good)).unwrap()
    }

    fn controller() -> MatchController {
        MatchController::new(MatchConfig::new(Rotation::FIRST, ServeStart::WeReceive)).unwrap()
    }

    #[test]
    fn test_nothing_to_undo() {
        let mut c = controller();
        assert!(matches!(c.undo_last_action(), Err(EngineError::InvalidState(_))));
    }

    #[test]
    fn test_undo_in_open_rally() {
        let mut c = controller();
        c.record_action(good_serve()).unwrap();
        assert_eq!(c.undo_last_action().unwrap(), Some(good_serve()));
        assert!(c.open_rally().is_empty());
    }

    #[test]
    fn test_undo_reverts_side_out() {
        let mut c = controller();
        let before = c.current_snapshot();
        c.record_opponent_error(crate::models::OpponentErrorKind::ServeError).unwrap();
        assert_eq!(c.current_snapshot().rotation.get(), 2);

        let removed = c.undo_last_action().unwrap().unwrap();
        assert!(removed.is_synthetic());
        assert_eq!(c.current_snapshot(), before);
        assert_eq!(c.match_record().total_rallies(), 0);
    }

    #[test]
    fn test_undo_keeps_earlier_rally_actions() {
        let mut c = controller();
        c.record_action(good_serve()).unwrap();
        c.record_action(ace()).unwrap();
        c.undo_last_action().unwrap();
        let snap = c.current_snapshot();
        assert_eq!(snap.rally_actions, vec![good_serve()]);
        assert_eq!(snap.score, SetScore::default());
        assert_eq!(snap.serving_phase, ServingPhase::Receiving);
    }

    #[test]
    fn test_undo_reopens_finished_set() {
        let mut c = controller();
        for _ in 0..25 {
            c.record_action(ace()).unwrap();
        }
        assert_eq!(c.current_snapshot().set_index, 2);

        c.undo_last_action().unwrap();
        let snap = c.current_snapshot();
        assert_eq!(snap.set_index, 1);
        assert_eq!(snap.score, SetScore::new(24, 0));
        assert_eq!(snap.sets_won_by_us, 0);
        assert_eq!(c.match_record().sets.len(), 1);
        assert_eq!(c.match_record().sets[0].winner, Winner::Undecided);
    }

    #[test]
    fn test_undo_reopens_won_match() {
        let mut c = controller();
        for _ in 0..75 {
            c.record_action(ace()).unwrap();
        }
        assert_eq!(c.current_snapshot().match_winner, Winner::Us);
        assert!(c.record_action(ace()).is_err());

        assert_eq!(c.undo_last_action().unwrap(), Some(ace()));
        let snap = c.current_snapshot();
        assert_eq!(snap.match_winner, Winner::Undecided);
        assert_eq!(snap.sets_won_by_us, 2);
        assert_eq!(snap.set_index, 3);
        assert_eq!(snap.score, SetScore::new(24, 0));
        assert_eq!(c.match_record().sets.len(), 3);
        assert_eq!(c.match_record().sets[2].winner, Winner::Undecided);

        let result = c.record_action(ace()).unwrap().into_result().unwrap();
        assert_eq!(result.match_winner, Winner::Us);
        assert_eq!(c.current_snapshot().sets_won_by_us, 3);
    }

    #[test]
    fn test_undo_drops_chosen_next_set_rotation() {
        let mut c = controller();
        for _ in 0..25 {
            c.record_action(ace()).unwrap();
        }
        c.set_next_set_rotation(Rotation::new(5).unwrap()).unwrap();
        c.undo_last_action().unwrap();
        assert_eq!(c.current_snapshot().set_index, 1);

        c.record_action(ace()).unwrap();
        let snap = c.current_snapshot();
        assert_eq!(snap.set_index, 2);
        assert_eq!(snap.rotation, Rotation::FIRST);
    }

    #[test]
    fn test_correction_blocks_undo() {
        let mut c = controller();
        c.record_action(ace()).unwrap();
        c.correct_score(2, 0).unwrap();
        assert!(matches!(c.undo_last_action(), Err(EngineError::InvalidState(_))));
        assert_eq!(c.current_snapshot().score, SetScore::new(2, 0));
    }
}
