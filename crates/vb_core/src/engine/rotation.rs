//! Rotation Tracker
//!
//! Owns the rotation number and serve/receive phase of our team.
//! - Side-out (won while receiving): rotation moves forward, we serve next
//! - Won while serving: rotation unchanged, keep serving
//! - Lost: rotation unchanged, receive next

use serde::{Deserialize, Serialize};

use crate::config::MatchConfig;
use crate::models::{PointOutcome, Rotation, RotationState, ServingPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationTracker {
    state: RotationState,
}

impl RotationTracker {
    pub fn new(state: RotationState) -> Self {
        Self { state }
    }

    /// Initial state for a set: configured setter rotation, configured
    /// serve/receive phase.
    pub fn for_set(config: &MatchConfig, set_index: u8) -> Self {
        Self::new(config.opening_state(set_index))
    }

    pub fn state(&self) -> RotationState {
        self.state
    }

    pub fn rotation(&self) -> Rotation {
        self.state.rotation
    }

    pub fn phase(&self) -> ServingPhase {
        self.state.phase
    }

    /// Apply the result of a finished rally played in `rally_phase`.
    ///
    /// Returns the new state.
    pub fn advance(&mut self, outcome: PointOutcome, rally_phase: ServingPhase) -> RotationState {
        let rotation = match (outcome, rally_phase) {
            (PointOutcome::WeWon, ServingPhase::Receiving) => self.state.rotation.next(),
            (PointOutcome::WeWon, ServingPhase::Serving) => self.state.rotation,
            (PointOutcome::WeLost, _) => self.state.rotation,
        };
        self.state = RotationState::new(rotation, outcome.next_phase());
        self.state
    }

    /// Rewind to a previously captured snapshot (undo).
    pub(crate) fn restore(&mut self, state: RotationState) {
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServeStart;
    use proptest::prelude::*;

    fn tracker(rotation: u8, phase: ServingPhase) -> RotationTracker {
        RotationTracker::new(RotationState::new(Rotation::new(rotation).unwrap(), phase))
    }

    #[test]
    fn test_side_out_advances() {
        let mut t = tracker(1, ServingPhase::Receiving);
        let state = t.advance(PointOutcome::WeWon, ServingPhase::Receiving);
        assert_eq!(state.rotation.get(), 2);
        assert_eq!(state.phase, ServingPhase::Serving);
    }

    #[test]
    fn test_win_while_serving_holds() {
        let mut t = tracker(3, ServingPhase::Serving);
        let state = t.advance(PointOutcome::WeWon, ServingPhase::Serving);
        assert_eq!(state, RotationState::new(Rotation::new(3).unwrap(), ServingPhase::Serving));
    }

    #[test]
    fn test_loss_switches_to_receiving() {
        let mut t = tracker(6, ServingPhase::Serving);
        let state = t.advance(PointOutcome::WeLost, ServingPhase::Serving);
        assert_eq!(state, RotationState::new(Rotation::new(6).unwrap(), ServingPhase::Receiving));
    }

    #[test]
    fn test_six_wraps_to_one() {
        let mut t = tracker(6, ServingPhase::Receiving);
        assert_eq!(t.advance(PointOutcome::WeWon, ServingPhase::Receiving).rotation, Rotation::FIRST);
    }

    #[test]
    fn test_for_set_uses_config() {
        let config = MatchConfig::new(Rotation::new(4).unwrap(), ServeStart::WeReceive);
        let t = RotationTracker::for_set(&config, 1);
        assert_eq!(t.rotation().get(), 4);
        assert_eq!(t.phase(), ServingPhase::Receiving);
    }

    proptest! {
        #[test]
        fn prop_six_side_outs_return_home(start in 1u8..=6) {
            let mut t = tracker(start, ServingPhase::Receiving);
            let mut visited = vec![t.rotation().get()];
            for _ in 0..6 {
                // lose the serve back so the next win is another side-out
                t.advance(PointOutcome::WeWon, ServingPhase::Receiving);
                visited.push(t.rotation().get());
                t.advance(PointOutcome::WeLost, ServingPhase::Serving);
            }
            let expected: Vec<u8> = (0..=6).map(|i| (start - 1 + i) % 6 + 1).collect();
            prop_assert_eq!(visited, expected);
            prop_assert_eq!(t.rotation().get(), start);
        }

        #[test]
        fn prop_non_side_outs_never_rotate(
            start in 1u8..=6,
            events in proptest::collection::vec(any::<bool>(), 0..40),
        ) {
            // true = win while serving, false = loss in either phase
            let mut t = tracker(start, ServingPhase::Serving);
            for win_while_serving in events {
                if win_while_serving {
                    t.advance(PointOutcome::WeWon, ServingPhase::Serving);
                } else {
                    let phase = t.phase();
                    t.advance(PointOutcome::WeLost, phase);
                }
                prop_assert_eq!(t.rotation().get(), start);
            }
        }
    }
}
