//! Libero substitution policy and the derived lineup projection.

use serde::{Deserialize, Serialize};

use super::position_table::role_at;
use crate::models::{CourtPosition, Role, Rotation, RotationState, ServingPhase};

/// True iff the libero stands in for the middle blocker at `position`:
/// a middle blocker, in the back row, while we receive.
pub fn libero_active(rotation: Rotation, position: CourtPosition, phase: ServingPhase) -> bool {
    phase.is_receiving() && position.is_back_row() && role_at(rotation, position).is_middle()
}

/// One court slot as shown to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineupSlot {
    pub position: CourtPosition,
    /// Role from the rotation chart.
    pub assigned: Role,
    /// Role actually on court (`Libero` when substituted).
    pub effective: Role,
}

impl LineupSlot {
    pub fn libero_in(&self) -> bool {
        self.effective == Role::Libero
    }
}

/// Court position → role for a rotational state.
///
/// Derived on demand from the rotation chart and the libero policy, never
/// stored, so it cannot drift from the rotation tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineupAssignment {
    pub slots: [LineupSlot; 6],
}

impl LineupAssignment {
    pub fn compute(state: RotationState) -> Self {
        let slots = CourtPosition::ALL.map(|position| {
            let assigned = role_at(state.rotation, position);
            let effective = if libero_active(state.rotation, position, state.phase) {
                Role::Libero
            } else {
                assigned
            };
            LineupSlot { position, assigned, effective }
        });
        Self { slots }
    }

    pub fn role_at(&self, position: CourtPosition) -> Role {
        self.slots[position.index()].effective
    }

    pub fn slot(&self, position: CourtPosition) -> &LineupSlot {
        &self.slots[position.index()]
    }

    /// Middle blocker currently replaced by the libero, if any.
    pub fn replaced_by_libero(&self) -> Option<Role> {
        self.slots.iter().find(|s| s.libero_in()).map(|s| s.assigned)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LineupSlot> {
        self.slots.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_never_active_while_serving() {
        for rotation in Rotation::ALL {
            for position in CourtPosition::ALL {
                assert!(!libero_active(rotation, position, ServingPhase::Serving));
            }
        }
    }

    #[test]
    fn test_rotation_one_receiving() {
        // MB2 sits in 6 (back row), MB1 in 3 (front row)
        let lineup = LineupAssignment::compute(RotationState::new(Rotation::FIRST, ServingPhase::Receiving));
        assert_eq!(lineup.role_at(CourtPosition::new(6).unwrap()), Role::Libero);
        assert_eq!(lineup.role_at(CourtPosition::new(3).unwrap()), Role::Middle1);
        assert_eq!(lineup.replaced_by_libero(), Some(Role::Middle2));
    }

    #[test]
    fn test_exactly_one_libero_when_receiving() {
        // the two middles are always three slots apart: one front, one back
        for rotation in Rotation::ALL {
            let lineup = LineupAssignment::compute(RotationState::new(rotation, ServingPhase::Receiving));
            assert_eq!(lineup.iter().filter(|s| s.libero_in()).count(), 1);
        }
    }

    #[test]
    fn test_substitution_leaves_chart_untouched() {
        for phase in ServingPhase::iter() {
            for rotation in Rotation::ALL {
                let lineup = LineupAssignment::compute(RotationState::new(rotation, phase));
                for slot in lineup.iter() {
                    assert_eq!(slot.assigned, role_at(rotation, slot.position));
                }
            }
        }
    }

    proptest! {
        #[test]
        fn prop_active_implies_back_row_middle(r in 1u8..=6, p in 1u8..=6) {
            let rotation = Rotation::new(r).unwrap();
            let position = CourtPosition::new(p).unwrap();
            if libero_active(rotation, position, ServingPhase::Receiving) {
                prop_assert!(role_at(rotation, position).is_middle());
                prop_assert!(matches!(p, 1 | 5 | 6));
            }
        }
    }
}
