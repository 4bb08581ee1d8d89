//! Rotation chart: which role stands in which court position.
//!
//! Rotation 1 is the canonical chart below. Each later rotation is the
//! previous one shifted by one court position so that the setter's position
//! goes down by one (1, 6, 5, 4, 3, 2).

use crate::models::{CourtPosition, Role, Rotation};

/// Rotation 1, indexed by court position - 1.
const ROTATION_ONE: [Role; 6] = [
    Role::Setter,   // 1
    Role::Outside1, // 2
    Role::Middle1,  // 3
    Role::Opposite, // 4
    Role::Outside2, // 5
    Role::Middle2,  // 6
];

/// Role standing in `position` during `rotation`. Total over 6x6.
pub fn role_at(rotation: Rotation, position: CourtPosition) -> Role {
    ROTATION_ONE[(position.index() + rotation.index()) % 6]
}

/// Court position of `role` during `rotation`; `None` for the libero.
pub fn position_of(rotation: Rotation, role: Role) -> Option<CourtPosition> {
    let base = ROTATION_ONE.iter().position(|r| *r == role)?;
    Some(CourtPosition::from_index(base + 6 - rotation.index()))
}

pub fn setter_position(rotation: Rotation) -> CourtPosition {
    // the setter always holds a slot
    CourtPosition::from_index(6 - rotation.index())
}

/// Full chart for one rotation, position 1 first.
pub fn chart(rotation: Rotation) -> [Role; 6] {
    CourtPosition::ALL.map(|position| role_at(rotation, position))
}
