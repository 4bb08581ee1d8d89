//! Court vocabulary: roles, court positions, rotation numbers and the
//! serve/receive phase.
//!
//! Court positions, viewed from above on our side of the net:
//!
//! ```text
//!   4   3   2      front row
//!   5   6   1      back row (1 = server)
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EngineError, Result};

/// On-court role of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(test, derive(strum_macros::EnumIter))]
pub enum Role {
    Setter,
    Opposite,
    Middle1,
    Middle2,
    Outside1,
    Outside2,
    Libero,
}

impl Role {
    /// The six roles that hold a rotation slot (the libero only substitutes).
    pub const ROTATION_ROLES: [Role; 6] = [
        Role::Setter,
        Role::Opposite,
        Role::Middle1,
        Role::Middle2,
        Role::Outside1,
        Role::Outside2,
    ];

    /// Short code used in the tracker tables.
    pub fn code(&self) -> &'static str {
        match self {
            Role::Setter => "S",
            Role::Opposite => "OPP",
            Role::Middle1 => "MB1",
            Role::Middle2 => "MB2",
            Role::Outside1 => "OH1",
            Role::Outside2 => "OH2",
            Role::Libero => "L",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Role::Setter => "Setter",
            Role::Opposite => "Opposite",
            Role::Middle1 => "Middle Blocker 1",
            Role::Middle2 => "Middle Blocker 2",
            Role::Outside1 => "Outside 1",
            Role::Outside2 => "Outside 2",
            Role::Libero => "Libero",
        }
    }

    pub fn is_middle(&self) -> bool {
        matches!(self, Role::Middle1 | Role::Middle2)
    }

    /// Parse a position code, accepting the spellings seen in recorded sheets.
    pub fn from_code(code: &str) -> Option<Role> {
        let role = match code.trim().to_ascii_uppercase().as_str() {
            "S" | "SETTER" => Role::Setter,
            "OPP" | "OPPOSITE" => Role::Opposite,
            "MB1" | "MB" | "MIDDLE" => Role::Middle1,
            "MB2" => Role::Middle2,
            "OH1" | "OH" | "OUTSIDE" => Role::Outside1,
            "OH2" => Role::Outside2,
            "L" | "LIBERO" | "LIB" => Role::Libero,
            _ => return None,
        };
        Some(role)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Court position 1..=6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct CourtPosition(u8);

impl CourtPosition {
    pub const ALL: [CourtPosition; 6] = [
        CourtPosition(1),
        CourtPosition(2),
        CourtPosition(3),
        CourtPosition(4),
        CourtPosition(5),
        CourtPosition(6),
    ];

    pub fn new(position: u8) -> Result<Self> {
        if (1..=6).contains(&position) {
            Ok(CourtPosition(position))
        } else {
            Err(EngineError::invalid_argument(format!(
                "court position must be 1-6, got {}",
                position
            )))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based index for table lookups.
    pub(crate) fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    pub(crate) fn from_index(index: usize) -> Self {
        CourtPosition((index % 6) as u8 + 1)
    }

    /// Positions 1, 5 and 6.
    pub fn is_back_row(self) -> bool {
        matches!(self.0, 1 | 5 | 6)
    }

    pub fn is_front_row(self) -> bool {
        !self.is_back_row()
    }

    pub fn label(self) -> &'static str {
        match self.0 {
            1 => "Back Right",
            2 => "Front Right",
            3 => "Front Center",
            4 => "Front Left",
            5 => "Back Left",
            _ => "Back Center",
        }
    }
}

impl TryFrom<u8> for CourtPosition {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self> {
        CourtPosition::new(value)
    }
}

impl From<CourtPosition> for u8 {
    fn from(position: CourtPosition) -> u8 {
        position.0
    }
}

impl fmt::Display for CourtPosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rotation number 1..=6.
///
/// Rotation 1 has the setter in court position 1; every side-out moves the
/// rotation forward by one and the setter one position back (1, 6, 5, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rotation(u8);

impl Rotation {
    pub const FIRST: Rotation = Rotation(1);

    pub const ALL: [Rotation; 6] =
        [Rotation(1), Rotation(2), Rotation(3), Rotation(4), Rotation(5), Rotation(6)];

    pub fn new(rotation: u8) -> Result<Self> {
        if (1..=6).contains(&rotation) {
            Ok(Rotation(rotation))
        } else {
            Err(EngineError::invalid_argument(format!(
                "rotation must be 1-6, got {}",
                rotation
            )))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// (n mod 6) + 1
    pub fn next(self) -> Self {
        Rotation(self.0 % 6 + 1)
    }

    pub fn previous(self) -> Self {
        Rotation((self.0 + 4) % 6 + 1)
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Rotation::FIRST
    }
}

impl TryFrom<u8> for Rotation {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self> {
        Rotation::new(value)
    }
}

impl From<Rotation> for u8 {
    fn from(rotation: Rotation) -> u8 {
        rotation.0
    }
}

impl fmt::Display for Rotation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether our team serves or receives the current point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(test, derive(strum_macros::EnumIter))]
#[serde(rename_all = "snake_case")]
pub enum ServingPhase {
    Serving,
    Receiving,
}

impl ServingPhase {
    /// Value written to the `Point_Type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServingPhase::Serving => "serving",
            ServingPhase::Receiving => "receiving",
        }
    }

    pub fn is_receiving(&self) -> bool {
        matches!(self, ServingPhase::Receiving)
    }

    pub fn opposite(self) -> Self {
        match self {
            ServingPhase::Serving => ServingPhase::Receiving,
            ServingPhase::Receiving => ServingPhase::Serving,
        }
    }
}

impl fmt::Display for ServingPhase {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rotation number plus serve/receive phase: the whole rotational state of
/// our team between two rallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RotationState {
    pub rotation: Rotation,
    pub phase: ServingPhase,
}

impl RotationState {
    pub fn new(rotation: Rotation, phase: ServingPhase) -> Self {
        Self { rotation, phase }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotation_wraps_forward_and_back() {
        let six = Rotation::new(6).unwrap();
        assert_eq!(six.next(), Rotation::FIRST);
        assert_eq!(Rotation::FIRST.previous(), six);
        for rotation in Rotation::ALL {
            assert_eq!(rotation.next().previous(), rotation);
        }
    }

    #[test]
    fn test_out_of_range_is_invalid_argument() {
        assert!(matches!(Rotation::new(0), Err(EngineError::InvalidArgument(_))));
        assert!(matches!(Rotation::new(7), Err(EngineError::InvalidArgument(_))));
        assert!(matches!(CourtPosition::new(0), Err(EngineError::InvalidArgument(_))));
        assert!(matches!(CourtPosition::new(9), Err(EngineError::InvalidArgument(_))));
    }

    #[test]
    fn test_back_row() {
        let back: Vec<u8> =
            CourtPosition::ALL.iter().filter(|p| p.is_back_row()).map(|p| p.get()).collect();
        assert_eq!(back, vec![1, 5, 6]);
    }

    #[test]
    fn test_role_aliases() {
        assert_eq!(Role::from_code("mb"), Some(Role::Middle1));
        assert_eq!(Role::from_code(" Outside "), Some(Role::Outside1));
        assert_eq!(Role::from_code("LIB"), Some(Role::Libero));
        assert_eq!(Role::from_code("DS"), None);
    }

    #[test]
    fn test_serde_rejects_bad_rotation() {
        assert!(serde_json::from_str::<Rotation>("4").is_ok());
        assert!(serde_json::from_str::<Rotation>("0").is_err());
    }
}
