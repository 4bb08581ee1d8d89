//! Recorded rally actions.
//!
//! Every action type carries its own closed outcome enumeration, so an
//! outcome that does not belong to the action cannot be represented. The
//! attack type travels inside the `Attack` variant: it is present exactly when
//! the action is an attack.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::court::Role;
use crate::error::ValidationError;

/// Lower-case, trimmed, with spaces and dashes folded to underscores.
pub(crate) fn normalize_name(value: &str) -> String {
    value.trim().to_ascii_lowercase().replace([' ', '-'], "_")
}

macro_rules! named_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[cfg_attr(test, derive(strum_macros::EnumIter))]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Name as written in the tracker tables.
            pub fn name(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn from_name(value: &str) -> Option<Self> {
                let normalized = normalize_name(value);
                $name::ALL.iter().copied().find(|v| v.name() == normalized)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

named_enum!(
    /// Action category, without its outcome.
    ActionType {
        Serve => "serve",
        Receive => "receive",
        Set => "set",
        Attack => "attack",
        Block => "block",
        Dig => "dig",
        FreeBall => "free_ball",
        OpponentError => "opponent_error",
        Error => "error",
    }
);

named_enum!(AttackOutcome {
    Kill => "kill",
    Blocked => "blocked",
    Out => "out",
    Net => "net",
    Defended => "defended",
    Error => "error",
});

named_enum!(ServeOutcome {
    Ace => "ace",
    Good => "good",
    Error => "error",
});

named_enum!(ReceiveOutcome {
    Perfect => "perfect",
    Good => "good",
    Poor => "poor",
    Error => "error",
});

named_enum!(BlockOutcome {
    Kill => "kill",
    Touch => "touch",
    Missed => "missed",
    Error => "error",
});

named_enum!(SetOutcome {
    Exceptional => "exceptional",
    Good => "good",
    Poor => "poor",
    Error => "error",
});

named_enum!(DigOutcome {
    Perfect => "perfect",
    Good => "good",
    Poor => "poor",
    Error => "error",
});

named_enum!(FreeBallOutcome {
    Good => "good",
    Error => "error",
});

named_enum!(
    /// Opponent fault that hands us the point.
    OpponentErrorKind {
        AttackError => "attack_error",
        ServeError => "serve_error",
        ReceiveError => "receive_error",
        SetError => "set_error",
    }
);

named_enum!(AttackType {
    Normal => "normal",
    Tip => "tip",
    AfterBlock => "after_block",
});

/// Action type together with its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", content = "detail", rename_all = "snake_case")]
pub enum ActionKind {
    Serve(ServeOutcome),
    Receive(ReceiveOutcome),
    Set(SetOutcome),
    Attack { outcome: AttackOutcome, attack_type: AttackType },
    Block(BlockOutcome),
    Dig(DigOutcome),
    FreeBall(FreeBallOutcome),
    OpponentError(OpponentErrorKind),
    /// Generic fault charged to our team as a whole.
    TeamError,
}

impl ActionKind {
    pub fn attack(outcome: AttackOutcome, attack_type: AttackType) -> Self {
        ActionKind::Attack { outcome, attack_type }
    }

    pub fn action_type(&self) -> ActionType {
        match self {
            ActionKind::Serve(_) => ActionType::Serve,
            ActionKind::Receive(_) => ActionType::Receive,
            ActionKind::Set(_) => ActionType::Set,
            ActionKind::Attack { .. } => ActionType::Attack,
            ActionKind::Block(_) => ActionType::Block,
            ActionKind::Dig(_) => ActionType::Dig,
            ActionKind::FreeBall(_) => ActionType::FreeBall,
            ActionKind::OpponentError(_) => ActionType::OpponentError,
            ActionKind::TeamError => ActionType::Error,
        }
    }

    pub fn outcome_name(&self) -> &'static str {
        match self {
            ActionKind::Serve(o) => o.name(),
            ActionKind::Receive(o) => o.name(),
            ActionKind::Set(o) => o.name(),
            ActionKind::Attack { outcome, .. } => outcome.name(),
            ActionKind::Block(o) => o.name(),
            ActionKind::Dig(o) => o.name(),
            ActionKind::FreeBall(o) => o.name(),
            ActionKind::OpponentError(o) => o.name(),
            ActionKind::TeamError => "error",
        }
    }

    pub fn attack_type(&self) -> Option<AttackType> {
        match self {
            ActionKind::Attack { attack_type, .. } => Some(*attack_type),
            _ => None,
        }
    }

    /// Build from an action type and an outcome name.
    ///
    /// `attack_type` must be present for attacks and absent for everything
    /// else.
    pub fn parse(
        action: ActionType,
        outcome: &str,
        attack_type: Option<AttackType>,
    ) -> Result<Self, ValidationError> {
        let unknown =
            || ValidationError::UnknownOutcome { action, value: outcome.trim().to_string() };

        if action != ActionType::Attack {
            if let Some(attack_type) = attack_type {
                return Err(ValidationError::UnexpectedAttackType {
                    action,
                    value: attack_type.name().to_string(),
                });
            }
        }

        let kind = match action {
            ActionType::Serve => ActionKind::Serve(ServeOutcome::from_name(outcome).ok_or_else(unknown)?),
            ActionType::Receive => {
                ActionKind::Receive(ReceiveOutcome::from_name(outcome).ok_or_else(unknown)?)
            }
            ActionType::Set => ActionKind::Set(SetOutcome::from_name(outcome).ok_or_else(unknown)?),
            ActionType::Attack => {
                let outcome = AttackOutcome::from_name(outcome).ok_or_else(unknown)?;
                let attack_type = attack_type.ok_or(ValidationError::MissingAttackType)?;
                ActionKind::Attack { outcome, attack_type }
            }
            ActionType::Block => ActionKind::Block(BlockOutcome::from_name(outcome).ok_or_else(unknown)?),
            ActionType::Dig => ActionKind::Dig(DigOutcome::from_name(outcome).ok_or_else(unknown)?),
            ActionType::FreeBall => {
                ActionKind::FreeBall(FreeBallOutcome::from_name(outcome).ok_or_else(unknown)?)
            }
            ActionType::OpponentError => {
                ActionKind::OpponentError(OpponentErrorKind::from_name(outcome).ok_or_else(unknown)?)
            }
            ActionType::Error => {
                if normalize_name(outcome) != "error" {
                    return Err(unknown());
                }
                ActionKind::TeamError
            }
        };
        Ok(kind)
    }
}

/// Who performed an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Actor {
    /// One of our players, identified by role and optionally by name.
    Player {
        role: Role,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    /// Our team as a whole (no individual at fault).
    Team,
    Opponent,
}

impl Actor {
    pub fn player(role: Role) -> Self {
        Actor::Player { role, name: None }
    }

    pub fn named(role: Role, name: impl Into<String>) -> Self {
        Actor::Player { role, name: Some(name.into()) }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Actor::Player { role, .. } => Some(*role),
            _ => None,
        }
    }

    /// `Player` column value.
    pub fn player_label(&self) -> String {
        match self {
            Actor::Player { name: Some(name), .. } => name.clone(),
            Actor::Player { role, name: None } => role.code().to_string(),
            Actor::Team => "OUR_TEAM".to_string(),
            Actor::Opponent => "OPPONENT".to_string(),
        }
    }

    /// `Position` column value.
    pub fn position_label(&self) -> &'static str {
        match self {
            Actor::Player { role, .. } => role.code(),
            Actor::Team => "TEAM",
            Actor::Opponent => "OPPONENT",
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Actor::Player { role, name: Some(name) } => write!(f, "{} ({})", name, role.code()),
            Actor::Player { role, name: None } => write!(f, "{}", role),
            Actor::Team => f.write_str("our team"),
            Actor::Opponent => f.write_str("the opponent"),
        }
    }
}

/// Actions the libero may not perform.
const LIBERO_RESTRICTED: [ActionType; 3] = [ActionType::Serve, ActionType::Attack, ActionType::Block];

/// One recorded event in a rally. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ActionRepr")]
pub struct Action {
    actor: Actor,
    kind: ActionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

#[derive(Deserialize)]
struct ActionRepr {
    actor: Actor,
    kind: ActionKind,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    notes: Option<String>,
}

impl TryFrom<ActionRepr> for Action {
    type Error = ValidationError;

    fn try_from(repr: ActionRepr) -> Result<Self, ValidationError> {
        let mut action = Action::new(repr.actor, repr.kind)?;
        action.timestamp = repr.timestamp;
        action.notes = repr.notes;
        Ok(action)
    }
}

impl Action {
    /// Build an action, checking that the actor may perform it.
    pub fn new(actor: Actor, kind: ActionKind) -> Result<Self, ValidationError> {
        let action = kind.action_type();
        match (&actor, &kind) {
            (Actor::Opponent, ActionKind::OpponentError(_)) => {}
            (_, ActionKind::OpponentError(_)) | (Actor::Opponent, _) => {
                return Err(ValidationError::ActorMismatch { action, actor: actor.to_string() });
            }
            // the whole team only ever commits the generic error
            (Actor::Team, kind) if !matches!(kind, ActionKind::TeamError) => {
                return Err(ValidationError::ActorMismatch { action, actor: actor.to_string() });
            }
            (Actor::Player { role: Role::Libero, .. }, _) if LIBERO_RESTRICTED.contains(&action) => {
                return Err(ValidationError::LiberoRestricted { action });
            }
            _ => {}
        }
        Ok(Self { actor, kind, timestamp: None, notes: None })
    }

    /// Action by one of our players, identified by role.
    pub fn by(role: Role, kind: ActionKind) -> Result<Self, ValidationError> {
        Action::new(Actor::player(role), kind)
    }

    pub fn opponent_error(kind: OpponentErrorKind) -> Self {
        Self {
            actor: Actor::Opponent,
            kind: ActionKind::OpponentError(kind),
            timestamp: None,
            notes: None,
        }
    }

    pub fn team_error() -> Self {
        Self { actor: Actor::Team, kind: ActionKind::TeamError, timestamp: None, notes: None }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn kind(&self) -> &ActionKind {
        &self.kind
    }

    pub fn action_type(&self) -> ActionType {
        self.kind.action_type()
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub fn notes(&self) -> Option<&str> {
        self.notes.as_deref()
    }

    /// Bookkeeping rows (opponent faults, whole-team faults) that name no
    /// individual player.
    pub fn is_synthetic(&self) -> bool {
        !matches!(self.actor, Actor::Player { .. })
    }
}
