use crate::error::{ArmplanError, Result};
use crate::position::{Position, WorkspaceLimits};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_SPEED: f64 = 100.0;
pub const MAX_FORCE: f64 = 10.0;
pub const MAX_DURATION: f64 = 30.0;

pub const DEFAULT_SPEED: f64 = 50.0;

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    MoveTo,
    CloseGripper,
    OpenGripper,
    SetSpeed,
    Wait,
    Home,
}

impl Action {
    pub fn all() -> &'static [Action] {
        &[
            Action::MoveTo,
            Action::CloseGripper,
            Action::OpenGripper,
            Action::SetSpeed,
            Action::Wait,
            Action::Home,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Action::MoveTo => "move_to",
            Action::CloseGripper => "close_gripper",
            Action::OpenGripper => "open_gripper",
            Action::SetSpeed => "set_speed",
            Action::Wait => "wait",
            Action::Home => "home",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Action {
    type Err = ArmplanError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Action::all()
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| ArmplanError::InvalidAction(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// CommandKind
// ---------------------------------------------------------------------------

/// What a command does, carrying only the parameters its action uses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CommandKind {
    /// A move without coordinates is accepted; it goes nowhere.
    MoveTo {
        position: Option<Position>,
        speed: Option<f64>,
    },
    CloseGripper {
        force: Option<f64>,
    },
    OpenGripper {
        force: Option<f64>,
    },
    SetSpeed {
        speed: Option<f64>,
    },
    Wait {
        duration: Option<f64>,
    },
    Home {
        speed: Option<f64>,
    },
}

impl CommandKind {
    pub fn action(&self) -> Action {
        match self {
            CommandKind::MoveTo { .. } => Action::MoveTo,
            CommandKind::CloseGripper { .. } => Action::CloseGripper,
            CommandKind::OpenGripper { .. } => Action::OpenGripper,
            CommandKind::SetSpeed { .. } => Action::SetSpeed,
            CommandKind::Wait { .. } => Action::Wait,
            CommandKind::Home { .. } => Action::Home,
        }
    }

    pub fn position(&self) -> Option<Position> {
        match self {
            CommandKind::MoveTo { position, .. } => *position,
            _ => None,
        }
    }

    pub fn speed(&self) -> Option<f64> {
        match self {
            CommandKind::MoveTo { speed, .. }
            | CommandKind::SetSpeed { speed }
            | CommandKind::Home { speed } => *speed,
            _ => None,
        }
    }

    pub fn force(&self) -> Option<f64> {
        match self {
            CommandKind::CloseGripper { force } | CommandKind::OpenGripper { force } => *force,
            _ => None,
        }
    }

    pub fn duration(&self) -> Option<f64> {
        match self {
            CommandKind::Wait { duration } => *duration,
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// CommandRecord
// ---------------------------------------------------------------------------

/// Flat wire form of a [`RobotCommand`].
///
/// `x`/`y`/`z`, `speed`, `force` and `duration` are omitted when absent so a
/// missing parameter never reappears as an explicit zero or null. `timestamp`
/// is always emitted, as null when unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

// ---------------------------------------------------------------------------
// RobotCommand
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "CommandRecord", try_from = "CommandRecord")]
pub struct RobotCommand {
    pub kind: CommandKind,
    pub description: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl RobotCommand {
    /// New command stamped with the current time.
    pub fn new(kind: CommandKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            timestamp: Some(Utc::now()),
        }
    }

    pub fn move_to(x: f64, y: f64, z: f64, speed: f64, description: impl Into<String>) -> Self {
        Self::new(
            CommandKind::MoveTo {
                position: Some(Position::new(x, y, z)),
                speed: Some(speed),
            },
            description,
        )
    }

    pub fn gripper(close: bool, force: Option<f64>, description: impl Into<String>) -> Self {
        let kind = if close {
            CommandKind::CloseGripper { force }
        } else {
            CommandKind::OpenGripper { force }
        };
        Self::new(kind, description)
    }

    pub fn wait(duration: f64, description: impl Into<String>) -> Self {
        Self::new(
            CommandKind::Wait {
                duration: Some(duration),
            },
            description,
        )
    }

    pub fn home(speed: f64) -> Self {
        Self::new(
            CommandKind::Home { speed: Some(speed) },
            "Move to home position",
        )
    }

    pub fn action(&self) -> Action {
        self.kind.action()
    }

    pub fn position(&self) -> Option<Position> {
        self.kind.position()
    }

    pub fn to_record(&self) -> CommandRecord {
        let position = self.kind.position();
        CommandRecord {
            action: self.action().as_str().to_string(),
            x: position.map(|p| p.x),
            y: position.map(|p| p.y),
            z: position.map(|p| p.z),
            speed: self.kind.speed(),
            force: self.kind.force(),
            duration: self.kind.duration(),
            description: self.description.clone(),
            timestamp: self.timestamp.map(|t| t.to_rfc3339()),
        }
    }

    /// Parse the flat form. Parameters that the action does not use are
    /// dropped (and logged at debug). A `move_to` without all three
    /// coordinates has no position.
    pub fn from_record(record: CommandRecord) -> Result<Self> {
        let action: Action = record.action.parse()?;
        let position = match (record.x, record.y, record.z) {
            (Some(x), Some(y), Some(z)) => Some(Position::new(x, y, z)),
            _ => None,
        };

        let kind = match action {
            Action::MoveTo => CommandKind::MoveTo {
                position,
                speed: record.speed,
            },
            Action::CloseGripper => CommandKind::CloseGripper {
                force: record.force,
            },
            Action::OpenGripper => CommandKind::OpenGripper {
                force: record.force,
            },
            Action::SetSpeed => CommandKind::SetSpeed {
                speed: record.speed,
            },
            Action::Wait => CommandKind::Wait {
                duration: record.duration,
            },
            Action::Home => CommandKind::Home {
                speed: record.speed,
            },
        };

        let dropped = dropped_fields(&record, &kind);
        if !dropped.is_empty() {
            tracing::debug!(
                action = action.as_str(),
                ?dropped,
                "ignoring parameters the action does not use"
            );
        }

        let timestamp = match record.timestamp.as_deref() {
            Some(s) if !s.is_empty() => Some(parse_timestamp(s)?),
            _ => None,
        };

        Ok(Self {
            kind,
            description: record.description,
            timestamp,
        })
    }

    /// Range check against workspace and safety limits. Absent parameters
    /// impose no constraint.
    pub fn validate(&self, limits: &WorkspaceLimits) -> bool {
        if let Some(p) = self.kind.position() {
            if !limits.contains(&p) {
                return false;
            }
        }
        if let Some(speed) = self.kind.speed() {
            if !(0.0..=MAX_SPEED).contains(&speed) {
                return false;
            }
        }
        if let Some(force) = self.kind.force() {
            if !(0.0..=MAX_FORCE).contains(&force) {
                return false;
            }
        }
        if let Some(duration) = self.kind.duration() {
            if !(0.0..=MAX_DURATION).contains(&duration) {
                return false;
            }
        }
        true
    }
}

impl From<RobotCommand> for CommandRecord {
    fn from(cmd: RobotCommand) -> Self {
        cmd.to_record()
    }
}

impl TryFrom<CommandRecord> for RobotCommand {
    type Error = ArmplanError;

    fn try_from(record: CommandRecord) -> Result<Self> {
        RobotCommand::from_record(record)
    }
}

/// Names of record parameters that did not survive into `kind`.
fn dropped_fields(record: &CommandRecord, kind: &CommandKind) -> Vec<&'static str> {
    let coords = [("x", record.x), ("y", record.y), ("z", record.z)];
    let mut dropped: Vec<&'static str> = if kind.position().is_none() {
        coords.iter().filter(|(_, v)| v.is_some()).map(|(k, _)| *k).collect()
    } else {
        Vec::new()
    };
    for (name, given, kept) in [
        ("speed", record.speed, kind.speed()),
        ("force", record.force, kind.force()),
        ("duration", record.duration, kind.duration()),
    ] {
        if given.is_some() && kept.is_none() {
            dropped.push(name);
        }
    }
    dropped
}

/// Accepts RFC 3339 timestamps and naive ISO-8601 date-times, the latter read as UTC.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| ArmplanError::InvalidTimestamp(s.to_string()))
}
