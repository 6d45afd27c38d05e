use crate::command::{Action, CommandKind, CommandRecord, RobotCommand, DEFAULT_SPEED};
use crate::error::{ArmplanError, Result};
use crate::position::{Position, WorkspaceLimits};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_SEQUENCE_LEN: usize = 100;

/// mm/s² used for the per-move acceleration allowance.
pub const ACCELERATION: f64 = 50.0;
/// Seconds for a single gripper open or close.
pub const GRIPPER_TIME: f64 = 1.0;
/// Seconds of settling time added after every command.
pub const SAFETY_DELAY: f64 = 0.2;

// ---------------------------------------------------------------------------
// SequenceStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceStatus {
    #[default]
    Pending,
    Executing,
    Completed,
    Failed,
}

impl SequenceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SequenceStatus::Pending => "pending",
            SequenceStatus::Executing => "executing",
            SequenceStatus::Completed => "completed",
            SequenceStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for SequenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SequenceStatus {
    type Err = ArmplanError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SequenceStatus::Pending),
            "executing" => Ok(SequenceStatus::Executing),
            "completed" => Ok(SequenceStatus::Completed),
            "failed" => Ok(SequenceStatus::Failed),
            _ => Err(ArmplanError::InvalidStatus(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Outcome of [`CommandSequence::validate_sequence`]. Every problem found is
/// collected; `valid` is true only when `errors` is empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    pub valid: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gripper {
    Unknown,
    Open,
    Closed,
}

// ---------------------------------------------------------------------------
// SequenceRecord
// ---------------------------------------------------------------------------

/// Wire form of a [`CommandSequence`]. `command_count` and
/// `estimated_duration` are derived on output and ignored on input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SequenceRecord {
    #[serde(default)]
    pub commands: Vec<CommandRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default)]
    pub execution_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub command_count: usize,
    #[serde(default)]
    pub estimated_duration: f64,
}

// ---------------------------------------------------------------------------
// CommandSequence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct CommandSequence {
    pub commands: Vec<RobotCommand>,
    pub created_at: DateTime<Utc>,
    pub execution_id: Option<String>,
    pub status: SequenceStatus,
}

impl Default for CommandSequence {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl CommandSequence {
    pub fn new(commands: Vec<RobotCommand>) -> Self {
        Self {
            commands,
            created_at: Utc::now(),
            execution_id: None,
            status: SequenceStatus::Pending,
        }
    }

    pub fn add_command(&mut self, command: RobotCommand) {
        self.commands.push(command);
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Check every command, the overall length, and gripper open/close
    /// consistency. The gripper starts in an unknown state, so the first
    /// gripper command is never flagged.
    pub fn validate_sequence(&self, limits: &WorkspaceLimits) -> Validation {
        let mut errors = Vec::new();

        for (i, cmd) in self.commands.iter().enumerate() {
            if !cmd.validate(limits) {
                errors.push(format!(
                    "Command {} validation failed: {}",
                    i + 1,
                    cmd.description
                ));
            }
        }

        if self.commands.len() > MAX_SEQUENCE_LEN {
            errors.push(format!(
                "Command sequence too long (max {MAX_SEQUENCE_LEN} commands)"
            ));
        }

        let mut gripper = Gripper::Unknown;
        for (i, cmd) in self.commands.iter().enumerate() {
            match cmd.action() {
                Action::CloseGripper => {
                    if gripper == Gripper::Closed {
                        errors.push(format!(
                            "Command {}: Attempting to close already closed gripper",
                            i + 1
                        ));
                    }
                    gripper = Gripper::Closed;
                }
                Action::OpenGripper => {
                    if gripper == Gripper::Open {
                        errors.push(format!(
                            "Command {}: Attempting to open already open gripper",
                            i + 1
                        ));
                    }
                    gripper = Gripper::Open;
                }
                _ => {}
            }
        }

        Validation {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Estimated wall-clock seconds to run the sequence from home.
    pub fn estimate_total_time(&self) -> f64 {
        let mut total = 0.0;
        let mut cursor = Position::HOME;

        for cmd in &self.commands {
            match cmd.kind {
                CommandKind::MoveTo {
                    position: Some(position),
                    speed,
                } => {
                    let speed = match speed {
                        Some(s) if s > 0.0 => s,
                        _ => DEFAULT_SPEED,
                    };
                    let distance = cursor.distance_to(&position);
                    total += distance / speed + speed / ACCELERATION;
                    cursor = position;
                }
                CommandKind::CloseGripper { .. } | CommandKind::OpenGripper { .. } => {
                    total += GRIPPER_TIME;
                }
                CommandKind::Wait {
                    duration: Some(duration),
                } => {
                    total += duration;
                }
                _ => {}
            }
            total += SAFETY_DELAY;
        }

        total
    }

    pub fn to_record(&self) -> SequenceRecord {
        SequenceRecord {
            commands: self.commands.iter().map(RobotCommand::to_record).collect(),
            created_at: Some(self.created_at.to_rfc3339()),
            execution_id: self.execution_id.clone(),
            status: Some(self.status.as_str().to_string()),
            command_count: self.commands.len(),
            estimated_duration: self.estimate_total_time(),
        }
    }

    pub fn from_record(record: SequenceRecord) -> Result<Self> {
        let commands = record
            .commands
            .into_iter()
            .map(RobotCommand::from_record)
            .collect::<Result<Vec<_>>>()?;

        let mut sequence = Self::new(commands);
        sequence.execution_id = record.execution_id;
        if let Some(status) = record.status.as_deref() {
            sequence.status = status.parse()?;
        }
        if let Some(created_at) = record.created_at.as_deref() {
            sequence.created_at = crate::command::parse_timestamp(created_at)?;
        }
        Ok(sequence)
    }
}

impl CommandSequence {
    /// Parse either a full [`SequenceRecord`] or a bare array of command records.
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let record = if value.is_array() {
            SequenceRecord {
                commands: serde_json::from_value(value)?,
                ..SequenceRecord::default()
            }
        } else {
            serde_json::from_value(value)?
        };
        Self::from_record(record)
    }
}

impl FromIterator<RobotCommand> for CommandSequence {
    fn from_iter<I: IntoIterator<Item = RobotCommand>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
