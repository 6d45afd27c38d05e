//! Keyword-driven stand-in for a vision/language model.
//!
//! Nothing here looks at pixels. Object labels and the task type come from
//! substring matches against a fixed vocabulary, the analysis sentence is a
//! randomly chosen template, and pick/place coordinates are drawn from fixed
//! ranges that sit inside the default workspace.

use crate::command::RobotCommand;
use crate::position::WorkspaceLimits;
use crate::sequence::{CommandSequence, Validation};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

const SHAPES: &[&str] = &["cube", "sphere", "cylinder", "block", "box"];
const COLORS: &[&str] = &[
    "red", "blue", "green", "yellow", "orange", "purple", "black", "white",
];
const CONTAINERS: &[&str] = &["container", "box", "tray", "basket", "bin"];
const TOOLS: &[&str] = &["screwdriver", "wrench", "hammer", "pliers", "tool"];
const ITEMS: &[&str] = &["ball", "component", "part", "piece", "object"];

const PLACEHOLDER_OBJECTS: &[&str] = &["object_1", "object_2", "target_location"];

/// Objects beyond this many get no pick/place choreography.
pub const MAX_MANIPULATED_OBJECTS: usize = 2;

const HOME_X: f64 = 0.0;
const HOME_Y: f64 = 0.0;
const HOME_Z: f64 = 50.0;

// ---------------------------------------------------------------------------
// TaskType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    PickAndPlace,
    Sorting,
    Stacking,
    Assembly,
    Cleaning,
}

impl TaskType {
    /// Match order matters: the first task type with a keyword hit wins.
    pub fn all() -> &'static [TaskType] {
        &[
            TaskType::PickAndPlace,
            TaskType::Sorting,
            TaskType::Stacking,
            TaskType::Assembly,
            TaskType::Cleaning,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::PickAndPlace => "pick_and_place",
            TaskType::Sorting => "sorting",
            TaskType::Stacking => "stacking",
            TaskType::Assembly => "assembly",
            TaskType::Cleaning => "cleaning",
        }
    }

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            TaskType::PickAndPlace => &["pick", "place", "move", "transfer", "relocate"],
            TaskType::Sorting => &["sort", "organize", "separate", "group", "categorize"],
            TaskType::Stacking => &["stack", "pile", "tower", "arrange vertically"],
            TaskType::Assembly => &["assemble", "connect", "attach", "join", "combine"],
            TaskType::Cleaning => &["clean", "clear", "remove", "tidy"],
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// TaskAnalyzer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct TaskAnalyzer;

impl TaskAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Detect object labels and the task type in `description`.
    ///
    /// A `{color}_{object}` label is produced only when the literal phrase
    /// `"{color} {object}"` occurs; co-occurrence alone is not enough.
    pub fn analyze_task_description(&self, description: &str) -> (Vec<String>, TaskType) {
        let text = description.to_lowercase();

        let mut detected: Vec<&str> = Vec::new();
        for &word in [SHAPES, COLORS, CONTAINERS, TOOLS, ITEMS].into_iter().flatten() {
            if text.contains(word) && !detected.contains(&word) {
                detected.push(word);
            }
        }

        let colors: Vec<&str> = COLORS.iter().copied().filter(|c| text.contains(c)).collect();

        let mut objects: Vec<String> = Vec::new();
        for color in &colors {
            for obj in &detected {
                if text.contains(&format!("{color} {obj}")) {
                    objects.push(format!("{color}_{obj}"));
                }
            }
        }

        let covered: Vec<String> = objects
            .iter()
            .filter_map(|o| o.rsplit('_').next().map(str::to_string))
            .collect();
        for obj in &detected {
            if !covered.iter().any(|c| c == obj) {
                objects.push(obj.to_string());
            }
        }

        if objects.is_empty() {
            objects = PLACEHOLDER_OBJECTS.iter().map(|s| s.to_string()).collect();
        }

        let task_type = TaskType::all()
            .iter()
            .copied()
            .find(|t| t.keywords().iter().any(|k| text.contains(k)))
            .unwrap_or(TaskType::PickAndPlace);

        (objects, task_type)
    }

    /// Pick a scene-analysis sentence for the task. Task types without their
    /// own templates use the pick-and-place wording.
    pub fn generate_analysis<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        objects: &[String],
        task_type: TaskType,
    ) -> String {
        let first = objects.first().map(String::as_str).unwrap_or("an object");
        let listed = objects.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
        let count = objects.len();

        let templates = match task_type {
            TaskType::Sorting => vec![
                format!(
                    "The workspace contains multiple objects that need to be sorted and organized. \
                     I've detected {count} different items including {listed}. \
                     I'll group similar objects together based on their characteristics."
                ),
                "This sorting task requires careful object classification. I can distinguish \
                 between different object types and will organize them into designated areas \
                 based on their properties."
                    .to_string(),
                format!(
                    "The scene shows various objects scattered across the workspace. \
                     My analysis indicates these can be efficiently sorted into {} distinct categories.",
                    count.min(3)
                ),
            ],
            _ => vec![
                format!(
                    "I can see a workspace with several objects that need to be manipulated. \
                     The task involves picking up {first} and placing it in a new location. \
                     I'll plan a safe trajectory that avoids collisions with other objects in the scene."
                ),
                format!(
                    "The scene shows a typical pick-and-place scenario. I've identified {count} \
                     distinct objects including {listed}. The robot will need to approach each \
                     object carefully and execute precise movements."
                ),
                "This is a classic manipulation task. I can see the target object clearly and \
                 have identified an optimal approach angle. The workspace appears uncluttered \
                 enough for safe robot operation."
                    .to_string(),
            ],
        };

        templates
            .choose(rng)
            .cloned()
            .unwrap_or_default()
    }

    /// Build the command sequence: home, a six-step pick/place for each of
    /// the first [`MAX_MANIPULATED_OBJECTS`] objects, then home again.
    pub fn generate_commands<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        objects: &[String],
        task_type: TaskType,
        description: &str,
    ) -> CommandSequence {
        tracing::debug!(
            task_type = %task_type,
            objects = objects.len(),
            chars = description.len(),
            "generating command sequence"
        );

        let mut sequence = CommandSequence::default();
        sequence.add_command(RobotCommand::move_to(
            HOME_X,
            HOME_Y,
            HOME_Z,
            60.0,
            "Move to home position and initialize",
        ));

        for obj in objects.iter().take(MAX_MANIPULATED_OBJECTS) {
            let name = obj.replace('_', " ");
            let pick_x = f64::from(rng.gen_range(-100i32..=100));
            let pick_y = f64::from(rng.gen_range(-80i32..=80));
            let place_x = f64::from(rng.gen_range(80i32..=150));
            let place_y = f64::from(rng.gen_range(60i32..=120));

            sequence.add_command(RobotCommand::move_to(
                pick_x,
                pick_y,
                30.0,
                50.0,
                format!("Approach {name}"),
            ));
            sequence.add_command(RobotCommand::move_to(
                pick_x,
                pick_y,
                15.0,
                20.0,
                format!("Descend to {name}"),
            ));
            sequence.add_command(RobotCommand::gripper(true, None, format!("Grasp {name}")));
            sequence.add_command(RobotCommand::move_to(
                pick_x,
                pick_y,
                40.0,
                30.0,
                format!("Lift {name}"),
            ));
            sequence.add_command(RobotCommand::move_to(
                place_x,
                place_y,
                20.0,
                45.0,
                format!("Transport {name} to destination"),
            ));
            sequence.add_command(RobotCommand::gripper(false, None, format!("Release {name}")));
        }

        sequence.add_command(RobotCommand::move_to(
            HOME_X,
            HOME_Y,
            HOME_Z,
            50.0,
            "Return to home position - task complete",
        ));
        sequence
    }

    /// Presentation confidence: starts near 0.9 and drops slightly for wordier
    /// descriptions, clamped to [0.75, 0.98] and rounded to three places.
    pub fn confidence<R: Rng + ?Sized>(&self, rng: &mut R, description: &str) -> f64 {
        let complexity = description.split_whitespace().count() as f64 / 20.0;
        let raw = 0.85 + rng.gen_range(0.0..0.1) - complexity * 0.05;
        round_to(raw.clamp(0.75, 0.98), 3)
    }
}

// ---------------------------------------------------------------------------
// TaskAnalysis
// ---------------------------------------------------------------------------

/// Everything derived from one task description.
#[derive(Debug, Clone)]
pub struct TaskAnalysis {
    pub analysis: String,
    pub objects: Vec<String>,
    pub task_type: TaskType,
    pub confidence: f64,
    pub sequence: CommandSequence,
    pub validation: Validation,
    /// Seconds, from [`CommandSequence::estimate_total_time`], one decimal.
    pub execution_time_estimate: f64,
}

impl TaskAnalyzer {
    /// Full pipeline: detect, describe, plan, then validate and time the plan.
    pub fn analyze<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        description: &str,
        limits: &WorkspaceLimits,
    ) -> TaskAnalysis {
        let (objects, task_type) = self.analyze_task_description(description);
        let analysis = self.generate_analysis(rng, &objects, task_type);
        let sequence = self.generate_commands(rng, &objects, task_type, description);
        let confidence = self.confidence(rng, description);

        let validation = sequence.validate_sequence(limits);
        if !validation.valid {
            tracing::warn!(errors = ?validation.errors, "generated sequence failed validation");
        }
        let execution_time_estimate = round_to(sequence.estimate_total_time(), 1);

        TaskAnalysis {
            analysis,
            objects,
            task_type,
            confidence,
            sequence,
            validation,
            execution_time_estimate,
        }
    }
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
