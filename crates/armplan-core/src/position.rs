use serde::{Deserialize, Serialize};

/// A point in the robot workspace, in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub const HOME: Position = Position {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

// ---------------------------------------------------------------------------
// WorkspaceLimits
// ---------------------------------------------------------------------------

/// Axis-aligned box a commanded position must stay within.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceLimits {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    pub z_min: f64,
    pub z_max: f64,
}

impl Default for WorkspaceLimits {
    fn default() -> Self {
        Self {
            x_min: -200.0,
            x_max: 200.0,
            y_min: -200.0,
            y_max: 200.0,
            z_min: 0.0,
            z_max: 150.0,
        }
    }
}

impl WorkspaceLimits {
    /// Bounds are inclusive on both ends.
    pub fn contains(&self, p: &Position) -> bool {
        (self.x_min..=self.x_max).contains(&p.x)
            && (self.y_min..=self.y_max).contains(&p.y)
            && (self.z_min..=self.z_max).contains(&p.z)
    }
}
