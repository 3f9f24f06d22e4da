//! Robot, task and assignment model shared by every component.

use serde::Serialize;
use std::collections::BTreeMap;

/// Dense robot identifier, `0..robot_count`.
pub type RobotId = usize;
/// Caller-assigned task identifier.
pub type TaskId = u64;

/// task id -> robot id for every non-completed task that found a robot.
pub type AssignmentMap = BTreeMap<TaskId, RobotId>;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in the plane.
    pub fn distance_to(&self, other: &Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A mobile agent as last reported by its update source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Robot {
    pub id: RobotId,
    pub position: Position,
    /// Expected in `0..=100`; the store does not clamp it.
    pub energy: f64,
    /// Opaque tags. Not consulted by allocation.
    pub capabilities: Vec<u32>,
    pub assigned_tasks: Vec<TaskId>,
}

impl Robot {
    pub fn new(id: RobotId, x: f64, y: f64, energy: f64) -> Self {
        Self {
            id,
            position: Position::new(x, y),
            energy,
            capabilities: Vec::new(),
            assigned_tasks: Vec::new(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: Vec<u32>) -> Self {
        self.capabilities = capabilities;
        self
    }
}

/// A spatially located unit of work.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Task {
    pub id: TaskId,
    pub description: String,
    /// Informational only; allocation ignores it.
    pub priority: i32,
    pub position: Position,
    pub completed: bool,
}

impl Task {
    pub fn new(id: TaskId, description: impl Into<String>, priority: i32, x: f64, y: f64) -> Self {
        Self {
            id,
            description: description.into(),
            priority,
            position: Position::new(x, y),
            completed: false,
        }
    }
}

/// Point-in-time copy of robots and tasks used as the sole input to a recompute.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub robots: Vec<Robot>,
    pub tasks: Vec<Task>,
    pub assignments: AssignmentMap,
}
