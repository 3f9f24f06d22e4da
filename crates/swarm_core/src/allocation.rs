use crate::types::{AssignmentMap, Robot, RobotId, Snapshot, Task};

/// Energy level at which a robot carries no penalty.
const FULL_ENERGY: f64 = 100.0;
/// Energy points per unit of distance-equivalent cost.
const ENERGY_PENALTY_DIVISOR: f64 = 10.0;

/// Centralized greedy allocator.
///
/// Every recompute rebuilds the whole assignment from a snapshot; nothing protects a task that
/// was assigned by a previous recompute.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllocationEngine;

impl AllocationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Distance to the task plus a linear penalty for missing energy.
    pub fn task_cost(&self, robot: &Robot, task: &Task) -> f64 {
        let distance = robot.position.distance_to(&task.position);
        let energy_penalty = (FULL_ENERGY - robot.energy) / ENERGY_PENALTY_DIVISOR;
        distance + energy_penalty
    }

    /// Cheapest robot for `task`. Ties go to the robot seen first, i.e. the lowest id.
    ///
    /// Robots whose cost is not a finite number never win.
    pub fn best_robot(&self, robots: &[Robot], task: &Task) -> Option<RobotId> {
        let mut best: Option<(RobotId, f64)> = None;
        for robot in robots {
            let cost = self.task_cost(robot, task);
            if !cost.is_finite() {
                continue;
            }
            match best {
                Some((_, min_cost)) if cost >= min_cost => {}
                _ => best = Some((robot.id, cost)),
            }
        }
        best.map(|(id, _)| id)
    }

    /// Builds a fresh assignment map for every open task in the snapshot.
    pub fn allocate(&self, snapshot: &Snapshot) -> AssignmentMap {
        let mut assignments = AssignmentMap::new();
        for task in snapshot.tasks.iter().filter(|t| !t.completed) {
            match self.best_robot(&snapshot.robots, task) {
                Some(robot_id) => {
                    assignments.insert(task.id, robot_id);
                }
                None => {
                    tracing::debug!(task_id = task.id, "No eligible robot, task left unassigned");
                }
            }
        }
        assignments
    }
}
