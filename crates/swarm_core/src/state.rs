use crate::types::{AssignmentMap, Robot, RobotId, Snapshot, Task, TaskId};
use parking_lot::RwLock;
use rand::Rng;

/// Capability tags every robot of a generated fleet carries.
const DEFAULT_CAPABILITIES: [u32; 5] = [1, 2, 3, 4, 5];
const ARENA_SIZE: f64 = 100.0;

/// Single source of truth for robot and task state.
///
/// Every field sits behind one lock so that a robot's position and energy change together and
/// an assignment commit (map plus every robot's task list) is observed as one unit. Critical
/// sections only copy or assign plain data; nothing here performs I/O while locked.
pub struct StateStore {
    inner: RwLock<Inner>,
}

struct Inner {
    robots: Vec<Robot>,
    tasks: Vec<Task>,
    assignments: AssignmentMap,
}

/// Robot, task and completed-task counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCounts {
    pub robots: usize,
    pub tasks: usize,
    pub completed_tasks: usize,
}

impl StateStore {
    /// Creates a fleet of `robot_count` robots scattered uniformly over the arena at full energy.
    pub fn new(robot_count: usize) -> Self {
        let mut rng = rand::thread_rng();
        let robots = (0..robot_count)
            .map(|id| {
                Robot::new(
                    id,
                    rng.gen_range(0.0..ARENA_SIZE),
                    rng.gen_range(0.0..ARENA_SIZE),
                    100.0,
                )
                .with_capabilities(DEFAULT_CAPABILITIES.to_vec())
            })
            .collect();
        Self::from_parts(robots)
    }

    /// Creates a store over a caller-built fleet. Robot ids are renumbered to their index.
    pub fn with_robots(robots: Vec<Robot>) -> Self {
        let robots = robots
            .into_iter()
            .enumerate()
            .map(|(id, mut robot)| {
                robot.id = id;
                robot.assigned_tasks.clear();
                robot
            })
            .collect();
        Self::from_parts(robots)
    }

    fn from_parts(robots: Vec<Robot>) -> Self {
        Self {
            inner: RwLock::new(Inner {
                robots,
                tasks: Vec::new(),
                assignments: AssignmentMap::new(),
            }),
        }
    }

    /// Last-write-wins update of one robot. Unknown ids are ignored.
    ///
    /// Returns whether the id was valid, for callers that want to count updates.
    pub fn update_robot_state(&self, robot_id: RobotId, x: f64, y: f64, energy: f64) -> bool {
        let mut inner = self.inner.write();
        match inner.robots.get_mut(robot_id) {
            Some(robot) => {
                robot.position.x = x;
                robot.position.y = y;
                robot.energy = energy;
                true
            }
            None => false,
        }
    }

    /// Appends a task. The stored copy always starts out not completed.
    pub fn add_task(&self, mut task: Task) {
        task.completed = false;
        tracing::debug!(task_id = task.id, "Task added");
        self.inner.write().tasks.push(task);
    }

    /// Flags a task as completed. Returns false if no task has that id.
    pub fn mark_task_completed(&self, task_id: TaskId) -> bool {
        let mut inner = self.inner.write();
        let mut found = false;
        for task in inner.tasks.iter_mut().filter(|t| t.id == task_id) {
            task.completed = true;
            found = true;
        }
        found
    }

    pub fn snapshot(&self) -> Snapshot {
        let inner = self.inner.read();
        Snapshot {
            robots: inner.robots.clone(),
            tasks: inner.tasks.clone(),
            assignments: inner.assignments.clone(),
        }
    }

    /// Replaces the assignment map and rebuilds every robot's task list from it.
    ///
    /// Entries naming an unknown robot, or an unknown or completed task, are dropped. Each
    /// robot's list follows task-list order. Returns the replaced map and the map as committed,
    /// both taken under the same write lock.
    pub fn commit_assignment(&self, new_map: AssignmentMap) -> (AssignmentMap, AssignmentMap) {
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        let mut committed = AssignmentMap::new();
        for robot in inner.robots.iter_mut() {
            robot.assigned_tasks.clear();
        }
        for task in inner.tasks.iter().filter(|t| !t.completed) {
            let Some(&robot_id) = new_map.get(&task.id) else {
                continue;
            };
            let Some(robot) = inner.robots.get_mut(robot_id) else {
                continue;
            };
            if committed.insert(task.id, robot_id).is_none() {
                robot.assigned_tasks.push(task.id);
            }
        }

        tracing::debug!(entries = committed.len(), "Assignment committed");
        let previous = std::mem::replace(&mut inner.assignments, committed.clone());
        (previous, committed)
    }

    /// Current task list of a robot; empty for an unknown id.
    pub fn robot_tasks(&self, robot_id: RobotId) -> Vec<TaskId> {
        self.inner
            .read()
            .robots
            .get(robot_id)
            .map(|robot| robot.assigned_tasks.clone())
            .unwrap_or_default()
    }

    pub fn robot(&self, robot_id: RobotId) -> Option<Robot> {
        self.inner.read().robots.get(robot_id).cloned()
    }

    pub fn assignments(&self) -> AssignmentMap {
        self.inner.read().assignments.clone()
    }

    pub fn robot_count(&self) -> usize {
        self.inner.read().robots.len()
    }

    pub fn status_counts(&self) -> StatusCounts {
        let inner = self.inner.read();
        StatusCounts {
            robots: inner.robots.len(),
            tasks: inner.tasks.len(),
            completed_tasks: inner.tasks.iter().filter(|t| t.completed).count(),
        }
    }
}
