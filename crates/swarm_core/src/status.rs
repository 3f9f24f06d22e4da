use crate::types::{AssignmentMap, RobotId, Snapshot, TaskId};
use serde::Serialize;
use std::fmt;

/// Read-only summary of the fleet derived from a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub timestamp_ms: i64,
    pub robots: usize,
    pub tasks: usize,
    pub completed_tasks: usize,
    /// Robots holding at least one task, in robot id order.
    pub assignments: Vec<RobotSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RobotSummary {
    pub robot_id: RobotId,
    pub tasks: Vec<TaskId>,
}

impl StatusReport {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            robots: snapshot.robots.len(),
            tasks: snapshot.tasks.len(),
            completed_tasks: snapshot.tasks.iter().filter(|t| t.completed).count(),
            assignments: snapshot
                .robots
                .iter()
                .filter(|r| !r.assigned_tasks.is_empty())
                .map(|r| RobotSummary {
                    robot_id: r.id,
                    tasks: r.assigned_tasks.clone(),
                })
                .collect(),
        }
    }

    /// Count lines only, one fact per line.
    pub fn counts_text(&self) -> String {
        format!(
            "Swarm Status:\nRobots: {}\nTasks: {}\nCompleted Tasks: {}\n",
            self.robots, self.tasks, self.completed_tasks
        )
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.counts_text())?;
        for summary in &self.assignments {
            write!(f, "Robot {} has tasks:", summary.robot_id)?;
            for task in &summary.tasks {
                write!(f, " {task}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Fleet view served to dashboards: every robot, every task and the current allocations.
#[derive(Debug, Clone, Serialize)]
pub struct FleetView {
    pub timestamp_ms: i64,
    pub robots: Vec<RobotView>,
    pub tasks: Vec<TaskView>,
    pub allocations: AssignmentMap,
}

#[derive(Debug, Clone, Serialize)]
pub struct RobotView {
    pub id: RobotId,
    pub x: f64,
    pub y: f64,
    pub battery: f64,
    pub tasks: Vec<TaskId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub id: TaskId,
    pub description: String,
    pub priority: i32,
    pub x: f64,
    pub y: f64,
    pub completed: bool,
}

impl FleetView {
    pub fn from_snapshot(snapshot: &Snapshot) -> Self {
        Self {
            timestamp_ms: chrono::Utc::now().timestamp_millis(),
            robots: snapshot
                .robots
                .iter()
                .map(|r| RobotView {
                    id: r.id,
                    x: r.position.x,
                    y: r.position.y,
                    battery: r.energy,
                    tasks: r.assigned_tasks.clone(),
                })
                .collect(),
            tasks: snapshot
                .tasks
                .iter()
                .map(|t| TaskView {
                    id: t.id,
                    description: t.description.clone(),
                    priority: t.priority,
                    x: t.position.x,
                    y: t.position.y,
                    completed: t.completed,
                })
                .collect(),
            allocations: snapshot.assignments.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Robot, Task};

    fn sample_snapshot() -> Snapshot {
        let mut r0 = Robot::new(0, 1.0, 2.0, 90.0);
        r0.assigned_tasks = vec![1, 4];
        let r1 = Robot::new(1, 5.0, 5.0, 40.0);
        let mut r2 = Robot::new(2, 7.0, 7.0, 100.0);
        r2.assigned_tasks = vec![3];
        let mut done = Task::new(2, "Transport item to B", 2, 30.0, 40.0);
        done.completed = true;
        Snapshot {
            robots: vec![r0, r1, r2],
            tasks: vec![
                Task::new(1, "Inspect area A", 1, 10.0, 10.0),
                done,
                Task::new(3, "Clean area C", 3, 70.0, 20.0),
                Task::new(4, "Monitor perimeter", 1, 50.0, 50.0),
            ],
            assignments: AssignmentMap::from([(1, 0), (3, 2), (4, 0)]),
        }
    }

    #[test]
    fn text_report_has_fixed_layout() {
        let report = StatusReport::from_snapshot(&sample_snapshot());
        assert_eq!(
            report.to_string(),
            "Swarm Status:\n\
             Robots: 3\n\
             Tasks: 4\n\
             Completed Tasks: 1\n\
             Robot 0 has tasks: 1 4\n\
             Robot 2 has tasks: 3\n"
        );
    }

    #[test]
    fn counts_text_omits_robot_lines() {
        let report = StatusReport::from_snapshot(&sample_snapshot());
        assert_eq!(
            report.counts_text(),
            "Swarm Status:\nRobots: 3\nTasks: 4\nCompleted Tasks: 1\n"
        );
    }

    #[test]
    fn fleet_view_serializes_dashboard_shape() {
        let view = FleetView::from_snapshot(&sample_snapshot());
        let json: serde_json::Value = serde_json::from_str(&view.to_json().unwrap()).unwrap();
        assert_eq!(json["robots"].as_array().unwrap().len(), 3);
        assert_eq!(json["robots"][0]["battery"], 90.0);
        assert_eq!(json["robots"][0]["tasks"], serde_json::json!([1, 4]));
        assert_eq!(json["tasks"][1]["completed"], true);
        assert_eq!(json["allocations"]["3"], 2);
    }
}
