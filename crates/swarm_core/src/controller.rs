use crate::allocation::AllocationEngine;
use crate::metrics::SwarmMetrics;
use crate::notify::{Announcement, NotificationChannel};
use crate::state::{StateStore, StatusCounts};
use crate::status::{FleetView, StatusReport};
use crate::types::{AssignmentMap, RobotId, Task, TaskId};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;

/// Wires the store, the allocator and the notification channel together.
///
/// Built once by the process entry point and shared behind an `Arc`; robot update sources,
/// task producers and status readers all call into the same instance.
pub struct SwarmController {
    store: Arc<StateStore>,
    engine: AllocationEngine,
    channel: NotificationChannel,
    metrics: Arc<SwarmMetrics>,
    /// Serializes recomputes so that commits land in snapshot order.
    allocation_lock: Mutex<()>,
}

impl SwarmController {
    pub fn new(
        store: Arc<StateStore>,
        engine: AllocationEngine,
        channel: NotificationChannel,
        metrics: Arc<SwarmMetrics>,
    ) -> Self {
        Self {
            store,
            engine,
            channel,
            metrics,
            allocation_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.store
    }

    /// Records a robot's position and energy. Does not trigger a recompute.
    pub fn update_robot_state(&self, robot_id: RobotId, x: f64, y: f64, energy: f64) {
        if self.store.update_robot_state(robot_id, x, y, energy) {
            self.metrics.robot_updates_total.inc();
        } else {
            tracing::trace!(robot_id, "Ignoring update for unknown robot");
            self.metrics.robot_updates_ignored_total.inc();
        }
    }

    /// Adds a task and reallocates.
    pub fn add_task(&self, task: Task) -> Vec<Announcement> {
        self.store.add_task(task);
        self.recompute()
    }

    /// Marks a task completed and reallocates so it leaves every robot's list.
    pub fn complete_task(&self, task_id: TaskId) -> bool {
        if !self.store.mark_task_completed(task_id) {
            return false;
        }
        tracing::info!(task_id, "Task completed");
        self.recompute();
        true
    }

    /// Runs one full reallocation and announces the pairs that are new.
    ///
    /// Announcements go out after the commit and after every lock is released.
    pub fn recompute(&self) -> Vec<Announcement> {
        let fresh = {
            let _guard = self.allocation_lock.lock();
            let started = Instant::now();

            let snapshot = self.store.snapshot();
            let plan = self.engine.allocate(&snapshot);
            let (previous, current) = self.store.commit_assignment(plan);

            self.metrics.recomputes_total.inc();
            self.metrics
                .recompute_duration_seconds
                .observe(started.elapsed().as_secs_f64());
            self.record_counts(&current);

            tracing::debug!(
                tasks = snapshot.tasks.len(),
                robots = snapshot.robots.len(),
                assigned = current.len(),
                "Recompute finished"
            );
            new_pairs(&previous, &current)
        };

        for announcement in &fresh {
            self.channel.announce(announcement.task_id, announcement.robot_id);
        }
        fresh
    }

    /// Fleet-wide out-of-band message.
    pub fn broadcast(&self, message: &str) {
        self.channel.broadcast(message);
    }

    pub fn robot_tasks(&self, robot_id: RobotId) -> Vec<TaskId> {
        self.store.robot_tasks(robot_id)
    }

    pub fn status_counts(&self) -> StatusCounts {
        self.store.status_counts()
    }

    pub fn status_report(&self) -> StatusReport {
        StatusReport::from_snapshot(&self.store.snapshot())
    }

    /// Fixed-format text report, one fact per line.
    pub fn system_status(&self) -> String {
        self.status_report().counts_text()
    }

    pub fn fleet_view(&self) -> FleetView {
        FleetView::from_snapshot(&self.store.snapshot())
    }

    fn record_counts(&self, assignments: &AssignmentMap) {
        let counts = self.store.status_counts();
        self.metrics.tasks.set(counts.tasks as i64);
        self.metrics.tasks_completed.set(counts.completed_tasks as i64);
        self.metrics.assignments_active.set(assignments.len() as i64);
    }
}

/// Pairs in `current` that `previous` did not already hold, in task id order.
fn new_pairs(previous: &AssignmentMap, current: &AssignmentMap) -> Vec<Announcement> {
    current
        .iter()
        .filter(|&(task_id, robot_id)| previous.get(task_id) != Some(robot_id))
        .map(|(&task_id, &robot_id)| Announcement { task_id, robot_id })
        .collect()
}
