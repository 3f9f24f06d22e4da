#![allow(dead_code)]

use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use swarm_core::{
    AllocationEngine, Destinations, NotificationChannel, Robot, StateStore, SwarmController,
    SwarmMetrics, Transport, TransportError,
};

pub const OBSERVER: ([u8; 4], u16) = ([127, 0, 0, 1], 9999);

/// Keeps every payload it is asked to send.
#[derive(Default)]
pub struct RecordingTransport {
    pub sent: Mutex<Vec<String>>,
}

impl Transport for RecordingTransport {
    fn send_to(&self, payload: &[u8], _addr: SocketAddr) -> Result<usize, TransportError> {
        self.sent
            .lock()
            .push(String::from_utf8_lossy(payload).into_owned());
        Ok(payload.len())
    }

    fn recv_from(&self, _buf: &mut [u8]) -> Result<(usize, SocketAddr), TransportError> {
        Err(TransportError::Unavailable("send only".into()))
    }
}

/// Fails every send and counts the attempts.
#[derive(Default)]
pub struct FailingTransport {
    pub attempts: AtomicUsize,
}

impl Transport for FailingTransport {
    fn send_to(&self, _payload: &[u8], _addr: SocketAddr) -> Result<usize, TransportError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(TransportError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "injected failure",
        )))
    }

    fn recv_from(&self, _buf: &mut [u8]) -> Result<(usize, SocketAddr), TransportError> {
        Err(TransportError::Unavailable("send only".into()))
    }
}

/// Builds a controller over `robots` whose announcements reach one observer through `transport`.
pub fn controller_with(
    robots: Vec<Robot>,
    transport: Arc<dyn Transport>,
) -> (SwarmController, Arc<SwarmMetrics>) {
    let metrics = Arc::new(SwarmMetrics::new());
    let channel = NotificationChannel::new(
        transport,
        Destinations::new(Vec::new(), vec![SocketAddr::from(OBSERVER)]),
        metrics.clone(),
    );
    let controller = SwarmController::new(
        Arc::new(StateStore::with_robots(robots)),
        AllocationEngine::new(),
        channel,
        metrics.clone(),
    );
    (controller, metrics)
}

/// Asserts the assignment invariants: known ids, open tasks only, lists match the map.
pub fn assert_invariants(store: &StateStore) {
    let snap = store.snapshot();
    for (task_id, robot_id) in &snap.assignments {
        assert!(*robot_id < snap.robots.len(), "unknown robot {robot_id}");
        let task = snap
            .tasks
            .iter()
            .find(|t| t.id == *task_id)
            .unwrap_or_else(|| panic!("unknown task {task_id}"));
        assert!(!task.completed, "completed task {task_id} is assigned");
    }
    let mut listed = 0;
    for robot in &snap.robots {
        for task_id in &robot.assigned_tasks {
            assert_eq!(snap.assignments.get(task_id), Some(&robot.id));
            listed += 1;
        }
    }
    assert_eq!(listed, snap.assignments.len());
}
