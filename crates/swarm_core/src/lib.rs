//! Concurrent state and assignment subsystem for a robot fleet.
//!
//! Robots report position and energy on their own schedule, tasks arrive from a producer, and
//! every task arrival triggers a full greedy reallocation whose new pairs are announced over a
//! best-effort datagram channel.

pub mod allocation;
pub mod controller;
pub mod metrics;
pub mod notify;
pub mod state;
pub mod status;
pub mod types;

pub use allocation::AllocationEngine;
pub use controller::SwarmController;
pub use metrics::SwarmMetrics;
pub use notify::{
    Announcement, AnnouncementParseError, Destinations, NotificationChannel, Transport,
    TransportError, UdpTransport,
};
pub use state::{StateStore, StatusCounts};
pub use status::{FleetView, StatusReport};
pub use types::{AssignmentMap, Position, Robot, RobotId, Snapshot, Task, TaskId};
