//! Best-effort announcement of allocation decisions over a datagram transport.

use crate::metrics::SwarmMetrics;
use crate::types::{RobotId, TaskId};
use prometheus::IntCounter;
use std::collections::HashMap;
use std::fmt;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Largest datagram `UdpTransport` will read.
pub const MAX_DATAGRAM_LEN: usize = 1024;
const SEND_TIMEOUT: Duration = Duration::from_millis(250);

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("socket I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("no address resolved for '{0}'")]
    Unresolved(String),
    #[error("transport unavailable: {0}")]
    Unavailable(String),
}

/// Datagram send/receive primitive the channel delivers through.
pub trait Transport: Send + Sync {
    fn send_to(&self, payload: &[u8], addr: SocketAddr) -> Result<usize, TransportError>;
    fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), TransportError>;
}

/// `Transport` over a UDP socket.
pub struct UdpTransport {
    socket: UdpSocket,
}

impl UdpTransport {
    /// Binds to `addr`. Sends are bounded by a short write timeout.
    pub fn bind(addr: impl ToSocketAddrs) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_write_timeout(Some(SEND_TIMEOUT))?;
        Ok(Self { socket })
    }

    /// Bounds how long `recv_from` blocks. `None` blocks indefinitely.
    pub fn set_read_timeout(&self, timeout: Option<Duration>) -> Result<(), TransportError> {
        self.socket.set_read_timeout(timeout)?;
        Ok(())
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.socket.local_addr()?)
    }

    /// Receives the next datagram as text, truncated to `MAX_DATAGRAM_LEN` bytes.
    pub fn recv_message(&self) -> Result<(String, SocketAddr), TransportError> {
        let mut buf = [0u8; MAX_DATAGRAM_LEN];
        let (len, from) = self.recv_from(&mut buf)?;
        Ok((String::from_utf8_lossy(&buf[..len]).into_owned(), from))
    }
}

impl Transport for UdpTransport {
    fn send_to(&self, payload: &[u8], addr: SocketAddr) -> Result<usize, TransportError> {
        Ok(self.socket.send_to(payload, addr)?)
    }

    fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr), TransportError> {
        Ok(self.socket.recv_from(buf)?)
    }
}

/// Resolves `host:port` strings, e.g. from configuration.
pub fn resolve_addr(addr: &str) -> Result<SocketAddr, TransportError> {
    addr.to_socket_addrs()?
        .next()
        .ok_or_else(|| TransportError::Unresolved(addr.to_owned()))
}

/// One newly decided (task, robot) pair. Wire form: `TASK <task_id> ROBOT <robot_id>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Announcement {
    pub task_id: TaskId,
    pub robot_id: RobotId,
}

impl fmt::Display for Announcement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TASK {} ROBOT {}", self.task_id, self.robot_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed announcement: {0:?}")]
pub struct AnnouncementParseError(pub String);

impl FromStr for Announcement {
    type Err = AnnouncementParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || AnnouncementParseError(s.to_owned());
        let mut parts = s.split_whitespace();
        match (parts.next(), parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some("TASK"), Some(task), Some("ROBOT"), Some(robot), None) => Ok(Self {
                task_id: task.parse().map_err(|_| malformed())?,
                robot_id: robot.parse().map_err(|_| malformed())?,
            }),
            _ => Err(malformed()),
        }
    }
}

/// Where announcements and broadcasts are delivered.
#[derive(Debug, Clone, Default)]
pub struct Destinations {
    /// Per-robot listener address.
    pub robots: HashMap<RobotId, SocketAddr>,
    /// Receives every announcement and broadcast.
    pub observers: Vec<SocketAddr>,
}

impl Destinations {
    /// Robot addresses indexed by robot id, plus observers.
    pub fn new(robot_addrs: Vec<SocketAddr>, observers: Vec<SocketAddr>) -> Self {
        Self {
            robots: robot_addrs.into_iter().enumerate().collect(),
            observers,
        }
    }
}

/// Fire-and-forget fan-out of allocation decisions. Failures are logged and counted, never
/// returned and never retried.
pub struct NotificationChannel {
    transport: Arc<dyn Transport>,
    destinations: Destinations,
    metrics: Arc<SwarmMetrics>,
}

impl NotificationChannel {
    pub fn new(
        transport: Arc<dyn Transport>,
        destinations: Destinations,
        metrics: Arc<SwarmMetrics>,
    ) -> Self {
        Self {
            transport,
            destinations,
            metrics,
        }
    }

    /// Sends the pair to the assigned robot and to every observer.
    pub fn announce(&self, task_id: TaskId, robot_id: RobotId) {
        let announcement = Announcement { task_id, robot_id };
        tracing::info!(task_id, robot_id, "Task allocated");

        let payload = announcement.to_string();
        let targets = self
            .destinations
            .robots
            .get(&robot_id)
            .into_iter()
            .chain(self.destinations.observers.iter());
        for addr in targets {
            self.deliver(payload.as_bytes(), *addr, &self.metrics.announcements_sent_total);
        }
    }

    /// Sends an out-of-band message to every robot and observer.
    pub fn broadcast(&self, message: &str) {
        tracing::info!(payload = message, "Broadcasting");
        let mut robots: Vec<_> = self.destinations.robots.iter().collect();
        robots.sort_by_key(|(id, _)| **id);
        let targets = robots
            .into_iter()
            .map(|(_, addr)| addr)
            .chain(self.destinations.observers.iter());
        for addr in targets {
            self.deliver(message.as_bytes(), *addr, &self.metrics.broadcasts_sent_total);
        }
    }

    fn deliver(&self, payload: &[u8], addr: SocketAddr, sent: &IntCounter) {
        match self.transport.send_to(payload, addr) {
            Ok(_) => sent.inc(),
            Err(e) => {
                self.metrics.announcement_failures_total.inc();
                tracing::warn!(error = %e, %addr, "Send error");
            }
        }
    }
}
