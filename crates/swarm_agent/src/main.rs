mod config;

use crate::config::Config;
use anyhow::Context;
use clap::Parser;
use std::future::Future;
use swarm_core::notify::MAX_DATAGRAM_LEN;
use swarm_core::{Announcement, RobotId, TaskId};
use tokio::net::UdpSocket;
use tracing_subscriber::{fmt, EnvFilter};

/// Tasks announced to one robot, in arrival order.
#[derive(Debug)]
struct Inbox {
    robot_id: RobotId,
    tasks: Vec<TaskId>,
}

impl Inbox {
    fn new(robot_id: RobotId) -> Self {
        Self {
            robot_id,
            tasks: Vec::new(),
        }
    }

    /// Applies one datagram. Returns the announcement if it names this robot.
    fn handle(&mut self, text: &str) -> Option<Announcement> {
        let announcement = match text.parse::<Announcement>() {
            Ok(a) => a,
            Err(e) => {
                tracing::info!(error = %e, "Non-announcement message received");
                return None;
            }
        };
        if announcement.robot_id != self.robot_id {
            tracing::debug!(
                task_id = announcement.task_id,
                robot_id = announcement.robot_id,
                "Announcement for another robot"
            );
            return None;
        }
        if !self.tasks.contains(&announcement.task_id) {
            self.tasks.push(announcement.task_id);
        }
        Some(announcement)
    }
}

/// Feeds datagrams into `inbox` until `shutdown` resolves.
async fn receive_loop(
    socket: UdpSocket,
    mut inbox: Inbox,
    shutdown: impl Future<Output = ()>,
) -> Inbox {
    tokio::pin!(shutdown);
    let mut buf = [0u8; MAX_DATAGRAM_LEN];
    loop {
        let (len, from) = tokio::select! {
            // Drain queued datagrams before stopping.
            biased;
            res = socket.recv_from(&mut buf) => match res {
                Ok(received) => received,
                Err(e) => {
                    tracing::warn!(error = %e, "Receive error");
                    continue;
                }
            },
            _ = &mut shutdown => break,
        };
        let text = String::from_utf8_lossy(&buf[..len]);
        if let Some(a) = inbox.handle(&text) {
            tracing::info!(
                task_id = a.task_id,
                %from,
                tasks = ?inbox.tasks,
                "Received new task assignment"
            );
        }
    }
    inbox
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();
    let config = Config::parse();
    tracing::info!(config = ?config, "Agent starting with configuration");

    let socket = UdpSocket::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    tracing::info!(
        addr = %socket.local_addr()?,
        robot_id = config.robot_id,
        "Listening for announcements"
    );

    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown signal received."),
            Err(e) => {
                tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };
    let inbox = receive_loop(socket, Inbox::new(config.robot_id), shutdown).await;

    tracing::info!(tasks = ?inbox.tasks, "Agent shutting down.");
    Ok(())
}
