// swarm/crates/swarm_controller/src/main.rs
mod http;
mod robot_manager;

use crate::robot_manager::{RobotManager, RobotManagerConfig};
use anyhow::Context;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use swarm_core::{
    notify::resolve_addr, AllocationEngine, Destinations, NotificationChannel, StateStore,
    SwarmController, SwarmMetrics, Task, UdpTransport,
};
use tokio::sync::watch;
use tracing_subscriber::{fmt, EnvFilter};

/// Holds all configuration for the swarm_controller application.
#[derive(Debug, Clone)]
struct Config {
    num_robots: usize,
    update_min: Duration,
    update_jitter: Duration,
    status_interval: Duration,
    metrics_listen_addr: SocketAddr,
    notify_bind_addr: String,
    robot_addrs: Vec<SocketAddr>,
    observer_addrs: Vec<SocketAddr>,
}

impl Config {
    /// Parses configuration from environment variables.
    fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            num_robots: std::env::var("SWARM_NUM_ROBOTS")
                .unwrap_or_else(|_| "5".into())
                .parse()
                .context("Failed to parse SWARM_NUM_ROBOTS")?,
            update_min: Duration::from_millis(
                std::env::var("SWARM_UPDATE_MIN_MS")
                    .unwrap_or_else(|_| "500".into())
                    .parse()
                    .context("Failed to parse SWARM_UPDATE_MIN_MS")?,
            ),
            update_jitter: Duration::from_millis(
                std::env::var("SWARM_UPDATE_JITTER_MS")
                    .unwrap_or_else(|_| "1500".into())
                    .parse()
                    .context("Failed to parse SWARM_UPDATE_JITTER_MS")?,
            ),
            status_interval: Duration::from_millis(
                std::env::var("SWARM_STATUS_INTERVAL_MS")
                    .unwrap_or_else(|_| "5000".into())
                    .parse()
                    .context("Failed to parse SWARM_STATUS_INTERVAL_MS")?,
            ),
            metrics_listen_addr: std::env::var("SWARM_METRICS_LISTEN_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:9091".into())
                .parse()
                .context("Failed to parse SWARM_METRICS_LISTEN_ADDR")?,
            notify_bind_addr: std::env::var("SWARM_NOTIFY_BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:0".into()),
            robot_addrs: parse_addr_list(&std::env::var("SWARM_ROBOT_ADDRS").unwrap_or_default())
                .context("Failed to parse SWARM_ROBOT_ADDRS")?,
            observer_addrs: parse_addr_list(
                &std::env::var("SWARM_OBSERVER_ADDRS").unwrap_or_default(),
            )
            .context("Failed to parse SWARM_OBSERVER_ADDRS")?,
        })
    }
}

/// Comma separated `host:port` list; blank entries are skipped.
fn parse_addr_list(raw: &str) -> anyhow::Result<Vec<SocketAddr>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| resolve_addr(s).with_context(|| format!("Invalid address '{s}'")))
        .collect()
}

fn seed_tasks() -> Vec<Task> {
    vec![
        Task::new(1, "Inspect area A", 1, 10.0, 10.0),
        Task::new(2, "Transport item to B", 2, 30.0, 40.0),
        Task::new(3, "Clean area C", 3, 70.0, 20.0),
        Task::new(4, "Monitor perimeter", 1, 50.0, 50.0),
    ]
}

/// Adds `tasks` on the blocking pool; each addition recomputes and may send datagrams.
async fn seed(swarm: Arc<SwarmController>, tasks: Vec<Task>) -> anyhow::Result<usize> {
    tokio::task::spawn_blocking(move || {
        tasks
            .into_iter()
            .map(|task| swarm.add_task(task).len())
            .sum::<usize>()
    })
    .await
    .context("Task seeding panicked")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let config = Config::from_env()?;
    tracing::info!(config = ?config, "Loaded configuration");

    let (shutdown_tx, shutdown_rx) = watch::channel(());

    let metrics = Arc::new(SwarmMetrics::new());
    let transport = UdpTransport::bind(config.notify_bind_addr.as_str())
        .with_context(|| {
            format!("Failed to bind notification socket on {}", config.notify_bind_addr)
        })?;
    let channel = NotificationChannel::new(
        Arc::new(transport),
        Destinations::new(config.robot_addrs.clone(), config.observer_addrs.clone()),
        metrics.clone(),
    );
    let swarm = Arc::new(SwarmController::new(
        Arc::new(StateStore::new(config.num_robots)),
        AllocationEngine::new(),
        channel,
        metrics.clone(),
    ));

    // Spawn the robot update sources
    let robot_manager_config = RobotManagerConfig {
        num_robots: config.num_robots,
        update_min: config.update_min,
        update_jitter: config.update_jitter,
    };
    let robot_manager_handle =
        RobotManager::spawn(robot_manager_config, swarm.clone(), shutdown_rx.clone());

    // Spawn the metrics / status server
    let http_handle = {
        let router = http::router(swarm.clone(), metrics.clone());
        let addr = config.metrics_listen_addr;
        tokio::spawn(async move {
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("Failed to bind HTTP listener on {addr}"))?;
            tracing::info!(addr = %addr, "Metrics server started");
            axum::serve(listener, router.into_make_service()).await?;
            Ok::<(), anyhow::Error>(())
        })
    };

    seed(swarm.clone(), seed_tasks()).await?;

    // Periodic status report
    let status_handle = {
        let swarm = swarm.clone();
        let interval = config.status_interval;
        let mut shutdown_rx = shutdown_rx.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    _ = ticker.tick() => {
                        let report = swarm.status_report();
                        tracing::info!(
                            robots = report.robots,
                            tasks = report.tasks,
                            completed_tasks = report.completed_tasks,
                            report = %report,
                            "Swarm status"
                        );
                    }
                }
            }
        })
    };

    tracing::info!("All services started. Awaiting shutdown signal...");

    shutdown_signal().await;

    tracing::info!("Shutdown signal received. Terminating services...");
    // The drop of the sender will cause all receivers to receive the shutdown signal.
    drop(shutdown_tx);

    let (robot_res, status_res) = tokio::join!(robot_manager_handle, status_handle);
    if let Err(e) = robot_res {
        tracing::error!(error = %e, "Robot manager task failed.");
    }
    if let Err(e) = status_res {
        tracing::error!(error = %e, "Status task failed.");
    }
    http_handle.abort();

    tracing::info!(status = %swarm.system_status(), "Controller shut down gracefully.");
    Ok(())
}

/// Listens for OS shutdown signals (SIGINT, SIGTERM) and resolves when one is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
