use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use swarm_core::{RobotId, SwarmController};
use tokio::{sync::watch, task::JoinSet, time::sleep};

const ARENA_SIZE: f64 = 100.0;
const MIN_ENERGY: f64 = 20.0;
const MAX_ENERGY: f64 = 100.0;

/// Configuration for the RobotManager.
#[derive(Debug, Clone)]
pub struct RobotManagerConfig {
    pub num_robots: usize,
    pub update_min: Duration,
    pub update_jitter: Duration,
}

/// Drives one simulated update source per robot.
///
/// Each source reports a fresh position and energy level on its own randomized cadence. The
/// sources only feed the store; reallocation happens on task arrival.
pub struct RobotManager {
    config: RobotManagerConfig,
    swarm: Arc<SwarmController>,
}

impl RobotManager {
    /// Spawns every robot's update loop and returns once all of them have stopped.
    pub fn spawn(
        config: RobotManagerConfig,
        swarm: Arc<SwarmController>,
        shutdown_rx: watch::Receiver<()>,
    ) -> tokio::task::JoinHandle<anyhow::Result<()>> {
        let manager = Arc::new(RobotManager { config, swarm });

        tokio::spawn(async move {
            tracing::info!(num_robots = manager.config.num_robots, "RobotManager started.");

            let mut robots = JoinSet::new();
            for robot_id in 0..manager.config.num_robots {
                let manager = manager.clone();
                let shutdown_rx = shutdown_rx.clone();
                robots.spawn(async move { manager.run_robot(robot_id, shutdown_rx).await });
            }

            while let Some(res) = robots.join_next().await {
                if let Err(e) = res {
                    tracing::error!(error = %e, "Robot update loop panicked.");
                }
            }

            tracing::info!("RobotManager has shut down.");
            Ok(())
        })
    }

    /// Publishes random state for one robot until shutdown is signalled.
    async fn run_robot(&self, robot_id: RobotId, mut shutdown_rx: watch::Receiver<()>) {
        tracing::debug!(robot_id, "Robot update loop started");
        loop {
            let (x, y, energy, delay) = self.next_update();
            self.swarm.update_robot_state(robot_id, x, y, energy);
            tracing::trace!(robot_id, x, y, energy, "Robot state reported");

            tokio::select! {
                _ = shutdown_rx.changed() => break,
                _ = sleep(delay) => {}
            }
        }
        tracing::debug!(robot_id, "Robot update loop stopped");
    }

    fn next_update(&self) -> (f64, f64, f64, Duration) {
        let mut rng = rand::thread_rng();
        let jitter_ms = self.config.update_jitter.as_millis() as u64;
        let delay = self.config.update_min
            + Duration::from_millis(if jitter_ms == 0 {
                0
            } else {
                rng.gen_range(0..jitter_ms)
            });
        (
            rng.gen_range(0.0..ARENA_SIZE),
            rng.gen_range(0.0..ARENA_SIZE),
            rng.gen_range(MIN_ENERGY..MAX_ENERGY),
            delay,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use swarm_core::{
        AllocationEngine, Destinations, NotificationChannel, Robot, StateStore, SwarmMetrics,
        Transport, TransportError,
    };

    struct NullTransport;

    impl Transport for NullTransport {
        fn send_to(&self, payload: &[u8], _addr: SocketAddr) -> Result<usize, TransportError> {
            Ok(payload.len())
        }

        fn recv_from(&self, _buf: &mut [u8]) -> Result<(usize, SocketAddr), TransportError> {
            Err(TransportError::Unavailable("send only".into()))
        }
    }

    #[tokio::test]
    async fn robots_report_until_shutdown() {
        let metrics = Arc::new(SwarmMetrics::new());
        let robots = (0..3).map(|id| Robot::new(id, -1.0, -1.0, 0.0)).collect();
        let swarm = Arc::new(SwarmController::new(
            Arc::new(StateStore::with_robots(robots)),
            AllocationEngine::new(),
            NotificationChannel::new(
                Arc::new(NullTransport),
                Destinations::default(),
                metrics.clone(),
            ),
            metrics.clone(),
        ));
        let (shutdown_tx, shutdown_rx) = watch::channel(());
        let config = RobotManagerConfig {
            num_robots: 3,
            update_min: Duration::from_millis(5),
            update_jitter: Duration::from_millis(5),
        };

        let handle = RobotManager::spawn(config, swarm.clone(), shutdown_rx);
        sleep(Duration::from_millis(100)).await;
        drop(shutdown_tx);
        handle.await.unwrap().unwrap();

        assert!(metrics.robot_updates_total.get() >= 3);
        for robot in swarm.store().snapshot().robots {
            assert!((0.0..ARENA_SIZE).contains(&robot.position.x));
            assert!((MIN_ENERGY..MAX_ENERGY).contains(&robot.energy));
        }
    }
}
