use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use prometheus::{Encoder, TextEncoder};
use std::sync::Arc;
use swarm_core::{SwarmController, SwarmMetrics};

/// `/metrics`, `/status` (text report) and `/api/swarm_data` (JSON fleet view).
pub fn router(swarm: Arc<SwarmController>, metrics: Arc<SwarmMetrics>) -> Router {
    let registry = metrics.registry.clone();
    let status_swarm = swarm.clone();
    Router::new()
        .route(
            "/metrics",
            get(move || {
                let registry = registry.clone();
                async move {
                    let metric_families = registry.gather();
                    let mut buffer = Vec::new();
                    match TextEncoder::new().encode(&metric_families, &mut buffer) {
                        Ok(()) => String::from_utf8_lossy(&buffer).into_owned().into_response(),
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to encode metrics");
                            StatusCode::INTERNAL_SERVER_ERROR.into_response()
                        }
                    }
                }
            }),
        )
        .route(
            "/status",
            get(move || {
                let swarm = status_swarm.clone();
                async move { swarm.status_report().to_string() }
            }),
        )
        .route(
            "/api/swarm_data",
            get(move || {
                let swarm = swarm.clone();
                async move {
                    match swarm.fleet_view().to_json() {
                        Ok(body) => {
                            ([(header::CONTENT_TYPE, "application/json")], body).into_response()
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to serialize fleet view");
                            StatusCode::INTERNAL_SERVER_ERROR.into_response()
                        }
                    }
                }
            }),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::net::SocketAddr;
    use swarm_core::{
        AllocationEngine, Destinations, NotificationChannel, Robot, StateStore, Task,
        Transport, TransportError,
    };
    use tower::ServiceExt;

    struct NullTransport;

    impl Transport for NullTransport {
        fn send_to(&self, payload: &[u8], _addr: SocketAddr) -> Result<usize, TransportError> {
            Ok(payload.len())
        }

        fn recv_from(&self, _buf: &mut [u8]) -> Result<(usize, SocketAddr), TransportError> {
            Err(TransportError::Unavailable("send only".into()))
        }
    }

    fn test_router() -> Router {
        let metrics = Arc::new(SwarmMetrics::new());
        let swarm = Arc::new(SwarmController::new(
            Arc::new(StateStore::with_robots(vec![Robot::new(0, 0.0, 0.0, 100.0)])),
            AllocationEngine::new(),
            NotificationChannel::new(
                Arc::new(NullTransport),
                Destinations::default(),
                metrics.clone(),
            ),
            metrics.clone(),
        ));
        swarm.add_task(Task::new(1, "Inspect area A", 1, 10.0, 10.0));
        router(swarm, metrics)
    }

    async fn get_body(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn status_endpoint_serves_text_report() {
        let (status, body) = get_body(test_router(), "/status").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.starts_with("Swarm Status:\nRobots: 1\nTasks: 1\nCompleted Tasks: 0\n"));
        assert!(body.contains("Robot 0 has tasks: 1"));
    }

    #[tokio::test]
    async fn swarm_data_endpoint_serves_json() {
        let (status, body) = get_body(test_router(), "/api/swarm_data").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("\"allocations\":{\"1\":0}"));
    }

    #[tokio::test]
    async fn metrics_endpoint_exposes_swarm_counters() {
        let (status, body) = get_body(test_router(), "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("swarm_recomputes_total 1"));
        assert!(body.contains("swarm_announcements_sent_total 0"));
    }
}
