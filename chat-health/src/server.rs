//! The `/health/live` and `/health/ready` HTTP endpoints Kubernetes probes.

use std::{sync::Arc, time::Duration};

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use chat_common::Signal;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;

use crate::{HealthChecker, HealthConfig, HealthError};

pub struct HealthServer {
    listener: TcpListener,
    router: Router,
}

impl HealthServer {
    /// # Errors
    /// Returns an error if binding `config.listen_address` fails.
    pub async fn new(config: HealthConfig, checker: Arc<HealthChecker>) -> Result<Self, HealthError> {
        let listener =
            TcpListener::bind(&config.listen_address)
                .await
                .map_err(|source| HealthError::BindError {
                    address: config.listen_address.clone(),
                    source,
                })?;

        tracing::info!(address = %config.listen_address, "health server bound");

        let router = Router::new()
            .route("/health/live", get(liveness))
            .route("/health/ready", get(readiness))
            .with_state(checker)
            .layer(TimeoutLayer::new(Duration::from_secs(1)));

        Ok(Self { listener, router })
    }

    /// # Errors
    /// Returns an error if the server exits with something other than a
    /// clean graceful shutdown.
    pub async fn serve(self, mut shutdown: tokio::sync::broadcast::Receiver<Signal>) -> Result<(), HealthError> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("health server received shutdown signal");
            })
            .await
            .map_err(|e| HealthError::ServerError(e.to_string()))?;

        Ok(())
    }
}

async fn liveness(State(checker): State<Arc<HealthChecker>>) -> impl IntoResponse {
    if checker.is_alive() {
        (StatusCode::OK, "OK").into_response()
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable").into_response()
    }
}

async fn readiness(State(checker): State<Arc<HealthChecker>>) -> impl IntoResponse {
    if checker.is_ready() {
        (StatusCode::OK, "OK").into_response()
    } else {
        let status = checker.status();
        tracing::warn!(?status, "readiness probe failed");
        (StatusCode::SERVICE_UNAVAILABLE, Json(status)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn liveness_always_passes() {
        let checker = Arc::new(HealthChecker::new(100));
        let response = liveness(State(checker)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn readiness_fails_before_any_component_reports_in() {
        let checker = Arc::new(HealthChecker::new(100));
        let response = readiness(State(checker)).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn readiness_passes_once_everything_is_ready() {
        let checker = Arc::new(HealthChecker::new(100));
        checker.set_gateway_ready(true);
        checker.set_store_ready(true);
        checker.set_cache_ready(true);
        checker.set_queue_ready(true);
        let response = readiness(State(checker)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
