//! Health check handlers
//!
//! Follows Kubernetes health check patterns:
//! - /health - comprehensive status
//! - /health/live - simple liveness (is the process running?)
//! - /health/ready - readiness (can it serve traffic?)

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::state::AppState;

/// Overall health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

/// Individual component health
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub latency_ms: u64,
}

/// Comprehensive health response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: Vec<ComponentHealth>,
}

/// Simple health response for liveness/readiness probes
#[derive(Serialize)]
pub struct SimpleHealthResponse {
    pub status: String,
}

/// Start time for uptime calculation
static START_TIME: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

fn get_uptime_seconds() -> u64 {
    let start = START_TIME.get_or_init(Instant::now);
    start.elapsed().as_secs()
}

/// Comprehensive health check across the database and the SCM connector
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let mut components = Vec::new();
    let mut overall_status = HealthStatus::Healthy;

    let db_health = check_database(&state).await;
    if db_health.status == HealthStatus::Unhealthy {
        overall_status = HealthStatus::Unhealthy;
    }
    components.push(db_health);

    // A dead connector degrades (user-scope checks fail) but the service
    // still answers reads and admin operations
    let scm_health = check_scm(&state).await;
    if scm_health.status != HealthStatus::Healthy && overall_status == HealthStatus::Healthy {
        overall_status = HealthStatus::Degraded;
    }
    components.push(scm_health);

    let response = HealthResponse {
        status: overall_status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: get_uptime_seconds(),
        components,
    };

    let status_code = match overall_status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

/// Check database health
async fn check_database(state: &AppState) -> ComponentHealth {
    let start = Instant::now();

    match tokio::time::timeout(
        Duration::from_secs(5),
        sqlx::query("SELECT 1").fetch_one(&state.db_pool),
    )
    .await
    {
        Ok(Ok(_)) => {
            debug!("Database health check passed");
            ComponentHealth {
                name: "database".to_string(),
                status: HealthStatus::Healthy,
                message: None,
                latency_ms: start.elapsed().as_millis() as u64,
            }
        }
        Ok(Err(e)) => {
            warn!("Database health check failed: {}", e);
            ComponentHealth {
                name: "database".to_string(),
                status: HealthStatus::Unhealthy,
                message: Some(format!("Query failed: {}", e)),
                latency_ms: start.elapsed().as_millis() as u64,
            }
        }
        Err(_) => {
            warn!("Database health check timed out");
            ComponentHealth {
                name: "database".to_string(),
                status: HealthStatus::Unhealthy,
                message: Some("Health check timed out after 5 seconds".to_string()),
                latency_ms: 5000,
            }
        }
    }
}

/// Check SCM connector health
async fn check_scm(state: &AppState) -> ComponentHealth {
    let start = Instant::now();

    match tokio::time::timeout(Duration::from_secs(5), state.scm.health_check()).await {
        Ok(Ok(true)) => {
            debug!("SCM connector health check passed");
            ComponentHealth {
                name: "scm".to_string(),
                status: HealthStatus::Healthy,
                message: None,
                latency_ms: start.elapsed().as_millis() as u64,
            }
        }
        Ok(Ok(false)) => {
            warn!("SCM connector health check returned false");
            ComponentHealth {
                name: "scm".to_string(),
                status: HealthStatus::Degraded,
                message: Some("Connector returned unhealthy status".to_string()),
                latency_ms: start.elapsed().as_millis() as u64,
            }
        }
        Ok(Err(e)) => {
            warn!("SCM connector health check failed: {}", e);
            ComponentHealth {
                name: "scm".to_string(),
                status: HealthStatus::Degraded,
                message: Some(format!("Connection error: {}", e)),
                latency_ms: start.elapsed().as_millis() as u64,
            }
        }
        Err(_) => {
            warn!("SCM connector health check timed out");
            ComponentHealth {
                name: "scm".to_string(),
                status: HealthStatus::Degraded,
                message: Some("Health check timed out after 5 seconds".to_string()),
                latency_ms: 5000,
            }
        }
    }
}

/// Kubernetes liveness probe
pub async fn liveness() -> (StatusCode, Json<SimpleHealthResponse>) {
    (
        StatusCode::OK,
        Json(SimpleHealthResponse {
            status: "alive".to_string(),
        }),
    )
}

/// Kubernetes readiness probe; the database is the only hard dependency
pub async fn readiness(State(state): State<AppState>) -> (StatusCode, Json<SimpleHealthResponse>) {
    let db_ok = matches!(
        tokio::time::timeout(
            Duration::from_secs(2),
            sqlx::query("SELECT 1").fetch_one(&state.db_pool)
        )
        .await,
        Ok(Ok(_))
    );

    if db_ok {
        (
            StatusCode::OK,
            Json(SimpleHealthResponse {
                status: "ready".to_string(),
            }),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(SimpleHealthResponse {
                status: "not ready: database unavailable".to_string(),
            }),
        )
    }
}
