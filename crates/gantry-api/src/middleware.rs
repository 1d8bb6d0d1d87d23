//! API middleware for rate limiting

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::clock::Clock;
use serde::Serialize;
use std::net::SocketAddr;
use tracing::warn;

use crate::state::AppState;

/// Rate limit exceeded error with standard headers
#[derive(Debug, Serialize)]
pub struct RateLimitError {
    pub error: String,
    pub message: String,
    pub retry_after_seconds: u64,
}

impl IntoResponse for RateLimitError {
    fn into_response(self) -> Response {
        let retry_after = self.retry_after_seconds.to_string();
        let body = Json(&self);
        let mut response = (StatusCode::TOO_MANY_REQUESTS, body).into_response();

        if let Ok(value) = HeaderValue::from_str(&retry_after) {
            response.headers_mut().insert("Retry-After", value);
        }

        response
    }
}

/// Middleware: per-IP request rate limiting
pub async fn rate_limit(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> std::result::Result<Response, RateLimitError> {
    let key = addr.ip().to_string();

    match state.rate_limiter.check_key(&key) {
        Ok(_) => Ok(next.run(request).await),
        Err(not_until) => {
            let clock = governor::clock::DefaultClock::default();
            let retry_after = not_until.wait_time_from(clock.now());
            warn!(ip = %key, "Rate limit exceeded");

            Err(RateLimitError {
                error: "rate_limited".to_string(),
                message: "Too many requests".to_string(),
                retry_after_seconds: retry_after.as_secs().max(1),
            })
        }
    }
}
