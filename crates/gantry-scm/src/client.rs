//! HTTP client for the SCM connector service
//!
//! The connector fronts the actual SCM providers (GitHub, GitLab, ...) and
//! answers one question this service cares about: what rights does a user
//! hold on an SCM location. Provider internals stay behind the connector.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, instrument};

use gantry_core::{GantryError, PermissionSet, Result};

/// Configuration for the SCM connector connection
#[derive(Debug, Clone)]
pub struct ScmConfig {
    /// Connector base URL (e.g. "http://localhost:9001")
    pub endpoint: String,
    /// Bearer token for service-to-service authentication
    pub token: String,
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for ScmConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:9001".to_string(),
            token: String::new(),
            connect_timeout_ms: 5000,
            request_timeout_ms: 30000,
        }
    }
}

/// Wire shape of the connector's permissions response
#[derive(Debug, Deserialize)]
struct PermissionsResponse {
    permissions: PermissionSet,
}

/// SCM connector client providing typed access to permission queries
#[derive(Clone)]
pub struct ScmClient {
    http: reqwest::Client,
    endpoint: Arc<String>,
    token: Arc<String>,
}

impl ScmClient {
    /// Create a new SCM connector client
    #[instrument(skip(config), fields(endpoint = %config.endpoint))]
    pub fn new(config: ScmConfig) -> Result<Self> {
        let endpoint = config.endpoint.trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            return Err(GantryError::scm_error("Connector endpoint is empty"));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| GantryError::scm_error(format!("Failed to build client: {}", e)))?;

        Ok(Self {
            http,
            endpoint: Arc::new(endpoint),
            token: Arc::new(config.token),
        })
    }

    /// Query a user's permission set on an SCM location.
    ///
    /// Always a fresh query; the connector owns any caching policy.
    #[instrument(skip(self))]
    pub async fn permissions(
        &self,
        scm_context: &str,
        scm_uri: &str,
        username: &str,
    ) -> Result<PermissionSet> {
        debug!("Querying SCM permissions");

        let url = format!("{}/v1/permissions", self.endpoint);
        let response = self
            .http
            .get(&url)
            .bearer_auth(self.token.as_str())
            .query(&[
                ("scmContext", scm_context),
                ("scmUri", scm_uri),
                ("username", username),
            ])
            .send()
            .await
            .map_err(|e| GantryError::scm_error(format!("Permission query failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(GantryError::scm_error(format!(
                "Connector returned {} for permission query",
                response.status()
            )));
        }

        let body: PermissionsResponse = response
            .json()
            .await
            .map_err(|e| GantryError::scm_error(format!("Invalid permissions payload: {}", e)))?;

        Ok(body.permissions)
    }

    /// Check if the connector is reachable
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/v1/status", self.endpoint);
        match self.http.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                debug!("SCM connector health check failed: {}", e);
                Ok(false)
            }
        }
    }
}

impl std::fmt::Debug for ScmClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScmClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}
