//! Data Transfer Objects for API requests and responses

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use gantry_core::{Template, TemplateTag, TemplateWithMetrics};

// ============================================================================
// Generic Response Types
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: ApiError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, String>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub offset: u32,
    pub limit: u32,
    pub has_more: bool,
}

/// Pagination query parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationParams {
    #[serde(default)]
    pub offset: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 20,
        }
    }
}

impl PaginationParams {
    /// Clamp the limit to the service maximum
    pub fn clamped(&self) -> (u32, u32) {
        (self.offset, self.limit.min(100))
    }
}

// ============================================================================
// Template DTOs
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTemplateRequest {
    pub namespace: String,
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintainer: Option<String>,
    pub config: serde_json::Value,
    #[serde(default)]
    pub labels: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TemplateResponse {
    pub id: String,
    pub pipeline_id: String,
    pub namespace: String,
    pub name: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maintainer: Option<String>,
    pub config: serde_json::Value,
    pub labels: Vec<String>,
    pub trusted: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Template> for TemplateResponse {
    fn from(template: &Template) -> Self {
        Self {
            id: template.id.to_string(),
            pipeline_id: template.pipeline_id.to_string(),
            namespace: template.namespace.clone(),
            name: template.name.clone(),
            version: template.version.clone(),
            description: template.description.clone(),
            maintainer: template.maintainer.clone(),
            config: template.config.clone(),
            labels: template.labels.clone(),
            trusted: template.trusted,
            created_at: template.created_at.to_rfc3339(),
            updated_at: template.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TemplateMetricsResponse {
    #[serde(flatten)]
    pub template: TemplateResponse,
    pub jobs: i64,
    pub builds: i64,
}

impl From<&TemplateWithMetrics> for TemplateMetricsResponse {
    fn from(entry: &TemplateWithMetrics) -> Self {
        Self {
            template: TemplateResponse::from(&entry.template),
            jobs: entry.metrics.jobs,
            builds: entry.metrics.builds,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TemplateTagResponse {
    pub namespace: String,
    pub name: String,
    pub tag: String,
    pub version: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&TemplateTag> for TemplateTagResponse {
    fn from(tag: &TemplateTag) -> Self {
        Self {
            namespace: tag.namespace.clone(),
            name: tag.name.clone(),
            tag: tag.tag.clone(),
            version: tag.version.clone(),
            created_at: tag.created_at.to_rfc3339(),
            updated_at: tag.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PutTagRequest {
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateTrustedRequest {
    pub trusted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTemplatesQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(default)]
    pub offset: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults() {
        let params: PaginationParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.offset, 0);
        assert_eq!(params.limit, 20);
    }

    #[test]
    fn test_pagination_clamps_limit() {
        let params = PaginationParams {
            offset: 5,
            limit: 5000,
        };
        assert_eq!(params.clamped(), (5, 100));
    }

    #[test]
    fn test_create_request_defaults_labels() {
        let request: CreateTemplateRequest = serde_json::from_str(
            r#"{"namespace": "tools", "name": "deploy", "version": "1.0.0", "config": {}}"#,
        )
        .unwrap();
        assert!(request.labels.is_empty());
        assert!(request.description.is_none());
    }
}
