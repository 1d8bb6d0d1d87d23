//! Template version handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::info;

use gantry_core::{Credential, GantryError, TemplateRepository};

use crate::dto::{
    PaginatedResponse, PaginationParams, TemplateMetricsResponse, TemplateResponse,
};
use crate::error::{map_error, ErrorResponse};
use crate::state::AppState;

/// List all versions of a template, newest first
pub async fn list_versions(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedResponse<TemplateResponse>>, ErrorResponse> {
    let (offset, limit) = pagination.clamped();

    let versions = state
        .template_repo
        .list_versions(&namespace, &name, offset, limit)
        .await
        .map_err(map_error)?;

    let items: Vec<TemplateResponse> = versions.iter().map(TemplateResponse::from).collect();
    let has_more = items.len() as u32 == limit;

    Ok(Json(PaginatedResponse {
        items,
        offset,
        limit,
        has_more,
    }))
}

/// List all versions of a template with usage metrics
pub async fn list_versions_with_metrics(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedResponse<TemplateMetricsResponse>>, ErrorResponse> {
    let (offset, limit) = pagination.clamped();

    let versions = state
        .template_repo
        .list_versions_with_metrics(&namespace, &name, offset, limit)
        .await
        .map_err(map_error)?;

    let items: Vec<TemplateMetricsResponse> =
        versions.iter().map(TemplateMetricsResponse::from).collect();
    let has_more = items.len() as u32 == limit;

    Ok(Json(PaginatedResponse {
        items,
        offset,
        limit,
        has_more,
    }))
}

/// Remove one version of a template
pub async fn remove_version(
    State(state): State<AppState>,
    Extension(credential): Extension<Credential>,
    Path((namespace, name, version)): Path<(String, String, String)>,
) -> Result<StatusCode, ErrorResponse> {
    let template = state
        .template_repo
        .get_version(&namespace, &name, &version)
        .await
        .map_err(map_error)?
        .ok_or_else(|| {
            map_error(GantryError::not_found(
                "Template",
                format!("{}/{}@{}", namespace, name, version),
            ))
        })?;

    state
        .resolver
        .can_remove(&credential, &template, "admin")
        .await
        .map_err(map_error)?;

    state
        .template_repo
        .delete_version(&namespace, &name, &version)
        .await
        .map_err(map_error)?;

    info!("Removed template version {}/{}@{}", namespace, name, version);
    Ok(StatusCode::NO_CONTENT)
}
