//! Template tag handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use tracing::info;

use gantry_core::{
    Credential, GantryError, TemplateRepository, TemplateTag, TemplateTagId, TemplateTagRepository,
};

use crate::dto::{
    ApiResponse, PaginatedResponse, PaginationParams, PutTagRequest, TemplateTagResponse,
};
use crate::error::{map_error, validation_failure, ErrorResponse};
use crate::state::AppState;
use crate::validation::Validator;

/// List a template's tags
pub async fn list_tags(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Json<PaginatedResponse<TemplateTagResponse>>, ErrorResponse> {
    let (offset, limit) = pagination.clamped();

    let tags = state
        .tag_repo
        .list(&namespace, &name, offset, limit)
        .await
        .map_err(map_error)?;

    let items: Vec<TemplateTagResponse> = tags.iter().map(TemplateTagResponse::from).collect();
    let has_more = items.len() as u32 == limit;

    Ok(Json(PaginatedResponse {
        items,
        offset,
        limit,
        has_more,
    }))
}

/// Create a tag or repoint it at another version
pub async fn put_tag(
    State(state): State<AppState>,
    Extension(credential): Extension<Credential>,
    Path((namespace, name, tag)): Path<(String, String, String)>,
    Json(request): Json<PutTagRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TemplateTagResponse>>), ErrorResponse> {
    let mut v = Validator::new();
    v.tag("tag", &tag).version("version", &request.version);
    v.validate().map_err(validation_failure)?;

    // The tag must point at a version that actually exists
    let template = state
        .template_repo
        .get_version(&namespace, &name, &request.version)
        .await
        .map_err(map_error)?
        .ok_or_else(|| {
            map_error(GantryError::not_found(
                "Template",
                format!("{}/{}@{}", namespace, name, request.version),
            ))
        })?;

    state
        .resolver
        .can_remove(&credential, &template, "push")
        .await
        .map_err(map_error)?;

    let now = Utc::now();
    let record = TemplateTag {
        id: TemplateTagId::new(),
        namespace: namespace.clone(),
        name: name.clone(),
        tag: tag.clone(),
        version: request.version,
        created_at: now,
        updated_at: now,
    };

    let (stored, created) = state.tag_repo.upsert(&record).await.map_err(map_error)?;

    info!(
        "Tag {}/{}:{} now points at {}",
        namespace, name, tag, stored.version
    );

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(ApiResponse::ok(TemplateTagResponse::from(&stored)))))
}

/// Remove a tag
pub async fn remove_tag(
    State(state): State<AppState>,
    Extension(credential): Extension<Credential>,
    Path((namespace, name, tag)): Path<(String, String, String)>,
) -> Result<StatusCode, ErrorResponse> {
    state
        .tag_repo
        .get(&namespace, &name, &tag)
        .await
        .map_err(map_error)?
        .ok_or_else(|| {
            map_error(GantryError::not_found(
                "Template tag",
                format!("{}/{}:{}", namespace, name, tag),
            ))
        })?;

    // Permission context comes from the template the tag belongs to
    let template = state
        .template_repo
        .get_latest(&namespace, &name)
        .await
        .map_err(map_error)?
        .ok_or_else(|| {
            map_error(GantryError::not_found(
                "Template",
                format!("{}/{}", namespace, name),
            ))
        })?;

    state
        .resolver
        .can_remove(&credential, &template, "admin")
        .await
        .map_err(map_error)?;

    state
        .tag_repo
        .delete(&namespace, &name, &tag)
        .await
        .map_err(map_error)?;

    info!("Removed tag {}/{}:{}", namespace, name, tag);
    Ok(StatusCode::NO_CONTENT)
}
