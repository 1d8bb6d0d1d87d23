//! Template management handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use gantry_core::{
    Credential, GantryError, PipelineLookup, Scope, Template, TemplateId, TemplateRepository,
    TemplateTagRepository,
};

use crate::dto::{
    ApiResponse, CreateTemplateRequest, ListTemplatesQuery, PaginatedResponse, TemplateResponse,
    UpdateTrustedRequest,
};
use crate::error::{failure, map_error, validation_failure, ErrorResponse};
use crate::state::AppState;
use crate::validation::Validator;

#[derive(Debug, Deserialize)]
pub struct GetTemplateQuery {
    pub version: Option<String>,
}

/// Publish a new template version.
///
/// Only build credentials may publish, never from a pull request, and a
/// template name stays bound to the pipeline that first published it.
pub async fn create_template(
    State(state): State<AppState>,
    Extension(credential): Extension<Credential>,
    Json(request): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<ApiResponse<TemplateResponse>>), ErrorResponse> {
    let mut v = Validator::new();
    v.name("namespace", &request.namespace)
        .name("name", &request.name)
        .version("version", &request.version)
        .description("description", request.description.as_deref())
        .labels("labels", &request.labels)
        .config("config", &request.config);
    v.validate().map_err(validation_failure)?;

    if credential.role() != Scope::Build || credential.is_pr {
        return Err(map_error(GantryError::forbidden(
            "Templates can only be published by build credentials",
        )));
    }
    let pipeline_id = credential.pipeline_id.ok_or_else(|| {
        map_error(GantryError::invalid_input(
            "Build credential is missing a pipeline id",
        ))
    })?;

    state
        .pipeline_repo
        .get(pipeline_id)
        .await
        .map_err(map_error)?
        .ok_or_else(|| map_error(GantryError::not_found("Pipeline", pipeline_id)))?;

    // A template name belongs to the pipeline that first published it
    if let Some(existing) = state
        .template_repo
        .get_latest(&request.namespace, &request.name)
        .await
        .map_err(map_error)?
    {
        if existing.pipeline_id != pipeline_id {
            warn!(
                template = %existing.full_name(),
                owner = %existing.pipeline_id,
                publisher = %pipeline_id,
                "Rejected publish against a template owned by another pipeline"
            );
            return Err(map_error(GantryError::forbidden(
                "Not allowed to publish this template",
            )));
        }
    }

    let now = Utc::now();
    let template = Template {
        id: TemplateId::new(),
        pipeline_id,
        namespace: request.namespace,
        name: request.name,
        version: request.version,
        description: request.description,
        maintainer: request.maintainer,
        config: request.config,
        labels: request.labels,
        trusted: false,
        created_at: now,
        updated_at: now,
    };

    let created = state
        .template_repo
        .create(&template)
        .await
        .map_err(map_error)?;

    info!("Published template {}@{}", created.full_name(), created.version);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(TemplateResponse::from(&created))),
    ))
}

/// List the latest version of each template
pub async fn list_templates(
    State(state): State<AppState>,
    Query(query): Query<ListTemplatesQuery>,
) -> Result<Json<PaginatedResponse<TemplateResponse>>, ErrorResponse> {
    let offset = query.offset;
    let limit = query.limit.min(100);

    let templates = state
        .template_repo
        .list_latest(query.namespace.as_deref(), offset, limit)
        .await
        .map_err(map_error)?;

    let items: Vec<TemplateResponse> = templates.iter().map(TemplateResponse::from).collect();
    let has_more = items.len() as u32 == limit;

    Ok(Json(PaginatedResponse {
        items,
        offset,
        limit,
        has_more,
    }))
}

/// Get one template: the latest version, or an exact version via `?version=`
pub async fn get_template(
    State(state): State<AppState>,
    Path((namespace, name)): Path<(String, String)>,
    Query(query): Query<GetTemplateQuery>,
) -> Result<Json<ApiResponse<TemplateResponse>>, ErrorResponse> {
    let template = match query.version.as_deref() {
        Some(version) => {
            state
                .template_repo
                .get_version(&namespace, &name, version)
                .await
        }
        None => state.template_repo.get_latest(&namespace, &name).await,
    }
    .map_err(map_error)?
    .ok_or_else(|| {
        map_error(GantryError::not_found(
            "Template",
            format!("{}/{}", namespace, name),
        ))
    })?;

    Ok(Json(ApiResponse::ok(TemplateResponse::from(&template))))
}

/// Get a template version by its id
pub async fn get_template_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<TemplateResponse>>, ErrorResponse> {
    let template_id: TemplateId = id
        .parse()
        .map_err(|_| failure(StatusCode::BAD_REQUEST, "INVALID_ID", "Invalid template ID format"))?;

    let template = state
        .template_repo
        .get_by_id(template_id)
        .await
        .map_err(map_error)?
        .ok_or_else(|| map_error(GantryError::not_found("Template", template_id)))?;

    Ok(Json(ApiResponse::ok(TemplateResponse::from(&template))))
}

/// Remove a template with all of its versions and tags
pub async fn remove_template(
    State(state): State<AppState>,
    Extension(credential): Extension<Credential>,
    Path((namespace, name)): Path<(String, String)>,
) -> Result<StatusCode, ErrorResponse> {
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
        .delete_all(&namespace, &name)
        .await
        .map_err(map_error)?;
    let removed = state
        .template_repo
        .delete_all(&namespace, &name)
        .await
        .map_err(map_error)?;

    info!("Removed template {}/{} ({} versions)", namespace, name, removed);
    Ok(StatusCode::NO_CONTENT)
}

/// Mark or unmark a template as trusted; platform admins only
pub async fn update_trusted(
    State(state): State<AppState>,
    Extension(credential): Extension<Credential>,
    Path((namespace, name)): Path<(String, String)>,
    Json(request): Json<UpdateTrustedRequest>,
) -> Result<StatusCode, ErrorResponse> {
    if !credential.has_scope(Scope::Admin) {
        return Err(map_error(GantryError::forbidden(
            "Only platform admins may change the trusted flag",
        )));
    }

    let updated = state
        .template_repo
        .update_trusted(&namespace, &name, request.trusted)
        .await
        .map_err(map_error)?;

    if updated == 0 {
        return Err(map_error(GantryError::not_found(
            "Template",
            format!("{}/{}", namespace, name),
        )));
    }

    info!(
        "Template {}/{} trusted flag set to {} across {} versions",
        namespace, name, request.trusted, updated
    );
    Ok(StatusCode::NO_CONTENT)
}
