//! Mapping from the core error taxonomy to HTTP responses

use axum::{http::StatusCode, Json};

use gantry_core::GantryError;

use crate::dto::{ApiError, ApiResponse};

/// Handler error type: status code plus envelope body
pub type ErrorResponse = (StatusCode, Json<ApiResponse<()>>);

/// Translate a core error into its HTTP representation.
///
/// NotFound and Forbidden come straight from the authorization resolver and
/// keep their messages verbatim; everything else is a supporting-surface
/// failure.
pub fn map_error(error: GantryError) -> ErrorResponse {
    let (status, code) = match &error {
        GantryError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        GantryError::Forbidden { .. } => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        GantryError::InvalidInput { .. } => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
        GantryError::Conflict { .. } => (StatusCode::CONFLICT, "CONFLICT"),
        GantryError::JwtError { .. } => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        GantryError::ScmError { .. } => (StatusCode::BAD_GATEWAY, "SCM_ERROR"),
        GantryError::DatabaseError { .. }
        | GantryError::ConfigError { .. }
        | GantryError::Internal { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL"),
    };

    failure(status, code, &error.to_string())
}

/// Build an error envelope directly
pub fn failure(status: StatusCode, code: &str, message: &str) -> ErrorResponse {
    (
        status,
        Json(ApiResponse::err(ApiError {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        })),
    )
}

/// 400 with a field-level validation breakdown
pub fn validation_failure(errors: Vec<crate::validation::ValidationError>) -> ErrorResponse {
    let details = errors
        .iter()
        .map(|e| (e.field.clone(), e.message.clone()))
        .collect();

    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::err(ApiError {
            code: "VALIDATION_FAILED".to_string(),
            message: "Request validation failed".to_string(),
            details: Some(details),
        })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_404() {
        let (status, body) = map_error(GantryError::not_found("Pipeline", "42"));
        assert_eq!(status, StatusCode::NOT_FOUND);
        let error = body.0.error.unwrap();
        assert_eq!(error.code, "NOT_FOUND");
        assert_eq!(error.message, "Pipeline 42 does not exist");
    }

    #[test]
    fn test_forbidden_maps_to_403() {
        let (status, body) = map_error(GantryError::forbidden("Not allowed to remove this template"));
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(
            body.0.error.unwrap().message,
            "Not allowed to remove this template"
        );
    }

    #[test]
    fn test_conflict_maps_to_409() {
        let (status, _) = map_error(GantryError::conflict("Template version already exists"));
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[test]
    fn test_scm_failure_maps_to_502() {
        let (status, _) = map_error(GantryError::scm_error("connector unreachable"));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
