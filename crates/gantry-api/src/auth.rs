//! JWT authentication for the template API
//!
//! Credentials arrive as HS256 bearer tokens issued by the platform's auth
//! service. The middleware turns a valid token into a [`Credential`] request
//! extension; handlers never see raw tokens.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use gantry_core::{Credential, GantryError, PipelineId, Result, Scope};

use crate::state::AppState;

/// Allowed algorithm for JWT signing/verification
const JWT_ALGORITHM: Algorithm = Algorithm::HS256;

/// Minimum secret length (256 bits = 32 bytes)
const MIN_SECRET_LENGTH: usize = 32;

/// JWT claims for a template-service credential
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: username, or the build id for build tokens
    pub sub: String,
    pub scm_context: String,
    #[serde(default)]
    pub scope: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pipeline_id: Option<String>,
    #[serde(default)]
    pub is_pr: bool,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
    pub jti: String,
}

/// JWT service for creating and validating credential tokens
#[derive(Clone)]
pub struct JwtService {
    secret: String,
    issuer: String,
    audience: String,
    token_expiry_secs: i64,
}

impl JwtService {
    pub fn new(secret: String, issuer: String, token_expiry_secs: i64) -> Self {
        if secret.len() < MIN_SECRET_LENGTH {
            warn!(
                "JWT secret is only {} bytes, recommended minimum is {} bytes for HS256",
                secret.len(),
                MIN_SECRET_LENGTH
            );
        }

        let audience = issuer.clone();

        Self {
            secret,
            issuer,
            audience,
            token_expiry_secs,
        }
    }

    /// Encode a credential into a signed token
    pub fn issue_token(&self, credential: &Credential) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: credential.username.clone(),
            scm_context: credential.scm_context.clone(),
            scope: credential.scope.iter().map(|s| s.to_string()).collect(),
            pipeline_id: credential.pipeline_id.map(|id| id.to_string()),
            is_pr: credential.is_pr,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            exp: (now + Duration::seconds(self.token_expiry_secs)).timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        encode(
            &Header::new(JWT_ALGORITHM),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| GantryError::jwt_error(format!("Failed to encode token: {}", e)))
    }

    /// Validate a token and decode its claims.
    ///
    /// Enforces the algorithm explicitly along with issuer, audience,
    /// expiry, and not-before.
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(JWT_ALGORITHM);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.validate_exp = true;
        validation.validate_nbf = true;

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| {
            warn!(error = %e, "Token validation failed");
            GantryError::jwt_error(format!("Token validation failed: {}", e))
        })?;

        debug!("Validated token for {}", token_data.claims.sub);
        Ok(token_data.claims)
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("issuer", &self.issuer)
            .field("token_expiry_secs", &self.token_expiry_secs)
            .finish()
    }
}

/// Build the request-scoped credential from validated claims
pub fn credential_from_claims(claims: &Claims) -> Result<Credential> {
    let mut scope = Vec::new();
    for s in &claims.scope {
        match Scope::parse(s) {
            Some(parsed) => scope.push(parsed),
            None => warn!(scope = %s, "Ignoring unknown credential scope"),
        }
    }

    let pipeline_id = claims
        .pipeline_id
        .as_deref()
        .map(|raw| {
            raw.parse::<PipelineId>()
                .map_err(|_| GantryError::jwt_error("Invalid pipeline_id claim"))
        })
        .transpose()?;

    Ok(Credential {
        username: claims.sub.clone(),
        scm_context: claims.scm_context.clone(),
        scope,
        pipeline_id,
        is_pr: claims.is_pr,
    })
}

/// Error response for auth failures
#[derive(Debug, Serialize)]
pub struct AuthError {
    pub error: String,
    pub message: String,
}

impl AuthError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            error: "unauthorized".to_string(),
            message: message.into(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (StatusCode::UNAUTHORIZED, Json(self)).into_response()
    }
}

/// Middleware: require a valid bearer token and attach the credential
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> std::result::Result<Response, AuthError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AuthError::new("Missing Authorization header"))?;

    let token = header_value
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::new("Authorization header must be a bearer token"))?;

    let claims = state
        .jwt
        .validate_token(token)
        .map_err(|e| AuthError::new(e.to_string()))?;

    let credential =
        credential_from_claims(&claims).map_err(|e| AuthError::new(e.to_string()))?;

    request.extensions_mut().insert(credential);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_jwt_service() -> JwtService {
        JwtService::new(
            "test-secret-key-at-least-32-bytes-long".to_string(),
            "gantry-test".to_string(),
            3600,
        )
    }

    fn user_credential() -> Credential {
        Credential {
            username: "alice".to_string(),
            scm_context: "github:github.com".to_string(),
            scope: vec![Scope::User],
            pipeline_id: None,
            is_pr: false,
        }
    }

    #[test]
    fn test_issue_and_validate_roundtrip() {
        let service = create_test_jwt_service();
        let token = service.issue_token(&user_credential()).unwrap();

        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.scm_context, "github:github.com");
        assert_eq!(claims.scope, vec!["user".to_string()]);
        assert!(claims.pipeline_id.is_none());
        assert!(!claims.is_pr);
    }

    #[test]
    fn test_build_credential_roundtrip_keeps_pipeline_id() {
        let service = create_test_jwt_service();
        let pipeline_id = PipelineId::new();
        let credential = Credential {
            username: "9876".to_string(),
            scm_context: "github:github.com".to_string(),
            scope: vec![Scope::Build],
            pipeline_id: Some(pipeline_id),
            is_pr: true,
        };

        let token = service.issue_token(&credential).unwrap();
        let claims = service.validate_token(&token).unwrap();
        let back = credential_from_claims(&claims).unwrap();

        assert_eq!(back.pipeline_id, Some(pipeline_id));
        assert!(back.is_pr);
        assert_eq!(back.role(), Scope::Build);
    }

    #[test]
    fn test_validate_rejects_garbage() {
        let service = create_test_jwt_service();
        assert!(service.validate_token("invalid.token.here").is_err());
    }

    #[test]
    fn test_validate_rejects_wrong_issuer() {
        let secret = "test-secret-key-at-least-32-bytes-long".to_string();
        let service1 = JwtService::new(secret.clone(), "issuer-1".to_string(), 3600);
        let service2 = JwtService::new(secret, "issuer-2".to_string(), 3600);

        let token = service1.issue_token(&user_credential()).unwrap();
        assert!(service2.validate_token(&token).is_err());
    }

    #[test]
    fn test_unknown_scopes_are_ignored() {
        let claims = Claims {
            sub: "alice".to_string(),
            scm_context: "github:github.com".to_string(),
            scope: vec!["user".to_string(), "pipeline".to_string()],
            pipeline_id: None,
            is_pr: false,
            iss: "gantry".to_string(),
            aud: "gantry".to_string(),
            exp: 0,
            iat: 0,
            nbf: 0,
            jti: "x".to_string(),
        };

        let credential = credential_from_claims(&claims).unwrap();
        assert_eq!(credential.scope, vec![Scope::User]);
    }

    #[test]
    fn test_invalid_pipeline_id_claim_is_rejected() {
        let claims = Claims {
            sub: "42".to_string(),
            scm_context: "github:github.com".to_string(),
            scope: vec!["build".to_string()],
            pipeline_id: Some("not-a-uuid".to_string()),
            is_pr: false,
            iss: "gantry".to_string(),
            aud: "gantry".to_string(),
            exp: 0,
            iat: 0,
            nbf: 0,
            jti: "x".to_string(),
        };

        assert!(credential_from_claims(&claims).is_err());
    }
}
