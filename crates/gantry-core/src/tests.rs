//! Unit tests for gantry-core

use super::*;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// =============================================================================
// Test Fixtures
// =============================================================================

fn template_for(pipeline_id: PipelineId) -> Template {
    Template {
        id: TemplateId::new(),
        pipeline_id,
        namespace: "tools".to_string(),
        name: "build-docker".to_string(),
        version: "1.0.0".to_string(),
        description: Some("Builds a docker image".to_string()),
        maintainer: Some("ops@example.com".to_string()),
        config: serde_json::json!({"image": "docker:24", "steps": []}),
        labels: vec!["stable".to_string()],
        trusted: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn pipeline(id: PipelineId) -> Pipeline {
    Pipeline {
        id,
        scm_uri: "github.com:12345:main".to_string(),
        scm_context: "github:github.com".to_string(),
        created_at: Utc::now(),
    }
}

fn user(username: &str) -> User {
    User {
        id: UserId::new(),
        username: username.to_string(),
        scm_context: "github:github.com".to_string(),
        created_at: Utc::now(),
    }
}

fn user_credential(username: &str) -> Credential {
    Credential {
        username: username.to_string(),
        scm_context: "github:github.com".to_string(),
        scope: vec![Scope::User],
        pipeline_id: None,
        is_pr: false,
    }
}

fn build_credential(pipeline_id: PipelineId, is_pr: bool) -> Credential {
    Credential {
        username: "123".to_string(),
        scm_context: "github:github.com".to_string(),
        scope: vec![Scope::Build],
        pipeline_id: Some(pipeline_id),
        is_pr,
    }
}

fn admin_credential() -> Credential {
    Credential {
        username: "root".to_string(),
        scm_context: "github:github.com".to_string(),
        scope: vec![Scope::Admin],
        pipeline_id: None,
        is_pr: false,
    }
}

/// In-memory pipeline lookup counting its invocations
struct FakePipelines {
    pipeline: Option<Pipeline>,
    calls: AtomicUsize,
}

impl FakePipelines {
    fn with(pipeline: Option<Pipeline>) -> Arc<Self> {
        Arc::new(Self {
            pipeline,
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl PipelineLookup for FakePipelines {
    async fn get(&self, id: PipelineId) -> Result<Option<Pipeline>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.pipeline.clone().filter(|p| p.id == id))
    }
}

/// In-memory user lookup counting its invocations
struct FakeUsers {
    user: Option<User>,
    permissions: PermissionSet,
    get_calls: AtomicUsize,
    permission_calls: AtomicUsize,
}

impl FakeUsers {
    fn with(user: Option<User>, permissions: PermissionSet) -> Arc<Self> {
        Arc::new(Self {
            user,
            permissions,
            get_calls: AtomicUsize::new(0),
            permission_calls: AtomicUsize::new(0),
        })
    }

    fn absent() -> Arc<Self> {
        Self::with(None, PermissionSet::new())
    }
}

#[async_trait::async_trait]
impl UserLookup for FakeUsers {
    async fn get(&self, username: &str, scm_context: &str) -> Result<Option<User>> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .user
            .clone()
            .filter(|u| u.username == username && u.scm_context == scm_context))
    }

    async fn permissions(&self, _user: &User, _scm_uri: &str) -> Result<PermissionSet> {
        self.permission_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.permissions.clone())
    }
}

fn resolver(pipelines: Arc<FakePipelines>, users: Arc<FakeUsers>) -> AuthorizationResolver {
    AuthorizationResolver::new(pipelines, users)
}

// =============================================================================
// Authorization Resolver Tests
// =============================================================================

mod authz_tests {
    use super::*;

    #[tokio::test]
    async fn test_admin_succeeds_without_any_lookup() {
        let pipelines = FakePipelines::with(None);
        let users = FakeUsers::absent();
        let r = resolver(pipelines.clone(), users.clone());
        let template = template_for(PipelineId::new());

        let outcome = r.can_remove(&admin_credential(), &template, "admin").await;

        assert!(outcome.is_ok());
        assert_eq!(pipelines.calls(), 0);
        assert_eq!(users.get_calls.load(Ordering::SeqCst), 0);
        assert_eq!(users.permission_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_admin_wins_even_with_other_scopes_present() {
        let pipelines = FakePipelines::with(None);
        let users = FakeUsers::absent();
        let r = resolver(pipelines.clone(), users);
        let template = template_for(PipelineId::new());

        let mut credential = admin_credential();
        credential.scope = vec![Scope::User, Scope::Admin];

        assert!(r.can_remove(&credential, &template, "admin").await.is_ok());
        assert_eq!(pipelines.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_pipeline_is_not_found_and_skips_user_lookup() {
        let pipelines = FakePipelines::with(None);
        let users = FakeUsers::absent();
        let r = resolver(pipelines.clone(), users.clone());
        let template = template_for(PipelineId::new());

        let err = r
            .can_remove(&user_credential("alice"), &template, "admin")
            .await
            .unwrap_err();

        assert!(matches!(err, GantryError::NotFound { .. }));
        assert_eq!(
            err.to_string(),
            format!("Pipeline {} does not exist", template.pipeline_id)
        );
        assert_eq!(pipelines.calls(), 1);
        assert_eq!(users.get_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_user_is_not_found() {
        let pipeline_id = PipelineId::new();
        let pipelines = FakePipelines::with(Some(pipeline(pipeline_id)));
        let users = FakeUsers::absent();
        let r = resolver(pipelines, users);

        let err = r
            .can_remove(&user_credential("bob"), &template_for(pipeline_id), "admin")
            .await
            .unwrap_err();

        assert!(matches!(err, GantryError::NotFound { .. }));
        assert_eq!(err.to_string(), "User bob does not exist");
    }

    #[tokio::test]
    async fn test_denied_permission_is_forbidden() {
        let pipeline_id = PipelineId::new();
        let pipelines = FakePipelines::with(Some(pipeline(pipeline_id)));
        let users = FakeUsers::with(
            Some(user("carol")),
            PermissionSet::new().grant("push", false),
        );
        let r = resolver(pipelines, users);

        let err = r
            .can_remove(&user_credential("carol"), &template_for(pipeline_id), "push")
            .await
            .unwrap_err();

        assert!(matches!(err, GantryError::Forbidden { .. }));
        assert_eq!(
            err.to_string(),
            "User carol does not have push access for this template"
        );
    }

    #[tokio::test]
    async fn test_absent_permission_key_is_denied() {
        let pipeline_id = PipelineId::new();
        let pipelines = FakePipelines::with(Some(pipeline(pipeline_id)));
        let users = FakeUsers::with(Some(user("carol")), PermissionSet::new());
        let r = resolver(pipelines, users);

        let err = r
            .can_remove(&user_credential("carol"), &template_for(pipeline_id), "admin")
            .await
            .unwrap_err();

        assert!(matches!(err, GantryError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_granted_permission_succeeds() {
        let pipeline_id = PipelineId::new();
        let pipelines = FakePipelines::with(Some(pipeline(pipeline_id)));
        let users = FakeUsers::with(
            Some(user("dave")),
            PermissionSet::new().grant("admin", true).grant("push", true),
        );
        let r = resolver(pipelines, users.clone());

        let outcome = r
            .can_remove(&user_credential("dave"), &template_for(pipeline_id), "admin")
            .await;

        assert!(outcome.is_ok());
        assert_eq!(users.permission_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_build_owning_pipeline_succeeds() {
        let pipeline_id = PipelineId::new();
        let pipelines = FakePipelines::with(Some(pipeline(pipeline_id)));
        let users = FakeUsers::absent();
        let r = resolver(pipelines, users.clone());

        let outcome = r
            .can_remove(
                &build_credential(pipeline_id, false),
                &template_for(pipeline_id),
                "admin",
            )
            .await;

        assert!(outcome.is_ok());
        // ownership path never consults the user lookup
        assert_eq!(users.get_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_build_from_pull_request_is_forbidden() {
        let pipeline_id = PipelineId::new();
        let pipelines = FakePipelines::with(Some(pipeline(pipeline_id)));
        let r = resolver(pipelines, FakeUsers::absent());

        let err = r
            .can_remove(
                &build_credential(pipeline_id, true),
                &template_for(pipeline_id),
                "admin",
            )
            .await
            .unwrap_err();

        assert!(matches!(err, GantryError::Forbidden { .. }));
        assert_eq!(err.to_string(), "Not allowed to remove this template");
    }

    #[tokio::test]
    async fn test_build_for_other_pipeline_is_forbidden() {
        let owner = PipelineId::new();
        let other = PipelineId::new();
        let pipelines = FakePipelines::with(Some(pipeline(owner)));
        let r = resolver(pipelines, FakeUsers::absent());

        let err = r
            .can_remove(&build_credential(other, false), &template_for(owner), "admin")
            .await
            .unwrap_err();

        assert!(matches!(err, GantryError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_build_without_pipeline_id_is_forbidden() {
        let pipeline_id = PipelineId::new();
        let pipelines = FakePipelines::with(Some(pipeline(pipeline_id)));
        let r = resolver(pipelines, FakeUsers::absent());

        let mut credential = build_credential(pipeline_id, false);
        credential.pipeline_id = None;

        let err = r
            .can_remove(&credential, &template_for(pipeline_id), "admin")
            .await
            .unwrap_err();

        assert!(matches!(err, GantryError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_repeated_invocations_are_idempotent() {
        let pipeline_id = PipelineId::new();
        let pipelines = FakePipelines::with(Some(pipeline(pipeline_id)));
        let users = FakeUsers::with(Some(user("erin")), PermissionSet::new().grant("admin", true));
        let r = resolver(pipelines, users);
        let credential = user_credential("erin");
        let template = template_for(pipeline_id);

        for _ in 0..3 {
            assert!(r.can_remove(&credential, &template, "admin").await.is_ok());
        }
        for _ in 0..3 {
            assert!(r.can_remove(&credential, &template, "lock").await.is_err());
        }
    }
}

// =============================================================================
// Model Tests
// =============================================================================

mod model_tests {
    use super::*;

    #[test]
    fn test_scope_serialization() {
        let json = serde_json::to_string(&Scope::Admin).unwrap();
        assert_eq!(json, "\"admin\"");

        let back: Scope = serde_json::from_str("\"build\"").unwrap();
        assert_eq!(back, Scope::Build);
    }

    #[test]
    fn test_scope_parse() {
        assert_eq!(Scope::parse("admin"), Some(Scope::Admin));
        assert_eq!(Scope::parse("user"), Some(Scope::User));
        assert_eq!(Scope::parse("build"), Some(Scope::Build));
        assert_eq!(Scope::parse("pipeline"), None);
    }

    #[test]
    fn test_credential_role_precedence() {
        let mut credential = user_credential("alice");
        assert_eq!(credential.role(), Scope::User);

        credential.scope.push(Scope::Admin);
        assert_eq!(credential.role(), Scope::Admin);

        credential.scope = vec![Scope::Build];
        assert_eq!(credential.role(), Scope::Build);

        // empty scope list falls through to the build default
        credential.scope = vec![];
        assert_eq!(credential.role(), Scope::Build);
    }

    #[test]
    fn test_permission_set_falsy_is_denied() {
        let permissions = PermissionSet::new().grant("push", true).grant("admin", false);
        assert!(permissions.allows("push"));
        assert!(!permissions.allows("admin"));
        assert!(!permissions.allows("never-granted"));
    }

    #[test]
    fn test_permission_set_deserializes_from_plain_map() {
        let permissions: PermissionSet =
            serde_json::from_str(r#"{"admin": true, "push": false}"#).unwrap();
        assert!(permissions.allows("admin"));
        assert!(!permissions.allows("push"));
    }

    #[test]
    fn test_permission_set_from_hashmap() {
        let mut map = HashMap::new();
        map.insert("pull".to_string(), true);
        let permissions = PermissionSet::from(map);
        assert!(permissions.allows("pull"));
    }

    #[test]
    fn test_template_full_name() {
        let template = template_for(PipelineId::new());
        assert_eq!(template.full_name(), "tools/build-docker");
    }

    #[test]
    fn test_template_serialization_roundtrip() {
        let template = template_for(PipelineId::new());
        let json = serde_json::to_string(&template).unwrap();
        let back: Template = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, template.id);
        assert_eq!(back.version, template.version);
        assert_eq!(back.labels, template.labels);
    }
}

// =============================================================================
// Error Tests
// =============================================================================

mod error_tests {
    use super::*;

    #[test]
    fn test_not_found_message_names_the_entity() {
        let err = GantryError::not_found("Pipeline", "42");
        assert_eq!(err.to_string(), "Pipeline 42 does not exist");
    }

    #[test]
    fn test_forbidden_message_is_verbatim() {
        let err = GantryError::forbidden("Not allowed to remove this template");
        assert_eq!(err.to_string(), "Not allowed to remove this template");
    }

    #[test]
    fn test_error_helper_methods() {
        assert!(matches!(
            GantryError::invalid_input("bad version"),
            GantryError::InvalidInput { .. }
        ));
        assert!(matches!(
            GantryError::conflict("version exists"),
            GantryError::Conflict { .. }
        ));
        assert!(matches!(
            GantryError::scm_error("connector timeout"),
            GantryError::ScmError { .. }
        ));
        assert!(matches!(
            GantryError::database_error("pool exhausted"),
            GantryError::DatabaseError { .. }
        ));
        assert!(matches!(
            GantryError::jwt_error("bad signature"),
            GantryError::JwtError { .. }
        ));
    }
}
