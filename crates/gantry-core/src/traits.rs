//! Core traits for the Gantry template service

use crate::{error::Result, ids::*, models::*};
use async_trait::async_trait;

// =============================================================================
// Lookup Traits (authorization collaborators)
// =============================================================================

/// Resolves a pipeline identifier to its record
#[async_trait]
pub trait PipelineLookup: Send + Sync {
    async fn get(&self, id: PipelineId) -> Result<Option<Pipeline>>;
}

/// Resolves platform users and their SCM rights
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn get(&self, username: &str, scm_context: &str) -> Result<Option<User>>;

    /// Query the user's permission set on an SCM location.
    ///
    /// Delegated to the SCM connector; always a fresh query, never cached.
    async fn permissions(&self, user: &User, scm_uri: &str) -> Result<PermissionSet>;
}

// =============================================================================
// Template Management Traits
// =============================================================================

/// Template persistence operations
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    async fn create(&self, template: &Template) -> Result<Template>;
    async fn get_by_id(&self, id: TemplateId) -> Result<Option<Template>>;
    async fn get_version(
        &self,
        namespace: &str,
        name: &str,
        version: &str,
    ) -> Result<Option<Template>>;
    async fn get_latest(&self, namespace: &str, name: &str) -> Result<Option<Template>>;
    /// Latest version of each template, optionally filtered by namespace
    async fn list_latest(
        &self,
        namespace: Option<&str>,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Template>>;
    async fn list_versions(
        &self,
        namespace: &str,
        name: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Template>>;
    async fn list_versions_with_metrics(
        &self,
        namespace: &str,
        name: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<TemplateWithMetrics>>;
    /// Flip the trusted flag on every version; returns affected row count
    async fn update_trusted(&self, namespace: &str, name: &str, trusted: bool) -> Result<u64>;
    /// Delete every version of a template; returns deleted row count
    async fn delete_all(&self, namespace: &str, name: &str) -> Result<u64>;
    /// Delete one version; returns deleted row count
    async fn delete_version(&self, namespace: &str, name: &str, version: &str) -> Result<u64>;
}

/// Template tag persistence operations
#[async_trait]
pub trait TemplateTagRepository: Send + Sync {
    /// Create the tag or repoint an existing one; returns the stored tag and
    /// whether it was newly created
    async fn upsert(&self, tag: &TemplateTag) -> Result<(TemplateTag, bool)>;
    async fn get(&self, namespace: &str, name: &str, tag: &str) -> Result<Option<TemplateTag>>;
    async fn list(
        &self,
        namespace: &str,
        name: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<TemplateTag>>;
    async fn delete(&self, namespace: &str, name: &str, tag: &str) -> Result<u64>;
    /// Delete every tag of a template; returns deleted row count
    async fn delete_all(&self, namespace: &str, name: &str) -> Result<u64>;
}
