//! Domain models for the Gantry template service
//!
//! Templates are versioned build definitions owned by a pipeline. The owning
//! pipeline is the permission context for every destructive operation: a
//! caller's rights on the pipeline's SCM location decide what they may do to
//! the template.

use crate::ids::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// =============================================================================
// Template Models
// =============================================================================

/// One published version of a template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: TemplateId,
    /// Pipeline that published this template; immutable permission context
    pub pipeline_id: PipelineId,
    pub namespace: String,
    pub name: String,
    pub version: String,
    pub description: Option<String>,
    pub maintainer: Option<String>,
    /// Build definition payload, stored verbatim
    pub config: serde_json::Value,
    pub labels: Vec<String>,
    pub trusted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Template {
    /// Fully-qualified template name, e.g. `tools/build-docker`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

/// A named alias pointing at one template version
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateTag {
    pub id: TemplateTagId,
    pub namespace: String,
    pub name: String,
    pub tag: String,
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Usage counters for one template version
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateMetrics {
    pub jobs: i64,
    pub builds: i64,
}

/// Template version paired with its usage metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateWithMetrics {
    #[serde(flatten)]
    pub template: Template,
    pub metrics: TemplateMetrics,
}

// =============================================================================
// Pipeline & User Models
// =============================================================================

/// A build pipeline, associated with an SCM location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: PipelineId,
    pub scm_uri: String,
    pub scm_context: String,
    pub created_at: DateTime<Utc>,
}

/// A human user known to the platform
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub scm_context: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Credential & Authorization Models
// =============================================================================

/// Role class a credential was issued under.
///
/// Classification is mutually exclusive in evaluation order: Admin wins over
/// User, and anything else falls through to Build (the token default).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Admin,
    User,
    Build,
}

impl Scope {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Scope::Admin),
            "user" => Some(Scope::User),
            "build" => Some(Scope::Build),
            _ => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Admin => write!(f, "admin"),
            Scope::User => write!(f, "user"),
            Scope::Build => write!(f, "build"),
        }
    }
}

/// The caller's identity and role class, constructed per request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub username: String,
    pub scm_context: String,
    pub scope: Vec<Scope>,
    /// Set when the credential was issued to a build
    pub pipeline_id: Option<PipelineId>,
    /// True when the issuing build ran for a pull request
    pub is_pr: bool,
}

impl Credential {
    pub fn has_scope(&self, scope: Scope) -> bool {
        self.scope.contains(&scope)
    }

    /// Resolve the credential's role class with the documented precedence:
    /// Admin first, then User, else Build.
    pub fn role(&self) -> Scope {
        if self.has_scope(Scope::Admin) {
            Scope::Admin
        } else if self.has_scope(Scope::User) {
            Scope::User
        } else {
            Scope::Build
        }
    }
}

/// A user's rights on an SCM location: permission name to granted flag.
///
/// An absent key is denied, same as an explicit `false`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet(HashMap<String, bool>);

impl PermissionSet {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn grant(mut self, permission: impl Into<String>, allowed: bool) -> Self {
        self.0.insert(permission.into(), allowed);
        self
    }

    pub fn allows(&self, permission: &str) -> bool {
        self.0.get(permission).copied().unwrap_or(false)
    }
}

impl From<HashMap<String, bool>> for PermissionSet {
    fn from(map: HashMap<String, bool>) -> Self {
        Self(map)
    }
}
