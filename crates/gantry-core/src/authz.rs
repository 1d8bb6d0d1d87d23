//! Authorization resolution for destructive template operations
//!
//! Every remove/mutate route runs through [`AuthorizationResolver::can_remove`]
//! before touching the data layer. The verdict combines the credential's role
//! class, template ownership, and a delegated SCM permission lookup.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::error::{GantryError, Result};
use crate::models::{Credential, Scope, Template};
use crate::traits::{PipelineLookup, UserLookup};

/// Decides whether a credential may remove or mutate a template.
///
/// Collaborators are injected at construction; the resolver holds no other
/// state and performs no writes. Pipeline and user records are fetched fresh
/// on every invocation.
#[derive(Clone)]
pub struct AuthorizationResolver {
    pipelines: Arc<dyn PipelineLookup>,
    users: Arc<dyn UserLookup>,
}

impl AuthorizationResolver {
    pub fn new(pipelines: Arc<dyn PipelineLookup>, users: Arc<dyn UserLookup>) -> Self {
        Self { pipelines, users }
    }

    /// Resolve whether `credential` may perform a destructive operation on
    /// `template` at the given permission level.
    ///
    /// Success is `Ok(())`; denial is always an error, never a falsy success:
    /// - `NotFound` when the owning pipeline or the user does not exist
    /// - `Forbidden` when the permission set denies the operation, or a
    ///   build credential does not own the template or comes from a PR
    ///
    /// Role precedence is admin, then user, then the build-token default.
    /// Admin succeeds without any lookup, even if the referenced pipeline
    /// does not exist.
    #[instrument(skip(self, credential, template), fields(
        username = %credential.username,
        template = %template.full_name(),
    ))]
    pub async fn can_remove(
        &self,
        credential: &Credential,
        template: &Template,
        permission: &str,
    ) -> Result<()> {
        let role = credential.role();
        if role == Scope::Admin {
            debug!("admin credential, skipping ownership checks");
            return Ok(());
        }

        let pipeline = self
            .pipelines
            .get(template.pipeline_id)
            .await?
            .ok_or_else(|| GantryError::not_found("Pipeline", template.pipeline_id))?;

        if role == Scope::User {
            let user = self
                .users
                .get(&credential.username, &credential.scm_context)
                .await?
                .ok_or_else(|| GantryError::not_found("User", &credential.username))?;

            let permissions = self.users.permissions(&user, &pipeline.scm_uri).await?;
            if !permissions.allows(permission) {
                return Err(GantryError::forbidden(format!(
                    "User {} does not have {} access for this template",
                    credential.username, permission
                )));
            }

            return Ok(());
        }

        // Build-token default: only the owning pipeline's own builds may
        // mutate, and never from a pull request.
        if credential.pipeline_id != Some(template.pipeline_id) || credential.is_pr {
            return Err(GantryError::forbidden("Not allowed to remove this template"));
        }

        Ok(())
    }
}

impl std::fmt::Debug for AuthorizationResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationResolver").finish_non_exhaustive()
    }
}
