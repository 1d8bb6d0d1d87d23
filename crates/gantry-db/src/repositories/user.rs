//! User repository implementation

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use gantry_core::{GantryError, PermissionSet, Result, User, UserId, UserLookup};
use gantry_scm::ScmClient;

/// PostgreSQL implementation of UserLookup.
///
/// User records live in Postgres; their SCM rights come from the connector,
/// queried fresh on every call.
pub struct PgUserRepository {
    pool: PgPool,
    scm: Arc<ScmClient>,
}

impl PgUserRepository {
    pub fn new(pool: PgPool, scm: Arc<ScmClient>) -> Self {
        Self { pool, scm }
    }
}

#[async_trait]
impl UserLookup for PgUserRepository {
    #[instrument(skip(self))]
    async fn get(&self, username: &str, scm_context: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, scm_context, created_at FROM users \
             WHERE username = $1 AND scm_context = $2",
        )
        .bind(username)
        .bind(scm_context)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| GantryError::database_error(e.to_string()))?;

        Ok(row.map(|row| User {
            id: UserId::from_uuid(row.get("id")),
            username: row.get("username"),
            scm_context: row.get("scm_context"),
            created_at: row.get("created_at"),
        }))
    }

    #[instrument(skip(self, user), fields(username = %user.username))]
    async fn permissions(&self, user: &User, scm_uri: &str) -> Result<PermissionSet> {
        self.scm
            .permissions(&user.scm_context, scm_uri, &user.username)
            .await
    }
}
