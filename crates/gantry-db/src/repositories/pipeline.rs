//! Pipeline repository implementation

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use gantry_core::{GantryError, Pipeline, PipelineId, PipelineLookup, Result};

/// PostgreSQL implementation of PipelineLookup.
///
/// Pipelines are owned by the pipeline service; this repository only reads
/// the slice the template service needs for permission context.
pub struct PgPipelineRepository {
    pool: PgPool,
}

impl PgPipelineRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PipelineLookup for PgPipelineRepository {
    #[instrument(skip(self))]
    async fn get(&self, id: PipelineId) -> Result<Option<Pipeline>> {
        let row = sqlx::query(
            "SELECT id, scm_uri, scm_context, created_at FROM pipelines WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| GantryError::database_error(e.to_string()))?;

        Ok(row.map(|row| Pipeline {
            id: PipelineId::from_uuid(row.get("id")),
            scm_uri: row.get("scm_uri"),
            scm_context: row.get("scm_context"),
            created_at: row.get("created_at"),
        }))
    }
}
