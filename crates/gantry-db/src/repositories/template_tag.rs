//! Template tag repository implementation

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use gantry_core::{GantryError, Result, TemplateTag, TemplateTagId, TemplateTagRepository};

/// PostgreSQL implementation of TemplateTagRepository
pub struct PgTemplateTagRepository {
    pool: PgPool,
}

impl PgTemplateTagRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn tag_from_row(row: &PgRow) -> TemplateTag {
    TemplateTag {
        id: TemplateTagId::from_uuid(row.get("id")),
        namespace: row.get("namespace"),
        name: row.get("name"),
        tag: row.get("tag"),
        version: row.get("version"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl TemplateTagRepository for PgTemplateTagRepository {
    #[instrument(skip(self, tag))]
    async fn upsert(&self, tag: &TemplateTag) -> Result<(TemplateTag, bool)> {
        // xmax = 0 distinguishes a fresh insert from a conflict update
        let row = sqlx::query(
            r#"
            INSERT INTO template_tags
                (id, namespace, name, tag, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (namespace, name, tag)
            DO UPDATE SET version = EXCLUDED.version, updated_at = EXCLUDED.updated_at
            RETURNING id, namespace, name, tag, version, created_at, updated_at,
                      (xmax = 0) AS inserted
            "#,
        )
        .bind(tag.id.as_uuid())
        .bind(&tag.namespace)
        .bind(&tag.name)
        .bind(&tag.tag)
        .bind(&tag.version)
        .bind(tag.created_at)
        .bind(tag.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| GantryError::database_error(e.to_string()))?;

        let inserted: bool = row.get("inserted");
        Ok((tag_from_row(&row), inserted))
    }

    #[instrument(skip(self))]
    async fn get(&self, namespace: &str, name: &str, tag: &str) -> Result<Option<TemplateTag>> {
        let row = sqlx::query(
            "SELECT id, namespace, name, tag, version, created_at, updated_at \
             FROM template_tags WHERE namespace = $1 AND name = $2 AND tag = $3",
        )
        .bind(namespace)
        .bind(name)
        .bind(tag)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| GantryError::database_error(e.to_string()))?;

        Ok(row.as_ref().map(tag_from_row))
    }

    #[instrument(skip(self))]
    async fn list(
        &self,
        namespace: &str,
        name: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<TemplateTag>> {
        let rows = sqlx::query(
            "SELECT id, namespace, name, tag, version, created_at, updated_at \
             FROM template_tags WHERE namespace = $1 AND name = $2 \
             ORDER BY tag LIMIT $3 OFFSET $4",
        )
        .bind(namespace)
        .bind(name)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| GantryError::database_error(e.to_string()))?;

        Ok(rows.iter().map(tag_from_row).collect())
    }

    #[instrument(skip(self))]
    async fn delete(&self, namespace: &str, name: &str, tag: &str) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM template_tags WHERE namespace = $1 AND name = $2 AND tag = $3",
        )
        .bind(namespace)
        .bind(name)
        .bind(tag)
        .execute(&self.pool)
        .await
        .map_err(|e| GantryError::database_error(e.to_string()))?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn delete_all(&self, namespace: &str, name: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM template_tags WHERE namespace = $1 AND name = $2")
            .bind(namespace)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| GantryError::database_error(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
