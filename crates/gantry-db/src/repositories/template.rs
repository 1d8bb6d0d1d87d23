//! Template repository implementation

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use gantry_core::{
    GantryError, PipelineId, Result, Template, TemplateId, TemplateMetrics, TemplateRepository,
    TemplateWithMetrics,
};

/// PostgreSQL implementation of TemplateRepository
pub struct PgTemplateRepository {
    pool: PgPool,
}

impl PgTemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const TEMPLATE_COLUMNS: &str = "id, pipeline_id, namespace, name, version, description, \
     maintainer, config, labels, trusted, created_at, updated_at";

fn template_from_row(row: &PgRow) -> Result<Template> {
    let config: serde_json::Value = row.get("config");
    let labels_json: serde_json::Value = row.get("labels");
    let labels: Vec<String> = serde_json::from_value(labels_json).unwrap_or_default();

    Ok(Template {
        id: TemplateId::from_uuid(row.get("id")),
        pipeline_id: PipelineId::from_uuid(row.get("pipeline_id")),
        namespace: row.get("namespace"),
        name: row.get("name"),
        version: row.get("version"),
        description: row.get("description"),
        maintainer: row.get("maintainer"),
        config,
        labels,
        trusted: row.get("trusted"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn map_db_error(e: sqlx::Error) -> GantryError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return GantryError::conflict("Template version already exists");
        }
    }
    GantryError::database_error(e.to_string())
}

#[async_trait]
impl TemplateRepository for PgTemplateRepository {
    #[instrument(skip(self, template))]
    async fn create(&self, template: &Template) -> Result<Template> {
        let labels_json = serde_json::to_value(&template.labels)
            .map_err(|e| GantryError::internal_error(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO templates
                (id, pipeline_id, namespace, name, version, description, maintainer,
                 config, labels, trusted, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(template.id.as_uuid())
        .bind(template.pipeline_id.as_uuid())
        .bind(&template.namespace)
        .bind(&template.name)
        .bind(&template.version)
        .bind(&template.description)
        .bind(&template.maintainer)
        .bind(&template.config)
        .bind(&labels_json)
        .bind(template.trusted)
        .bind(template.created_at)
        .bind(template.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(template.clone())
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: TemplateId) -> Result<Option<Template>> {
        let row = sqlx::query(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM templates WHERE id = $1"
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.as_ref().map(template_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn get_version(
        &self,
        namespace: &str,
        name: &str,
        version: &str,
    ) -> Result<Option<Template>> {
        let row = sqlx::query(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM templates \
             WHERE namespace = $1 AND name = $2 AND version = $3"
        ))
        .bind(namespace)
        .bind(name)
        .bind(version)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.as_ref().map(template_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn get_latest(&self, namespace: &str, name: &str) -> Result<Option<Template>> {
        let row = sqlx::query(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM templates \
             WHERE namespace = $1 AND name = $2 \
             ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(namespace)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.as_ref().map(template_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn list_latest(
        &self,
        namespace: Option<&str>,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Template>> {
        let rows = match namespace {
            Some(ns) => {
                sqlx::query(&format!(
                    "SELECT DISTINCT ON (namespace, name) {TEMPLATE_COLUMNS} \
                     FROM templates WHERE namespace = $1 \
                     ORDER BY namespace, name, created_at DESC \
                     LIMIT $2 OFFSET $3"
                ))
                .bind(ns)
                .bind(limit as i64)
                .bind(offset as i64)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query(&format!(
                    "SELECT DISTINCT ON (namespace, name) {TEMPLATE_COLUMNS} \
                     FROM templates \
                     ORDER BY namespace, name, created_at DESC \
                     LIMIT $1 OFFSET $2"
                ))
                .bind(limit as i64)
                .bind(offset as i64)
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(map_db_error)?;

        rows.iter().map(template_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn list_versions(
        &self,
        namespace: &str,
        name: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<Template>> {
        let rows = sqlx::query(&format!(
            "SELECT {TEMPLATE_COLUMNS} FROM templates \
             WHERE namespace = $1 AND name = $2 \
             ORDER BY created_at DESC \
             LIMIT $3 OFFSET $4"
        ))
        .bind(namespace)
        .bind(name)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        rows.iter().map(template_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn list_versions_with_metrics(
        &self,
        namespace: &str,
        name: &str,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<TemplateWithMetrics>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.pipeline_id, t.namespace, t.name, t.version, t.description,
                   t.maintainer, t.config, t.labels, t.trusted, t.created_at, t.updated_at,
                   COALESCE(u.jobs, 0) AS jobs,
                   COALESCE(u.builds, 0) AS builds
            FROM templates t
            LEFT JOIN template_usage u ON u.template_id = t.id
            WHERE t.namespace = $1 AND t.name = $2
            ORDER BY t.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(namespace)
        .bind(name)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;

        rows.iter()
            .map(|row| {
                let template = template_from_row(row)?;
                Ok(TemplateWithMetrics {
                    template,
                    metrics: TemplateMetrics {
                        jobs: row.get("jobs"),
                        builds: row.get("builds"),
                    },
                })
            })
            .collect()
    }

    #[instrument(skip(self))]
    async fn update_trusted(&self, namespace: &str, name: &str, trusted: bool) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE templates SET trusted = $1, updated_at = NOW() \
             WHERE namespace = $2 AND name = $3",
        )
        .bind(trusted)
        .bind(namespace)
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn delete_all(&self, namespace: &str, name: &str) -> Result<u64> {
        let result = sqlx::query("DELETE FROM templates WHERE namespace = $1 AND name = $2")
            .bind(namespace)
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn delete_version(&self, namespace: &str, name: &str, version: &str) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM templates WHERE namespace = $1 AND name = $2 AND version = $3",
        )
        .bind(namespace)
        .bind(name)
        .bind(version)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }
}
