use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{FounderParams, FoundersRepo, RepoError};
use crate::domain::entities::FounderRecord;

use super::PostgresRepositories;
use super::util::{ensure_affected, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct FounderRow {
    id: Uuid,
    name: String,
    description: String,
    image_url: String,
    sort_order: i32,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl From<FounderRow> for FounderRecord {
    fn from(row: FounderRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            image_url: row.image_url,
            sort_order: row.sort_order,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[async_trait]
impl FoundersRepo for PostgresRepositories {
    async fn list_founders(&self) -> Result<Vec<FounderRecord>, RepoError> {
        let rows = sqlx::query_as::<_, FounderRow>(
            r#"
            SELECT id, name, description, image_url, sort_order, created_at, updated_at
            FROM founders
            ORDER BY sort_order ASC, created_at ASC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(FounderRecord::from).collect())
    }

    async fn find_founder(&self, id: Uuid) -> Result<Option<FounderRecord>, RepoError> {
        let row = sqlx::query_as::<_, FounderRow>(
            r#"
            SELECT id, name, description, image_url, sort_order, created_at, updated_at
            FROM founders
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(FounderRecord::from))
    }

    async fn create_founder(&self, params: FounderParams) -> Result<FounderRecord, RepoError> {
        let row = sqlx::query_as::<_, FounderRow>(
            r#"
            INSERT INTO founders (id, name, description, image_url, sort_order)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, description, image_url, sort_order, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(params.name)
        .bind(params.description)
        .bind(params.image_url)
        .bind(params.sort_order)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn update_founder(
        &self,
        id: Uuid,
        params: FounderParams,
    ) -> Result<FounderRecord, RepoError> {
        let row = sqlx::query_as::<_, FounderRow>(
            r#"
            UPDATE founders
            SET name = $2,
                description = $3,
                image_url = $4,
                sort_order = $5,
                updated_at = now()
            WHERE id = $1
            RETURNING id, name, description, image_url, sort_order, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(params.name)
        .bind(params.description)
        .bind(params.image_url)
        .bind(params.sort_order)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(FounderRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_founder(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM founders WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        ensure_affected(result.rows_affected())
    }
}
