use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    application::repos::{CreateTagParams, RepoError, TagsRepo, TagsWriteRepo},
    domain::entities::TagRecord,
};

use super::PostgresRepositories;
use super::util::{ensure_affected, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct TagRow {
    id: Uuid,
    name: String,
    slug: String,
    color: String,
    created_at: OffsetDateTime,
}

impl From<TagRow> for TagRecord {
    fn from(row: TagRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            color: row.color,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl TagsRepo for PostgresRepositories {
    async fn list_by_name(&self) -> Result<Vec<TagRecord>, RepoError> {
        let rows = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT id, name, slug, color, created_at
            FROM tags
            ORDER BY name ASC, slug ASC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TagRecord::from).collect())
    }

    async fn list_newest_first(&self) -> Result<Vec<TagRecord>, RepoError> {
        let rows = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT id, name, slug, color, created_at
            FROM tags
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(TagRecord::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<TagRecord>, RepoError> {
        let row = sqlx::query_as::<_, TagRow>(
            "SELECT id, name, slug, color, created_at FROM tags WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(TagRecord::from))
    }
}

#[async_trait]
impl TagsWriteRepo for PostgresRepositories {
    async fn create_tag(&self, params: CreateTagParams) -> Result<TagRecord, RepoError> {
        let CreateTagParams { name, slug, color } = params;

        let row = sqlx::query_as::<_, TagRow>(
            r#"
            INSERT INTO tags (id, name, slug, color)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, slug, color, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .bind(slug)
        .bind(color)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn delete_tag(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        ensure_affected(result.rows_affected())
    }
}
