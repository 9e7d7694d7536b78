use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{CreateGalleryImageParams, GalleryRepo, RepoError};
use crate::domain::entities::GalleryImageRecord;

use super::PostgresRepositories;
use super::util::{convert_count, ensure_affected, map_sqlx_error};

#[derive(sqlx::FromRow)]
struct GalleryImageRow {
    id: Uuid,
    image_url: String,
    alt_text: String,
    sort_order: i32,
    created_at: OffsetDateTime,
}

impl From<GalleryImageRow> for GalleryImageRecord {
    fn from(row: GalleryImageRow) -> Self {
        Self {
            id: row.id,
            image_url: row.image_url,
            alt_text: row.alt_text,
            sort_order: row.sort_order,
            created_at: row.created_at,
        }
    }
}

#[async_trait]
impl GalleryRepo for PostgresRepositories {
    async fn list_images(&self) -> Result<Vec<GalleryImageRecord>, RepoError> {
        let rows = sqlx::query_as::<_, GalleryImageRow>(
            r#"
            SELECT id, image_url, alt_text, sort_order, created_at
            FROM gallery_images
            ORDER BY sort_order ASC, created_at ASC
            "#,
        )
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(GalleryImageRecord::from).collect())
    }

    async fn count_images(&self) -> Result<u64, RepoError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM gallery_images")
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        convert_count(count)
    }

    async fn find_image(&self, id: Uuid) -> Result<Option<GalleryImageRecord>, RepoError> {
        let row = sqlx::query_as::<_, GalleryImageRow>(
            "SELECT id, image_url, alt_text, sort_order, created_at FROM gallery_images WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(GalleryImageRecord::from))
    }

    async fn insert_image(
        &self,
        params: CreateGalleryImageParams,
    ) -> Result<GalleryImageRecord, RepoError> {
        let row = sqlx::query_as::<_, GalleryImageRow>(
            r#"
            INSERT INTO gallery_images (id, image_url, alt_text, sort_order)
            VALUES ($1, $2, $3, $4)
            RETURNING id, image_url, alt_text, sort_order, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(params.image_url)
        .bind(params.alt_text)
        .bind(params.sort_order)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn delete_image(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM gallery_images WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        ensure_affected(result.rows_affected())
    }
}
