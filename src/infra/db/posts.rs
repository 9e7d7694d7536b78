use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::application::repos::{
    CreatePostParams, PostTagLink, PostTagsRepo, PostsRepo, PostsWriteRepo, RepoError,
};
use crate::domain::entities::{PostRecord, TagRecord};

use super::PostgresRepositories;
use super::util::{ensure_affected, map_sqlx_error};

const POST_COLUMNS: &str = "p.id, p.title, p.content, p.excerpt, p.author, \
    p.featured_image_url, p.published, p.created_at";

#[derive(sqlx::FromRow)]
struct PostRow {
    id: Uuid,
    title: String,
    content: String,
    excerpt: String,
    author: String,
    featured_image_url: Option<String>,
    published: bool,
    created_at: OffsetDateTime,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            content: row.content,
            excerpt: row.excerpt,
            author: row.author,
            featured_image_url: row.featured_image_url,
            published: row.published,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct PostTagRow {
    post_id: Uuid,
    id: Uuid,
    name: String,
    slug: String,
    color: String,
    created_at: OffsetDateTime,
}

impl From<PostTagRow> for PostTagLink {
    fn from(row: PostTagRow) -> Self {
        Self {
            post_id: row.post_id,
            tag: TagRecord {
                id: row.id,
                name: row.name,
                slug: row.slug,
                color: row.color,
                created_at: row.created_at,
            },
        }
    }
}

#[async_trait]
impl PostsRepo for PostgresRepositories {
    async fn list_published(&self, tag: Option<Uuid>) -> Result<Vec<PostRecord>, RepoError> {
        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new("SELECT ");
        qb.push(POST_COLUMNS);
        qb.push(" FROM posts p WHERE p.published = TRUE");
        if let Some(tag_id) = tag {
            qb.push(
                " AND EXISTS (SELECT 1 FROM post_tags pt WHERE pt.post_id = p.id AND pt.tag_id = ",
            );
            qb.push_bind(tag_id);
            qb.push(")");
        }
        qb.push(" ORDER BY p.created_at DESC, p.id DESC");

        let rows = qb
            .build_query_as::<PostRow>()
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn list_all(&self) -> Result<Vec<PostRecord>, RepoError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts p ORDER BY p.created_at DESC, p.id DESC");
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .fetch_all(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<PostRecord>, RepoError> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        Ok(row.map(PostRecord::from))
    }
}

#[async_trait]
impl PostsWriteRepo for PostgresRepositories {
    async fn create_post(&self, params: CreatePostParams) -> Result<PostRecord, RepoError> {
        let CreatePostParams {
            title,
            content,
            excerpt,
            author,
            featured_image_url,
            published,
        } = params;

        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (id, title, content, excerpt, author, featured_image_url, published)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, title, content, excerpt, author, featured_image_url, published, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(content)
        .bind(excerpt)
        .bind(author)
        .bind(featured_image_url)
        .bind(published)
        .fetch_one(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.into())
    }

    async fn set_published(&self, id: Uuid, published: bool) -> Result<PostRecord, RepoError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            UPDATE posts
            SET published = $2
            WHERE id = $1
            RETURNING id, title, content, excerpt, author, featured_image_url, published, created_at
            "#,
        )
        .bind(id)
        .bind(published)
        .fetch_optional(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        row.map(PostRecord::from).ok_or(RepoError::NotFound)
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;

        ensure_affected(result.rows_affected())
    }
}

#[async_trait]
impl PostTagsRepo for PostgresRepositories {
    async fn attach_tags(&self, post_id: Uuid, tag_ids: &[Uuid]) -> Result<(), RepoError> {
        if tag_ids.is_empty() {
            return Ok(());
        }

        let mut qb: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("INSERT INTO post_tags (post_id, tag_id) ");
        qb.push_values(tag_ids.iter(), |mut row, tag_id| {
            row.push_bind(post_id).push_bind(*tag_id);
        });
        qb.push(" ON CONFLICT DO NOTHING");

        qb.build()
            .execute(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn list_tags_for_posts(
        &self,
        post_ids: &[Uuid],
    ) -> Result<Vec<PostTagLink>, RepoError> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, PostTagRow>(
            r#"
            SELECT pt.post_id, t.id, t.name, t.slug, t.color, t.created_at
            FROM post_tags pt
            INNER JOIN tags t ON t.id = pt.tag_id
            WHERE pt.post_id = ANY($1)
            ORDER BY t.name ASC
            "#,
        )
        .bind(post_ids)
        .fetch_all(self.pool())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PostTagLink::from).collect())
    }
}
