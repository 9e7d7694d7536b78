use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::application::admin::posts::{CreatePostCommand, PostAction};
use crate::application::auth::AdminPrincipal;
use crate::application::feed::PostView;
use crate::domain::entities::PostRecord;
use crate::infra::http::error::{ApiError, post_to_api};
use crate::infra::http::public::parse_uuid;
use crate::infra::http::state::HttpState;

use super::multipart::MultipartForm;

pub(super) async fn list(State(state): State<HttpState>) -> Result<Json<Vec<PostView>>, ApiError> {
    let posts = state.posts.list_posts().await.map_err(post_to_api)?;
    Ok(Json(posts))
}

pub(super) async fn create(
    State(state): State<HttpState>,
    Extension(admin): Extension<AdminPrincipal>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<PostRecord>), ApiError> {
    let mut form = MultipartForm::read(multipart).await?;
    let command = CreatePostCommand {
        title: form.text_or_blank("title"),
        content: form.text_or_blank("content"),
        author: form.text_or_blank("author"),
        excerpt: form.optional_text("excerpt"),
        tag_ids: parse_tag_ids(form.texts("tag_ids"))?,
        action: parse_action(form.text("action"))?,
        featured_image: form.take_file("image"),
    };

    let post = state
        .posts
        .create_post(&admin.username, command)
        .await
        .map_err(post_to_api)?;
    Ok((StatusCode::CREATED, Json(post)))
}

pub(super) async fn toggle(
    State(state): State<HttpState>,
    Extension(admin): Extension<AdminPrincipal>,
    Path(id): Path<String>,
) -> Result<Json<PostRecord>, ApiError> {
    let id = parse_uuid(&id, "id")?;
    let post = state
        .posts
        .toggle_published(&admin.username, id)
        .await
        .map_err(post_to_api)?;
    Ok(Json(post))
}

pub(super) async fn remove(
    State(state): State<HttpState>,
    Extension(admin): Extension<AdminPrincipal>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_uuid(&id, "id")?;
    state
        .posts
        .delete_post(&admin.username, id)
        .await
        .map_err(post_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Tag ids arrive either as repeated fields or comma separated.
fn parse_tag_ids<'a>(values: impl Iterator<Item = &'a str>) -> Result<Vec<Uuid>, ApiError> {
    values
        .flat_map(|value| value.split(','))
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| parse_uuid(value, "tag_ids"))
        .collect()
}

fn parse_action(value: Option<&str>) -> Result<PostAction, ApiError> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(PostAction::default()),
        Some(value) => value.parse().map_err(|_| {
            ApiError::bad_request(
                "Unknown action",
                Some("`action` must be `publish` or `draft`".to_string()),
            )
        }),
    }
}
