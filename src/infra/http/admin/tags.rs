use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;

use crate::application::admin::tags::CreateTagCommand;
use crate::application::auth::AdminPrincipal;
use crate::domain::entities::TagRecord;
use crate::infra::http::error::{ApiError, tag_to_api};
use crate::infra::http::public::parse_uuid;
use crate::infra::http::state::HttpState;

use super::json_to_api;

#[derive(Debug, Deserialize)]
pub(super) struct CreateTagRequest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    color: Option<String>,
}

pub(super) async fn list(State(state): State<HttpState>) -> Result<Json<Vec<TagRecord>>, ApiError> {
    let tags = state.tags.list_tags().await.map_err(tag_to_api)?;
    Ok(Json(tags))
}

pub(super) async fn create(
    State(state): State<HttpState>,
    Extension(admin): Extension<AdminPrincipal>,
    payload: Result<Json<CreateTagRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<TagRecord>), ApiError> {
    let Json(payload) = payload.map_err(json_to_api)?;
    let tag = state
        .tags
        .create_tag(
            &admin.username,
            CreateTagCommand {
                name: payload.name,
                color: payload.color,
            },
        )
        .await
        .map_err(tag_to_api)?;
    Ok((StatusCode::CREATED, Json(tag)))
}

pub(super) async fn remove(
    State(state): State<HttpState>,
    Extension(admin): Extension<AdminPrincipal>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_uuid(&id, "id")?;
    state
        .tags
        .delete_tag(&admin.username, id)
        .await
        .map_err(tag_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}
