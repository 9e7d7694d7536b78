use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};

use crate::application::admin::founders::FounderCommand;
use crate::application::auth::AdminPrincipal;
use crate::domain::entities::FounderRecord;
use crate::infra::http::error::{ApiError, founder_to_api};
use crate::infra::http::public::parse_uuid;
use crate::infra::http::state::HttpState;

use super::multipart::MultipartForm;

pub(super) async fn list(
    State(state): State<HttpState>,
) -> Result<Json<Vec<FounderRecord>>, ApiError> {
    let founders = state.founders.list().await.map_err(founder_to_api)?;
    Ok(Json(founders))
}

pub(super) async fn create(
    State(state): State<HttpState>,
    Extension(admin): Extension<AdminPrincipal>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<FounderRecord>), ApiError> {
    let command = read_command(multipart).await?;
    let founder = state
        .founders
        .create(&admin.username, command)
        .await
        .map_err(founder_to_api)?;
    Ok((StatusCode::CREATED, Json(founder)))
}

pub(super) async fn update(
    State(state): State<HttpState>,
    Extension(admin): Extension<AdminPrincipal>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<FounderRecord>, ApiError> {
    let id = parse_uuid(&id, "id")?;
    let command = read_command(multipart).await?;
    let founder = state
        .founders
        .update(&admin.username, id, command)
        .await
        .map_err(founder_to_api)?;
    Ok(Json(founder))
}

pub(super) async fn remove(
    State(state): State<HttpState>,
    Extension(admin): Extension<AdminPrincipal>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_uuid(&id, "id")?;
    state
        .founders
        .delete(&admin.username, id)
        .await
        .map_err(founder_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn read_command(multipart: Multipart) -> Result<FounderCommand, ApiError> {
    let mut form = MultipartForm::read(multipart).await?;
    let sort_order = match form.optional_text("sort_order") {
        None => 0,
        Some(value) => value.parse::<i32>().map_err(|_| {
            ApiError::bad_request(
                "Invalid sort order",
                Some("`sort_order` must be a whole number".to_string()),
            )
        })?,
    };

    Ok(FounderCommand {
        name: form.text_or_blank("name"),
        description: form.text_or_blank("description"),
        sort_order,
        image_url: form.optional_text("image_url"),
        image: form.take_file("image"),
    })
}
