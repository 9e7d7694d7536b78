use axum::{
    Extension, Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
};

use crate::application::auth::AdminPrincipal;
use crate::domain::entities::GalleryImageRecord;
use crate::infra::http::error::{ApiError, gallery_to_api};
use crate::infra::http::public::parse_uuid;
use crate::infra::http::state::HttpState;

use super::multipart::MultipartForm;

pub(super) async fn list(
    State(state): State<HttpState>,
) -> Result<Json<Vec<GalleryImageRecord>>, ApiError> {
    let images = state.gallery.list().await.map_err(gallery_to_api)?;
    Ok(Json(images))
}

pub(super) async fn upload(
    State(state): State<HttpState>,
    Extension(admin): Extension<AdminPrincipal>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<GalleryImageRecord>>), ApiError> {
    let mut form = MultipartForm::read(multipart).await?;
    let files = form.take_files("files");
    let images = state
        .gallery
        .upload(&admin.username, files)
        .await
        .map_err(gallery_to_api)?;
    Ok((StatusCode::CREATED, Json(images)))
}

pub(super) async fn remove(
    State(state): State<HttpState>,
    Extension(admin): Extension<AdminPrincipal>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_uuid(&id, "id")?;
    state
        .gallery
        .delete(&admin.username, id)
        .await
        .map_err(gallery_to_api)?;
    Ok(StatusCode::NO_CONTENT)
}
