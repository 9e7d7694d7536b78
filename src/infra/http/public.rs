use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query, State},
    http::{
        HeaderValue, StatusCode,
        header::{CACHE_CONTROL, CONTENT_LENGTH, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    routing::get,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::application::error::ErrorReport;
use crate::application::feed::PostView;
use crate::domain::entities::{FounderRecord, GalleryImageRecord, TagRecord};
use crate::domain::filter::TagFilter;
use crate::domain::uploads::Bucket;

use super::error::{ApiError, feed_to_api};
use super::state::HttpState;

pub fn build_public_router() -> Router<HttpState> {
    Router::new()
        .route("/api/posts", get(list_posts))
        .route("/api/posts/{id}", get(get_post))
        .route("/api/tags", get(list_tags))
        .route("/api/founders", get(list_founders))
        .route("/api/gallery", get(list_gallery))
        .route("/uploads/{bucket}/{key}", get(serve_upload))
        .route("/health", get(health))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListQuery {
    tag: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostListResponse {
    pub posts: Vec<PostView>,
    pub selected_tag: Option<Uuid>,
}

pub(super) fn parse_uuid(value: &str, field: &'static str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(value.trim()).map_err(|_| {
        ApiError::bad_request("Invalid identifier", Some(format!("`{field}` must be a UUID")))
    })
}

async fn list_posts(
    State(state): State<HttpState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<PostListResponse>, ApiError> {
    let filter = match query.tag.as_deref().map(str::trim) {
        None | Some("") => TagFilter::none(),
        Some(tag) => TagFilter::tag(parse_uuid(tag, "tag")?),
    };

    let posts = state.feed.list_published(filter).await.map_err(feed_to_api)?;
    Ok(Json(PostListResponse {
        posts,
        selected_tag: filter.selected(),
    }))
}

async fn get_post(
    State(state): State<HttpState>,
    Path(id): Path<String>,
) -> Result<Json<PostView>, ApiError> {
    let id = parse_uuid(&id, "id")?;
    let post = state.feed.find_published(id).await.map_err(feed_to_api)?;
    Ok(Json(post))
}

async fn list_tags(State(state): State<HttpState>) -> Result<Json<Vec<TagRecord>>, ApiError> {
    let tags = state.feed.list_tags().await.map_err(feed_to_api)?;
    Ok(Json(tags))
}

async fn list_founders(
    State(state): State<HttpState>,
) -> Result<Json<Vec<FounderRecord>>, ApiError> {
    let founders = state.feed.list_founders().await.map_err(feed_to_api)?;
    Ok(Json(founders))
}

async fn list_gallery(
    State(state): State<HttpState>,
) -> Result<Json<Vec<GalleryImageRecord>>, ApiError> {
    let images = state.feed.list_gallery().await.map_err(feed_to_api)?;
    Ok(Json(images))
}

async fn serve_upload(
    State(state): State<HttpState>,
    Path((bucket, key)): Path<(String, String)>,
) -> Response {
    const SOURCE: &str = "infra::http::public::serve_upload";

    let Ok(bucket) = bucket.parse::<Bucket>() else {
        return ApiError::not_found("Upload not found")
            .with_source(SOURCE)
            .into_response();
    };

    match state.blobs.read(bucket, &key).await {
        Ok(bytes) => build_upload_response(&key, bytes),
        Err(err) if err.is_not_found() => ApiError::not_found("Upload not found")
            .with_source(SOURCE)
            .with_detail(err)
            .into_response(),
        Err(err) => {
            error!(
                target = "bravespace::http::public",
                bucket = %bucket,
                key = %key,
                error = %err,
                "failed to read stored upload"
            );
            ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                super::error::codes::UPLOAD,
                "Failed to read uploaded file",
                None,
            )
            .with_source(SOURCE)
            .with_detail(err)
            .into_response()
        }
    }
}

fn build_upload_response(key: &str, bytes: Bytes) -> Response {
    let length = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    let mime = mime_guess::from_path(key).first_or_octet_stream();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&length.to_string()) {
        headers.insert(CONTENT_LENGTH, value);
    }
    headers.insert(
        CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=31536000, immutable"),
    );

    response
}

async fn health(State(state): State<HttpState>) -> Response {
    match state.health.check().await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(message) => {
            let mut response = StatusCode::SERVICE_UNAVAILABLE.into_response();
            ErrorReport::from_message(
                "infra::http::health",
                StatusCode::SERVICE_UNAVAILABLE,
                message,
            )
            .attach(&mut response);
            response
        }
    }
}
