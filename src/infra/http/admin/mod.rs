//! Bearer-protected admin API: sign-in, posts, tags, founders and gallery.

mod founders;
mod gallery;
mod multipart;
mod posts;
mod tags;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::Deserialize;

use crate::application::auth::{AuthError, IssuedSession};

use super::error::{ApiError, auth_to_api};
use super::middleware::{admin_auth, bearer_token};
use super::state::HttpState;

pub fn build_admin_router(state: HttpState) -> Router<HttpState> {
    let protected = Router::new()
        .route("/api/admin/logout", post(logout))
        .route("/api/admin/posts", get(posts::list).post(posts::create))
        .route("/api/admin/posts/{id}", delete(posts::remove))
        .route("/api/admin/posts/{id}/toggle", post(posts::toggle))
        .route("/api/admin/tags", get(tags::list).post(tags::create))
        .route("/api/admin/tags/{id}", delete(tags::remove))
        .route(
            "/api/admin/founders",
            get(founders::list).post(founders::create),
        )
        .route(
            "/api/admin/founders/{id}",
            put(founders::update).delete(founders::remove),
        )
        .route("/api/admin/gallery", get(gallery::list).post(gallery::upload))
        .route("/api/admin/gallery/{id}", delete(gallery::remove))
        .layer(from_fn_with_state(state, admin_auth));

    Router::new()
        .route("/api/admin/login", post(login))
        .merge(protected)
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

async fn login(
    State(state): State<HttpState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<IssuedSession>, ApiError> {
    let Json(payload) = payload.map_err(json_to_api)?;
    let session = state
        .auth
        .login(&payload.username, &payload.password)
        .map_err(auth_to_api)?;
    Ok(Json(session))
}

async fn logout(State(state): State<HttpState>, headers: HeaderMap) -> Response {
    match bearer_token(&headers) {
        Some(token) => {
            state.auth.logout(&token);
            StatusCode::NO_CONTENT.into_response()
        }
        None => auth_to_api(AuthError::InvalidToken).into_response(),
    }
}

pub(super) fn json_to_api(rejection: JsonRejection) -> ApiError {
    ApiError::bad_request("Invalid JSON payload", Some(rejection.body_text()))
        .with_source("infra::http::admin::json")
        .with_detail(rejection)
}
