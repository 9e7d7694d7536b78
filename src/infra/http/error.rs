//! JSON error responses and the mapping from service errors onto them.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::application::admin::founders::FounderError;
use crate::application::admin::gallery::GalleryError;
use crate::application::admin::posts::AdminPostError;
use crate::application::admin::tags::AdminTagError;
use crate::application::auth::AuthError;
use crate::application::error::ErrorReport;
use crate::application::feed::FeedError;
use crate::application::repos::RepoError;
use crate::application::storage::{BlobStoreError, UploadError};

#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorMessage,
}

pub mod codes {
    pub const BAD_REQUEST: &str = "bad_request";
    pub const VALIDATION: &str = "validation_error";
    pub const UNAUTHORIZED: &str = "unauthorized";
    pub const SESSION_EXPIRED: &str = "session_expired";
    pub const LOGIN_DISABLED: &str = "login_disabled";
    pub const NOT_FOUND: &str = "not_found";
    pub const DUPLICATE: &str = "duplicate";
    pub const INVALID_INPUT: &str = "invalid_input";
    pub const INTEGRITY: &str = "integrity_error";
    pub const DB_TIMEOUT: &str = "db_timeout";
    pub const REPO: &str = "store_error";
    pub const UPLOAD: &str = "upload_error";
    pub const PAYLOAD_TOO_LARGE: &str = "payload_too_large";
}

#[derive(Debug, Serialize)]
pub struct ApiErrorMessage {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// An error response. `hint` is shown to the caller; `detail` only reaches
/// the response log.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: &'static str,
    hint: Option<String>,
    source: &'static str,
    detail: Option<String>,
}

impl ApiError {
    pub fn new(
        status: StatusCode,
        code: &'static str,
        message: &'static str,
        hint: Option<String>,
    ) -> Self {
        Self {
            status,
            code,
            message,
            hint,
            source: "infra::http",
            detail: None,
        }
    }

    pub fn bad_request(message: &'static str, hint: Option<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, codes::BAD_REQUEST, message, hint)
    }

    pub fn validation(field: &str) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            codes::VALIDATION,
            "Validation failed",
            Some(format!("`{field}` is missing or invalid")),
        )
    }

    pub fn unauthorized() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            codes::UNAUTHORIZED,
            "Admin session required",
            None,
        )
    }

    pub fn not_found(message: &'static str) -> Self {
        Self::new(StatusCode::NOT_FOUND, codes::NOT_FOUND, message, None)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    #[must_use]
    pub fn with_source(mut self, source: &'static str) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl std::fmt::Display) -> Self {
        self.detail = Some(detail.to_string());
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let logged = self
            .detail
            .clone()
            .or_else(|| self.hint.clone())
            .unwrap_or_else(|| self.message.to_string());
        let body = ApiErrorBody {
            error: ApiErrorMessage {
                code: self.code.to_string(),
                message: self.message.to_string(),
                hint: self.hint,
            },
        };
        let mut response = (self.status, Json(body)).into_response();
        ErrorReport::from_message(self.source, self.status, format!("{}: {logged}", self.code))
            .attach(&mut response);
        response
    }
}

pub fn repo_to_api(err: RepoError) -> ApiError {
    let api = match &err {
        RepoError::Duplicate { constraint } => ApiError::new(
            StatusCode::CONFLICT,
            codes::DUPLICATE,
            "Duplicate record",
            Some(constraint.clone()),
        ),
        RepoError::NotFound => ApiError::not_found("Resource not found"),
        RepoError::InvalidInput { message } => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::INVALID_INPUT,
            "Invalid input",
            Some(message.clone()),
        ),
        RepoError::Integrity { message } => ApiError::new(
            StatusCode::CONFLICT,
            codes::INTEGRITY,
            "Integrity constraint violated",
            Some(message.clone()),
        ),
        RepoError::Timeout => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::DB_TIMEOUT,
            "Database timeout",
            None,
        ),
        RepoError::Persistence(_) => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::REPO,
            "Something went wrong, please try again",
            None,
        ),
    };
    api.with_detail(err)
}

pub fn upload_to_api(err: UploadError) -> ApiError {
    let api = match &err {
        UploadError::Invalid(invalid) if err.is_too_large() => ApiError::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            codes::PAYLOAD_TOO_LARGE,
            "Image is too large",
            Some(invalid.to_string()),
        ),
        UploadError::Invalid(invalid) => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::UPLOAD,
            "Image upload rejected",
            Some(invalid.to_string()),
        ),
        UploadError::Store(store) => blob_to_api_status(store),
    };
    api.with_detail(err)
}

fn blob_to_api_status(err: &BlobStoreError) -> ApiError {
    match err {
        BlobStoreError::EmptyPayload => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::UPLOAD,
            "Image upload rejected",
            Some("image is empty".to_string()),
        ),
        _ => ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            codes::UPLOAD,
            "Image upload failed, please try again",
            None,
        ),
    }
}

pub fn post_to_api(err: AdminPostError) -> ApiError {
    match err {
        AdminPostError::ConstraintViolation(field) => ApiError::validation(field),
        AdminPostError::NotFound => ApiError::not_found("Post not found"),
        AdminPostError::Upload(err) => upload_to_api(err),
        AdminPostError::Repo(err) => repo_to_api(err),
    }
    .with_source("infra::http::admin::posts")
}

pub fn tag_to_api(err: AdminTagError) -> ApiError {
    match err {
        AdminTagError::ConstraintViolation(field) => ApiError::validation(field),
        AdminTagError::NotFound => ApiError::not_found("Tag not found"),
        AdminTagError::Repo(err) => repo_to_api(err),
    }
    .with_source("infra::http::admin::tags")
}

pub fn founder_to_api(err: FounderError) -> ApiError {
    match err {
        FounderError::ConstraintViolation(field) => ApiError::validation(field),
        FounderError::NotFound => ApiError::not_found("Founder not found"),
        FounderError::Upload(err) => upload_to_api(err),
        FounderError::Repo(err) => repo_to_api(err),
    }
    .with_source("infra::http::admin::founders")
}

pub fn gallery_to_api(err: GalleryError) -> ApiError {
    match err {
        GalleryError::NoFiles => ApiError::new(
            StatusCode::BAD_REQUEST,
            codes::VALIDATION,
            "Validation failed",
            Some("at least one file is required".to_string()),
        ),
        GalleryError::NotFound => ApiError::not_found("Gallery image not found"),
        GalleryError::Upload { filename, source } => {
            let detail = format!("{filename}: {source}");
            let api = upload_to_api(source);
            ApiError::new(
                api.status(),
                api.code(),
                "Image upload rejected",
                Some(format!("`{filename}` could not be stored")),
            )
            .with_detail(detail)
        }
        GalleryError::Repo(err) => repo_to_api(err),
    }
    .with_source("infra::http::admin::gallery")
}

pub fn feed_to_api(err: FeedError) -> ApiError {
    match err {
        FeedError::NotFound => ApiError::not_found("Post not found"),
        FeedError::Repo(err) => repo_to_api(err),
    }
    .with_source("infra::http::public")
}

pub fn auth_to_api(err: AuthError) -> ApiError {
    match err {
        AuthError::NotConfigured => ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            codes::LOGIN_DISABLED,
            "Admin sign-in is not configured",
            None,
        ),
        AuthError::InvalidCredentials => ApiError::new(
            StatusCode::UNAUTHORIZED,
            codes::UNAUTHORIZED,
            "Invalid username or password",
            None,
        ),
        AuthError::InvalidToken => ApiError::unauthorized(),
        AuthError::Expired => ApiError::new(
            StatusCode::UNAUTHORIZED,
            codes::SESSION_EXPIRED,
            "Admin session expired",
            None,
        ),
    }
    .with_source("infra::http::admin::auth")
}
