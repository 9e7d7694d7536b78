//! HTTP surface: public read API, bearer-protected admin API and blob
//! serving.

mod admin;
pub mod error;
mod middleware;
mod public;
mod state;

pub use error::{ApiError, ApiErrorBody, codes};
pub use middleware::RequestContext;
pub use public::PostListResponse;
pub use state::{HealthCheck, HttpState};

use axum::{Router, extract::DefaultBodyLimit, middleware as axum_middleware};

use middleware::{log_responses, set_request_context};

/// Assemble the full application router.
pub fn build_router(state: HttpState) -> Router {
    let body_limit = state.max_request_bytes;

    public::build_public_router()
        .merge(admin::build_admin_router(state.clone()))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(axum_middleware::from_fn(log_responses))
        .layer(axum_middleware::from_fn(set_request_context))
}
