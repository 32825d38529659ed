//! HTTP API definitions.

pub mod auth;
pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::{define_error, Error};

/// Returns the [`Router`] of the HTTP API.
pub fn router() -> Router {
    Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/check-user", post(auth::check_user))
        .route("/api/auth/signup-check", get(auth::signup_check))
        .route("/api/health", get(health::health))
}

/// Fallback handler of the routes nobody serves.
#[expect(
    clippy::unused_async,
    reason = "`async` is required to match signature"
)]
pub async fn not_found() -> Error {
    ApiError::NotFound.into()
}

define_error! {
    enum ApiError {
        #[code = "NOT_FOUND"]
        #[status = NOT_FOUND]
        #[message = "Not found"]
        NotFound,
    }
}
