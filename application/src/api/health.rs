//! Health check endpoint.

use axum::Json;
use serde_json::{json, Value};

/// Reports that the application is up.
#[expect(
    clippy::unused_async,
    reason = "`async` is required to match signature"
)]
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
