use axum::Json;
use serde_json::{json, Value};

pub mod replier_handlers;

// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
