use axum::{body::to_bytes, response::Response};
use serde_json::Value;

/// Reads an Axum response body and parses it as JSON.
pub async fn response_to_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Reads an Axum response body as UTF-8 text (for plain-text error bodies).
pub async fn response_to_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
