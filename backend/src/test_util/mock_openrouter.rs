//! Canned OpenRouter response bodies for tests.

use serde_json::{json, Value};

/// Successful chat completion carrying one answer.
pub fn completion_json(content: &str) -> Value {
    json!({
        "id": "gen-test",
        "choices": [{
            "message": {
                "role": "assistant",
                "content": content
            },
            "finish_reason": "stop"
        }]
    })
}

/// 2xx completion with no message content; the client substitutes its
/// placeholder answer.
pub fn completion_without_content_json() -> Value {
    json!({
        "id": "gen-test",
        "choices": []
    })
}

/// Error body in OpenRouter's `error.message` shape.
pub fn error_json(message: &str) -> Value {
    json!({
        "error": {
            "message": message,
            "code": 429
        }
    })
}

/// Free-model listing in the frontend find-endpoint shape.
pub fn model_find_json(slugs: &[&str]) -> Value {
    let models: Vec<Value> = slugs
        .iter()
        .map(|slug| {
            json!({
                "slug": slug,
                "name": slug,
                "pricing": { "prompt": "0", "completion": "0" }
            })
        })
        .collect();
    json!({ "data": { "models": models } })
}
