use serde_json::{json, Value};

/// Turns a raw response body into a JSON payload.
///
/// Bodies that advertise or look like JSON are parsed; anything else, including
/// JSON-looking text that fails to parse, is wrapped as `{"message": body}`.
/// An empty body becomes `{"message": status_text}`.
pub fn classify(content_type: Option<&str>, body: &str, status_text: &str) -> Value {
    if body.is_empty() {
        return json!({ "message": status_text });
    }

    if is_json_content_type(content_type) || looks_like_json(body) {
        if let Ok(value) = serde_json::from_str(body) {
            return value;
        }
    }

    json!({ "message": body })
}

pub fn is_json_content_type(content_type: Option<&str>) -> bool {
    let Some(value) = content_type else {
        return false;
    };
    let mime = value.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    mime == "application/json" || mime.ends_with("+json")
}

fn looks_like_json(body: &str) -> bool {
    let trimmed = body.trim();
    trimmed.starts_with('{') || trimmed.starts_with('[')
}
