use crate::api::response::Payload;

pub const NO_RESPONSE: &str = "No response received.";

/// Pretty JSON (two-space indent), raw text, or a notice for empty bodies.
pub fn render_payload(payload: &Payload) -> String {
    match payload {
        Payload::Json(value) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        Payload::Text(text) => text.clone(),
        Payload::Empty => NO_RESPONSE.to_string(),
    }
}

pub fn print_payload(payload: &Payload) {
    println!("{}", render_payload(payload));
}
