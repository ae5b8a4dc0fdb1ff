use serde_json::Value;

/// Decoded response body
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
    Empty,
}

impl Payload {
    /// JSON first, raw text when the body is not valid JSON.
    pub fn decode(body: &str) -> Self {
        if body.trim().is_empty() {
            return Payload::Empty;
        }
        match serde_json::from_str::<Value>(body) {
            Ok(value) => Payload::Json(value),
            Err(_) => Payload::Text(body.to_string()),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope {
    pub status: u16,
    pub payload: Payload,
    pub ok: bool,
}

impl ResponseEnvelope {
    pub fn new(status: u16, payload: Payload) -> Self {
        Self {
            status,
            payload,
            ok: (200..300).contains(&status),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_json() {
        assert_eq!(
            Payload::decode("{\"items\":[]}"),
            Payload::Json(json!({"items": []}))
        );
    }

    #[test]
    fn test_decode_falls_back_to_text() {
        assert_eq!(
            Payload::decode("<html>oops</html>"),
            Payload::Text("<html>oops</html>".to_string())
        );
    }

    #[test]
    fn test_decode_empty() {
        assert_eq!(Payload::decode(""), Payload::Empty);
        assert_eq!(Payload::decode("  \n"), Payload::Empty);
    }

    #[test]
    fn test_envelope_ok_flag() {
        assert!(ResponseEnvelope::new(204, Payload::Empty).ok);
        assert!(!ResponseEnvelope::new(404, Payload::Empty).ok);
    }
}
