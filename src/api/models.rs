use crate::storage::credentials::Credential;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// Authentication models
#[derive(Debug, Serialize)]
pub struct SignInRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TokenResponse {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Absolute expiry, unix seconds
    pub expires_at: Option<i64>,
    /// Relative expiry, seconds from now
    pub expires_in: Option<i64>,
}

impl TokenResponse {
    /// Tokens are either at the top level or nested under `session`.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        let top: TokenResponse = serde_json::from_value(payload.clone()).ok()?;
        if top.access_token.is_some() {
            return Some(top);
        }
        let nested = payload.get("session")?;
        serde_json::from_value(nested.clone()).ok()
    }

    /// Build a credential; `None` when the response carries no access token.
    pub fn into_credential(self, now: DateTime<Utc>) -> Option<Credential> {
        let access_token = self.access_token.filter(|t| !t.is_empty())?;
        let expires_at = self
            .expires_at
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .or_else(|| self.expires_in.map(|secs| now + Duration::seconds(secs)));

        Some(Credential {
            access_token,
            refresh_token: self.refresh_token.filter(|t| !t.is_empty()),
            expires_at,
        })
    }
}

/// Identity bound to the current credential (`auth/me`)
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct UserInfo {
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// Collection models
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CollectionSummary {
    pub uuid: String,
    pub name: Option<String>,
    #[serde(default)]
    pub document_count: Option<u64>,
    #[serde(default)]
    pub chunk_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_token_response_top_level() {
        let payload = json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_at": 1_900_000_000,
            "user_id": "u1"
        });
        let token = TokenResponse::from_payload(&payload).unwrap();
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let credential = token.into_credential(now).unwrap();

        assert_eq!(credential.access_token, "a");
        assert_eq!(credential.refresh_token.as_deref(), Some("r"));
        assert_eq!(credential.expires_at.unwrap().timestamp(), 1_900_000_000);
    }

    #[test]
    fn test_token_response_nested_session_with_expires_in() {
        let payload = json!({
            "user": {"email": "a@b.com"},
            "session": {"access_token": "a", "refresh_token": "r", "expires_in": 3600}
        });
        let now = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        let credential = TokenResponse::from_payload(&payload)
            .unwrap()
            .into_credential(now)
            .unwrap();

        assert_eq!(credential.expires_at, Some(now + Duration::seconds(3600)));
    }

    #[test]
    fn test_token_response_without_access_token() {
        let payload = json!({"user": {"email": "a@b.com"}, "message": "Check your email"});
        let token = TokenResponse::from_payload(&payload);
        assert!(token.is_none_or(|t| t.into_credential(Utc::now()).is_none()));
    }

    #[test]
    fn test_user_info_keeps_extra_fields() {
        let user: UserInfo = serde_json::from_value(json!({
            "identity": "u1",
            "email": "a@b.com",
            "permissions": ["authenticated"]
        }))
        .unwrap();
        assert_eq!(user.identity.as_deref(), Some("u1"));
        assert!(user.extra.contains_key("permissions"));
    }
}
