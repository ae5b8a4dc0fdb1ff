//! Session lifecycle
//!
//! `SessionManager` is the only owner of the credential store. It signs in,
//! signs up, signs out, refreshes, and hands out a credential that is valid
//! at send time. At most one refresh is attempted per request; every failure
//! comes back to the caller as a classified [`AppError`].

use crate::AppError;
use crate::api::client::ApiClient;
use crate::api::models::{SignInRequest, TokenResponse, UserInfo};
use crate::api::request::RequestSpec;
use crate::api::response::ResponseEnvelope;
use crate::core::clock::{Clock, SystemClock};
use crate::error::{AuthError, ValidationError};
use crate::storage::config::AdminCredentials;
use crate::storage::credentials::{Credential, CredentialStore};
use chrono::Duration;
use serde_json::Value;

/// Tokens this close to expiry are refreshed before use.
pub const REFRESH_MARGIN_SECS: i64 = 30;

pub const SIGNIN_PATH: &str = "auth/signin";
pub const SIGNUP_PATH: &str = "auth/signup";
pub const SIGNOUT_PATH: &str = "auth/signout";
pub const REFRESH_PATH: &str = "auth/refresh";
pub const ME_PATH: &str = "auth/me";

#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    Authenticated { credential: Credential, payload: Value },
    /// The provider wants the email confirmed before issuing tokens.
    PendingVerification { payload: Value },
}

pub struct SessionManager<S, C = SystemClock> {
    client: ApiClient,
    store: S,
    clock: C,
    margin: Duration,
    auto_sign_in: Option<AdminCredentials>,
}

impl<S: CredentialStore> SessionManager<S, SystemClock> {
    pub fn new(client: ApiClient, store: S) -> Self {
        Self::with_clock(client, store, SystemClock)
    }
}

impl<S: CredentialStore, C: Clock> SessionManager<S, C> {
    pub fn with_clock(client: ApiClient, store: S, clock: C) -> Self {
        Self {
            client,
            store,
            clock,
            margin: Duration::seconds(REFRESH_MARGIN_SECS),
            auto_sign_in: None,
        }
    }

    /// Sign in with this account when an authenticated call finds no usable
    /// credential.
    pub fn with_auto_sign_in(mut self, admin: Option<AdminCredentials>) -> Self {
        self.auto_sign_in = admin;
        self
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn has_credential(&self) -> bool {
        self.store.current().is_some()
    }

    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<Credential, AppError> {
        let body = serde_json::to_value(SignInRequest { email, password })
            .map_err(|e| ValidationError::MalformedJson(e.to_string()))?;
        let spec = RequestSpec::post(SIGNIN_PATH).json(body);

        let envelope = self.client.dispatch(&spec, None).await.map_err(|e| match e {
            AppError::Auth(AuthError::Rejected { .. })
            | AppError::Validation(ValidationError::Server { status: 400, .. }) => {
                log::error!("Failed to sign in: {}", e);
                AuthError::InvalidCredentials.into()
            }
            other => other,
        })?;

        let credential = self.credential_from(&envelope, SIGNIN_PATH)?;
        self.store.replace(credential.clone())?;
        log::info!("Signed in as {}", email);
        Ok(credential)
    }

    pub async fn sign_up(&mut self, email: &str, password: &str) -> Result<SignUpOutcome, AppError> {
        let body = serde_json::to_value(SignInRequest { email, password })
            .map_err(|e| ValidationError::MalformedJson(e.to_string()))?;
        let spec = RequestSpec::post(SIGNUP_PATH).json(body);

        let envelope = self.client.dispatch(&spec, None).await?;
        let payload = envelope.payload.as_json().cloned().unwrap_or(Value::Null);

        match TokenResponse::from_payload(&payload).and_then(|t| t.into_credential(self.clock.now()))
        {
            Some(credential) => {
                self.store.replace(credential.clone())?;
                log::info!("Signed up and signed in as {}", email);
                Ok(SignUpOutcome::Authenticated {
                    credential,
                    payload,
                })
            }
            None => {
                log::info!("Sign up for {} is pending email verification", email);
                Ok(SignUpOutcome::PendingVerification { payload })
            }
        }
    }

    /// Revoke the session remotely when one is held, then clear the local
    /// store no matter how the remote call went. A remote failure is still
    /// reported.
    pub async fn sign_out(&mut self) -> Result<(), AppError> {
        let remote = match self.store.current() {
            Some(credential) => self
                .client
                .dispatch(&RequestSpec::post(SIGNOUT_PATH), Some(credential))
                .await
                .map(|_| ()),
            None => {
                log::info!("No credential held; skipping remote sign out");
                Ok(())
            }
        };

        self.store.clear()?;

        if let Err(e) = remote {
            log::warn!("Remote sign out failed after clearing local session: {}", e);
            return Err(e);
        }
        Ok(())
    }

    /// Exchange the stored refresh token for a new credential.
    ///
    /// Without a refresh token this fails immediately and performs no
    /// request. A rejection by the provider clears the store.
    pub async fn refresh(&mut self) -> Result<Credential, AppError> {
        let Some(refresh_token) = self
            .store
            .current()
            .filter(|c| c.has_refresh_token())
            .and_then(|c| c.refresh_token.clone())
        else {
            log::warn!("No refresh token available to refresh access token");
            return Err(AuthError::NoRefreshToken.into());
        };

        let spec = RequestSpec::post(REFRESH_PATH).query("refresh_token", refresh_token);
        match self.client.dispatch(&spec, None).await {
            Ok(envelope) => {
                let credential = self.credential_from(&envelope, REFRESH_PATH)?;
                self.store.replace(credential.clone())?;
                log::info!("Access token refreshed");
                Ok(credential)
            }
            Err(e @ AppError::Transport(_)) => Err(e),
            Err(e) => {
                log::error!("Failed to refresh token: {}", e);
                self.store.clear()?;
                Err(AuthError::RefreshRejected.into())
            }
        }
    }

    /// Cached credential if still fresh, otherwise the result of one refresh.
    ///
    /// When the refresh fails and `require_auth` is false the caller proceeds
    /// unauthenticated (`Ok(None)`).
    pub async fn current_credential(
        &mut self,
        require_auth: bool,
    ) -> Result<Option<Credential>, AppError> {
        let now = self.clock.now();
        if let Some(credential) = self.store.current() {
            if !credential.is_expired(now, self.margin) {
                return Ok(Some(credential.clone()));
            }
            log::info!("Access token expired or about to expire; refreshing");
        }

        match self.refresh().await {
            Ok(credential) => Ok(Some(credential)),
            Err(AppError::Auth(reason)) => {
                log::debug!("No usable credential: {}", reason);
                // A stale token that cannot be refreshed is dead
                if self.store.current().is_some() {
                    self.store.clear()?;
                }
                if require_auth {
                    Err(AuthError::Unauthenticated.into())
                } else {
                    Ok(None)
                }
            }
            Err(e) if require_auth => Err(e),
            Err(e) => {
                log::warn!("Proceeding without credential: {}", e);
                Ok(None)
            }
        }
    }

    pub async fn whoami(&mut self) -> Result<UserInfo, AppError> {
        let envelope = self.send(&RequestSpec::get(ME_PATH), true).await?;
        let payload = envelope
            .payload
            .into_json()
            .ok_or_else(|| ValidationError::UnexpectedResponse {
                endpoint: ME_PATH.to_string(),
                message: "expected a JSON object".to_string(),
            })?;

        serde_json::from_value(payload).map_err(|e| {
            ValidationError::UnexpectedResponse {
                endpoint: ME_PATH.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Resolve a credential and dispatch. This is the pipeline every command
    /// goes through.
    pub async fn send(
        &mut self,
        spec: &RequestSpec,
        require_auth: bool,
    ) -> Result<ResponseEnvelope, AppError> {
        // Reject a malformed body before any refresh or sign in traffic
        spec.body()?;
        let credential = self.resolve(require_auth).await?;
        self.client.dispatch(spec, credential.as_ref()).await
    }

    async fn resolve(&mut self, require_auth: bool) -> Result<Option<Credential>, AppError> {
        match self.current_credential(require_auth).await {
            Err(AppError::Auth(AuthError::Unauthenticated)) if require_auth => {
                match self.auto_sign_in.clone() {
                    Some(admin) => {
                        log::info!("Signing in with configured account {}", admin.email);
                        let credential = self.sign_in(&admin.email, admin.password.expose()).await?;
                        Ok(Some(credential))
                    }
                    None => Err(AuthError::Unauthenticated.into()),
                }
            }
            other => other,
        }
    }

    fn credential_from(
        &self,
        envelope: &ResponseEnvelope,
        endpoint: &str,
    ) -> Result<Credential, AppError> {
        envelope
            .payload
            .as_json()
            .and_then(TokenResponse::from_payload)
            .and_then(|t| t.into_credential(self.clock.now()))
            .ok_or_else(|| {
                ValidationError::UnexpectedResponse {
                    endpoint: endpoint.to_string(),
                    message: "response did not contain an access_token".to_string(),
                }
                .into()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use crate::error::TransportError;
    use crate::storage::config::Secret;
    use crate::storage::credentials::MemoryCredentialStore;
    use chrono::{DateTime, TimeZone, Utc};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap()
    }

    fn session(
        server: &MockServer,
        store: MemoryCredentialStore,
    ) -> SessionManager<MemoryCredentialStore, FixedClock> {
        let client = ApiClient::new(server.uri()).unwrap();
        SessionManager::with_clock(client, store, FixedClock(now()))
    }

    fn expired_credential() -> Credential {
        Credential {
            access_token: "stale".to_string(),
            refresh_token: Some("refresh-1".to_string()),
            expires_at: Some(now() - Duration::minutes(5)),
        }
    }

    async fn mount_refresh(server: &MockServer, status: u16, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/auth/refresh"))
            .and(query_param("refresh_token", "refresh-1"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "access_token": "fresh",
                "refresh_token": "refresh-2",
                "expires_in": 3600
            })))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_sign_in_then_current_credential_does_not_refresh() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/signin"))
            .and(body_json(json!({"email": "admin@example.test", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "a1",
                "refresh_token": "r1",
                "expires_in": 3600
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(path("/auth/refresh"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut session = session(&server, MemoryCredentialStore::new());
        let signed_in = session.sign_in("admin@example.test", "pw").await.unwrap();
        assert_eq!(signed_in.expires_at, Some(now() + Duration::seconds(3600)));

        let current = session.current_credential(true).await.unwrap();
        assert_eq!(current, Some(signed_in));
    }

    #[tokio::test]
    async fn test_sign_in_rejected_is_invalid_credentials() {
        let server = MockServer::start().await;
        Mock::given(path("/auth/signin"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid login"})),
            )
            .mount(&server)
            .await;

        let mut session = session(&server, MemoryCredentialStore::new());
        let result = session.sign_in("admin@example.test", "wrong").await;
        assert!(matches!(
            result,
            Err(AppError::Auth(AuthError::InvalidCredentials))
        ));
        assert!(!session.has_credential());
    }

    #[tokio::test]
    async fn test_sign_in_without_token_keeps_store_untouched() {
        let server = MockServer::start().await;
        Mock::given(path("/auth/signin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let previous = Credential {
            access_token: "keep".to_string(),
            refresh_token: None,
            expires_at: None,
        };
        let mut session = session(&server, MemoryCredentialStore::with_credential(previous.clone()));
        let result = session.sign_in("admin@example.test", "pw").await;
        assert!(matches!(
            result,
            Err(AppError::Validation(ValidationError::UnexpectedResponse { .. }))
        ));
        assert_eq!(session.store().current(), Some(&previous));
    }

    #[tokio::test]
    async fn test_expired_credential_triggers_exactly_one_refresh() {
        let server = MockServer::start().await;
        mount_refresh(&server, 200, 1).await;

        let mut session = session(
            &server,
            MemoryCredentialStore::with_credential(expired_credential()),
        );
        let current = session.current_credential(true).await.unwrap().unwrap();

        assert_eq!(current.access_token, "fresh");
        assert_eq!(current.refresh_token.as_deref(), Some("refresh-2"));
        assert_eq!(session.store().current(), Some(&current));
    }

    #[tokio::test]
    async fn test_credential_inside_margin_is_refreshed() {
        let server = MockServer::start().await;
        mount_refresh(&server, 200, 1).await;

        let almost_expired = Credential {
            expires_at: Some(now() + Duration::seconds(REFRESH_MARGIN_SECS - 1)),
            ..expired_credential()
        };
        let mut session = session(
            &server,
            MemoryCredentialStore::with_credential(almost_expired),
        );
        let current = session.current_credential(true).await.unwrap().unwrap();
        assert_eq!(current.access_token, "fresh");
    }

    #[tokio::test]
    async fn test_rejected_refresh_requires_new_sign_in() {
        let server = MockServer::start().await;
        mount_refresh(&server, 401, 1).await;

        let mut session = session(
            &server,
            MemoryCredentialStore::with_credential(expired_credential()),
        );
        let result = session.current_credential(true).await;

        assert!(matches!(
            result,
            Err(AppError::Auth(AuthError::Unauthenticated))
        ));
        assert!(!session.has_credential());
    }

    #[tokio::test]
    async fn test_refresh_rejection_is_reported_and_clears_store() {
        let server = MockServer::start().await;
        mount_refresh(&server, 400, 1).await;

        let mut session = session(
            &server,
            MemoryCredentialStore::with_credential(expired_credential()),
        );
        assert!(matches!(
            session.refresh().await,
            Err(AppError::Auth(AuthError::RefreshRejected))
        ));
        assert!(!session.has_credential());
    }

    #[tokio::test]
    async fn test_refresh_transport_failure_keeps_credential() {
        let server = MockServer::start().await;
        mount_refresh(&server, 503, 1).await;

        let mut session = session(
            &server,
            MemoryCredentialStore::with_credential(expired_credential()),
        );
        assert!(matches!(
            session.refresh().await,
            Err(AppError::Transport(TransportError::ServerError { status: 503, .. }))
        ));
        assert!(session.has_credential());
    }

    #[tokio::test]
    async fn test_optional_auth_falls_back_to_none() {
        let server = MockServer::start().await;
        mount_refresh(&server, 401, 1).await;

        let mut session = session(
            &server,
            MemoryCredentialStore::with_credential(expired_credential()),
        );
        assert_eq!(session.current_credential(false).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_refresh_without_token_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut empty = session(&server, MemoryCredentialStore::new());
        assert!(matches!(
            empty.refresh().await,
            Err(AppError::Auth(AuthError::NoRefreshToken))
        ));

        let without_refresh = Credential {
            refresh_token: None,
            ..expired_credential()
        };
        let mut session = session(
            &server,
            MemoryCredentialStore::with_credential(without_refresh),
        );
        assert!(matches!(
            session.refresh().await,
            Err(AppError::Auth(AuthError::NoRefreshToken))
        ));
        assert!(matches!(
            session.current_credential(true).await,
            Err(AppError::Auth(AuthError::Unauthenticated))
        ));
    }

    #[tokio::test]
    async fn test_sign_out_clears_store_when_remote_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/signout"))
            .and(header("authorization", "Bearer live"))
            .respond_with(ResponseTemplate::new(503))
            .expect(1)
            .mount(&server)
            .await;

        let live = Credential {
            access_token: "live".to_string(),
            refresh_token: Some("r".to_string()),
            expires_at: None,
        };
        let mut session = session(&server, MemoryCredentialStore::with_credential(live));
        let result = session.sign_out().await;

        assert!(matches!(result, Err(AppError::Transport(_))));
        assert!(!session.has_credential());
    }

    #[tokio::test]
    async fn test_sign_out_clears_store_when_server_unreachable() {
        let client = ApiClient::with_timeout(
            "http://127.0.0.1:9".to_string(),
            std::time::Duration::from_secs(5),
        )
        .unwrap();
        let live = Credential {
            access_token: "live".to_string(),
            refresh_token: None,
            expires_at: None,
        };
        let mut session = SessionManager::new(client, MemoryCredentialStore::with_credential(live));

        assert!(matches!(
            session.sign_out().await,
            Err(AppError::Transport(_))
        ));
        assert!(!session.has_credential());
    }

    #[tokio::test]
    async fn test_sign_out_without_credential_skips_remote() {
        let server = MockServer::start().await;
        Mock::given(path("/auth/signout"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut session = session(&server, MemoryCredentialStore::new());
        assert!(session.sign_out().await.is_ok());
    }

    #[tokio::test]
    async fn test_sign_up_pending_verification() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "user_id": "u1",
                "email": "new@example.test",
                "message": "Please check your email"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut session = session(&server, MemoryCredentialStore::new());
        let outcome = session.sign_up("new@example.test", "pw").await.unwrap();
        assert!(matches!(outcome, SignUpOutcome::PendingVerification { .. }));
        assert!(!session.has_credential());
    }

    #[tokio::test]
    async fn test_sign_up_with_tokens_authenticates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/signup"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "a1",
                "refresh_token": "r1",
                "email": "new@example.test"
            })))
            .mount(&server)
            .await;

        let mut session = session(&server, MemoryCredentialStore::new());
        match session.sign_up("new@example.test", "pw").await.unwrap() {
            SignUpOutcome::Authenticated { credential, payload } => {
                assert_eq!(credential.access_token, "a1");
                assert_eq!(payload["email"], "new@example.test");
            }
            other => panic!("Expected authenticated outcome, got {:?}", other),
        }
        assert!(session.has_credential());
    }

    #[tokio::test]
    async fn test_send_signs_in_with_configured_account() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/signin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "admin-token",
                "refresh_token": "r1"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/collections"))
            .and(header("authorization", "Bearer admin-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(2)
            .mount(&server)
            .await;

        let admin = AdminCredentials {
            email: "admin@example.test".to_string(),
            password: Secret::new("pw".to_string()),
        };
        let mut session =
            session(&server, MemoryCredentialStore::new()).with_auto_sign_in(Some(admin));

        session
            .send(&RequestSpec::get("collections"), true)
            .await
            .unwrap();
        // Second call reuses the stored token
        session
            .send(&RequestSpec::get("collections"), true)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_send_without_credential_fails_fast_when_auth_required() {
        let server = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut session = session(&server, MemoryCredentialStore::new());
        let result = session.send(&RequestSpec::get("collections"), true).await;
        assert!(matches!(
            result,
            Err(AppError::Auth(AuthError::Unauthenticated))
        ));
    }

    #[tokio::test]
    async fn test_send_unauthenticated_health() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let mut session = session(&server, MemoryCredentialStore::new());
        let envelope = session.send(&RequestSpec::get("health"), false).await.unwrap();
        assert_eq!(envelope.payload.as_json(), Some(&json!({"status": "ok"})));

        let received = server.received_requests().await.unwrap();
        assert!(received[0].headers.get("authorization").is_none());
    }

    #[tokio::test]
    async fn test_whoami() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .and(header("authorization", "Bearer live"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "identity": "u1",
                "email": "admin@example.test"
            })))
            .mount(&server)
            .await;

        let live = Credential {
            access_token: "live".to_string(),
            refresh_token: None,
            expires_at: None,
        };
        let mut session = session(&server, MemoryCredentialStore::with_credential(live));
        let user = session.whoami().await.unwrap();
        assert_eq!(user.email.as_deref(), Some("admin@example.test"));
    }

    #[tokio::test]
    async fn test_whoami_unauthenticated() {
        let server = MockServer::start().await;
        let mut session = session(&server, MemoryCredentialStore::new());
        assert!(matches!(
            session.whoami().await,
            Err(AppError::Auth(AuthError::Unauthenticated))
        ));
    }
}
