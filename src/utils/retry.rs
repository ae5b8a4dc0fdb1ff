use crate::AppError;
use crate::api::request::{HttpMethod, RequestSpec};
use crate::api::response::ResponseEnvelope;
use crate::core::clock::Clock;
use crate::core::session::SessionManager;
use crate::storage::credentials::CredentialStore;
use backoff::{ExponentialBackoff, backoff::Backoff};
use std::time::Duration;

/// Retry configuration for transport failures
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt; zero disables retrying
    pub max_retries: u32,
    /// Initial retry delay
    pub initial_delay: Duration,
    /// Maximum retry delay
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub multiplier: f64,
    /// Also retry POST and PATCH
    pub allow_unsafe: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
            allow_unsafe: false,
        }
    }
}

impl RetryConfig {
    pub fn with_retries(max_retries: u32, allow_unsafe: bool) -> Self {
        Self {
            max_retries,
            allow_unsafe,
            ..Self::default()
        }
    }
}

/// Re-sends a request through the session manager while the failure is a
/// transport error and the verb is safe to repeat.
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub async fn send<S, C>(
        &self,
        session: &mut SessionManager<S, C>,
        spec: &RequestSpec,
        require_auth: bool,
    ) -> Result<ResponseEnvelope, AppError>
    where
        S: CredentialStore,
        C: Clock,
    {
        let mut backoff = ExponentialBackoff {
            initial_interval: self.config.initial_delay,
            max_interval: self.config.max_delay,
            multiplier: self.config.multiplier,
            max_elapsed_time: None,
            ..Default::default()
        };

        let mut attempt = 0;

        loop {
            attempt += 1;

            match session.send(spec, require_auth).await {
                Ok(envelope) => return Ok(envelope),
                Err(error) => {
                    if !self.should_retry(&error, attempt, spec.method) {
                        return Err(error);
                    }

                    match backoff.next_backoff() {
                        Some(delay) => {
                            log::warn!(
                                "{} (attempt {}), retrying in {:?}",
                                error,
                                attempt,
                                delay
                            );
                            tokio::time::sleep(delay).await;
                        }
                        None => return Err(error),
                    }
                }
            }
        }
    }

    /// Determine if an error should trigger another attempt
    fn should_retry(&self, error: &AppError, attempt: u32, method: HttpMethod) -> bool {
        if attempt > self.config.max_retries {
            return false;
        }
        if !method.is_idempotent() && !self.config.allow_unsafe {
            return false;
        }
        error.is_retryable()
    }
}
