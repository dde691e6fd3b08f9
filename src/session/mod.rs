//! HTTP session abstraction.
//!
//! Responsibilities:
//! - Own the transport configuration: browser-like default headers with a
//!   selectable user-agent, TLS-verification policy, per-method timeouts, and
//!   a bounded redirect policy.
//! - Apply the retry/backoff policy for transient statuses and low-level
//!   transport failures so callers only ever see a final response or a
//!   `TransportError`.

use std::collections::HashMap;
use std::time::Duration;

use bytes::Bytes;
use reqwest::redirect;
use thiserror::Error;
use tokio::time::sleep;
use url::Url;

pub mod retry;
pub mod user_agents;

pub use retry::RetryPolicy;
pub use user_agents::UserAgentChoice;

/// Timeout for plain page fetches.
pub const DEFAULT_GET_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout for the login POST; longer to account for server-side processing.
pub const DEFAULT_POST_TIMEOUT: Duration = Duration::from_secs(15);

/// Redirects are capped at one hop so the landing URL can be inspected
/// directly instead of silently following an arbitrary chain.
const DEFAULT_REDIRECT_CAP: usize = 1;

/// Transport configuration, fixed for the lifetime of a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub user_agent: UserAgentChoice,
    /// TLS certificate verification. Permissive by default for lab targets.
    pub verify_tls: bool,
    pub get_timeout: Duration,
    pub post_timeout: Duration,
    pub redirect_cap: usize,
    pub retry: RetryPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_agent: UserAgentChoice::default(),
            verify_tls: false,
            get_timeout: DEFAULT_GET_TIMEOUT,
            post_timeout: DEFAULT_POST_TIMEOUT,
            redirect_cap: DEFAULT_REDIRECT_CAP,
            retry: RetryPolicy::default(),
        }
    }
}

/// Final response surfaced to callers after redirects and retries.
#[derive(Debug, Clone)]
pub struct SessionResponse {
    status: u16,
    url: Url,
    body: Bytes,
}

impl SessionResponse {
    pub fn new(status: u16, url: Url, body: Bytes) -> Self {
        Self { status, url, body }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    /// Final URL after redirect handling.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Body as UTF-8 text, lossy.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    pub fn bytes(&self) -> Bytes {
        self.body.clone()
    }
}

/// Network-layer failure after retries were exhausted. Callers must be able
/// to distinguish this from a credential rejection.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build http client: {0}")]
    ClientInit(#[source] reqwest::Error),
    #[error("invalid session headers: {0}")]
    Headers(#[from] user_agents::HeaderSetError),
    #[error("invalid request url `{url}`: {source}")]
    Url {
        url: String,
        source: url::ParseError,
    },
    #[error("request to {url} failed after {attempts} attempt(s): {source}")]
    Exhausted {
        url: String,
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} kept returning status {status} after {attempts} attempt(s)")]
    RetryableStatus {
        url: String,
        status: u16,
        attempts: u32,
    },
}

/// Single-owner HTTP session. Owns the reqwest client (and its cookie jar)
/// for exactly one sweep; never shared across concurrent sweeps.
#[derive(Debug)]
pub struct HttpSession {
    client: reqwest::Client,
    user_agent: String,
    get_timeout: Duration,
    post_timeout: Duration,
    retry: RetryPolicy,
}

impl HttpSession {
    pub fn new(config: SessionConfig) -> Result<Self, TransportError> {
        let user_agent = config.user_agent.resolve();
        let headers = user_agents::default_headers(&user_agent)?;

        let redirect_cap = config.redirect_cap;
        let policy = redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() > redirect_cap {
                attempt.stop()
            } else {
                attempt.follow()
            }
        });

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .redirect(policy)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(TransportError::ClientInit)?;

        Ok(Self {
            client,
            user_agent,
            get_timeout: config.get_timeout,
            post_timeout: config.post_timeout,
            retry: config.retry,
        })
    }

    /// The user-agent string resolved at construction time.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub async fn get(&self, url: &str) -> Result<SessionResponse, TransportError> {
        self.execute(url, self.get_timeout, None).await
    }

    pub async fn post_form(
        &self,
        url: &str,
        fields: &HashMap<String, String>,
    ) -> Result<SessionResponse, TransportError> {
        self.execute(url, self.post_timeout, Some(fields)).await
    }

    async fn execute(
        &self,
        url: &str,
        timeout: Duration,
        form: Option<&HashMap<String, String>>,
    ) -> Result<SessionResponse, TransportError> {
        let parsed = Url::parse(url).map_err(|source| TransportError::Url {
            url: url.to_string(),
            source,
        })?;

        let max_retries = self.retry.max_retries();
        let mut attempts = 0u32;

        loop {
            attempts += 1;

            let builder = match form {
                Some(fields) => self.client.post(parsed.clone()).form(fields),
                None => self.client.get(parsed.clone()),
            }
            .timeout(timeout);

            match builder.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if self.retry.is_retryable_status(status) {
                        if attempts <= max_retries {
                            let wait = self.retry.backoff_for(attempts);
                            log::debug!(
                                "{} returned {}, retrying ({}/{}) after {:.2}s",
                                parsed,
                                status,
                                attempts,
                                max_retries,
                                wait.as_secs_f64()
                            );
                            sleep(wait).await;
                            continue;
                        }
                        return Err(TransportError::RetryableStatus {
                            url: parsed.to_string(),
                            status,
                            attempts,
                        });
                    }

                    let final_url = response.url().clone();
                    let body = response.bytes().await.map_err(|source| {
                        TransportError::Exhausted {
                            url: parsed.to_string(),
                            attempts,
                            source,
                        }
                    })?;

                    return Ok(SessionResponse::new(status, final_url, body));
                }
                Err(source) => {
                    if attempts <= max_retries {
                        let wait = self.retry.backoff_for(attempts);
                        log::debug!(
                            "request to {} failed ({}), retrying ({}/{}) after {:.2}s",
                            parsed,
                            source,
                            attempts,
                            max_retries,
                            wait.as_secs_f64()
                        );
                        sleep(wait).await;
                        continue;
                    }
                    return Err(TransportError::Exhausted {
                        url: parsed.to_string(),
                        attempts,
                        source,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_permissive_and_bounded() {
        let config = SessionConfig::default();
        assert!(!config.verify_tls);
        assert_eq!(config.get_timeout, DEFAULT_GET_TIMEOUT);
        assert_eq!(config.post_timeout, DEFAULT_POST_TIMEOUT);
        assert_eq!(config.redirect_cap, 1);
    }

    #[test]
    fn session_reports_resolved_user_agent() {
        let session = HttpSession::new(SessionConfig {
            user_agent: UserAgentChoice::Fixed("ProbeBot/1.0".into()),
            ..SessionConfig::default()
        })
        .unwrap();
        assert_eq!(session.user_agent(), "ProbeBot/1.0");
    }
}
