//! Response classification.
//!
//! Maps a completed login response (final URL after redirects, body text) to
//! a semantic outcome. Marker sets are data rather than code: the default set
//! mirrors the known target markers, and a custom set can be loaded from JSON
//! when a service changes its pages. The classifier is injected as a strategy
//! so the engine stays testable against synthetic responses.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use serde::Deserialize;
use thiserror::Error;
use url::Url;

/// Semantic outcome of one completed login response.
///
/// Anything that matches neither the blocked nor the success markers is a
/// `Failure`; false negatives are preferred over false positives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Success,
    Blocked,
    Failure,
}

/// Strategy converting a raw response into a [`Classification`].
pub trait Classifier: Send + Sync {
    fn classify(&self, final_url: &Url, body: &str) -> Classification;
}

/// One body substring marker, optionally matched case-insensitively.
#[derive(Debug, Clone, Deserialize)]
pub struct BodyMarker {
    pub text: String,
    #[serde(default)]
    pub case_insensitive: bool,
}

impl BodyMarker {
    pub fn exact(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            case_insensitive: false,
        }
    }

    pub fn any_case(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            case_insensitive: true,
        }
    }
}

/// Marker sets driving the default classifier.
#[derive(Debug, Clone, Deserialize)]
pub struct MarkerRules {
    /// URL fragments naming a rejection or challenge/checkpoint interstitial.
    pub blocked_url_markers: Vec<String>,
    /// URL fragments naming a post-authentication landing page.
    pub success_url_markers: Vec<String>,
    /// Body substrings that only appear in an authenticated session.
    pub success_body_markers: Vec<BodyMarker>,
}

impl Default for MarkerRules {
    fn default() -> Self {
        Self {
            blocked_url_markers: vec!["login_error".into(), "checkpoint".into()],
            success_url_markers: vec![
                "facebook.com/home".into(),
                "facebook.com/?sk=welcome".into(),
            ],
            success_body_markers: vec![
                BodyMarker::exact("Welcome to Facebook"),
                BodyMarker::any_case("news feed"),
            ],
        }
    }
}

impl MarkerRules {
    /// Load a custom marker set from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RulesError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| RulesError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| RulesError::InvalidJson {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("I/O error reading marker rules {path:?}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("marker rules JSON invalid at {path:?}: {source}")]
    InvalidJson {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Default classifier: ordered substring matching against the marker rules.
///
/// Decision order is a deliberate tie-break, most specific/negative signal
/// first: blocked URL marker, then success URL marker, then success body
/// marker, then `Failure`.
#[derive(Debug)]
pub struct MarkerClassifier {
    rules: MarkerRules,
    body_patterns: Vec<Regex>,
}

impl MarkerClassifier {
    pub fn new(rules: MarkerRules) -> Self {
        let body_patterns = rules
            .success_body_markers
            .iter()
            .map(|marker| {
                RegexBuilder::new(&regex::escape(&marker.text))
                    .case_insensitive(marker.case_insensitive)
                    .build()
                    .expect("escaped marker is a valid regex")
            })
            .collect();

        Self {
            rules,
            body_patterns,
        }
    }

    pub fn rules(&self) -> &MarkerRules {
        &self.rules
    }
}

impl Default for MarkerClassifier {
    fn default() -> Self {
        Self::new(MarkerRules::default())
    }
}

impl Classifier for MarkerClassifier {
    fn classify(&self, final_url: &Url, body: &str) -> Classification {
        let url_str = final_url.as_str();

        if self
            .rules
            .blocked_url_markers
            .iter()
            .any(|marker| url_str.contains(marker.as_str()))
        {
            return Classification::Blocked;
        }

        if self
            .rules
            .success_url_markers
            .iter()
            .any(|marker| url_str.contains(marker.as_str()))
        {
            return Classification::Success;
        }

        if self.body_patterns.iter().any(|pattern| pattern.is_match(body)) {
            return Classification::Success;
        }

        Classification::Failure
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn checkpoint_url_is_blocked() {
        let classifier = MarkerClassifier::default();
        let result = classifier.classify(
            &url("https://www.facebook.com/checkpoint/?next=1"),
            "<html></html>",
        );
        assert_eq!(result, Classification::Blocked);
    }

    #[test]
    fn blocked_marker_wins_over_success_marker() {
        // Most negative signal first: a URL carrying both markers is Blocked.
        let classifier = MarkerClassifier::default();
        let result = classifier.classify(
            &url("https://www.facebook.com/home?next=login_error"),
            "Welcome to Facebook",
        );
        assert_eq!(result, Classification::Blocked);
    }

    #[test]
    fn landing_url_is_success() {
        let classifier = MarkerClassifier::default();
        let result = classifier.classify(&url("https://www.facebook.com/home.php"), "");
        assert_eq!(result, Classification::Success);
    }

    #[test]
    fn feed_marker_matches_any_case() {
        let classifier = MarkerClassifier::default();
        let result = classifier.classify(
            &url("https://www.facebook.com/login.php"),
            "<div>Your News Feed</div>",
        );
        assert_eq!(result, Classification::Success);
    }

    #[test]
    fn banner_marker_is_case_sensitive() {
        let classifier = MarkerClassifier::default();
        let result = classifier.classify(
            &url("https://www.facebook.com/login.php"),
            "welcome to facebook",
        );
        assert_eq!(result, Classification::Failure);
    }

    #[test]
    fn unknown_response_defaults_to_failure() {
        let classifier = MarkerClassifier::default();
        let result = classifier.classify(
            &url("https://www.facebook.com/login.php"),
            "<html>try again</html>",
        );
        assert_eq!(result, Classification::Failure);
    }

    #[test]
    fn classification_is_deterministic() {
        let classifier = MarkerClassifier::default();
        let target = url("https://www.facebook.com/login.php?login_attempt=1");
        let body = "Wrong credentials";
        let first = classifier.classify(&target, body);
        let second = classifier.classify(&target, body);
        assert_eq!(first, second);
    }

    #[test]
    fn custom_rules_deserialize_from_json() {
        let raw = r#"{
            "blocked_url_markers": ["denied"],
            "success_url_markers": ["dashboard"],
            "success_body_markers": [{"text": "signed in", "case_insensitive": true}]
        }"#;
        let rules: MarkerRules = serde_json::from_str(raw).unwrap();
        let classifier = MarkerClassifier::new(rules);
        assert_eq!(
            classifier.classify(&url("https://target.test/dashboard"), ""),
            Classification::Success
        );
        assert_eq!(
            classifier.classify(&url("https://target.test/login"), "You are SIGNED IN"),
            Classification::Success
        );
    }
}
