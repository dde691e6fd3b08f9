//! Login page parsing helpers.
//!
//! Extracts the login form's action and hidden input fields from a fetched
//! login page so the attempt payload can carry server-issued tokens. This is
//! an optional pre-attempt step; pages that cannot be parsed simply yield no
//! hints.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use thiserror::Error;
use url::Url;

/// Snapshot of the login form found on the page.
#[derive(Debug, Clone, Default)]
pub struct LoginFormHints {
    /// Form action, HTML-unescaped, possibly relative.
    pub action: Option<String>,
    /// Hidden `<input>` name/value pairs in document order.
    pub hidden_fields: Vec<(String, String)>,
}

impl LoginFormHints {
    /// Resolve the form action against the login page URL.
    pub fn resolve_action(&self, base: &Url) -> Option<Url> {
        self.action
            .as_deref()
            .filter(|action| !action.is_empty())
            .and_then(|action| base.join(action).ok())
    }

    pub fn is_empty(&self) -> bool {
        self.action.is_none() && self.hidden_fields.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum FormParseError {
    #[error("unable to locate a login form")]
    FormNotFound,
}

/// Find the login form in `body` and extract its action and hidden fields.
///
/// Prefers the first form carrying a password input; falls back to the first
/// form on the page.
pub fn parse_login_form(body: &str) -> Result<LoginFormHints, FormParseError> {
    let mut fallback: Option<LoginFormHints> = None;

    for caps in FORM_RE.captures_iter(body) {
        let action = caps
            .name("action")
            .map(|m| html_escape::decode_html_entities(m.as_str()).to_string())
            .filter(|action| !action.is_empty());

        let inputs = parse_inputs(caps.name("inputs").map(|m| m.as_str()).unwrap_or(""));
        let has_password = inputs
            .iter()
            .any(|input| input.kind.as_deref() == Some("password"));

        let hidden_fields = inputs
            .into_iter()
            .filter(|input| input.kind.as_deref() == Some("hidden"))
            .filter_map(|input| input.name.map(|name| (name, input.value.unwrap_or_default())))
            .collect();

        let hints = LoginFormHints {
            action,
            hidden_fields,
        };

        if has_password {
            return Ok(hints);
        }
        if fallback.is_none() {
            fallback = Some(hints);
        }
    }

    fallback.ok_or(FormParseError::FormNotFound)
}

struct ParsedInput {
    kind: Option<String>,
    name: Option<String>,
    value: Option<String>,
}

fn parse_inputs(fragment: &str) -> Vec<ParsedInput> {
    let mut inputs = Vec::new();

    for caps in INPUT_RE.captures_iter(fragment) {
        let attributes = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let mut input = ParsedInput {
            kind: None,
            name: None,
            value: None,
        };

        for attr_caps in ATTR_RE.captures_iter(attributes) {
            if let (Some(name), Some(value)) = (attr_caps.name("name"), attr_caps.name("value")) {
                let decoded = html_escape::decode_html_entities(value.as_str()).to_string();
                match name.as_str().to_ascii_lowercase().as_str() {
                    "type" => input.kind = Some(decoded.to_ascii_lowercase()),
                    "name" => input.name = Some(decoded),
                    "value" => input.value = Some(decoded),
                    _ => {}
                }
            }
        }

        inputs.push(input);
    }

    inputs
}

static FORM_RE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(
        r#"(?si)<form[^>]*\baction=['"](?P<action>[^"']*)['"][^>]*>(?P<inputs>.*?)</form>"#,
    )
    .case_insensitive(true)
    .dot_matches_new_line(true)
    .build()
    .expect("invalid login form regex")
});

static INPUT_RE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r#"(?si)<input\s+([^>]+?)/?>"#)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .expect("invalid input regex")
});

static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r#"(?si)(?P<name>[^\s=]+)=['"](?P<value>[^'"]*)['"]"#)
        .case_insensitive(true)
        .build()
        .expect("invalid attribute regex")
});
