//! User-agent selection and the default browser-like header set.
//!
//! A small pool of common desktop browser strings is compiled in; callers can
//! pin a custom string instead of drawing from the pool.

use http::{HeaderMap, HeaderName, HeaderValue, header};
use rand::seq::SliceRandom;
use rand::thread_rng;

/// Compiled-in pool of desktop browser strings.
static USER_AGENT_POOL: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.1.1 Safari/605.1.15",
];

/// How the session picks its user-agent.
#[derive(Debug, Clone, Default)]
pub enum UserAgentChoice {
    /// Draw one string from the compiled-in pool at construction time.
    #[default]
    Random,
    /// Use the given string verbatim.
    Fixed(String),
}

impl UserAgentChoice {
    pub fn resolve(&self) -> String {
        match self {
            UserAgentChoice::Fixed(custom) => custom.clone(),
            UserAgentChoice::Random => random_choice(USER_AGENT_POOL).to_string(),
        }
    }
}

fn random_choice<T: Copy>(items: &[T]) -> T {
    let mut rng = thread_rng();
    *items.choose(&mut rng).expect("random choice on empty slice")
}

/// Standard browser-like header set sent on every request.
pub fn default_headers(user_agent: &str) -> Result<HeaderMap, HeaderSetError> {
    let mut headers = HeaderMap::new();
    insert(&mut headers, header::USER_AGENT, user_agent)?;
    insert(
        &mut headers,
        header::ACCEPT,
        "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
    )?;
    insert(&mut headers, header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")?;
    // Accept-Encoding is left to the client: a hand-set value would disable
    // automatic response decompression.
    insert(&mut headers, HeaderName::from_static("dnt"), "1")?;
    insert(&mut headers, header::CONNECTION, "keep-alive")?;
    insert(
        &mut headers,
        HeaderName::from_static("upgrade-insecure-requests"),
        "1",
    )?;
    Ok(headers)
}

fn insert(
    headers: &mut HeaderMap,
    name: HeaderName,
    value: &str,
) -> Result<(), HeaderSetError> {
    let header_value = HeaderValue::from_str(value)
        .map_err(|_| HeaderSetError::InvalidValue(name.to_string()))?;
    headers.insert(name, header_value);
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum HeaderSetError {
    #[error("invalid header value for {0}")]
    InvalidValue(String),
}
