//! # credsweep
//!
//! A sequential credential-verification engine for **authorized** login
//! security testing: one identifier, an ordered list of candidate secrets,
//! one rate-limited attempt at a time against a remote HTTP endpoint.
//!
//! Only use this against accounts you own or have explicit written
//! permission to test.
//!
//! ## Features
//!
//! - Browser-like HTTP session with user-agent selection, bounded redirects,
//!   and retry/backoff for transient failures
//! - Data-driven response classification (Success / Blocked / Failure) via an
//!   injectable strategy
//! - Strictly sequential sweep loop with a configurable inter-attempt delay,
//!   an attempt budget, and cooperative cancellation
//! - Progress and result reporting through an explicit event sink
//!
//! ## Example
//!
//! ```no_run
//! use credsweep::{
//!     AttemptEngine, CredentialSweep, HttpSession, MarkerClassifier, SessionConfig,
//!     SweepConfig, TargetProfile,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = HttpSession::new(SessionConfig::default())?;
//!     let engine = AttemptEngine::new(
//!         "probe@example.com",
//!         TargetProfile::default(),
//!         session,
//!         MarkerClassifier::default(),
//!     );
//!
//!     let mut sweep = CredentialSweep::new(SweepConfig::default(), engine);
//!     let outcome = sweep
//!         .run(vec!["first-guess".into(), "second-guess".into()])
//!         .await;
//!     println!("outcome: {:?}", outcome);
//!     Ok(())
//! }
//! ```

mod sweeper;

pub mod attempt;
pub mod classify;
pub mod events;
pub mod session;
pub mod wordlist;

pub use crate::sweeper::{
    CancelToken,
    CredentialSweep,
    DEFAULT_DELAY,
    SweepConfig,
    SweepOutcome,
};

pub use crate::session::{
    HttpSession,
    RetryPolicy,
    SessionConfig,
    SessionResponse,
    TransportError,
    UserAgentChoice,
};

pub use crate::classify::{
    BodyMarker,
    Classification,
    Classifier,
    MarkerClassifier,
    MarkerRules,
    RulesError,
};

pub use crate::attempt::{
    AttemptDriver,
    AttemptEngine,
    AttemptResult,
    FormParseError,
    LoginFormHints,
    ProfileError,
    TargetProfile,
    parse_login_form,
};

pub use crate::events::{
    AttemptEvent,
    BlockedEvent,
    EventDispatcher,
    EventHandler,
    LoggingHandler,
    OutcomeEvent,
    ProgressEvent,
    SweepEvent,
    TransportFailureEvent,
};

pub use crate::wordlist::{Wordlist, WordlistError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
