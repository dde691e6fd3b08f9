//! Sweep orchestration.
//!
//! Drives the candidate list through the attempt driver one entry at a time:
//! a cancellable delay before every attempt, an attempt budget checked before
//! the pending candidate is consumed, and termination on the first success.
//! Strictly sequential by construction; the rate limit against the remote
//! service is the point, so nothing here runs concurrently.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::time::sleep;

use crate::attempt::{AttemptDriver, AttemptResult};
use crate::events::{
    AttemptEvent, BlockedEvent, EventDispatcher, EventHandler, LoggingHandler, OutcomeEvent,
    ProgressEvent, SweepEvent, TransportFailureEvent,
};

/// Default pause between attempts.
pub const DEFAULT_DELAY: Duration = Duration::from_secs(2);

/// Immutable sweep configuration.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Pause applied before every attempt.
    pub delay: Duration,
    /// Attempt budget; 0 means unbounded.
    pub max_attempts: u32,
    /// Stop the whole sweep on the first checkpoint/challenge response. Off
    /// by default: a lab target may throw a one-off interstitial, but against
    /// a real service a checkpoint usually invalidates further attempts.
    pub halt_on_block: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            delay: DEFAULT_DELAY,
            max_attempts: 0,
            halt_on_block: false,
        }
    }
}

/// Terminal result of a full sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    /// A candidate was accepted; carries the found value.
    Found(String),
    /// The candidate list ran out without a success.
    Exhausted,
    /// The attempt budget was reached before a success.
    BudgetReached,
    /// The sweep halted at a safe point: cooperative cancellation, or a
    /// checkpoint response under the halt-on-block policy.
    Interrupted,
}

/// Cooperative cancellation handle.
///
/// Cloneable; `cancel` takes effect at the sweep's next safe point: before
/// the inter-attempt delay (interrupting it) or right after an attempt
/// completes. An in-flight request is never abandoned halfway.
#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn cancel(&self) {
        let _ = self.sender.send(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once the token is cancelled; immediately if it already was.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        let _ = receiver.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// The sweep state machine: Idle on construction, Running inside [`run`],
/// then exactly one of the [`SweepOutcome`] terminals.
///
/// [`run`]: CredentialSweep::run
pub struct CredentialSweep<D> {
    config: SweepConfig,
    driver: D,
    events: Arc<EventDispatcher>,
    cancel: CancelToken,
    attempts_made: usize,
}

impl<D: AttemptDriver> CredentialSweep<D> {
    pub fn new(config: SweepConfig, driver: D) -> Self {
        let mut events = EventDispatcher::new();
        events.register_handler(Arc::new(LoggingHandler));

        Self {
            config,
            driver,
            events: Arc::new(events),
            cancel: CancelToken::new(),
            attempts_made: 0,
        }
    }

    /// Register an additional event handler (progress display, test probe).
    pub fn with_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        let events = Arc::get_mut(&mut self.events)
            .expect("handlers must be registered before the sweep runs");
        events.register_handler(handler);
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Handle for cancelling this sweep from the outside.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Attempts made so far (final count once `run` returns).
    pub fn attempts_made(&self) -> usize {
        self.attempts_made
    }

    /// Consume the candidate list in order and return the terminal outcome.
    pub async fn run(&mut self, candidates: Vec<String>) -> SweepOutcome {
        let total = candidates.len();
        self.attempts_made = 0;

        let outcome = self.drive(candidates, total).await;

        self.events.dispatch(SweepEvent::Outcome(OutcomeEvent {
            outcome: outcome.clone(),
            attempts_made: self.attempts_made,
            timestamp: Utc::now(),
        }));

        outcome
    }

    async fn drive(&mut self, candidates: Vec<String>, total: usize) -> SweepOutcome {
        for candidate in candidates {
            if self.cancel.is_cancelled() {
                return SweepOutcome::Interrupted;
            }

            // Budget is checked before the pending candidate is consumed.
            if self.config.max_attempts > 0
                && self.attempts_made == self.config.max_attempts as usize
            {
                return SweepOutcome::BudgetReached;
            }

            if !self.config.delay.is_zero() {
                tokio::select! {
                    _ = sleep(self.config.delay) => {}
                    _ = self.cancel.cancelled() => return SweepOutcome::Interrupted,
                }
            }

            let attempt = self.attempts_made + 1;
            self.events.dispatch(SweepEvent::AttemptStarted(AttemptEvent {
                attempt,
                total,
                candidate: candidate.clone(),
                timestamp: Utc::now(),
            }));

            let result = self.driver.attempt(&candidate).await;
            self.attempts_made += 1;

            self.events.dispatch(SweepEvent::Progress(ProgressEvent {
                attempts_made: self.attempts_made,
                total,
                timestamp: Utc::now(),
            }));

            match result {
                AttemptResult::Success => return SweepOutcome::Found(candidate),
                AttemptResult::Failure => {}
                AttemptResult::Transport(err) => {
                    // A transient network blip must not lose the remaining
                    // list; the candidate counts as a non-match.
                    self.events
                        .dispatch(SweepEvent::TransportFailure(TransportFailureEvent {
                            attempt,
                            candidate: candidate.clone(),
                            error: err.to_string(),
                            timestamp: Utc::now(),
                        }));
                }
                AttemptResult::Blocked => {
                    self.events.dispatch(SweepEvent::Blocked(BlockedEvent {
                        attempt,
                        candidate: candidate.clone(),
                        timestamp: Utc::now(),
                    }));
                    if self.config.halt_on_block {
                        log::warn!("halting sweep: checkpoint response under halt-on-block policy");
                        return SweepOutcome::Interrupted;
                    }
                }
            }

            if self.cancel.is_cancelled() {
                return SweepOutcome::Interrupted;
            }
        }

        SweepOutcome::Exhausted
    }
}
