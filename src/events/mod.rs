//! Sweep event sink.
//!
//! Progress and result reporting flows through an explicit dispatcher rather
//! than process-wide state, so front-ends register their own handlers and
//! independent sweeps stay isolated in tests.

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::sweeper::SweepOutcome;

/// Emitted immediately before a candidate is attempted.
#[derive(Debug, Clone)]
pub struct AttemptEvent {
    /// 1-based attempt number.
    pub attempt: usize,
    pub total: usize,
    pub candidate: String,
    pub timestamp: DateTime<Utc>,
}

/// Emitted after every attempt completes.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub attempts_made: usize,
    pub total: usize,
    pub timestamp: DateTime<Utc>,
}

/// Emitted when an attempt failed at the transport layer.
#[derive(Debug, Clone)]
pub struct TransportFailureEvent {
    pub attempt: usize,
    pub candidate: String,
    pub error: String,
    pub timestamp: DateTime<Utc>,
}

/// Emitted when the service answered with a challenge/checkpoint page.
#[derive(Debug, Clone)]
pub struct BlockedEvent {
    pub attempt: usize,
    pub candidate: String,
    pub timestamp: DateTime<Utc>,
}

/// Emitted exactly once, on the terminal state.
#[derive(Debug, Clone)]
pub struct OutcomeEvent {
    pub outcome: SweepOutcome,
    pub attempts_made: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub enum SweepEvent {
    AttemptStarted(AttemptEvent),
    Progress(ProgressEvent),
    TransportFailure(TransportFailureEvent),
    Blocked(BlockedEvent),
    Outcome(OutcomeEvent),
}

/// Trait implemented by event handlers.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &SweepEvent);
}

/// Dispatcher that broadcasts events to registered handlers.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn register_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    pub fn dispatch(&self, event: SweepEvent) {
        for handler in &self.handlers {
            handler.handle(&event);
        }
    }
}

/// Logs events using the `log` crate.
#[derive(Debug)]
pub struct LoggingHandler;

impl EventHandler for LoggingHandler {
    fn handle(&self, event: &SweepEvent) {
        match event {
            SweepEvent::AttemptStarted(attempt) => {
                log::info!(
                    "attempt {}/{}: trying '{}'",
                    attempt.attempt,
                    attempt.total,
                    attempt.candidate
                );
            }
            SweepEvent::Progress(progress) => {
                log::debug!("progress {}/{}", progress.attempts_made, progress.total);
            }
            SweepEvent::TransportFailure(failure) => {
                log::error!(
                    "attempt {} failed at the transport layer: {}",
                    failure.attempt,
                    failure.error
                );
            }
            SweepEvent::Blocked(blocked) => {
                log::warn!(
                    "attempt {} answered with a checkpoint/challenge page",
                    blocked.attempt
                );
            }
            SweepEvent::Outcome(outcome) => {
                log::info!(
                    "sweep finished after {} attempt(s): {:?}",
                    outcome.attempts_made,
                    outcome.outcome
                );
            }
        }
    }
}
