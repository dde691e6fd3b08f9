//! Sweep state-machine properties: ordering, budgets, delay contract, and
//! reporting, driven through scripted attempt drivers.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use credsweep::{
    AttemptDriver, AttemptResult, CredentialSweep, EventHandler, SweepConfig, SweepEvent,
    SweepOutcome, TransportError,
};

struct ScriptedDriver {
    outcomes: VecDeque<AttemptResult>,
    seen: Arc<Mutex<Vec<String>>>,
}

impl ScriptedDriver {
    fn new(outcomes: impl IntoIterator<Item = AttemptResult>) -> Self {
        Self {
            outcomes: outcomes.into_iter().collect(),
            seen: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn seen(&self) -> Arc<Mutex<Vec<String>>> {
        self.seen.clone()
    }
}

#[async_trait]
impl AttemptDriver for ScriptedDriver {
    async fn attempt(&mut self, candidate: &str) -> AttemptResult {
        self.seen.lock().unwrap().push(candidate.to_string());
        self.outcomes.pop_front().expect("script exhausted")
    }
}

/// Captures every dispatched event for later inspection.
#[derive(Default)]
struct CapturingHandler {
    events: Arc<Mutex<Vec<SweepEvent>>>,
}

impl CapturingHandler {
    fn events(&self) -> Arc<Mutex<Vec<SweepEvent>>> {
        self.events.clone()
    }
}

impl EventHandler for CapturingHandler {
    fn handle(&self, event: &SweepEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

fn no_delay() -> SweepConfig {
    SweepConfig {
        delay: Duration::ZERO,
        ..SweepConfig::default()
    }
}

fn transport_error() -> AttemptResult {
    AttemptResult::Transport(TransportError::RetryableStatus {
        url: "https://target.test/login".to_string(),
        status: 502,
        attempts: 4,
    })
}

fn candidates(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

#[tokio::test]
async fn candidates_are_attempted_strictly_in_order() {
    let driver = ScriptedDriver::new([
        AttemptResult::Failure,
        AttemptResult::Failure,
        AttemptResult::Success,
    ]);
    let seen = driver.seen();

    let mut sweep = CredentialSweep::new(no_delay(), driver);
    let outcome = sweep.run(candidates(&["p1", "p2", "p3"])).await;

    assert_eq!(outcome, SweepOutcome::Found("p3".to_string()));
    assert_eq!(*seen.lock().unwrap(), vec!["p1", "p2", "p3"]);
}

#[tokio::test]
async fn rerun_with_identical_script_is_deterministic() {
    for _ in 0..2 {
        let driver = ScriptedDriver::new([
            AttemptResult::Failure,
            AttemptResult::Success,
            AttemptResult::Failure,
        ]);
        let mut sweep = CredentialSweep::new(no_delay(), driver);
        let outcome = sweep.run(candidates(&["a", "b", "c"])).await;

        assert_eq!(outcome, SweepOutcome::Found("b".to_string()));
        assert_eq!(sweep.attempts_made(), 2);
    }
}

#[tokio::test]
async fn unlimited_budget_consumes_the_whole_list() {
    let driver =
        ScriptedDriver::new(std::iter::repeat_with(|| AttemptResult::Failure).take(7));
    let mut sweep = CredentialSweep::new(no_delay(), driver);
    let outcome = sweep
        .run(candidates(&["1", "2", "3", "4", "5", "6", "7"]))
        .await;

    assert_eq!(outcome, SweepOutcome::Exhausted);
    assert_eq!(sweep.attempts_made(), 7);
}

#[tokio::test]
async fn budget_caps_attempts_regardless_of_list_length() {
    for k in 1..=3u32 {
        let driver =
            ScriptedDriver::new(std::iter::repeat_with(|| AttemptResult::Failure).take(k as usize));
        let config = SweepConfig {
            max_attempts: k,
            ..no_delay()
        };
        let mut sweep = CredentialSweep::new(config, driver);
        let outcome = sweep
            .run(candidates(&["a", "b", "c", "d", "e", "f"]))
            .await;

        assert_eq!(outcome, SweepOutcome::BudgetReached);
        assert_eq!(sweep.attempts_made(), k as usize);
    }
}

#[tokio::test]
async fn transport_blips_count_toward_budget_but_do_not_abort() {
    let driver = ScriptedDriver::new([
        transport_error(),
        transport_error(),
        AttemptResult::Failure,
        AttemptResult::Success,
    ]);
    let mut sweep = CredentialSweep::new(no_delay(), driver);
    let outcome = sweep.run(candidates(&["p1", "p2", "p3", "p4"])).await;

    assert_eq!(outcome, SweepOutcome::Found("p4".to_string()));
    assert_eq!(sweep.attempts_made(), 4);
}

#[tokio::test]
async fn inter_attempt_spacing_respects_the_configured_delay() {
    let delay = Duration::from_millis(40);
    let driver =
        ScriptedDriver::new(std::iter::repeat_with(|| AttemptResult::Failure).take(3));
    let config = SweepConfig {
        delay,
        ..SweepConfig::default()
    };
    let mut sweep = CredentialSweep::new(config, driver);

    let started = Instant::now();
    let outcome = sweep.run(candidates(&["a", "b", "c"])).await;
    let elapsed = started.elapsed();

    assert_eq!(outcome, SweepOutcome::Exhausted);
    // One delay before each of the three attempts.
    assert!(elapsed >= delay * 3, "elapsed {elapsed:?}");
}

#[tokio::test]
async fn progress_events_track_every_attempt() {
    let driver = ScriptedDriver::new([
        AttemptResult::Failure,
        transport_error(),
        AttemptResult::Blocked,
        AttemptResult::Success,
    ]);
    let handler = CapturingHandler::default();
    let events = handler.events();

    let mut sweep =
        CredentialSweep::new(no_delay(), driver).with_handler(Arc::new(handler));
    let outcome = sweep.run(candidates(&["a", "b", "c", "d"])).await;
    assert_eq!(outcome, SweepOutcome::Found("d".to_string()));

    let events = events.lock().unwrap();

    let progress: Vec<(usize, usize)> = events
        .iter()
        .filter_map(|event| match event {
            SweepEvent::Progress(p) => Some((p.attempts_made, p.total)),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![(1, 4), (2, 4), (3, 4), (4, 4)]);

    let transport_failures = events
        .iter()
        .filter(|event| matches!(event, SweepEvent::TransportFailure(_)))
        .count();
    assert_eq!(transport_failures, 1);

    let blocked = events
        .iter()
        .filter(|event| matches!(event, SweepEvent::Blocked(_)))
        .count();
    assert_eq!(blocked, 1);

    let outcomes: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            SweepEvent::Outcome(o) => Some((o.outcome.clone(), o.attempts_made)),
            _ => None,
        })
        .collect();
    assert_eq!(outcomes, vec![(SweepOutcome::Found("d".to_string()), 4)]);
}

#[tokio::test]
async fn empty_list_reports_exhausted_without_attempting() {
    let driver = ScriptedDriver::new([]);
    let handler = CapturingHandler::default();
    let events = handler.events();

    let mut sweep =
        CredentialSweep::new(no_delay(), driver).with_handler(Arc::new(handler));
    let outcome = sweep.run(Vec::new()).await;

    assert_eq!(outcome, SweepOutcome::Exhausted);
    assert_eq!(sweep.attempts_made(), 0);

    let events = events.lock().unwrap();
    assert!(
        events
            .iter()
            .all(|event| matches!(event, SweepEvent::Outcome(_))),
        "only the terminal outcome may be reported"
    );
}

#[tokio::test]
async fn cancellation_mid_sweep_stops_at_a_safe_point() {
    let driver =
        ScriptedDriver::new(std::iter::repeat_with(|| AttemptResult::Failure).take(100));
    let config = SweepConfig {
        delay: Duration::from_millis(10),
        ..SweepConfig::default()
    };
    let mut sweep = CredentialSweep::new(config, driver);
    let token = sweep.cancel_token();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(35)).await;
        token.cancel();
    });

    let values: Vec<String> = (0..100).map(|i| format!("c{i}")).collect();
    let outcome = sweep.run(values).await;

    assert_eq!(outcome, SweepOutcome::Interrupted);
    assert!(sweep.attempts_made() < 100);
}
