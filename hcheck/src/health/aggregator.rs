//! Fan-out of every registered test, deadline-bounded fan-in and status reduction

use super::{runner::run_test, CheckContext, Registry, Status, TestResult};
use crate::error::TestError;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Every test reported before the deadline.
    Completed,
    /// The deadline fired first; unreported tests were filled in as Unavailable.
    TimedOut,
}

/// Result of one complete health evaluation.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub status: Status,
    pub tests: BTreeMap<String, TestResult>,
    pub completion: Completion,
}

impl Evaluation {
    pub fn timed_out(&self) -> bool {
        self.completion == Completion::TimedOut
    }
}

pub struct Aggregator {
    registry: Arc<Registry>,
    timeout: Duration,
}

impl Aggregator {
    pub fn new(registry: Arc<Registry>, timeout: Duration) -> Self {
        Self { registry, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Runs every registered test concurrently under a shared deadline of
    /// now + timeout and collects one result per test.
    ///
    /// Tests still running when the deadline fires are not aborted: their
    /// tasks keep going in the background until they return on their own,
    /// and whatever they send afterwards is dropped. Their contexts are
    /// cancelled when this future completes or is dropped, so tests that watch
    /// the context can stop early. Dropping this future (for example because
    /// the client went away) ends the wait immediately.
    pub async fn evaluate(&self) -> Evaluation {
        let expected = self.registry.len();
        let deadline = Instant::now() + self.timeout;
        let (ctx, _cancel) = CheckContext::with_deadline(deadline);
        let (tx, mut rx) = mpsc::channel(expected.max(1));

        debug!("Running {} health tests with a {:?} deadline", expected, self.timeout);

        for (name, test) in self.registry.iter() {
            tokio::spawn(run_test(
                ctx.clone(),
                name.to_string(),
                Arc::clone(test),
                tx.clone(),
            ));
        }
        drop(tx);

        let mut tests = BTreeMap::new();
        let expired = tokio::time::sleep_until(deadline);
        tokio::pin!(expired);

        while tests.len() < expected {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(result) => {
                        log_result(&result);
                        tests.insert(result.name.clone(), result);
                    }
                    None => {
                        error!("Health test queue closed with {} of {} results", tests.len(), expected);
                        self.fill_missing(&mut tests, TestError::NoReport, Duration::ZERO);
                        break;
                    }
                },
                _ = &mut expired => {
                    warn!(
                        "Health evaluation timed out after {:?} with {} of {} results",
                        self.timeout,
                        tests.len(),
                        expected
                    );
                    self.fill_missing(&mut tests, TestError::Timeout, self.timeout);

                    return Evaluation {
                        status: Status::Unavailable,
                        tests,
                        completion: Completion::TimedOut,
                    };
                }
            }
        }

        let status = Status::reduce(tests.values().map(|result| result.status));
        info!("Health evaluation completed - Overall status: {}", status);

        Evaluation {
            status,
            tests,
            completion: Completion::Completed,
        }
    }

    fn fill_missing(&self, tests: &mut BTreeMap<String, TestResult>, error: TestError, duration: Duration) {
        for name in self.registry.names() {
            if !tests.contains_key(name) {
                warn!("Health test '{}' did not report: {}", name, error);
                tests.insert(
                    name.to_string(),
                    TestResult::new(name, duration, Status::Unavailable)
                        .with_error(Some(error.to_string())),
                );
            }
        }
    }
}

fn log_result(result: &TestResult) {
    match result.status {
        Status::Available => {
            debug!("Health test '{}' passed in {:?}", result.name, result.duration);
        }
        Status::Degraded => {
            warn!(
                "Health test '{}' degraded in {:?}: {}",
                result.name,
                result.duration,
                result.error.as_deref().unwrap_or("no error reported")
            );
        }
        Status::Unavailable => {
            error!(
                "Health test '{}' failed in {:?}: {}",
                result.name,
                result.duration,
                result.error.as_deref().unwrap_or("no error reported")
            );
        }
    }
}
