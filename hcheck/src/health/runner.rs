//! Runs a single test and delivers its result to the evaluation that launched it

use super::{CheckContext, Status, TestFunc, TestResult};
use crate::error::TestError;
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

/// Invokes `test`, times it and sends the result on `results`.
///
/// The context is passed through untouched; honouring the deadline is up to
/// the test. A panicking test is reported as Unavailable.
pub async fn run_test(
    ctx: CheckContext,
    name: String,
    test: Arc<dyn TestFunc>,
    results: mpsc::Sender<TestResult>,
) {
    let start = Instant::now();
    let outcome = AssertUnwindSafe(test.check(ctx)).catch_unwind().await;
    let duration = start.elapsed();

    let result = match outcome {
        Ok(outcome) => TestResult::new(name, duration, outcome.status).with_error(outcome.error),
        Err(panic) => TestResult::new(name, duration, Status::Unavailable)
            .with_error(Some(TestError::Panicked(panic_message(panic)).to_string())),
    };

    // The queue holds one slot per registered test, so this never waits. It
    // only fails once the evaluation has stopped listening.
    if let Err(mpsc::error::SendError(late)) = results.send(result).await {
        debug!(
            "Health test '{}' finished after its evaluation ended ({:?})",
            late.name, late.duration
        );
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::TestOutcome;
    use std::time::Duration;

    fn context() -> (CheckContext, crate::health::CancelGuard) {
        CheckContext::with_timeout(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_run_test_success_without_error() {
        let (ctx, _guard) = context();
        let (tx, mut rx) = mpsc::channel(1);
        let test: Arc<dyn TestFunc> = Arc::new(|_ctx: CheckContext| async { TestOutcome::available() });

        run_test(ctx, "db".to_string(), test, tx).await;

        let result = rx.recv().await.unwrap();
        assert_eq!(result.name, "db");
        assert_eq!(result.status, Status::Available);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_run_test_keeps_status_alongside_error() {
        let (ctx, _guard) = context();
        let (tx, mut rx) = mpsc::channel(1);
        let test: Arc<dyn TestFunc> =
            Arc::new(|_ctx: CheckContext| async { TestOutcome::degraded("replica lag 3s") });

        run_test(ctx, "replica".to_string(), test, tx).await;

        let result = rx.recv().await.unwrap();
        assert_eq!(result.status, Status::Degraded);
        assert_eq!(result.error.as_deref(), Some("replica lag 3s"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_test_measures_duration() {
        let (ctx, _guard) = context();
        let (tx, mut rx) = mpsc::channel(1);
        let test: Arc<dyn TestFunc> = Arc::new(|_ctx: CheckContext| async {
            tokio::time::sleep(Duration::from_millis(120)).await;
            TestOutcome::available()
        });

        run_test(ctx, "slowish".to_string(), test, tx).await;

        let result = rx.recv().await.unwrap();
        assert!(result.duration >= Duration::from_millis(120));
    }

    #[tokio::test]
    async fn test_run_test_contains_panics() {
        let (ctx, _guard) = context();
        let (tx, mut rx) = mpsc::channel(1);
        let test: Arc<dyn TestFunc> = Arc::new(|_ctx: CheckContext| async {
            if true {
                panic!("connection pool poisoned");
            }
            TestOutcome::available()
        });

        run_test(ctx, "pool".to_string(), test, tx).await;

        let result = rx.recv().await.unwrap();
        assert_eq!(result.status, Status::Unavailable);
        assert_eq!(
            result.error.as_deref(),
            Some("test panicked: connection pool poisoned")
        );
    }

    #[tokio::test]
    async fn test_run_test_tolerates_closed_queue() {
        let (ctx, _guard) = context();
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let test: Arc<dyn TestFunc> = Arc::new(|_ctx: CheckContext| async { TestOutcome::available() });

        run_test(ctx, "late".to_string(), test, tx).await;
    }
}
