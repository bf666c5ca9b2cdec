//! The capability a registered health test provides, and the context it runs under

use super::Status;
use async_trait::async_trait;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;

/// What a test reports back: a status and, optionally, an explanation.
///
/// The status is always consulted, even when an error is attached, so a test
/// can report `Degraded` together with the reason it is degraded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestOutcome {
    pub status: Status,
    pub error: Option<String>,
}

impl TestOutcome {
    pub fn new(status: Status) -> Self {
        Self { status, error: None }
    }

    pub fn available() -> Self {
        Self::new(Status::Available)
    }

    pub fn degraded(error: impl Display) -> Self {
        Self::new(Status::Degraded).with_error(error)
    }

    pub fn unavailable(error: impl Display) -> Self {
        Self::new(Status::Unavailable).with_error(error)
    }

    pub fn with_error(mut self, error: impl Display) -> Self {
        self.error = Some(error.to_string());
        self
    }
}

/// A named health test.
///
/// Implemented for every `Fn(CheckContext) -> impl Future<Output = TestOutcome>`,
/// so plain async functions and closures can be registered directly.
#[async_trait]
pub trait TestFunc: Send + Sync {
    async fn check(&self, ctx: CheckContext) -> TestOutcome;
}

#[async_trait]
impl<F, Fut> TestFunc for F
where
    F: Fn(CheckContext) -> Fut + Send + Sync,
    Fut: Future<Output = TestOutcome> + Send + 'static,
{
    async fn check(&self, ctx: CheckContext) -> TestOutcome {
        (self)(ctx).await
    }
}

/// Deadline and cancellation signal shared by every test of one evaluation.
///
/// Cancellation is advisory. The engine stops waiting at the deadline either
/// way; a test that wants to stop its own work early has to watch this context.
#[derive(Debug, Clone)]
pub struct CheckContext {
    deadline: Instant,
    cancel: watch::Receiver<bool>,
}

/// Owning half of a [`CheckContext`]. Dropping it cancels every context
/// derived from it.
#[derive(Debug)]
pub struct CancelGuard {
    cancel: watch::Sender<bool>,
}

impl CancelGuard {
    pub fn cancel(&self) {
        let _ = self.cancel.send(true);
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl CheckContext {
    pub fn with_deadline(deadline: Instant) -> (Self, CancelGuard) {
        let (tx, rx) = watch::channel(false);
        (
            Self {
                deadline,
                cancel: rx,
            },
            CancelGuard { cancel: tx },
        )
    }

    pub fn with_timeout(timeout: Duration) -> (Self, CancelGuard) {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_cancelled(&self) -> bool {
        Instant::now() >= self.deadline
            || *self.cancel.borrow()
            || self.cancel.has_changed().is_err()
    }

    /// Resolves once the deadline passes or the owning evaluation goes away.
    pub async fn cancelled(&self) {
        let mut cancel = self.cancel.clone();
        let signalled = async move {
            loop {
                if *cancel.borrow_and_update() {
                    return;
                }
                if cancel.changed().await.is_err() {
                    return;
                }
            }
        };

        tokio::select! {
            _ = tokio::time::sleep_until(self.deadline) => {}
            _ = signalled => {}
        }
    }

    /// Runs `fut` until it finishes or the context is cancelled, whichever is first.
    pub async fn run_until<F>(&self, fut: F) -> Option<F::Output>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            _ = self.cancelled() => None,
            output = fut => Some(output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn always_degraded(_ctx: CheckContext) -> TestOutcome {
        TestOutcome::degraded("replica lag")
    }

    #[test]
    fn test_outcome_constructors() {
        let outcome = TestOutcome::available();
        assert_eq!(outcome.status, Status::Available);
        assert!(outcome.error.is_none());

        let outcome = TestOutcome::degraded("slow");
        assert_eq!(outcome.status, Status::Degraded);
        assert_eq!(outcome.error.as_deref(), Some("slow"));

        let outcome = TestOutcome::unavailable("down");
        assert_eq!(outcome.status, Status::Unavailable);
        assert_eq!(outcome.error.as_deref(), Some("down"));

        let outcome = TestOutcome::new(Status::Available).with_error("warming up");
        assert_eq!(outcome.status, Status::Available);
        assert_eq!(outcome.error.as_deref(), Some("warming up"));
    }

    #[tokio::test]
    async fn test_async_fn_is_test_func() {
        let (ctx, _guard) = CheckContext::with_timeout(Duration::from_secs(1));
        let outcome = always_degraded.check(ctx).await;
        assert_eq!(outcome, TestOutcome::degraded("replica lag"));
    }

    #[tokio::test]
    async fn test_closure_is_test_func() {
        let test = |_ctx: CheckContext| async { TestOutcome::available() };
        let (ctx, _guard) = CheckContext::with_timeout(Duration::from_secs(1));
        assert_eq!(test.check(ctx).await.status, Status::Available);
    }

    #[tokio::test(start_paused = true)]
    async fn test_context_cancelled_at_deadline() {
        let (ctx, _guard) = CheckContext::with_timeout(Duration::from_millis(100));
        assert!(!ctx.is_cancelled());
        assert_eq!(ctx.remaining(), Duration::from_millis(100));

        ctx.cancelled().await;

        assert!(ctx.is_cancelled());
        assert_eq!(ctx.remaining(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_context_cancelled_when_guard_dropped() {
        let (ctx, guard) = CheckContext::with_timeout(Duration::from_secs(60));
        assert!(!ctx.is_cancelled());

        drop(guard);

        ctx.cancelled().await;
        assert!(ctx.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_until() {
        let (ctx, _guard) = CheckContext::with_timeout(Duration::from_millis(50));

        let fast = ctx.run_until(async { 7 }).await;
        assert_eq!(fast, Some(7));

        let slow = ctx
            .run_until(tokio::time::sleep(Duration::from_secs(10)))
            .await;
        assert!(slow.is_none());
    }
}
