//! Per-call invocation context.

use std::{sync::Arc, time::Duration};

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::registry::Method;

/// State that travels with a single call through the middleware chain to the
/// handler.
///
/// The transport creates a context per request, optionally attaching a
/// cancellation token and a deadline. The dispatcher fills in the resolved
/// method name before the chain runs. Nothing here preempts a handler;
/// handlers that care about cancellation await [`Context::cancelled`].
#[derive(Debug, Clone)]
pub struct Context {
    method: Arc<str>,
    handler: Option<Arc<Method>>,
    cancellation: CancellationToken,
    deadline: Option<Instant>,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            method: Arc::from(""),
            handler: None,
            cancellation: CancellationToken::new(),
            deadline: None,
        }
    }
}

impl Context {
    /// Creates a context with a fresh cancellation token and no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `token` as the cancellation signal for this call.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Sets an absolute deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the deadline to `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub(crate) fn with_method(mut self, method: &str) -> Self {
        self.method = Arc::from(method);
        self
    }

    /// Attaches the resolved method, invoked at the end of the chain.
    pub(crate) fn with_handler(mut self, handler: Arc<Method>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub(crate) fn handler(&self) -> Option<&Arc<Method>> {
        self.handler.as_ref()
    }

    /// Resolved method name. Empty until the dispatcher has resolved it.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Cancellation token for this call.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Deadline for this call, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline. `None` without a deadline, zero once it
    /// has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Returns true if the call was cancelled or its deadline has passed.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled() || self.remaining() == Some(Duration::ZERO)
    }

    /// Completes once the call is cancelled or its deadline passes.
    pub async fn cancelled(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.cancellation.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.cancellation.cancelled().await,
        }
    }
}

/// Returns the method name resolved for this call.
///
/// Useful from middleware, e.g. for logging.
pub fn method_from_context(ctx: &Context) -> &str {
    ctx.method()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_is_blank() {
        let ctx = Context::new();

        assert_eq!(method_from_context(&ctx), "");
        assert!(ctx.deadline().is_none());
        assert!(ctx.remaining().is_none());
        assert!(!ctx.is_cancelled());
    }

    #[test]
    fn test_with_method() {
        let ctx = Context::new().with_method("Echo");
        assert_eq!(ctx.method(), "Echo");
    }

    #[test]
    fn test_cancellation_is_shared_with_clones() {
        let token = CancellationToken::new();
        let ctx = Context::new().with_cancellation(token.clone());
        let cloned = ctx.clone();

        token.cancel();

        assert!(ctx.is_cancelled());
        assert!(cloned.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_resolves_on_cancel() {
        let token = CancellationToken::new();
        let ctx = Context::new().with_cancellation(token.clone());

        tokio::spawn(async move { token.cancel() });

        tokio::time::timeout(Duration::from_secs(5), ctx.cancelled())
            .await
            .expect("context should be cancelled");
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expiry() {
        let ctx = Context::new().with_timeout(Duration::from_millis(50));

        assert!(!ctx.is_cancelled());
        assert!(ctx.remaining().unwrap() <= Duration::from_millis(50));

        ctx.cancelled().await;

        assert!(ctx.is_cancelled());
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
    }
}
