//! Middleware chain.
//!
//! A middleware turns the next handler in the chain into a new handler. The
//! first middleware registered is the outermost one: with `A` then `B`
//! registered, a call runs A-before, B-before, the handler, B-after, A-after.

use std::{future::Future, sync::Arc, time::Instant};

use futures_util::future::BoxFuture;
use serde_json::Value;
use tracing::{info, warn};

use crate::{binder::Params, context::Context, error::RpcResult};

/// Future returned by a handler in the chain.
pub type HandlerFuture = BoxFuture<'static, RpcResult<Value>>;

/// A handler in the chain: the registered method at the end, or a
/// middleware-wrapped handler in front of it.
#[derive(Clone)]
pub struct Next {
    inner: Arc<dyn Fn(Context, Params) -> HandlerFuture + Send + Sync>,
}

impl Next {
    /// Creates a handler from an async function.
    pub fn new<F, Fut>(handler: F) -> Self
    where
        F: Fn(Context, Params) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = RpcResult<Value>> + Send + 'static,
    {
        Self {
            inner: Arc::new(move |ctx, params| Box::pin(handler(ctx, params))),
        }
    }

    /// Invokes the handler.
    pub fn call(&self, ctx: Context, params: Params) -> HandlerFuture {
        (self.inner)(ctx, params)
    }
}

impl std::fmt::Debug for Next {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Next").finish_non_exhaustive()
    }
}

/// Wraps a handler with cross-cutting behavior.
///
/// Any `Fn(Next) -> Next` closure is a middleware.
pub trait Middleware: Send + Sync + 'static {
    /// Returns a handler that runs around `next`.
    fn wrap(&self, next: Next) -> Next;
}

impl<F> Middleware for F
where
    F: Fn(Next) -> Next + Send + Sync + 'static,
{
    fn wrap(&self, next: Next) -> Next {
        self(next)
    }
}

/// Composes `middleware` around `terminal`, first entry outermost.
pub(crate) fn compose(middleware: &[Arc<dyn Middleware>], terminal: Next) -> Next {
    middleware
        .iter()
        .rev()
        .fold(terminal, |next, middleware| middleware.wrap(next))
}

/// Logs each call with its method name and duration.
///
/// Failed calls are logged with the full error, including internal messages
/// that are hidden from the client.
pub fn logging() -> impl Middleware {
    |next: Next| {
        Next::new(move |ctx: Context, params: Params| {
            let next = next.clone();
            async move {
                let method = ctx.method().to_string();
                let start = Instant::now();
                let result = next.call(ctx, params).await;
                let elapsed_ms = start.elapsed().as_millis() as u64;

                match &result {
                    Ok(_) => info!(method = %method, elapsed_ms, "RPC call completed"),
                    Err(error) => {
                        warn!(method = %method, elapsed_ms, error = %error, "RPC call failed")
                    }
                }

                result
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Mutex,
    };

    use serde_json::json;

    use super::*;
    use crate::error::RpcError;

    fn recording(log: Arc<Mutex<Vec<String>>>, name: &'static str) -> impl Middleware {
        move |next: Next| {
            let log = Arc::clone(&log);
            Next::new(move |ctx, params| {
                let next = next.clone();
                let log = Arc::clone(&log);
                async move {
                    log.lock().unwrap().push(format!("{}-before", name));
                    let result = next.call(ctx, params).await;
                    log.lock().unwrap().push(format!("{}-after", name));
                    result
                }
            })
        }
    }

    #[tokio::test]
    async fn test_compose_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let handler_log = Arc::clone(&log);
        let terminal = Next::new(move |_ctx, _params| {
            let log = Arc::clone(&handler_log);
            async move {
                log.lock().unwrap().push("handler".to_string());
                Ok(json!(null))
            }
        });

        let middleware: Vec<Arc<dyn Middleware>> = vec![
            Arc::new(recording(Arc::clone(&log), "A")),
            Arc::new(recording(Arc::clone(&log), "B")),
        ];
        let chain = compose(&middleware, terminal);

        chain.call(Context::new(), Params::none()).await.unwrap();

        assert_eq!(
            *log.lock().unwrap(),
            vec!["A-before", "B-before", "handler", "B-after", "A-after"]
        );
    }

    #[tokio::test]
    async fn test_compose_without_middleware_is_terminal() {
        let terminal = Next::new(|_ctx, _params| async { Ok(json!("done")) });
        let chain = compose(&[], terminal);

        assert_eq!(
            chain.call(Context::new(), Params::none()).await.unwrap(),
            json!("done")
        );
    }

    #[tokio::test]
    async fn test_short_circuit() {
        let invoked = Arc::new(AtomicBool::new(false));
        let handler_invoked = Arc::clone(&invoked);
        let terminal = Next::new(move |_ctx, _params| {
            handler_invoked.store(true, Ordering::SeqCst);
            async { Ok(json!(null)) }
        });
        let deny = |_next: Next| {
            Next::new(|_ctx, _params| async { Err(RpcError::public("denied", "nope")) })
        };

        let chain = compose(&[Arc::new(deny)], terminal);
        let error = chain.call(Context::new(), Params::none()).await.unwrap_err();

        assert_eq!(error.to_string(), "[denied] nope");
        assert!(!invoked.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_transform_result() {
        let terminal = Next::new(|_ctx, _params| async { Ok(json!(1)) });
        let wrap_result = |next: Next| {
            Next::new(move |ctx, params| {
                let next = next.clone();
                async move {
                    next.call(ctx, params)
                        .await
                        .map(|value| json!({ "wrapped": value }))
                }
            })
        };

        let chain = compose(&[Arc::new(wrap_result)], terminal);
        let value = chain.call(Context::new(), Params::none()).await.unwrap();

        assert_eq!(value, json!({"wrapped": 1}));
    }

    #[tokio::test]
    async fn test_logging_passes_through() {
        let terminal = Next::new(|_ctx, _params| async { Err(RpcError::internal("secret")) });
        let chain = compose(&[Arc::new(logging())], terminal);

        let error = chain.call(Context::new(), Params::none()).await.unwrap_err();
        assert_eq!(error.to_string(), "secret");
    }
}
