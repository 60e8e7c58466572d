//! Per-request dispatch.
//!
//! A call moves through resolving the method, binding its params, invoking
//! the middleware-wrapped handler and rendering the outcome. Any failure
//! skips straight to rendering, so every call ends in exactly one of
//! `result` or `error`.

use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use futures_util::FutureExt;
use rpc_protocol::{Request, Response};
use serde_json::Value;
use tracing::{debug, error};

use crate::{
    binder::Params,
    classifier::classify,
    context::Context,
    error::{RegistryError, RpcError, RpcResult},
    middleware::{compose, Middleware, Next},
    registry::{Method, MethodRegistry},
};

/// Sent if a response cannot be encoded.
const FALLBACK_RESPONSE: &[u8] =
    br#"{"error":{"code":"internal_error","message":"internal error"}}"#;

/// Collects methods and middleware before serving starts.
#[derive(Default)]
pub struct DispatcherBuilder {
    registry: MethodRegistry,
    middleware: Vec<Arc<dyn Middleware>>,
    dump_errors: bool,
}

impl DispatcherBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware. Earlier middleware runs outside later ones.
    pub fn use_middleware(&mut self, middleware: impl Middleware) -> &mut Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Sends internal error messages to clients instead of the generic
    /// message. Meant for debugging only.
    pub fn dump_errors(&mut self, enabled: bool) -> &mut Self {
        self.dump_errors = enabled;
        self
    }

    /// Registers a method.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        method: Method,
    ) -> Result<(), RegistryError> {
        self.registry.register(name, method)
    }

    /// Registers several methods, all or nothing.
    pub fn register_all<I, N>(&mut self, methods: I) -> Result<(), RegistryError>
    where
        I: IntoIterator<Item = (N, Method)>,
        N: Into<String>,
    {
        self.registry.register_all(methods)
    }

    /// Freezes the registry and middleware into a dispatcher.
    pub fn build(self) -> Dispatcher {
        let registry = Arc::new(self.registry);
        let chain = compose(&self.middleware, terminal());

        Dispatcher {
            registry,
            chain,
            dump_errors: self.dump_errors,
        }
    }
}

/// Dispatches calls to registered methods.
///
/// Immutable once built; share it behind an `Arc` across requests.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<MethodRegistry>,
    chain: Next,
    dump_errors: bool,
}

impl Dispatcher {
    /// Starts building a dispatcher.
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::new()
    }

    /// Registered methods.
    pub fn registry(&self) -> &MethodRegistry {
        &self.registry
    }

    /// Returns true if internal error messages are sent to clients.
    pub fn dumps_errors(&self) -> bool {
        self.dump_errors
    }

    /// Handles one encoded request and returns the encoded response.
    ///
    /// A body that is not a request envelope is answered with
    /// `invalid_params`, the same as params that fail to decode.
    pub async fn handle(&self, ctx: Context, body: &[u8]) -> Vec<u8> {
        let response = match serde_json::from_slice::<Request>(body) {
            Ok(request) => self.dispatch(ctx, request).await,
            Err(error) => {
                debug!(error = %error, "Failed to decode request envelope");
                self.render_error("", RpcError::invalid_params())
            }
        };

        serde_json::to_vec(&response).unwrap_or_else(|error| {
            error!(error = %error, "Failed to encode response");
            FALLBACK_RESPONSE.to_vec()
        })
    }

    /// Handles one decoded request.
    pub async fn dispatch(&self, ctx: Context, request: Request) -> Response {
        let Request { method, params } = request;
        debug!(method = %method, "Dispatching RPC call");

        match self.call(ctx, &method, params).await {
            Ok(result) => Response::success(result),
            Err(error) => self.render_error(&method, error),
        }
    }

    async fn call(&self, ctx: Context, name: &str, params: Option<Value>) -> RpcResult<Value> {
        let method = self
            .registry
            .lookup(name)
            .ok_or_else(|| RpcError::method_not_found(name))?;

        let ctx = ctx.with_method(name).with_handler(Arc::clone(&method));
        let chain = self.chain.clone();
        // Binding runs `Deserialize` impls and must stay inside the panic guard.
        let invocation = AssertUnwindSafe(async move {
            match method.bind(params) {
                Ok(params) => chain.call(ctx, params).await,
                Err(error) => Err(error),
            }
        });

        match invocation.catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(RpcError::internal(format!(
                "handler panicked: {}",
                panic_message(&*panic)
            ))),
        }
    }

    fn render_error(&self, method: &str, error: RpcError) -> Response {
        match &error {
            RpcError::Internal(cause) => {
                let detail = format!("{:#}", cause);
                error!(method = %method, error = %detail, "RPC call failed with internal error");
            }
            RpcError::Public {
                code,
                cause: Some(cause),
                ..
            } => {
                let detail = format!("{:#}", cause);
                debug!(method = %method, code = %code, cause = %detail, "RPC call failed");
            }
            RpcError::Public { code, .. } => {
                debug!(method = %method, code = %code, "RPC call failed");
            }
        }

        Response::error(classify(&error, self.dump_errors))
    }
}

/// Innermost handler: calls the method resolved onto the context.
///
/// A context without one, e.g. a fresh context passed down by middleware,
/// gets `method_not_found`.
fn terminal() -> Next {
    Next::new(|ctx: Context, params: Params| async move {
        let handler = ctx.handler().cloned();
        match handler {
            Some(method) => method.invoke(ctx, params).await,
            None => Err(RpcError::method_not_found(ctx.method())),
        }
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic payload"
    }
}
