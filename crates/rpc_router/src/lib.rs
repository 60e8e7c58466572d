//! Microframework for serving JSON-RPC methods.
//!
//! Methods are async functions registered under a name, either with a
//! parameter type decoded from the request's `params`, or without params:
//!
//! ```
//! use rpc_router::{middleware, Context, Dispatcher, Method, RpcError};
//! use serde::Deserialize;
//! use serde_json::{json, Value};
//!
//! #[derive(Deserialize)]
//! struct HelloParams {
//!     name: String,
//! }
//!
//! async fn hello(_ctx: Context, params: HelloParams) -> Result<Value, RpcError> {
//!     Ok(json!({ "message": format!("Hello, {}", params.name) }))
//! }
//!
//! # tokio_test::block_on(async {
//! let mut builder = Dispatcher::builder();
//! builder.use_middleware(middleware::logging());
//! builder.register("Hello", Method::with_params(hello))?;
//! let dispatcher = builder.build();
//!
//! let body = dispatcher
//!     .handle(Context::new(), br#"{"method":"Hello","params":{"name":"world"}}"#)
//!     .await;
//! assert_eq!(body, br#"{"result":{"message":"Hello, world"}}"#);
//! # Ok::<(), rpc_router::RegistryError>(())
//! # }).unwrap();
//! ```
//!
//! A successful call renders its return value as `result`. A failed call
//! renders an `error` object: errors built with [`RpcError::public`] go to
//! the client as-is, anything else is replaced by a generic internal error
//! unless the dispatcher was built with `dump_errors(true)`. Panics inside a
//! handler are caught and reported as internal errors for that call only.

mod binder;
mod classifier;
mod context;
mod dispatcher;
mod error;
pub mod middleware;
mod registry;

pub use binder::Params;
pub use classifier::classify;
pub use context::{method_from_context, Context};
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use error::{RegistryError, RpcError, RpcResult};
pub use middleware::{HandlerFuture, Middleware, Next};
pub use registry::{Method, MethodRegistry, Methods};
pub use rpc_protocol::{error_codes, ErrorCode, ErrorObject, Request, Response};
