//! Built-in methods

use rpc_router::{Context, DispatcherBuilder, Method, RegistryError, RpcResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Params for `Hello`
#[derive(Debug, Clone, Deserialize)]
pub struct HelloParams {
    pub name: String,
}

/// Result of `Hello`
#[derive(Debug, Clone, Serialize)]
pub struct HelloResponse {
    pub message: String,
}

/// Registers the built-in methods: `Echo`, `Hello` and `Ping`.
pub fn register(builder: &mut DispatcherBuilder) -> Result<(), RegistryError> {
    builder.register_all([
        ("Echo", Method::with_params(echo)),
        ("Hello", Method::with_params(hello)),
        ("Ping", Method::without_params(ping)),
    ])
}

/// Returns params unchanged
async fn echo(_ctx: Context, params: Value) -> RpcResult<Value> {
    Ok(params)
}

async fn hello(_ctx: Context, params: HelloParams) -> RpcResult<HelloResponse> {
    Ok(HelloResponse {
        message: format!("Hello, {}", params.name),
    })
}

async fn ping(_ctx: Context) -> RpcResult<&'static str> {
    Ok("pong")
}
