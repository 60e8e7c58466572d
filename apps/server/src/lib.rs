//! HTTP host for the JSON-RPC dispatcher.
//!
//! Mounts a [`Dispatcher`] at `POST /rpc` behind axum, with configuration,
//! tracing and the built-in methods wired up.

pub mod config;
pub mod methods;
pub mod rpc;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use rpc_router::{middleware, Dispatcher, RegistryError};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub use config::{ConfigError, LogFormat, ServerConfig};
pub use state::AppState;

/// Builds the dispatcher with request logging and the built-in methods.
pub fn create_dispatcher(config: &ServerConfig) -> Result<Dispatcher, RegistryError> {
    let mut builder = Dispatcher::builder();
    builder
        .use_middleware(middleware::logging())
        .dump_errors(config.dump_errors);
    methods::register(&mut builder)?;
    Ok(builder.build())
}

/// Creates the application router.
pub fn create_app(state: AppState) -> Result<Router, ConfigError> {
    let cors = if state.config.enable_cors {
        let origins = state.config.cors_header_values()?;
        if origins.is_empty() {
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        } else {
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    } else {
        CorsLayer::new()
    };

    let body_limit = DefaultBodyLimit::max(state.config.max_body_bytes);

    Ok(Router::new()
        .route("/rpc", post(rpc::handle_rpc))
        .route("/health", get(health_check))
        .layer(body_limit)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Initializes tracing from the configured level and format.
pub fn init_tracing(config: &ServerConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "rpc_server={level},rpc_router={level},tower_http=debug",
            level = config.log_level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
