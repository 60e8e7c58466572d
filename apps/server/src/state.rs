//! Application state

use std::{sync::Arc, time::Duration};

use rpc_router::Dispatcher;

use crate::config::ServerConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Method dispatcher, frozen before serving starts
    pub dispatcher: Arc<Dispatcher>,

    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl AppState {
    /// Create a new application state
    pub fn new(config: ServerConfig, dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            config: Arc::new(config),
        }
    }

    /// Deadline attached to each call
    pub fn request_timeout(&self) -> Option<Duration> {
        self.config.request_timeout()
    }
}
