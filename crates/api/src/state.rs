use std::sync::Arc;

use retouch_core::gateway::JobGateway;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Gateway that talks to the remote providers with the server-held
    /// credentials.
    pub gateway: Arc<dyn JobGateway>,
}
