use std::sync::Arc;

use terraconsole_core::authorization::Authorizer;

use crate::config::ServerConfig;
use crate::executor::ExecutorChannel;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: everything is behind `Arc` or is already a pool handle.
#[derive(Clone)]
pub struct AppState {
    pub pool: terraconsole_db::DbPool,
    pub config: Arc<ServerConfig>,
    /// Consulted before every core operation.
    pub authorizer: Arc<dyn Authorizer>,
    /// Receives plan/apply/abort commands after transitions commit.
    pub executor: Arc<ExecutorChannel>,
}
