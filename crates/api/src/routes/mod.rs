pub mod health;
pub mod remote_state;
pub mod runs;
pub mod workspaces;

use axum::Router;

use crate::config::ServerConfig;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /projects/{project_id}/workspaces           list, create
///
/// /workspaces/{id}                            get, delete
/// /workspaces/{id}/lock                       lock (POST)
/// /workspaces/{id}/unlock                     unlock (POST)
/// /workspaces/{id}/runs                       list, create
/// /workspaces/{id}/state                      current state blob (GET)
/// /workspaces/{id}/state-versions             version metadata (GET)
/// /workspaces/{id}/outputs                    current outputs (GET)
///
/// /runs/{id}                                  get
/// /runs/{id}/plan-log                         plan log (GET)
/// /runs/{id}/apply-log                        apply log (GET)
/// /runs/{id}/approve                          approve (POST)
/// /runs/{id}/discard                          discard (POST)
/// /runs/{id}/cancel                           cancel (POST)
/// /runs/{id}/progress                         executor report (POST)
///
/// /state-versions/{id}                        version blob (GET)
///
/// /state/{workspace_id}                       fetch (GET), push (POST)
/// /state/{workspace_id}/lock                  lock (any method)
/// /state/{workspace_id}/unlock                unlock (any method)
/// ```
pub fn api_routes(config: &ServerConfig) -> Router<AppState> {
    Router::new()
        .merge(workspaces::router())
        .merge(runs::router())
        .nest(
            "/state",
            remote_state::router(config.state_body_limit_bytes),
        )
}
