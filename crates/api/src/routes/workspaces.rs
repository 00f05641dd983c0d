//! Routes for workspaces, their lock, and their state history.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{state_versions, workspaces};
use crate::state::AppState;

/// ```text
/// GET    /projects/{project_id}/workspaces   -> list_workspaces
/// POST   /projects/{project_id}/workspaces   -> create_workspace
/// GET    /workspaces/{id}                    -> get_workspace
/// DELETE /workspaces/{id}                    -> delete_workspace
/// POST   /workspaces/{id}/lock               -> lock_workspace
/// POST   /workspaces/{id}/unlock             -> unlock_workspace
/// GET    /workspaces/{id}/state              -> get_current_state
/// GET    /workspaces/{id}/state-versions     -> list_state_versions
/// GET    /workspaces/{id}/outputs            -> get_outputs
/// GET    /state-versions/{id}                -> get_state_version
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/{project_id}/workspaces",
            get(workspaces::list_workspaces).post(workspaces::create_workspace),
        )
        .route(
            "/workspaces/{id}",
            get(workspaces::get_workspace).delete(workspaces::delete_workspace),
        )
        .route("/workspaces/{id}/lock", post(workspaces::lock_workspace))
        .route("/workspaces/{id}/unlock", post(workspaces::unlock_workspace))
        .route("/workspaces/{id}/state", get(state_versions::get_current_state))
        .route(
            "/workspaces/{id}/state-versions",
            get(state_versions::list_state_versions),
        )
        .route("/workspaces/{id}/outputs", get(state_versions::get_outputs))
        .route("/state-versions/{id}", get(state_versions::get_state_version))
}
