//! Routes for the Terraform HTTP backend, mounted at `/state`.

use axum::extract::DefaultBodyLimit;
use axum::routing::{any, get};
use axum::Router;

use crate::handlers::remote_state;
use crate::state::AppState;

/// ```text
/// GET    /{workspace_id}          -> fetch_state
/// POST   /{workspace_id}          -> push_state (body capped at `body_limit`)
/// ANY    /{workspace_id}/lock     -> lock_state
/// ANY    /{workspace_id}/unlock   -> unlock_state
/// ```
pub fn router(body_limit: usize) -> Router<AppState> {
    Router::new()
        .route(
            "/{workspace_id}",
            get(remote_state::fetch_state)
                .post(remote_state::push_state)
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/{workspace_id}/lock", any(remote_state::lock_state))
        .route("/{workspace_id}/unlock", any(remote_state::unlock_state))
}
