pub mod remote_state;
pub mod runs;
pub mod state_versions;
pub mod workspaces;

use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use terraconsole_core::authorization::{require, Action, Resource};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Ask the configured authorizer whether `auth` may perform `action`.
pub(crate) async fn authorize(
    state: &AppState,
    auth: &AuthUser,
    resource: Resource,
    action: Action,
) -> AppResult<()> {
    require(state.authorizer.as_ref(), auth.user_id, resource, action).await?;
    Ok(())
}

/// A stored state document, returned byte-for-byte.
pub(crate) fn raw_state(body: Vec<u8>) -> Response {
    ([(CONTENT_TYPE, "application/json")], body).into_response()
}
