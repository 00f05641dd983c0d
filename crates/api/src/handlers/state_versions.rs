//! Human-facing reads of the state version history.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use terraconsole_core::authorization::{Action, Resource};
use terraconsole_core::error::CoreError;
use terraconsole_core::types::DbId;
use terraconsole_db::models::state_version::StateVersionListQuery;
use terraconsole_db::repositories::StateVersionRepo;

use crate::error::{AppError, AppResult};
use crate::extract::{AppPath, AppQuery};
use crate::handlers::{authorize, raw_state};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// GET /api/workspaces/{workspace_id}/state
///
/// The current state document, byte-for-byte as it was pushed.
pub async fn get_current_state(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(workspace_id): AppPath<DbId>,
) -> AppResult<Response> {
    authorize(&state, &auth, Resource::Workspace(workspace_id), Action::Read).await?;
    let version = StateVersionRepo::current(&state.pool, workspace_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "State for workspace",
            id: workspace_id,
        }))?;
    Ok(raw_state(version.state))
}

/// GET /api/workspaces/{workspace_id}/state-versions
///
/// Metadata only, highest serial first; `?limit=` is clamped to 1..=50.
pub async fn list_state_versions(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(workspace_id): AppPath<DbId>,
    AppQuery(params): AppQuery<StateVersionListQuery>,
) -> AppResult<impl IntoResponse> {
    authorize(&state, &auth, Resource::Workspace(workspace_id), Action::Read).await?;
    let versions = StateVersionRepo::list_recent(&state.pool, workspace_id, &params).await?;
    Ok(Json(versions))
}

/// GET /api/state-versions/{version_id}
pub async fn get_state_version(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(version_id): AppPath<DbId>,
) -> AppResult<Response> {
    authorize(&state, &auth, Resource::StateVersion(version_id), Action::Read).await?;
    let version = StateVersionRepo::find_by_id(&state.pool, version_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "StateVersion",
            id: version_id,
        }))?;
    Ok(raw_state(version.state))
}

/// GET /api/workspaces/{workspace_id}/outputs
///
/// Outputs of the current version; `{}` before the first push.
pub async fn get_outputs(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(workspace_id): AppPath<DbId>,
) -> AppResult<impl IntoResponse> {
    authorize(&state, &auth, Resource::Workspace(workspace_id), Action::Read).await?;
    let outputs = StateVersionRepo::outputs(&state.pool, workspace_id).await?;
    Ok(Json(outputs))
}
