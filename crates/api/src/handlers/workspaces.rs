//! Handlers for workspaces and the human-facing workspace lock.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use terraconsole_core::authorization::{Action, Resource};
use terraconsole_core::error::CoreError;
use terraconsole_core::types::DbId;
use terraconsole_db::models::workspace::CreateWorkspace;
use terraconsole_db::repositories::{LockOutcome, WorkspaceRepo};

use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath};
use crate::handlers::authorize;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

fn workspace_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Workspace",
        id,
    })
}

/// POST /api/projects/{project_id}/workspaces
pub async fn create_workspace(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(project_id): AppPath<DbId>,
    AppJson(input): AppJson<CreateWorkspace>,
) -> AppResult<impl IntoResponse> {
    if input.name.trim().is_empty() {
        return Err(CoreError::Validation("Workspace name must not be empty".into()).into());
    }
    authorize(&state, &auth, Resource::Project(project_id), Action::Write).await?;

    if !WorkspaceRepo::project_exists(&state.pool, project_id).await? {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Project",
            id: project_id,
        }));
    }

    let workspace = WorkspaceRepo::create(&state.pool, project_id, &input).await?;

    tracing::info!(
        workspace_id = %workspace.id,
        project_id = %project_id,
        user_id = %auth.user_id,
        "Workspace created",
    );

    Ok((StatusCode::CREATED, Json(workspace)))
}

/// GET /api/projects/{project_id}/workspaces
pub async fn list_workspaces(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(project_id): AppPath<DbId>,
) -> AppResult<impl IntoResponse> {
    authorize(&state, &auth, Resource::Project(project_id), Action::Read).await?;
    let workspaces = WorkspaceRepo::list_by_project(&state.pool, project_id).await?;
    Ok(Json(workspaces))
}

/// GET /api/workspaces/{workspace_id}
pub async fn get_workspace(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(workspace_id): AppPath<DbId>,
) -> AppResult<impl IntoResponse> {
    authorize(&state, &auth, Resource::Workspace(workspace_id), Action::Read).await?;
    let workspace = WorkspaceRepo::find_by_id(&state.pool, workspace_id)
        .await?
        .ok_or_else(|| workspace_not_found(workspace_id))?;
    Ok(Json(workspace))
}

/// DELETE /api/workspaces/{workspace_id}
///
/// Runs and state versions are removed with the workspace.
pub async fn delete_workspace(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(workspace_id): AppPath<DbId>,
) -> AppResult<StatusCode> {
    authorize(&state, &auth, Resource::Workspace(workspace_id), Action::Write).await?;
    if !WorkspaceRepo::delete(&state.pool, workspace_id).await? {
        return Err(workspace_not_found(workspace_id));
    }
    tracing::info!(workspace_id = %workspace_id, user_id = %auth.user_id, "Workspace deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/workspaces/{workspace_id}/lock
pub async fn lock_workspace(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(workspace_id): AppPath<DbId>,
) -> AppResult<impl IntoResponse> {
    authorize(&state, &auth, Resource::Workspace(workspace_id), Action::Lock).await?;

    match WorkspaceRepo::lock(&state.pool, workspace_id, auth.user_id).await? {
        LockOutcome::Acquired(workspace) => {
            tracing::info!(workspace_id = %workspace_id, holder = %auth.user_id, "Workspace locked");
            Ok(Json(workspace))
        }
        LockOutcome::AlreadyLocked(_) => Err(CoreError::WorkspaceLocked(workspace_id).into()),
        LockOutcome::NotFound => Err(workspace_not_found(workspace_id)),
    }
}

/// POST /api/workspaces/{workspace_id}/unlock
///
/// Unlocking an unlocked workspace succeeds.
pub async fn unlock_workspace(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(workspace_id): AppPath<DbId>,
) -> AppResult<impl IntoResponse> {
    authorize(&state, &auth, Resource::Workspace(workspace_id), Action::Lock).await?;

    let workspace = WorkspaceRepo::unlock(&state.pool, workspace_id)
        .await?
        .ok_or_else(|| workspace_not_found(workspace_id))?;
    tracing::info!(workspace_id = %workspace_id, user_id = %auth.user_id, "Workspace unlocked");
    Ok(Json(workspace))
}
