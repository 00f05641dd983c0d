//! Terraform HTTP backend protocol.
//!
//! `terraform` talks to these endpoints directly: plain status codes, raw
//! state bodies, and lock endpoints that accept any method (the client sends
//! `LOCK` / `UNLOCK`).

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use terraconsole_core::authorization::{Action, Resource};
use terraconsole_core::error::CoreError;
use terraconsole_core::state_document::StateSummary;
use terraconsole_core::types::DbId;
use terraconsole_db::models::state_version::AppendState;
use terraconsole_db::repositories::{AppendOutcome, LockOutcome, StateVersionRepo, WorkspaceRepo};

use crate::error::{AppError, AppResult};
use crate::extract::{AppPath, AppQuery};
use crate::handlers::{authorize, raw_state};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PushStateQuery {
    /// The run that produced this state, if any.
    pub run_id: Option<DbId>,
}

fn workspace_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Workspace",
        id,
    })
}

/// GET /api/state/{workspace_id}
///
/// 204 with no body until the first push.
pub async fn fetch_state(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(workspace_id): AppPath<DbId>,
) -> AppResult<Response> {
    authorize(&state, &auth, Resource::Workspace(workspace_id), Action::Read).await?;
    Ok(match StateVersionRepo::current(&state.pool, workspace_id).await? {
        Some(version) => raw_state(version.state),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// POST /api/state/{workspace_id}
///
/// Stores the body verbatim as a new version. Metadata is read leniently;
/// a document that does not parse is still stored.
pub async fn push_state(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(workspace_id): AppPath<DbId>,
    AppQuery(query): AppQuery<PushStateQuery>,
    body: Bytes,
) -> AppResult<StatusCode> {
    authorize(&state, &auth, Resource::Workspace(workspace_id), Action::Write).await?;

    let summary = StateSummary::from_bytes(&body);
    let input = AppendState {
        workspace_id,
        run_id: query.run_id,
        created_by: Some(auth.user_id),
        state: &body,
        serial: summary.serial,
        lineage: &summary.lineage,
        outputs: &summary.outputs,
        resource_count: summary.resource_count,
    };

    match StateVersionRepo::append(&state.pool, &input).await? {
        AppendOutcome::Appended { version, previous } => {
            if let Some((previous_serial, previous_lineage)) = previous {
                if previous_lineage == version.lineage && version.serial <= previous_serial {
                    tracing::warn!(
                        workspace_id = %workspace_id,
                        serial = version.serial,
                        previous_serial,
                        lineage = %version.lineage,
                        "State pushed with non-increasing serial",
                    );
                }
            }
            tracing::info!(
                workspace_id = %workspace_id,
                state_version_id = %version.id,
                serial = version.serial,
                resource_count = version.resource_count,
                "State pushed",
            );
            Ok(StatusCode::OK)
        }
        AppendOutcome::WorkspaceNotFound => Err(workspace_not_found(workspace_id)),
        AppendOutcome::LockedByOther { holder } => {
            tracing::info!(
                workspace_id = %workspace_id,
                pusher = %auth.user_id,
                holder = ?holder,
                "State push refused, workspace locked by another principal",
            );
            Err(CoreError::WorkspaceLocked(workspace_id).into())
        }
        AppendOutcome::RunNotInWorkspace { run_id } => Err(CoreError::Validation(format!(
            "Run {run_id} does not belong to workspace {workspace_id}"
        ))
        .into()),
    }
}

/// ANY /api/state/{workspace_id}/lock
pub async fn lock_state(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(workspace_id): AppPath<DbId>,
) -> AppResult<impl IntoResponse> {
    authorize(&state, &auth, Resource::Workspace(workspace_id), Action::Lock).await?;

    match WorkspaceRepo::lock(&state.pool, workspace_id, auth.user_id).await? {
        LockOutcome::Acquired(_) => {
            tracing::info!(workspace_id = %workspace_id, holder = %auth.user_id, "State locked");
            Ok(Json(json!({ "status": "locked" })))
        }
        LockOutcome::AlreadyLocked(_) => Err(CoreError::WorkspaceLocked(workspace_id).into()),
        LockOutcome::NotFound => Err(workspace_not_found(workspace_id)),
    }
}

/// ANY /api/state/{workspace_id}/unlock
///
/// Always succeeds, including for a workspace that is not locked or does
/// not exist.
pub async fn unlock_state(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(workspace_id): AppPath<DbId>,
) -> AppResult<impl IntoResponse> {
    authorize(&state, &auth, Resource::Workspace(workspace_id), Action::Lock).await?;

    if WorkspaceRepo::unlock(&state.pool, workspace_id).await?.is_some() {
        tracing::info!(workspace_id = %workspace_id, user_id = %auth.user_id, "State unlocked");
    }
    Ok(Json(json!({ "status": "unlocked" })))
}
