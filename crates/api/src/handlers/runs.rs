//! Handlers for the run lifecycle.
//!
//! Transitions are decided by the core transition table and persisted by
//! [`RunRepo`]; executor commands go out only after the write has committed.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use terraconsole_core::authorization::{Action, Resource};
use terraconsole_core::error::CoreError;
use terraconsole_core::executor::{ExecutorCommand, RunExecutor};
use terraconsole_core::run_lifecycle::RunEvent;
use terraconsole_core::types::DbId;
use terraconsole_db::models::run::{CreateRun, Run, RunListQuery, RunProgress};
use terraconsole_db::repositories::{CreateRunOutcome, RunRepo, TransitionOutcome};

use crate::error::{AppError, AppResult};
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::handlers::authorize;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

fn run_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Run", id })
}

/// Persist `event` for a run and translate the outcome into a response.
async fn transition(
    state: &AppState,
    run_id: DbId,
    event: RunEvent,
    progress: Option<&RunProgress>,
) -> AppResult<Run> {
    match RunRepo::transition(&state.pool, run_id, event, progress).await? {
        TransitionOutcome::Transitioned { run, previous } => {
            tracing::info!(
                run_id = %run_id,
                workspace_id = %run.workspace_id,
                from = %previous.as_str(),
                to = %run.status.as_str(),
                "Run transitioned",
            );
            Ok(run)
        }
        TransitionOutcome::NotFound => Err(run_not_found(run_id)),
        TransitionOutcome::Rejected(err) => Err(err.into()),
        TransitionOutcome::ActiveRunExists { workspace_id } => {
            Err(CoreError::ActiveRunExists(workspace_id).into())
        }
    }
}

/// POST /api/workspaces/{workspace_id}/runs
///
/// Queues a `pending` run and asks the executor to plan it.
pub async fn create_run(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(workspace_id): AppPath<DbId>,
    AppJson(input): AppJson<CreateRun>,
) -> AppResult<impl IntoResponse> {
    authorize(&state, &auth, Resource::Workspace(workspace_id), Action::Write).await?;

    let run = match RunRepo::create(&state.pool, workspace_id, auth.user_id, &input).await? {
        CreateRunOutcome::Created(run) => run,
        CreateRunOutcome::WorkspaceNotFound => {
            return Err(AppError::Core(CoreError::NotFound {
                entity: "Workspace",
                id: workspace_id,
            }))
        }
        CreateRunOutcome::WorkspaceLocked => {
            return Err(CoreError::WorkspaceLocked(workspace_id).into())
        }
        CreateRunOutcome::ActiveRunExists => {
            return Err(CoreError::ActiveRunExists(workspace_id).into())
        }
    };

    tracing::info!(
        run_id = %run.id,
        workspace_id = %workspace_id,
        operation = %run.operation.as_str(),
        user_id = %auth.user_id,
        "Run queued",
    );

    state.executor.dispatch(ExecutorCommand::Plan {
        run_id: run.id,
        workspace_id,
        operation: run.operation,
    });

    Ok((StatusCode::CREATED, Json(run)))
}

/// GET /api/workspaces/{workspace_id}/runs
///
/// Newest first; `?limit=` is clamped to 1..=50.
pub async fn list_runs(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(workspace_id): AppPath<DbId>,
    AppQuery(params): AppQuery<RunListQuery>,
) -> AppResult<impl IntoResponse> {
    authorize(&state, &auth, Resource::Workspace(workspace_id), Action::Read).await?;
    let runs = RunRepo::list_by_workspace(&state.pool, workspace_id, &params).await?;
    Ok(Json(runs))
}

/// GET /api/runs/{run_id}
pub async fn get_run(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(run_id): AppPath<DbId>,
) -> AppResult<impl IntoResponse> {
    authorize(&state, &auth, Resource::Run(run_id), Action::Read).await?;
    let run = RunRepo::find_by_id(&state.pool, run_id)
        .await?
        .ok_or_else(|| run_not_found(run_id))?;
    Ok(Json(run))
}

/// GET /api/runs/{run_id}/plan-log
pub async fn get_plan_log(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(run_id): AppPath<DbId>,
) -> AppResult<impl IntoResponse> {
    authorize(&state, &auth, Resource::Run(run_id), Action::Read).await?;
    let log = RunRepo::plan_log(&state.pool, run_id)
        .await?
        .ok_or_else(|| run_not_found(run_id))?;
    Ok(Json(json!({ "log": log })))
}

/// GET /api/runs/{run_id}/apply-log
pub async fn get_apply_log(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(run_id): AppPath<DbId>,
) -> AppResult<impl IntoResponse> {
    authorize(&state, &auth, Resource::Run(run_id), Action::Read).await?;
    let log = RunRepo::apply_log(&state.pool, run_id)
        .await?
        .ok_or_else(|| run_not_found(run_id))?;
    Ok(Json(json!({ "log": log })))
}

/// POST /api/runs/{run_id}/approve
///
/// `needs_confirmation -> applying`, then hands the run to the executor.
pub async fn approve_run(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(run_id): AppPath<DbId>,
) -> AppResult<impl IntoResponse> {
    authorize(&state, &auth, Resource::Run(run_id), Action::Approve).await?;
    let run = transition(&state, run_id, RunEvent::Approve, None).await?;

    state.executor.dispatch(ExecutorCommand::Apply {
        run_id,
        workspace_id: run.workspace_id,
    });

    Ok(Json(run))
}

/// POST /api/runs/{run_id}/discard
pub async fn discard_run(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(run_id): AppPath<DbId>,
) -> AppResult<impl IntoResponse> {
    authorize(&state, &auth, Resource::Run(run_id), Action::Write).await?;
    let run = transition(&state, run_id, RunEvent::Discard, None).await?;
    Ok(Json(run))
}

/// POST /api/runs/{run_id}/cancel
///
/// Tells the executor to abort any in-flight work for the run.
pub async fn cancel_run(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(run_id): AppPath<DbId>,
) -> AppResult<impl IntoResponse> {
    authorize(&state, &auth, Resource::Run(run_id), Action::Write).await?;
    let run = transition(&state, run_id, RunEvent::Cancel, None).await?;

    state.executor.dispatch(ExecutorCommand::Abort { run_id });

    Ok(Json(run))
}

/// POST /api/runs/{run_id}/progress
///
/// Executor report. Repeating the current status updates only logs and
/// counters.
pub async fn report_progress(
    auth: AuthUser,
    State(state): State<AppState>,
    AppPath(run_id): AppPath<DbId>,
    AppJson(progress): AppJson<RunProgress>,
) -> AppResult<impl IntoResponse> {
    authorize(&state, &auth, Resource::Run(run_id), Action::Report).await?;
    let run = transition(
        &state,
        run_id,
        RunEvent::Report(progress.status),
        Some(&progress),
    )
    .await?;
    Ok(Json(run))
}
