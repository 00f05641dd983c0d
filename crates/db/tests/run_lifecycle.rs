//! Integration tests for run creation and status transitions.
//!
//! Exercises the guards that must hold against a real database:
//! - No run is created while the workspace is locked
//! - At most one pending/planning/applying run per workspace
//! - Illegal transitions leave the run unchanged
//! - Lifecycle timestamps are stamped once

use assert_matches::assert_matches;
use sqlx::PgPool;
use terraconsole_core::error::CoreError;
use terraconsole_core::run_lifecycle::{RunEvent, RunOperation, RunStatus};
use terraconsole_db::models::run::{CreateRun, Run, RunListQuery, RunProgress};
use terraconsole_db::models::workspace::{CreateWorkspace, Workspace};
use terraconsole_db::repositories::{
    CreateRunOutcome, RunRepo, TransitionOutcome, WorkspaceRepo,
};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn new_workspace(pool: &PgPool, auto_apply: bool) -> Workspace {
    let project: (Uuid,) =
        sqlx::query_as("INSERT INTO projects (name) VALUES ('runs') RETURNING id")
            .fetch_one(pool)
            .await
            .unwrap();
    let input = CreateWorkspace {
        name: "runs-ws".to_string(),
        terraform_version: Some("1.9.5".to_string()),
        auto_apply: Some(auto_apply),
    };
    WorkspaceRepo::create(pool, project.0, &input).await.unwrap()
}

fn plan() -> CreateRun {
    CreateRun {
        operation: RunOperation::Plan,
        message: "test run".to_string(),
        auto_apply: false,
    }
}

async fn create_run(pool: &PgPool, workspace_id: Uuid, input: &CreateRun) -> Run {
    let outcome = RunRepo::create(pool, workspace_id, Uuid::new_v4(), input)
        .await
        .unwrap();
    assert_matches!(outcome, CreateRunOutcome::Created(run) => run)
}

fn report(status: RunStatus) -> RunProgress {
    RunProgress {
        status,
        plan_log: None,
        apply_log: None,
        resources_added: None,
        resources_changed: None,
        resources_deleted: None,
    }
}

async fn drive(pool: &PgPool, run_id: Uuid, statuses: &[RunStatus]) -> Run {
    let mut last = None;
    for status in statuses {
        let progress = report(*status);
        let outcome = RunRepo::transition(pool, run_id, RunEvent::Report(*status), Some(&progress))
            .await
            .unwrap();
        last = Some(assert_matches!(outcome, TransitionOutcome::Transitioned { run, .. } => run));
    }
    last.expect("at least one status")
}

async fn active_count(pool: &PgPool, workspace_id: Uuid) -> i64 {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM runs WHERE workspace_id = $1 \
         AND status IN ('pending', 'planning', 'applying')",
    )
    .bind(workspace_id)
    .fetch_one(pool)
    .await
    .unwrap();
    row.0
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_run_is_pending_and_inherits_workspace_fields(pool: PgPool) {
    let ws = new_workspace(&pool, true).await;
    let run = create_run(&pool, ws.id, &plan()).await;

    assert_eq!(run.status, RunStatus::Pending);
    assert_eq!(run.operation, RunOperation::Plan);
    assert_eq!(run.terraform_version, "1.9.5");
    assert!(run.auto_apply, "auto_apply inherited from workspace");
    assert!(!run.is_destroy);
    assert!(run.started_at.is_none());
    assert!(run.completed_at.is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_destroy_run_sets_is_destroy(pool: PgPool) {
    let ws = new_workspace(&pool, false).await;
    let input = CreateRun {
        operation: RunOperation::Destroy,
        message: String::new(),
        auto_apply: true,
    };
    let run = create_run(&pool, ws.id, &input).await;
    assert!(run.is_destroy);
    assert!(run.auto_apply, "auto_apply taken from the request flag");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_run_on_locked_workspace_inserts_nothing(pool: PgPool) {
    let ws = new_workspace(&pool, false).await;
    WorkspaceRepo::lock(&pool, ws.id, Uuid::new_v4()).await.unwrap();

    let outcome = RunRepo::create(&pool, ws.id, Uuid::new_v4(), &plan())
        .await
        .unwrap();
    assert_matches!(outcome, CreateRunOutcome::WorkspaceLocked);

    let runs = RunRepo::list_by_workspace(&pool, ws.id, &RunListQuery::default())
        .await
        .unwrap();
    assert!(runs.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_second_run_is_refused_while_first_is_active(pool: PgPool) {
    let ws = new_workspace(&pool, false).await;
    create_run(&pool, ws.id, &plan()).await;

    let outcome = RunRepo::create(&pool, ws.id, Uuid::new_v4(), &plan())
        .await
        .unwrap();
    assert_matches!(outcome, CreateRunOutcome::ActiveRunExists);
    assert_eq!(active_count(&pool, ws.id).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_run_missing_workspace(pool: PgPool) {
    let outcome = RunRepo::create(&pool, Uuid::new_v4(), Uuid::new_v4(), &plan())
        .await
        .unwrap();
    assert_matches!(outcome, CreateRunOutcome::WorkspaceNotFound);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_concurrent_creates_admit_one_active_run(pool: PgPool) {
    let ws = new_workspace(&pool, false).await;
    let workspace_id = ws.id;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let pool = pool.clone();
            tokio::spawn(async move {
                RunRepo::create(&pool, workspace_id, Uuid::new_v4(), &plan()).await
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        if let CreateRunOutcome::Created(_) = handle.await.unwrap().unwrap() {
            created += 1;
        }
    }
    assert_eq!(created, 1);
    assert_eq!(active_count(&pool, workspace_id).await, 1);
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_cancel_pending_run_frees_the_queue(pool: PgPool) {
    let ws = new_workspace(&pool, false).await;
    let run = create_run(&pool, ws.id, &plan()).await;

    let outcome = RunRepo::transition(&pool, run.id, RunEvent::Cancel, None)
        .await
        .unwrap();
    let cancelled = assert_matches!(
        outcome,
        TransitionOutcome::Transitioned { run, previous: RunStatus::Pending } => run
    );
    assert_eq!(cancelled.status, RunStatus::Cancelled);
    assert!(cancelled.completed_at.is_some());

    create_run(&pool, ws.id, &plan()).await;
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_approve_from_wrong_state_leaves_run_unchanged(pool: PgPool) {
    let ws = new_workspace(&pool, false).await;
    let run = create_run(&pool, ws.id, &plan()).await;

    let outcome = RunRepo::transition(&pool, run.id, RunEvent::Approve, None)
        .await
        .unwrap();
    assert_matches!(outcome, TransitionOutcome::Rejected(CoreError::InvalidState(_)));

    let reloaded = RunRepo::find_by_id(&pool, run.id).await.unwrap().unwrap();
    assert_eq!(reloaded.status, RunStatus::Pending);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_transition_missing_run(pool: PgPool) {
    let outcome = RunRepo::transition(&pool, Uuid::new_v4(), RunEvent::Cancel, None)
        .await
        .unwrap();
    assert_matches!(outcome, TransitionOutcome::NotFound);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_full_lifecycle_stamps_timestamps_once(pool: PgPool) {
    let ws = new_workspace(&pool, false).await;
    let run = create_run(&pool, ws.id, &plan()).await;

    let planning = drive(&pool, run.id, &[RunStatus::Planning]).await;
    let started_at = planning.started_at.expect("started_at stamped");

    let waiting = drive(&pool, run.id, &[RunStatus::NeedsConfirmation]).await;
    assert_eq!(waiting.started_at, Some(started_at));
    let plan_completed_at = waiting.plan_completed_at.expect("plan_completed_at stamped");

    let outcome = RunRepo::transition(&pool, run.id, RunEvent::Approve, None)
        .await
        .unwrap();
    let applying = assert_matches!(outcome, TransitionOutcome::Transitioned { run, .. } => run);
    assert_eq!(applying.status, RunStatus::Applying);

    let applied = drive(&pool, run.id, &[RunStatus::Applied]).await;
    assert_eq!(applied.started_at, Some(started_at));
    assert_eq!(applied.plan_completed_at, Some(plan_completed_at));
    let applied_at = applied.applied_at.expect("applied_at stamped");
    let completed_at = applied.completed_at.expect("completed_at stamped");
    assert!(started_at <= plan_completed_at);
    assert!(plan_completed_at <= applied_at);
    assert!(applied_at <= completed_at);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_progress_updates_logs_and_counters(pool: PgPool) {
    let ws = new_workspace(&pool, false).await;
    let run = create_run(&pool, ws.id, &plan()).await;
    drive(&pool, run.id, &[RunStatus::Planning]).await;

    let progress = RunProgress {
        status: RunStatus::Planned,
        plan_log: Some("Plan: 2 to add, 1 to change, 0 to destroy.".to_string()),
        apply_log: None,
        resources_added: Some(2),
        resources_changed: Some(1),
        resources_deleted: Some(0),
    };
    let outcome = RunRepo::transition(
        &pool,
        run.id,
        RunEvent::Report(RunStatus::Planned),
        Some(&progress),
    )
    .await
    .unwrap();
    let planned = assert_matches!(outcome, TransitionOutcome::Transitioned { run, .. } => run);
    assert_eq!(planned.resources_added, 2);
    assert_eq!(planned.resources_changed, 1);

    let log = RunRepo::plan_log(&pool, run.id).await.unwrap().unwrap();
    assert!(log.starts_with("Plan: 2 to add"));
    assert_eq!(RunRepo::apply_log(&pool, run.id).await.unwrap().unwrap(), "");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_approve_refused_when_another_run_became_active(pool: PgPool) {
    let ws = new_workspace(&pool, false).await;
    let first = create_run(&pool, ws.id, &plan()).await;
    drive(&pool, first.id, &[RunStatus::Planning, RunStatus::NeedsConfirmation]).await;

    // needs_confirmation is not active, so a second run may be queued.
    create_run(&pool, ws.id, &plan()).await;

    let outcome = RunRepo::transition(&pool, first.id, RunEvent::Approve, None)
        .await
        .unwrap();
    assert_matches!(outcome, TransitionOutcome::ActiveRunExists { .. });
    assert_eq!(active_count(&pool, ws.id).await, 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_runs_newest_first(pool: PgPool) {
    let ws = new_workspace(&pool, false).await;
    let mut ids = Vec::new();
    for _ in 0..3 {
        let run = create_run(&pool, ws.id, &plan()).await;
        RunRepo::transition(&pool, run.id, RunEvent::Cancel, None)
            .await
            .unwrap();
        ids.push(run.id);
    }

    let runs = RunRepo::list_by_workspace(&pool, ws.id, &RunListQuery::default())
        .await
        .unwrap();
    let listed: Vec<_> = runs.iter().map(|r| r.id).collect();
    ids.reverse();
    assert_eq!(listed, ids);

    let limited = RunRepo::list_by_workspace(&pool, ws.id, &RunListQuery { limit: Some(2) })
        .await
        .unwrap();
    assert_eq!(limited.len(), 2);
}
