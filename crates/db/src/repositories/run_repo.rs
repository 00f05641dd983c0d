//! Repository for the `runs` table.
//!
//! Status changes go through [`terraconsole_core::run_lifecycle::next_status`];
//! this module only persists the decision. Both the create path and every
//! transition into an active status take the workspace row lock first, so
//! the "one active run per workspace" check and the write that depends on it
//! happen inside one transaction. The partial unique index
//! `uq_runs_one_active_per_workspace` backs this up at the schema level.

use sqlx::{PgPool, Postgres, Transaction};
use terraconsole_core::error::CoreError;
use terraconsole_core::run_lifecycle::{
    next_status, stamps_for, RunEvent, RunStatus, ACTIVE_STATUSES,
};
use terraconsole_core::types::DbId;

use crate::clamp_limit;
use crate::models::run::{CreateRun, Run, RunListQuery, RunProgress};

/// Column list for `runs` queries (log columns excluded).
const COLUMNS: &str = "\
    id, workspace_id, status, operation, message, is_destroy, auto_apply, \
    terraform_version, created_by, \
    resources_added, resources_changed, resources_deleted, \
    started_at, plan_completed_at, applied_at, completed_at, \
    created_at, updated_at";

/// Maximum (and default) page size for run listings.
pub const MAX_LIMIT: i64 = 50;

/// Result of [`RunRepo::create`].
#[derive(Debug)]
pub enum CreateRunOutcome {
    Created(Run),
    WorkspaceNotFound,
    /// The workspace lock is held; no run was inserted.
    WorkspaceLocked,
    /// Another run is pending, planning or applying; no run was inserted.
    ActiveRunExists,
}

/// Result of [`RunRepo::transition`].
#[derive(Debug)]
pub enum TransitionOutcome {
    Transitioned { run: Run, previous: RunStatus },
    NotFound,
    /// The event is illegal from the current status; the run is unchanged.
    Rejected(CoreError),
    /// Moving into `applying` would make a second active run.
    ActiveRunExists { workspace_id: DbId },
}

/// Workspace fields read under the row lock when creating a run.
#[derive(sqlx::FromRow)]
struct WorkspaceGate {
    locked: bool,
    auto_apply: bool,
    terraform_version: String,
}

/// Provides lifecycle operations for runs.
pub struct RunRepo;

impl RunRepo {
    /// Queue a new `pending` run.
    ///
    /// Refused while the workspace is locked or while another run is active.
    /// `auto_apply` is the request flag OR the workspace's setting, captured
    /// once here.
    pub async fn create(
        pool: &PgPool,
        workspace_id: DbId,
        created_by: DbId,
        input: &CreateRun,
    ) -> Result<CreateRunOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let gate = sqlx::query_as::<_, WorkspaceGate>(
            "SELECT locked, auto_apply, terraform_version FROM workspaces \
             WHERE id = $1 FOR UPDATE",
        )
        .bind(workspace_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(gate) = gate else {
            return Ok(CreateRunOutcome::WorkspaceNotFound);
        };
        if gate.locked {
            return Ok(CreateRunOutcome::WorkspaceLocked);
        }
        if Self::has_active_run(&mut tx, workspace_id, None).await? {
            return Ok(CreateRunOutcome::ActiveRunExists);
        }

        let query = format!(
            "INSERT INTO runs \
                 (workspace_id, status, operation, message, is_destroy, auto_apply, \
                  terraform_version, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {COLUMNS}"
        );
        let run = sqlx::query_as::<_, Run>(&query)
            .bind(workspace_id)
            .bind(RunStatus::Pending.as_str())
            .bind(input.operation.as_str())
            .bind(&input.message)
            .bind(input.operation.is_destroy())
            .bind(input.auto_apply || gate.auto_apply)
            .bind(&gate.terraform_version)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(CreateRunOutcome::Created(run))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Run>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM runs WHERE id = $1");
        sqlx::query_as::<_, Run>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List runs for a workspace, newest first.
    pub async fn list_by_workspace(
        pool: &PgPool,
        workspace_id: DbId,
        params: &RunListQuery,
    ) -> Result<Vec<Run>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM runs WHERE workspace_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        );
        sqlx::query_as::<_, Run>(&query)
            .bind(workspace_id)
            .bind(clamp_limit(params.limit, MAX_LIMIT))
            .fetch_all(pool)
            .await
    }

    /// Returns `None` if the run does not exist.
    pub async fn plan_log(pool: &PgPool, id: DbId) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as("SELECT plan_log FROM runs WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|r| r.0))
    }

    /// Returns `None` if the run does not exist.
    pub async fn apply_log(pool: &PgPool, id: DbId) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as("SELECT apply_log FROM runs WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|r| r.0))
    }

    /// Apply `event` to a run and persist the new status.
    ///
    /// `progress` carries executor-reported logs and counters; it is only
    /// meaningful with [`RunEvent::Report`]. Lifecycle timestamps are stamped
    /// once and never moved.
    pub async fn transition(
        pool: &PgPool,
        run_id: DbId,
        event: RunEvent,
        progress: Option<&RunProgress>,
    ) -> Result<TransitionOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {COLUMNS} FROM runs WHERE id = $1 FOR UPDATE");
        let current = sqlx::query_as::<_, Run>(&query)
            .bind(run_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(current) = current else {
            return Ok(TransitionOutcome::NotFound);
        };

        let target = match next_status(current.status, event) {
            Ok(target) => target,
            Err(err) => return Ok(TransitionOutcome::Rejected(err)),
        };

        if target.is_active() && !current.status.is_active() {
            sqlx::query("SELECT id FROM workspaces WHERE id = $1 FOR UPDATE")
                .bind(current.workspace_id)
                .execute(&mut *tx)
                .await?;
            if Self::has_active_run(&mut tx, current.workspace_id, Some(run_id)).await? {
                return Ok(TransitionOutcome::ActiveRunExists {
                    workspace_id: current.workspace_id,
                });
            }
        }

        let stamps = stamps_for(current.status, target);
        let query = format!(
            "UPDATE runs SET \
                 status = $2, \
                 started_at = CASE WHEN $3 THEN COALESCE(started_at, NOW()) ELSE started_at END, \
                 plan_completed_at = CASE WHEN $4 THEN COALESCE(plan_completed_at, NOW()) ELSE plan_completed_at END, \
                 applied_at = CASE WHEN $5 THEN COALESCE(applied_at, NOW()) ELSE applied_at END, \
                 completed_at = CASE WHEN $6 THEN COALESCE(completed_at, NOW()) ELSE completed_at END, \
                 plan_log = COALESCE($7, plan_log), \
                 apply_log = COALESCE($8, apply_log), \
                 resources_added = COALESCE($9, resources_added), \
                 resources_changed = COALESCE($10, resources_changed), \
                 resources_deleted = COALESCE($11, resources_deleted) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        let run = sqlx::query_as::<_, Run>(&query)
            .bind(run_id)
            .bind(target.as_str())
            .bind(stamps.started)
            .bind(stamps.plan_completed)
            .bind(stamps.applied)
            .bind(stamps.completed)
            .bind(progress.and_then(|p| p.plan_log.as_deref()))
            .bind(progress.and_then(|p| p.apply_log.as_deref()))
            .bind(progress.and_then(|p| p.resources_added))
            .bind(progress.and_then(|p| p.resources_changed))
            .bind(progress.and_then(|p| p.resources_deleted))
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(TransitionOutcome::Transitioned {
            run,
            previous: current.status,
        })
    }

    /// Whether the workspace has a pending, planning or applying run other
    /// than `except`.
    async fn has_active_run(
        tx: &mut Transaction<'_, Postgres>,
        workspace_id: DbId,
        except: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let active: Vec<&str> = ACTIVE_STATUSES.iter().map(|s| s.as_str()).collect();
        let row: (bool,) = sqlx::query_as(
            "SELECT EXISTS( \
                 SELECT 1 FROM runs \
                 WHERE workspace_id = $1 AND status = ANY($2) \
                   AND ($3::uuid IS NULL OR id <> $3) \
             )",
        )
        .bind(workspace_id)
        .bind(&active)
        .bind(except)
        .fetch_one(&mut **tx)
        .await?;
        Ok(row.0)
    }
}
