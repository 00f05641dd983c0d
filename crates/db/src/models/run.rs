//! Run entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use terraconsole_core::run_lifecycle::{RunOperation, RunStatus};
use terraconsole_core::types::{DbId, Timestamp};

/// A row from the `runs` table, without the log columns.
///
/// Logs can be large and are fetched separately through
/// `RunRepo::plan_log` / `RunRepo::apply_log`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Run {
    pub id: DbId,
    pub workspace_id: DbId,
    #[sqlx(try_from = "String")]
    pub status: RunStatus,
    #[sqlx(try_from = "String")]
    pub operation: RunOperation,
    pub message: String,
    pub is_destroy: bool,
    /// Request flag OR the workspace setting, captured at creation.
    pub auto_apply: bool,
    pub terraform_version: String,
    pub created_by: DbId,
    pub resources_added: i32,
    pub resources_changed: i32,
    pub resources_deleted: i32,
    pub started_at: Option<Timestamp>,
    pub plan_completed_at: Option<Timestamp>,
    pub applied_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for `POST /api/workspaces/{workspace_id}/runs`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRun {
    pub operation: RunOperation,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub auto_apply: bool,
}

/// Executor progress report for `POST /api/runs/{run_id}/progress`.
///
/// `status` may equal the current status to update only logs or counters.
#[derive(Debug, Clone, Deserialize)]
pub struct RunProgress {
    pub status: RunStatus,
    pub plan_log: Option<String>,
    pub apply_log: Option<String>,
    pub resources_added: Option<i32>,
    pub resources_changed: Option<i32>,
    pub resources_deleted: Option<i32>,
}

/// Query parameters for run listings.
#[derive(Debug, Default, Deserialize)]
pub struct RunListQuery {
    /// Maximum number of results. Defaults to 50, capped at 50.
    pub limit: Option<i64>,
}
