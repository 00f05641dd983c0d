//! Workspace entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use terraconsole_core::types::{DbId, Timestamp};

/// A row from the `workspaces` table.
///
/// `locked_by` and `locked_at` are only ever set while `locked` is true.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Workspace {
    pub id: DbId,
    pub project_id: DbId,
    pub name: String,
    pub terraform_version: String,
    pub auto_apply: bool,
    pub locked: bool,
    pub locked_by: Option<DbId>,
    pub locked_at: Option<Timestamp>,
    pub current_state_id: Option<DbId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for `POST /api/projects/{project_id}/workspaces`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateWorkspace {
    pub name: String,
    pub terraform_version: Option<String>,
    pub auto_apply: Option<bool>,
}
