//! Repository for the `workspaces` table, including the workspace lock.
//!
//! Every lock mutation is a single conditional `UPDATE`, so two callers
//! racing for the lock cannot both win.

use sqlx::PgPool;
use terraconsole_core::types::DbId;

use crate::models::workspace::{CreateWorkspace, Workspace};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, project_id, name, terraform_version, auto_apply, \
    locked, locked_by, locked_at, current_state_id, created_at, updated_at";

/// Result of a lock attempt.
#[derive(Debug)]
pub enum LockOutcome {
    /// The caller now holds the lock.
    Acquired(Workspace),
    /// Someone already holds the lock; the row is returned unchanged.
    AlreadyLocked(Workspace),
    NotFound,
}

/// Provides CRUD and lock operations for workspaces.
pub struct WorkspaceRepo;

impl WorkspaceRepo {
    /// Insert a new workspace under `project_id`.
    pub async fn create(
        pool: &PgPool,
        project_id: DbId,
        input: &CreateWorkspace,
    ) -> Result<Workspace, sqlx::Error> {
        let query = format!(
            "INSERT INTO workspaces (project_id, name, terraform_version, auto_apply) \
             VALUES ($1, $2, COALESCE($3, 'latest'), COALESCE($4, false)) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Workspace>(&query)
            .bind(project_id)
            .bind(&input.name)
            .bind(&input.terraform_version)
            .bind(input.auto_apply)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Workspace>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM workspaces WHERE id = $1");
        sqlx::query_as::<_, Workspace>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List the workspaces of a project ordered by name.
    pub async fn list_by_project(
        pool: &PgPool,
        project_id: DbId,
    ) -> Result<Vec<Workspace>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM workspaces WHERE project_id = $1 ORDER BY name ASC"
        );
        sqlx::query_as::<_, Workspace>(&query)
            .bind(project_id)
            .fetch_all(pool)
            .await
    }

    pub async fn project_exists(pool: &PgPool, project_id: DbId) -> Result<bool, sqlx::Error> {
        let row: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM projects WHERE id = $1)")
            .bind(project_id)
            .fetch_one(pool)
            .await?;
        Ok(row.0)
    }

    /// Delete a workspace. Runs and state versions go with it (`ON DELETE CASCADE`).
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM workspaces WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Lock ─────────────────────────────────────────────────────────

    /// Acquire the lock for `holder` if nobody holds it.
    pub async fn lock(pool: &PgPool, id: DbId, holder: DbId) -> Result<LockOutcome, sqlx::Error> {
        let query = format!(
            "UPDATE workspaces \
             SET locked = true, locked_by = $2, locked_at = NOW() \
             WHERE id = $1 AND locked = false \
             RETURNING {COLUMNS}"
        );
        let acquired = sqlx::query_as::<_, Workspace>(&query)
            .bind(id)
            .bind(holder)
            .fetch_optional(pool)
            .await?;

        if let Some(workspace) = acquired {
            return Ok(LockOutcome::Acquired(workspace));
        }

        Ok(match Self::find_by_id(pool, id).await? {
            Some(workspace) => LockOutcome::AlreadyLocked(workspace),
            None => LockOutcome::NotFound,
        })
    }

    /// Clear the lock unconditionally. Unlocking an unlocked workspace is a no-op.
    ///
    /// Returns `None` if the workspace does not exist.
    pub async fn unlock(pool: &PgPool, id: DbId) -> Result<Option<Workspace>, sqlx::Error> {
        let query = format!(
            "UPDATE workspaces \
             SET locked = false, locked_by = NULL, locked_at = NULL \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Workspace>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Returns `None` if the workspace does not exist.
    pub async fn is_locked(pool: &PgPool, id: DbId) -> Result<Option<bool>, sqlx::Error> {
        let row: Option<(bool,)> = sqlx::query_as("SELECT locked FROM workspaces WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map(|r| r.0))
    }
}
