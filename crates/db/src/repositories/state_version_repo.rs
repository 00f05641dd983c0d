//! Repository for the append-only `state_versions` table.
//!
//! Rows are never updated after insert. The workspace's `current_state_id`
//! always points at the version with the highest serial.

use sqlx::PgPool;
use terraconsole_core::hashing::sha256_hex;
use terraconsole_core::types::DbId;

use crate::clamp_limit;
use crate::models::state_version::{
    AppendState, StateVersion, StateVersionListQuery, StateVersionMeta,
};

/// Metadata columns (everything except the blob).
const META_COLUMNS: &str = "id, workspace_id, run_id, serial, lineage, state_hash, \
    outputs, resource_count, created_by, created_at";

/// All columns including the blob.
const COLUMNS: &str = "id, workspace_id, run_id, serial, lineage, state, state_hash, \
    outputs, resource_count, created_by, created_at";

/// Ordering that defines the "current" version of a workspace.
const CURRENT_ORDER: &str = "ORDER BY serial DESC, created_at DESC, id DESC";

/// Maximum (and default) page size for version listings.
pub const MAX_LIMIT: i64 = 50;

/// Result of [`StateVersionRepo::append`].
#[derive(Debug)]
pub enum AppendOutcome {
    Appended {
        version: StateVersionMeta,
        /// Serial and lineage of the version that was current before this
        /// append, so callers can check monotonicity.
        previous: Option<(i64, String)>,
    },
    WorkspaceNotFound,
    /// The workspace lock is held by a principal other than the pusher.
    LockedByOther { holder: Option<DbId> },
    /// `run_id` does not name a run of this workspace.
    RunNotInWorkspace { run_id: DbId },
}

#[derive(sqlx::FromRow)]
struct LockGate {
    locked: bool,
    locked_by: Option<DbId>,
}

/// Provides append and read operations for state versions.
pub struct StateVersionRepo;

impl StateVersionRepo {
    /// Record a new state version and repoint the workspace at the current one.
    ///
    /// Runs in one transaction holding the workspace row lock, so concurrent
    /// pushes to the same workspace are serialized and a failed insert leaves
    /// `current_state_id` untouched. A duplicate `(lineage, serial)` with a
    /// non-empty lineage fails on `uq_state_versions_workspace_lineage_serial`.
    pub async fn append(
        pool: &PgPool,
        input: &AppendState<'_>,
    ) -> Result<AppendOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let gate = sqlx::query_as::<_, LockGate>(
            "SELECT locked, locked_by FROM workspaces WHERE id = $1 FOR UPDATE",
        )
        .bind(input.workspace_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(gate) = gate else {
            return Ok(AppendOutcome::WorkspaceNotFound);
        };
        if gate.locked && (gate.locked_by.is_none() || gate.locked_by != input.created_by) {
            return Ok(AppendOutcome::LockedByOther {
                holder: gate.locked_by,
            });
        }

        if let Some(run_id) = input.run_id {
            let owned: (bool,) = sqlx::query_as(
                "SELECT EXISTS(SELECT 1 FROM runs WHERE id = $1 AND workspace_id = $2)",
            )
            .bind(run_id)
            .bind(input.workspace_id)
            .fetch_one(&mut *tx)
            .await?;
            if !owned.0 {
                return Ok(AppendOutcome::RunNotInWorkspace { run_id });
            }
        }

        let previous: Option<(i64, String)> = sqlx::query_as(&format!(
            "SELECT serial, lineage FROM state_versions WHERE workspace_id = $1 \
             {CURRENT_ORDER} LIMIT 1"
        ))
        .bind(input.workspace_id)
        .fetch_optional(&mut *tx)
        .await?;

        let query = format!(
            "INSERT INTO state_versions \
                 (workspace_id, run_id, serial, lineage, state, state_hash, outputs, \
                  resource_count, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {META_COLUMNS}"
        );
        let version = sqlx::query_as::<_, StateVersionMeta>(&query)
            .bind(input.workspace_id)
            .bind(input.run_id)
            .bind(input.serial)
            .bind(input.lineage)
            .bind(input.state)
            .bind(sha256_hex(input.state))
            .bind(input.outputs)
            .bind(input.resource_count)
            .bind(input.created_by)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(&format!(
            "UPDATE workspaces SET current_state_id = ( \
                 SELECT id FROM state_versions WHERE workspace_id = $1 \
                 {CURRENT_ORDER} LIMIT 1 \
             ) WHERE id = $1"
        ))
        .bind(input.workspace_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(AppendOutcome::Appended { version, previous })
    }

    /// The version with the highest serial for a workspace, blob included.
    pub async fn current(
        pool: &PgPool,
        workspace_id: DbId,
    ) -> Result<Option<StateVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM state_versions WHERE workspace_id = $1 \
             {CURRENT_ORDER} LIMIT 1"
        );
        sqlx::query_as::<_, StateVersion>(&query)
            .bind(workspace_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<StateVersion>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM state_versions WHERE id = $1");
        sqlx::query_as::<_, StateVersion>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Version metadata for a workspace, highest serial first.
    pub async fn list_recent(
        pool: &PgPool,
        workspace_id: DbId,
        params: &StateVersionListQuery,
    ) -> Result<Vec<StateVersionMeta>, sqlx::Error> {
        let query = format!(
            "SELECT {META_COLUMNS} FROM state_versions WHERE workspace_id = $1 \
             {CURRENT_ORDER} LIMIT $2"
        );
        sqlx::query_as::<_, StateVersionMeta>(&query)
            .bind(workspace_id)
            .bind(clamp_limit(params.limit, MAX_LIMIT))
            .fetch_all(pool)
            .await
    }

    /// Outputs of the current version, or an empty object if there is none.
    pub async fn outputs(
        pool: &PgPool,
        workspace_id: DbId,
    ) -> Result<serde_json::Value, sqlx::Error> {
        let row: Option<(serde_json::Value,)> = sqlx::query_as(&format!(
            "SELECT outputs FROM state_versions WHERE workspace_id = $1 \
             {CURRENT_ORDER} LIMIT 1"
        ))
        .bind(workspace_id)
        .fetch_optional(pool)
        .await?;
        Ok(row
            .map(|r| r.0)
            .unwrap_or_else(|| serde_json::Value::Object(Default::default())))
    }
}
