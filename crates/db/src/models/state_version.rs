//! State version entity models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use terraconsole_core::types::{DbId, Timestamp};

/// A full row from the `state_versions` table, including the raw blob.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StateVersion {
    pub id: DbId,
    pub workspace_id: DbId,
    pub run_id: Option<DbId>,
    pub serial: i64,
    pub lineage: String,
    #[serde(skip_serializing)]
    pub state: Vec<u8>,
    pub state_hash: String,
    pub outputs: serde_json::Value,
    pub resource_count: i32,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
}

/// State version metadata without the blob, used for listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StateVersionMeta {
    pub id: DbId,
    pub workspace_id: DbId,
    pub run_id: Option<DbId>,
    pub serial: i64,
    pub lineage: String,
    pub state_hash: String,
    pub outputs: serde_json::Value,
    pub resource_count: i32,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
}

/// Input for `StateVersionRepo::append`.
///
/// `serial`, `lineage` and `outputs` are whatever the pusher declared; the
/// repository does not validate them against earlier versions.
#[derive(Debug, Clone)]
pub struct AppendState<'a> {
    pub workspace_id: DbId,
    pub run_id: Option<DbId>,
    pub created_by: Option<DbId>,
    pub state: &'a [u8],
    pub serial: i64,
    pub lineage: &'a str,
    pub outputs: &'a serde_json::Value,
    pub resource_count: i32,
}

/// Query parameters for state version listings.
#[derive(Debug, Default, Deserialize)]
pub struct StateVersionListQuery {
    /// Maximum number of results. Defaults to 50, capped at 50.
    pub limit: Option<i64>,
}
