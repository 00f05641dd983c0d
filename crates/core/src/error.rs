use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The workspace lock is held, so the workspace cannot be mutated.
    #[error("Workspace {0} is locked")]
    WorkspaceLocked(DbId),

    /// Another run is already pending, planning or applying.
    #[error("Workspace {0} already has an active run")]
    ActiveRunExists(DbId),

    /// The requested transition is not legal from the current status.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
