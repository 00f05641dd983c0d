//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` as the first argument. Guarded operations return an outcome enum
//! instead of a domain error; the API layer decides how to surface it.

pub mod run_repo;
pub mod state_version_repo;
pub mod workspace_repo;

pub use run_repo::{CreateRunOutcome, RunRepo, TransitionOutcome};
pub use state_version_repo::{AppendOutcome, StateVersionRepo};
pub use workspace_repo::{LockOutcome, WorkspaceRepo};
