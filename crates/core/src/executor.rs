//! Outbound boundary to the plan/apply executor.
//!
//! The core never runs Terraform. It records status and tells whatever
//! executor is attached what to do next; the executor reports back through
//! ordinary progress requests.

use serde::Serialize;

use crate::run_lifecycle::RunOperation;
use crate::types::DbId;

/// Instruction sent to the executor after a transition commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ExecutorCommand {
    /// A run was queued and should start planning.
    Plan {
        run_id: DbId,
        workspace_id: DbId,
        operation: RunOperation,
    },
    /// A plan was approved and should be applied.
    Apply { run_id: DbId, workspace_id: DbId },
    /// A run was cancelled; stop any work in flight.
    Abort { run_id: DbId },
}

impl ExecutorCommand {
    pub fn run_id(&self) -> DbId {
        match self {
            ExecutorCommand::Plan { run_id, .. }
            | ExecutorCommand::Apply { run_id, .. }
            | ExecutorCommand::Abort { run_id } => *run_id,
        }
    }
}

/// Something that accepts executor commands.
///
/// Dispatch is fire-and-forget: the transition has already been committed,
/// so a missing executor must not fail the request.
pub trait RunExecutor: Send + Sync {
    fn dispatch(&self, command: ExecutorCommand);
}
