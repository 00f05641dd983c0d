//! Run status machine.
//!
//! A run starts `pending` and ends in one of five terminal statuses. Users
//! drive `cancel`, `discard` and `approve`; everything else is reported by the
//! external plan/apply executor. This module only decides whether a
//! transition is legal and which lifecycle timestamps it stamps; persisting
//! the result is the repository's job.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// RunStatus
// ---------------------------------------------------------------------------

/// Lifecycle status of a run. Stored as its snake_case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    Planning,
    Planned,
    NeedsConfirmation,
    Applying,
    Applied,
    Errored,
    Cancelled,
    Discarded,
    PlannedAndFinished,
}

/// Statuses that count towards the one-active-run-per-workspace rule.
pub const ACTIVE_STATUSES: [RunStatus; 3] = [
    RunStatus::Pending,
    RunStatus::Planning,
    RunStatus::Applying,
];

impl RunStatus {
    pub const ALL: [RunStatus; 10] = [
        RunStatus::Pending,
        RunStatus::Planning,
        RunStatus::Planned,
        RunStatus::NeedsConfirmation,
        RunStatus::Applying,
        RunStatus::Applied,
        RunStatus::Errored,
        RunStatus::Cancelled,
        RunStatus::Discarded,
        RunStatus::PlannedAndFinished,
    ];

    /// The database / wire name of the status.
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Pending => "pending",
            RunStatus::Planning => "planning",
            RunStatus::Planned => "planned",
            RunStatus::NeedsConfirmation => "needs_confirmation",
            RunStatus::Applying => "applying",
            RunStatus::Applied => "applied",
            RunStatus::Errored => "errored",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Discarded => "discarded",
            RunStatus::PlannedAndFinished => "planned_and_finished",
        }
    }

    /// No further transitions are possible once a run is terminal.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Applied
                | RunStatus::Errored
                | RunStatus::Cancelled
                | RunStatus::Discarded
                | RunStatus::PlannedAndFinished
        )
    }

    /// Whether the run occupies the workspace's single active slot.
    pub fn is_active(self) -> bool {
        ACTIVE_STATUSES.contains(&self)
    }

    /// Statuses the executor may move a run into from `self`.
    pub fn executor_targets(self) -> &'static [RunStatus] {
        match self {
            RunStatus::Pending => &[RunStatus::Planning, RunStatus::Errored],
            RunStatus::Planning => &[
                RunStatus::Planned,
                RunStatus::NeedsConfirmation,
                RunStatus::PlannedAndFinished,
                RunStatus::Applying,
                RunStatus::Errored,
            ],
            RunStatus::Planned => &[
                RunStatus::Applying,
                RunStatus::PlannedAndFinished,
                RunStatus::Errored,
            ],
            RunStatus::Applying => &[RunStatus::Applied, RunStatus::Errored],
            _ => &[],
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RunStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown run status '{s}'")))
    }
}

impl TryFrom<String> for RunStatus {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// RunOperation
// ---------------------------------------------------------------------------

/// What the run asks the executor to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOperation {
    Plan,
    PlanAndApply,
    Destroy,
    Refresh,
}

impl RunOperation {
    pub const ALL: [RunOperation; 4] = [
        RunOperation::Plan,
        RunOperation::PlanAndApply,
        RunOperation::Destroy,
        RunOperation::Refresh,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RunOperation::Plan => "plan",
            RunOperation::PlanAndApply => "plan_and_apply",
            RunOperation::Destroy => "destroy",
            RunOperation::Refresh => "refresh",
        }
    }

    pub fn is_destroy(self) -> bool {
        self == RunOperation::Destroy
    }
}

impl fmt::Display for RunOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunOperation {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RunOperation::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Unknown run operation '{s}'")))
    }
}

impl TryFrom<String> for RunOperation {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Something that asks a run to change status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEvent {
    /// User cancels a run that has not finished planning.
    Cancel,
    /// User throws away a finished plan.
    Discard,
    /// User confirms a plan awaiting confirmation.
    Approve,
    /// Executor reports progress into the given status.
    Report(RunStatus),
}

/// Compute the status a run moves to when `event` is applied in `current`.
///
/// Returns [`CoreError::InvalidState`] when the event is not legal from
/// `current`; the caller must then leave the run untouched.
pub fn next_status(current: RunStatus, event: RunEvent) -> Result<RunStatus, CoreError> {
    match event {
        RunEvent::Cancel => match current {
            RunStatus::Pending | RunStatus::Planning => Ok(RunStatus::Cancelled),
            _ => Err(CoreError::InvalidState(
                "Run cannot be cancelled in current state".into(),
            )),
        },
        RunEvent::Discard => match current {
            RunStatus::NeedsConfirmation | RunStatus::Planned => Ok(RunStatus::Discarded),
            _ => Err(CoreError::InvalidState(
                "Run cannot be discarded in current state".into(),
            )),
        },
        RunEvent::Approve => match current {
            RunStatus::NeedsConfirmation => Ok(RunStatus::Applying),
            _ => Err(CoreError::InvalidState(
                "Run is not awaiting confirmation".into(),
            )),
        },
        RunEvent::Report(target) => {
            if current.is_terminal() {
                return Err(CoreError::InvalidState(format!(
                    "Run already finished with status {current}"
                )));
            }
            // Same-status reports only carry log/counter updates.
            if target == current || current.executor_targets().contains(&target) {
                Ok(target)
            } else {
                Err(CoreError::InvalidState(format!(
                    "Run cannot move from {current} to {target}"
                )))
            }
        }
    }
}

/// Which lifecycle timestamps a transition stamps.
///
/// Repositories write each stamp with `COALESCE` so a timestamp, once set,
/// is never moved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionStamps {
    pub started: bool,
    pub plan_completed: bool,
    pub applied: bool,
    pub completed: bool,
}

/// Timestamps stamped by moving from `from` to `to`.
pub fn stamps_for(from: RunStatus, to: RunStatus) -> TransitionStamps {
    if from == to {
        return TransitionStamps::default();
    }
    TransitionStamps {
        started: to == RunStatus::Planning,
        plan_completed: from == RunStatus::Planning && to != RunStatus::Errored,
        applied: to == RunStatus::Applied,
        completed: to.is_terminal(),
    }
}
