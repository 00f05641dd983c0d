//! In-process executor command channel backed by `tokio::sync::broadcast`.
//!
//! Runners attach with [`ExecutorChannel::subscribe`] and receive every
//! [`ExecutorCommand`] dispatched after a run transition commits.

use terraconsole_core::executor::{ExecutorCommand, RunExecutor};
use tokio::sync::broadcast;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 256;

pub struct ExecutorChannel {
    sender: broadcast::Sender<ExecutorCommand>,
}

impl ExecutorChannel {
    /// Create a channel with a specific capacity.
    ///
    /// Slow subscribers that fall more than `capacity` commands behind
    /// observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ExecutorCommand> {
        self.sender.subscribe()
    }
}

impl Default for ExecutorChannel {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl RunExecutor for ExecutorChannel {
    fn dispatch(&self, command: ExecutorCommand) {
        let run_id = command.run_id();
        if self.sender.send(command).is_err() {
            tracing::warn!(run_id = %run_id, "No executor subscribed, command dropped");
        }
    }
}
