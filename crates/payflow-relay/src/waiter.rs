//! Await completion of a relay task by polling its status.

use std::sync::Arc;

use payflow_types::{RelayError, RelayTaskStatus, Result, TransactionHash, NO_ERROR_MESSAGE};
use tracing::{debug, info, warn};

use crate::{RelayClient, WaitConfig};

/// Polls a relay until a task leaves its in-flight states or the poll
/// budget runs out.
///
/// The waiter holds no per-task state, so one instance can await any number
/// of tasks concurrently.
#[derive(Clone)]
pub struct RelayTaskWaiter {
    client: Arc<dyn RelayClient>,
    config: WaitConfig,
}

impl RelayTaskWaiter {
    pub fn new(client: Arc<dyn RelayClient>, config: WaitConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> WaitConfig {
        self.config
    }

    /// Await `task_id` with the waiter's configured interval and timeout.
    pub async fn await_completion(&self, task_id: &str) -> Result<TransactionHash> {
        self.await_completion_with(task_id, self.config).await
    }

    /// Await `task_id`, sleeping `config.poll_interval()` before every
    /// status query and querying at most `config.max_polls()` times.
    ///
    /// Running out of polls is reported as a failure in the last observed
    /// in-flight state.
    pub async fn await_completion_with(
        &self,
        task_id: &str,
        config: WaitConfig,
    ) -> Result<TransactionHash> {
        if task_id.is_empty() {
            return Err(RelayError::InvalidTaskId);
        }
        let max_polls = config.max_polls()?;
        let poll_interval = config.poll_interval();

        let mut polls = 0u64;
        let last = loop {
            polls += 1;
            tokio::time::sleep(poll_interval).await;

            let status = self.client.get_task_status(task_id).await?;
            debug!(
                task_id,
                poll = polls,
                max_polls,
                state = ?status.as_ref().map(|s| &s.task_state),
                "Relay task status"
            );

            match status {
                Some(s) if s.task_state.is_in_flight() && polls < max_polls => continue,
                other => break other,
            }
        };

        resolve(task_id, last)
    }
}

fn resolve(task_id: &str, last: Option<RelayTaskStatus>) -> Result<TransactionHash> {
    let Some(status) = last else {
        warn!(task_id, "Relay returned no status for task");
        return Err(RelayError::NoResponse {
            task_id: task_id.to_string(),
        });
    };

    if !status.task_state.is_success() {
        let message = status
            .last_check_message
            .unwrap_or_else(|| NO_ERROR_MESSAGE.to_string());
        warn!(task_id, state = %status.task_state, %message, "Relay task failed");
        return Err(RelayError::Failed {
            task_id: task_id.to_string(),
            state: status.task_state,
            message,
        });
    }

    match status.transaction_hash {
        Some(tx_hash) => {
            info!(task_id, %tx_hash, "Relay task executed");
            Ok(tx_hash)
        }
        None => Err(RelayError::MissingTransactionHash {
            task_id: task_id.to_string(),
        }),
    }
}
