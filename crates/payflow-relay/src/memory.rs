//! In-memory relay client for testing.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use payflow_types::{RelayTaskStatus, Result, TaskId};

use crate::{RelayClient, SponsoredCallRequest};

/// Relay client that replays a scripted sequence of status responses.
///
/// Each status query pops the next scripted response; once one response is
/// left it is returned for every further query.
pub struct MemoryRelay {
    script: Mutex<VecDeque<Option<RelayTaskStatus>>>,
    queries: Mutex<Vec<TaskId>>,
    submissions: Mutex<Vec<SponsoredCallRequest>>,
}

impl MemoryRelay {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            queries: Mutex::new(Vec::new()),
            submissions: Mutex::new(Vec::new()),
        }
    }

    pub fn with_script<I>(responses: I) -> Self
    where
        I: IntoIterator<Item = Option<RelayTaskStatus>>,
    {
        let relay = Self::new();
        lock(&relay.script).extend(responses);
        relay
    }

    /// Number of status queries served so far.
    pub fn query_count(&self) -> usize {
        lock(&self.queries).len()
    }

    pub fn queried_task_ids(&self) -> Vec<TaskId> {
        lock(&self.queries).clone()
    }

    pub fn submissions(&self) -> Vec<SponsoredCallRequest> {
        lock(&self.submissions).clone()
    }
}

impl Default for MemoryRelay {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl RelayClient for MemoryRelay {
    async fn get_task_status(&self, task_id: &str) -> Result<Option<RelayTaskStatus>> {
        lock(&self.queries).push(task_id.to_string());

        let mut script = lock(&self.script);
        let next = if script.len() > 1 {
            script.pop_front().flatten()
        } else {
            script.front().cloned().flatten()
        };
        Ok(next)
    }

    async fn sponsored_call(&self, request: &SponsoredCallRequest) -> Result<TaskId> {
        let mut submissions = lock(&self.submissions);
        submissions.push(request.clone());
        Ok(format!("memory-task-{}", submissions.len()))
    }
}
