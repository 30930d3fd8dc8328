//! Parallel specialist fan-out.
//!
//! Every routed category runs as its own task in a `JoinSet`, bounded by the
//! per-agent timeout. A failing agent (error, timeout, panic) is turned into a
//! labeled output and never affects its siblings. Outputs come back in
//! request order regardless of completion order.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, warn};

use clara_types::agent::{Category, SpecialistOutput, UserContext};
use clara_types::error::AgentError;

use crate::agent::specialist::SpecialistAgent;
use crate::repository::Store;

/// Default per-agent budget.
pub const DEFAULT_AGENT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct FanOutCoordinator<S: Store> {
    store: Arc<S>,
    agent_timeout: Duration,
}

impl<S: Store> FanOutCoordinator<S> {
    pub fn new(store: Arc<S>, agent_timeout: Duration) -> Self {
        Self {
            store,
            agent_timeout,
        }
    }

    /// Run the specialist for each category against one message.
    pub async fn run(
        &self,
        categories: &[Category],
        message: &str,
        context: Arc<UserContext>,
    ) -> Vec<SpecialistOutput> {
        let store = Arc::clone(&self.store);
        self.dispatch(categories, |category| {
            let store = Arc::clone(&store);
            let context = Arc::clone(&context);
            let message = message.to_string();
            async move {
                match SpecialistAgent::for_category(category) {
                    Some(agent) => agent.handle(store.as_ref(), &message, &context).await,
                    None => Ok(String::new()),
                }
            }
        })
        .await
    }

    /// Fan out arbitrary per-category tasks with the coordinator's
    /// timeout, isolation and ordering guarantees.
    pub async fn dispatch<F, Fut>(
        &self,
        categories: &[Category],
        mut task_for: F,
    ) -> Vec<SpecialistOutput>
    where
        F: FnMut(Category) -> Fut,
        Fut: Future<Output = Result<String, AgentError>> + Send + 'static,
    {
        let routed: Vec<Category> = categories
            .iter()
            .copied()
            .filter(|c| !c.is_fallback())
            .collect();
        if routed.is_empty() {
            return Vec::new();
        }

        let timeout = self.agent_timeout;
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        let mut set = JoinSet::new();
        let mut slots = HashMap::with_capacity(routed.len());

        for (index, category) in routed.iter().copied().enumerate() {
            let task = task_for(category);
            let handle = set.spawn(async move {
                match tokio::time::timeout(timeout, task).await {
                    Ok(result) => result,
                    Err(_) => Err(AgentError::Timeout(timeout_ms)),
                }
            });
            slots.insert(handle.id(), index);
        }

        debug!(agents = routed.len(), timeout_ms, "Dispatched specialists");

        let mut outputs: Vec<Option<SpecialistOutput>> = vec![None; routed.len()];
        while let Some(joined) = set.join_next_with_id().await {
            let (id, result) = match joined {
                Ok((id, result)) => (id, result),
                Err(join_err) => {
                    let id = join_err.id();
                    let err = if join_err.is_panic() {
                        AgentError::Panicked
                    } else {
                        AgentError::InvalidInput(join_err.to_string())
                    };
                    (id, Err(err))
                }
            };
            let Some(&index) = slots.get(&id) else {
                continue;
            };
            let category = routed[index];

            let output = match result {
                Ok(content) => SpecialistOutput::new(category, content),
                Err(e) => {
                    warn!(agent = %category, error = %e, "Specialist failed");
                    SpecialistOutput::failure(category, e)
                }
            };
            outputs[index] = Some(output);
        }

        outputs
            .into_iter()
            .flatten()
            .filter(|o| !o.is_blank())
            .collect()
    }
}
