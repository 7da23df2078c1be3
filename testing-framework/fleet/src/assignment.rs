use async_trait::async_trait;
use pkgtest_core::{WaitError, WaitPolicy, wait_until};
use thiserror::Error;
use tracing::debug;

use crate::{
    agent::{Agent, Policy},
    client::FleetError,
};

/// Read access to the current state of a single agent.
#[async_trait]
pub trait AgentSource: Send + Sync {
    async fn get_agent(&self, agent_id: &str) -> Result<Agent, FleetError>;
}

#[derive(Debug, Error)]
pub enum AssignmentError {
    #[error("could not assign policy {policy_id} to agent {agent_id}: {source}")]
    Reassign {
        agent_id: String,
        policy_id: String,
        #[source]
        source: FleetError,
    },
    #[error(
        "waiting for policy {policy_id} (revision {revision}) on agent {agent_id} failed: {source}"
    )]
    Converge {
        agent_id: String,
        policy_id: String,
        revision: u64,
        #[source]
        source: WaitError<FleetError>,
    },
}

/// Poll `agent_id` until it reports both the identity and the revision of
/// `policy`.
///
/// A failed fetch aborts the wait; mismatching state is polled again after
/// `wait.poll_interval` until `wait.timeout` elapses.
pub async fn wait_until_policy_assigned<S>(
    source: &S,
    agent_id: &str,
    policy: &Policy,
    wait: WaitPolicy,
) -> Result<Agent, AssignmentError>
where
    S: AgentSource + ?Sized,
{
    let what = format!("policy {} revision {} on agent {agent_id}", policy.id, policy.revision);

    wait_until(&what, wait, move || async move {
        let agent = source.get_agent(agent_id).await?;
        if agent.has_policy(policy) {
            return Ok(Some(agent));
        }
        debug!(
            agent = agent_id,
            current_policy = %agent.policy_id,
            current_revision = agent.policy_revision,
            target_policy = %policy.id,
            target_revision = policy.revision,
            "agent has not picked up the policy yet"
        );
        Ok::<_, FleetError>(None)
    })
    .await
    .map_err(|source| AssignmentError::Converge {
        agent_id: agent_id.to_owned(),
        policy_id: policy.id.clone(),
        revision: policy.revision,
        source,
    })
}
