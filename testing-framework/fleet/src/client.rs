use std::time::Duration;

use async_trait::async_trait;
use pkgtest_core::WaitPolicy;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::{
    agent::{Agent, Policy},
    assignment::{AgentSource, AssignmentError, wait_until_policy_assigned},
};

pub const DEFAULT_KIBANA_HOST: &str = "http://127.0.0.1:5601";

const FLEET_API: [&str; 2] = ["api", "fleet"];
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_ASSIGN_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum FleetError {
    #[error("invalid Fleet base url `{url}`: {reason}")]
    BaseUrl { url: String, reason: String },
    #[error("could not {operation}: {source}")]
    Request {
        operation: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("could not {operation}; API status code = {status}; response body = {body}")]
    Status {
        operation: String,
        status: StatusCode,
        body: String,
    },
    #[error("could not decode {operation} response: {source}")]
    Decode {
        operation: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Connection settings for the Fleet API served by Kibana.
#[derive(Clone)]
pub struct FleetConfig {
    pub base_url: Url,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Cadence and bound of the post-reassign convergence wait.
    pub assignment_wait: WaitPolicy,
}

impl std::fmt::Debug for FleetConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FleetConfig")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<set>"))
            .field("assignment_wait", &self.assignment_wait)
            .finish()
    }
}

impl FleetConfig {
    pub fn new(base_url: &str) -> Result<Self, FleetError> {
        let invalid = |reason: String| FleetError::BaseUrl {
            url: base_url.to_owned(),
            reason,
        };
        let parsed = Url::parse(base_url).map_err(|err| invalid(err.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(invalid("url cannot carry a path".to_owned()));
        }

        Ok(Self {
            base_url: parsed,
            username: None,
            password: None,
            assignment_wait: WaitPolicy::new(DEFAULT_POLL_INTERVAL)
                .with_timeout(DEFAULT_ASSIGN_TIMEOUT),
        })
    }

    #[must_use]
    pub fn with_basic_auth(mut self, username: String, password: String) -> Self {
        self.username = Some(username);
        self.password = Some(password);
        self
    }

    #[must_use]
    pub fn with_assignment_wait(mut self, wait: WaitPolicy) -> Self {
        self.assignment_wait = wait;
        self
    }

    pub fn from_env() -> Result<Self, FleetError> {
        let host = pkgtest_env::kibana_host().unwrap_or_else(|| DEFAULT_KIBANA_HOST.to_owned());
        let mut config = Self::new(&host)?;

        if let Some(username) = pkgtest_env::elasticsearch_username() {
            config.username = Some(username);
            config.password = pkgtest_env::elasticsearch_password();
        }

        let poll_interval = pkgtest_env::policy_poll_interval_secs()
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL);
        let timeout = pkgtest_env::policy_wait_timeout_secs()
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_ASSIGN_TIMEOUT);
        config.assignment_wait = WaitPolicy::new(poll_interval).with_timeout(timeout);

        Ok(config)
    }
}

#[derive(Deserialize)]
struct AgentList {
    #[serde(default)]
    list: Vec<Agent>,
}

#[derive(Deserialize)]
struct AgentItem {
    item: Agent,
}

/// Thin async client for the Fleet agents API.
#[derive(Clone, Debug)]
pub struct FleetClient {
    config: FleetConfig,
    client: Client,
}

impl FleetClient {
    #[must_use]
    pub fn new(config: FleetConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    /// `{base}/api/fleet/<segments...>`, each segment percent-encoded.
    #[must_use]
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.config.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(FLEET_API).extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let builder = self
            .client
            .request(method, self.endpoint(segments))
            .header("kbn-xsrf", "pkgtest");
        match &self.config.username {
            Some(username) => builder.basic_auth(username, self.config.password.as_deref()),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: String,
        builder: RequestBuilder,
    ) -> Result<T, FleetError> {
        let response = builder.send().await.map_err(|source| FleetError::Request {
            operation: operation.clone(),
            source,
        })?;
        let status = response.status();
        let body = response.bytes().await.map_err(|source| FleetError::Request {
            operation: operation.clone(),
            source,
        })?;

        if status != StatusCode::OK {
            return Err(FleetError::Status {
                operation,
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        serde_json::from_slice(&body).map_err(|source| FleetError::Decode { operation, source })
    }

    /// Agents enrolled with Fleet.
    pub async fn list_agents(&self) -> Result<Vec<Agent>, FleetError> {
        let request = self.request(Method::GET, &["agents"]);
        let agents: AgentList = self.send("list agents".to_owned(), request).await?;
        debug!(count = agents.list.len(), "listed fleet agents");
        Ok(agents.list)
    }

    pub async fn get_agent(&self, agent_id: &str) -> Result<Agent, FleetError> {
        let request = self.request(Method::GET, &["agents", agent_id]);
        let agent: AgentItem = self.send(format!("get agent {agent_id}"), request).await?;
        Ok(agent.item)
    }

    /// Reassign `agent` to `policy` and wait until it runs that exact revision.
    pub async fn assign_policy_to_agent(
        &self,
        agent: &Agent,
        policy: &Policy,
    ) -> Result<Agent, AssignmentError> {
        let request = self
            .request(Method::PUT, &["agents", agent.id.as_str(), "reassign"])
            .json(&json!({ "policy_id": policy.id }));
        self.send::<serde_json::Value>(
            format!("assign policy {} to agent {}", policy.id, agent.id),
            request,
        )
        .await
        .map_err(|source| AssignmentError::Reassign {
            agent_id: agent.id.clone(),
            policy_id: policy.id.clone(),
            source,
        })?;

        info!(
            agent = %agent.id,
            policy = %policy.id,
            revision = policy.revision,
            "policy reassigned; waiting for agent to pick it up"
        );
        wait_until_policy_assigned(self, &agent.id, policy, self.config.assignment_wait).await
    }
}

#[async_trait]
impl AgentSource for FleetClient {
    async fn get_agent(&self, agent_id: &str) -> Result<Agent, FleetError> {
        FleetClient::get_agent(self, agent_id).await
    }
}
