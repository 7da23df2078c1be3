use std::time::Duration;

use async_trait::async_trait;
use pkgtest_core::WaitPolicy;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::{
    arrival::{ArrivalError, DocumentSource, wait_for_documents},
    search::{SearchResponse, is_index_not_found},
};

/// Upper bound on documents fetched by one search.
pub const SEARCH_SIZE: usize = 500;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
const DEFAULT_ARRIVAL_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Error)]
pub enum ElasticsearchError {
    #[error("PKGTEST_ELASTICSEARCH_HOST is not set")]
    UndefinedHost,
    #[error("invalid Elasticsearch url `{url}`: {reason}")]
    BaseUrl { url: String, reason: String },
    #[error("could not {operation}: {source}")]
    Request {
        operation: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("could not {operation}; status code = {status}; response body = {body}")]
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

#[derive(Clone)]
pub struct ElasticsearchConfig {
    pub base_url: Url,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Cadence and bound of the data arrival wait.
    pub arrival_wait: WaitPolicy,
}

impl std::fmt::Debug for ElasticsearchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElasticsearchConfig")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<set>"))
            .field("arrival_wait", &self.arrival_wait)
            .finish()
    }
}

impl ElasticsearchConfig {
    pub fn new(base_url: &str) -> Result<Self, ElasticsearchError> {
        let invalid = |reason: String| ElasticsearchError::BaseUrl {
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
            arrival_wait: WaitPolicy::new(DEFAULT_POLL_INTERVAL).with_timeout(DEFAULT_ARRIVAL_TIMEOUT),
        })
    }

    #[must_use]
    pub fn with_basic_auth(mut self, username: String, password: String) -> Self {
        self.username = Some(username);
        self.password = Some(password);
        self
    }

    #[must_use]
    pub fn with_arrival_wait(mut self, wait: WaitPolicy) -> Self {
        self.arrival_wait = wait;
        self
    }

    /// The host is mandatory; credentials are shared with the Fleet client.
    pub fn from_env() -> Result<Self, ElasticsearchError> {
        let host = pkgtest_env::elasticsearch_host().ok_or(ElasticsearchError::UndefinedHost)?;
        let mut config = Self::new(&host)?;

        if let Some(username) = pkgtest_env::elasticsearch_username() {
            config.username = Some(username);
            config.password = pkgtest_env::elasticsearch_password();
        }
        if let Some(secs) = pkgtest_env::data_wait_timeout_secs() {
            config.arrival_wait = config.arrival_wait.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }
}

#[derive(Clone, Debug)]
pub struct ElasticsearchClient {
    config: ElasticsearchConfig,
    client: Client,
}

impl ElasticsearchClient {
    #[must_use]
    pub fn new(config: ElasticsearchConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ElasticsearchConfig {
        &self.config
    }

    /// `{base}/<segments...>`, each segment percent-encoded.
    #[must_use]
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.config.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let builder = self.client.request(method, self.endpoint(segments));
        match &self.config.username {
            Some(username) => builder.basic_auth(username, self.config.password.as_deref()),
            None => builder,
        }
    }

    /// Documents in `index` (a name or pattern), oldest `@timestamp` first.
    ///
    /// An index that does not exist yet yields no documents.
    pub async fn search(&self, index: &str) -> Result<Vec<Value>, ElasticsearchError> {
        let operation = format!("search {index}");
        let response = self
            .request(Method::POST, &[index, "_search"])
            .json(&json!({
                "size": SEARCH_SIZE,
                "sort": [{"@timestamp": {"order": "asc", "unmapped_type": "date"}}],
            }))
            .send()
            .await
            .map_err(|source| ElasticsearchError::Request {
                operation: operation.clone(),
                source,
            })?;
        let status = response.status();
        let body = response.bytes().await.map_err(|source| ElasticsearchError::Request {
            operation: operation.clone(),
            source,
        })?;

        if status == StatusCode::NOT_FOUND && is_index_not_found(&String::from_utf8_lossy(&body)) {
            debug!(index, "index does not exist yet");
            return Ok(Vec::new());
        }
        if status != StatusCode::OK {
            return Err(ElasticsearchError::Status {
                operation,
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        let response: SearchResponse = serde_json::from_slice(&body)
            .map_err(|source| ElasticsearchError::Decode { operation, source })?;
        Ok(response.into_documents())
    }

    /// Wait until `index` holds at least `min_documents` documents and return
    /// them.
    pub async fn wait_for_documents(
        &self,
        index: &str,
        min_documents: usize,
    ) -> Result<Vec<Value>, ArrivalError> {
        wait_for_documents(self, index, min_documents, self.config.arrival_wait).await
    }
}

#[async_trait]
impl DocumentSource for ElasticsearchClient {
    async fn search(&self, index: &str) -> Result<Vec<Value>, ElasticsearchError> {
        ElasticsearchClient::search(self, index).await
    }
}
