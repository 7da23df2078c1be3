use async_trait::async_trait;
use pkgtest_core::ServiceContext;
use pkgtest_elasticsearch::{ElasticsearchClient, data_stream_index};
use serde_json::Value;

use crate::system_test::{DynError, EventSource};

/// Events indexed into one data stream, collected once they start arriving.
#[derive(Clone, Debug)]
pub struct DataStreamEvents {
    client: ElasticsearchClient,
    index: String,
    min_documents: usize,
}

impl DataStreamEvents {
    #[must_use]
    pub fn new(client: ElasticsearchClient, index: impl Into<String>) -> Self {
        Self {
            client,
            index: index.into(),
            min_documents: 1,
        }
    }

    /// Events of `{kind}-{package}.{data_stream}-{namespace}`.
    #[must_use]
    pub fn for_data_stream(
        client: ElasticsearchClient,
        kind: &str,
        package: &str,
        data_stream: &str,
        namespace: &str,
    ) -> Self {
        let dataset = format!("{package}.{data_stream}");
        Self::new(client, data_stream_index(kind, &dataset, namespace))
    }

    #[must_use]
    pub fn with_min_documents(mut self, min_documents: usize) -> Self {
        self.min_documents = min_documents;
        self
    }

    #[must_use]
    pub fn index(&self) -> &str {
        &self.index
    }
}

#[async_trait]
impl EventSource for DataStreamEvents {
    async fn collect(&self, _ctx: &ServiceContext) -> Result<Vec<Value>, DynError> {
        Ok(self
            .client
            .wait_for_documents(&self.index, self.min_documents)
            .await?)
    }
}
