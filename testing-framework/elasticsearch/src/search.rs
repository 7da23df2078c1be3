use serde::Deserialize;
use serde_json::Value;

/// Name of the data stream `{type}-{dataset}-{namespace}`, e.g.
/// `logs-apache.access-ep`.
#[must_use]
pub fn data_stream_index(kind: &str, dataset: &str, namespace: &str) -> String {
    format!("{kind}-{dataset}-{namespace}")
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    hits: Hits,
}

#[derive(Debug, Default, Deserialize)]
struct Hits {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    #[serde(rename = "_source", default)]
    source: Value,
}

impl SearchResponse {
    pub(crate) fn into_documents(self) -> Vec<Value> {
        self.hits.hits.into_iter().map(|hit| hit.source).collect()
    }
}

/// True when Elasticsearch rejected a search because the index does not exist
/// yet, which happens until the first document of a data stream lands.
pub(crate) fn is_index_not_found(body: &str) -> bool {
    body.contains("index_not_found_exception")
}
