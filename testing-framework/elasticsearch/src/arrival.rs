use async_trait::async_trait;
use pkgtest_core::{WaitError, WaitPolicy, wait_until};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::client::ElasticsearchError;

/// Read access to the documents indexed under one name or pattern.
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn search(&self, index: &str) -> Result<Vec<Value>, ElasticsearchError>;
}

#[derive(Debug, Error)]
#[error("waiting for {min_documents} document(s) in {index} failed: {source}")]
pub struct ArrivalError {
    pub index: String,
    pub min_documents: usize,
    #[source]
    pub source: WaitError<ElasticsearchError>,
}

/// Search `index` until it holds at least `min_documents` documents.
///
/// A missing index counts as empty. Any other search failure aborts the wait.
pub async fn wait_for_documents<S>(
    source: &S,
    index: &str,
    min_documents: usize,
    wait: WaitPolicy,
) -> Result<Vec<Value>, ArrivalError>
where
    S: DocumentSource + ?Sized,
{
    let what = format!("documents in {index}");

    let documents = wait_until(&what, wait, move || async move {
        let documents = source.search(index).await?;
        if !documents.is_empty() && documents.len() >= min_documents {
            return Ok(Some(documents));
        }
        debug!(index, found = documents.len(), min_documents, "data has not arrived yet");
        Ok::<_, ElasticsearchError>(None)
    })
    .await
    .map_err(|source| ArrivalError {
        index: index.to_owned(),
        min_documents,
        source,
    })?;

    info!(index, documents = documents.len(), "data arrived");
    Ok(documents)
}
