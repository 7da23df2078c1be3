use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};
use tokio::{net::TcpListener, task::JoinHandle};
use tracing::debug;

struct IndexState {
    index: String,
    documents: Vec<Value>,
    lag: usize,
    searches: AtomicUsize,
}

/// In-process stand-in for the Elasticsearch search API.
///
/// The single index does not exist for the first `lag` searches, then serves
/// all of its documents.
pub struct FakeElasticsearch {
    addr: SocketAddr,
    state: Arc<IndexState>,
    server: JoinHandle<()>,
}

impl FakeElasticsearch {
    pub async fn start(index: &str, documents: Vec<Value>, lag: usize) -> anyhow::Result<Self> {
        let state = Arc::new(IndexState {
            index: index.to_owned(),
            documents,
            lag,
            searches: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route("/:index/_search", post(search))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let server = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                debug!(error = %err, "fake elasticsearch server stopped");
            }
        });

        Ok(Self {
            addr,
            state,
            server,
        })
    }

    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    #[must_use]
    pub fn searches(&self) -> usize {
        self.state.searches.load(Ordering::SeqCst)
    }
}

impl Drop for FakeElasticsearch {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn search(State(state): State<Arc<IndexState>>, Path(index): Path<String>) -> Response {
    let seen = state.searches.fetch_add(1, Ordering::SeqCst);

    if index != state.index || seen < state.lag {
        let body = json!({
            "error": {
                "root_cause": [{"type": "index_not_found_exception", "index": index}],
                "type": "index_not_found_exception",
            },
            "status": 404,
        });
        return (StatusCode::NOT_FOUND, Json(body)).into_response();
    }

    let hits: Vec<Value> = state
        .documents
        .iter()
        .map(|doc| json!({ "_index": state.index, "_source": doc }))
        .collect();
    Json(json!({
        "took": 1,
        "hits": { "total": { "value": hits.len(), "relation": "eq" }, "hits": hits },
    }))
    .into_response()
}
