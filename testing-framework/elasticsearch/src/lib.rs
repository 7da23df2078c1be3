mod arrival;
mod client;
mod search;

pub use arrival::{ArrivalError, DocumentSource, wait_for_documents};
pub use client::{ElasticsearchClient, ElasticsearchConfig, ElasticsearchError, SEARCH_SIZE};
pub use search::data_stream_index;
