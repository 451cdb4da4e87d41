//! Retriever adapters.
//!
//! - `HttpRetriever` - external similarity-search service
//! - `InMemoryRetriever` - keyword overlap over a YAML corpus

mod http_retriever;
mod in_memory;

pub use http_retriever::{HttpRetriever, HttpRetrieverConfig};
pub use in_memory::{CorpusEntry, CorpusError, InMemoryRetriever};
