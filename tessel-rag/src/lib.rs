//! Multi-tenant RAG context engine for tessel.
//!
//! Ingests knowledge items (text, files, links, FAQ pairs) for a tenant's
//! chatbot, chunks and embeds them, semantically deduplicates against the
//! tenant's corpus, and answers tenant-scoped similarity queries.

pub mod chunker;
pub mod crawl;
pub mod dedup;
pub mod embeddings;
pub mod engine;
pub mod errors;
pub mod extract;
pub mod guard;
pub mod ingest;
pub mod models;
pub mod search;
pub mod similarity;
pub mod storage;

pub use tessel_core::config::{RagSettings, RetryPolicy, SearchDefaults};

pub use embeddings::{EmbeddingProvider, HttpEmbeddingClient};
pub use engine::ContextEngine;
pub use errors::{RagError, RagResult};
pub use extract::{PlainTextExtractor, TextExtractor};
pub use models::{
    ChatbotRecord, ContentType, ContextMetadata, ContextRecord, ContextUpdate, EmbeddingRecord,
    IngestOutcome, IngestRequest, SearchHit,
};
pub use storage::DocumentStore;
