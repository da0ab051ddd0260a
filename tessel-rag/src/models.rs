use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of knowledge item a context holds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Text,
    File,
    Link,
    Question,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::File => "file",
            Self::Link => "link",
            Self::Question => "question",
        }
    }
}

impl FromStr for ContentType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(Self::Text),
            "file" => Ok(Self::File),
            "link" => Ok(Self::Link),
            "question" => Ok(Self::Question),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-type metadata attached to a context. One variant per content type so
/// each ingestion path only sees the fields relevant to it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContextMetadata {
    Text,
    File {
        file_name: String,
        mime_type: String,
        size_bytes: u64,
    },
    Link {
        url: String,
    },
    Question {
        question: String,
        answer: String,
    },
}

impl ContextMetadata {
    pub fn content_type(&self) -> ContentType {
        match self {
            Self::Text => ContentType::Text,
            Self::File { .. } => ContentType::File,
            Self::Link { .. } => ContentType::Link,
            Self::Question { .. } => ContentType::Question,
        }
    }

    /// Source label stamped on every embedding derived from this context.
    pub fn source_tag(&self) -> String {
        match self {
            Self::Text => "text".to_string(),
            Self::File { file_name, .. } => file_name.clone(),
            Self::Link { url } => url.clone(),
            Self::Question { .. } => "faq".to_string(),
        }
    }

    /// Source URL, for the per-tenant LINK uniqueness check.
    pub fn source_url(&self) -> Option<&str> {
        match self {
            Self::Link { url } => Some(url.as_str()),
            _ => None,
        }
    }
}

/// One knowledge item as the tenant submitted it.
#[derive(Debug, Clone)]
pub struct ContextRecord {
    pub id: String,
    pub tenant_id: String,
    pub content_type: ContentType,
    pub title: String,
    pub raw_content: String,
    pub metadata: ContextMetadata,
    /// Ids of the embeddings derived from this context, in chunk order.
    /// Empty only transiently during ingestion.
    pub embedding_ids: Vec<i64>,
    pub content_hash: String,
    pub created_at: String,
    pub updated_at: String,
}

/// One retrievable chunk.
#[derive(Debug, Clone)]
pub struct EmbeddingRecord {
    pub id: i64,
    /// Always equals the parent context's tenant_id. This is the isolation
    /// boundary the query pipeline filters on.
    pub tenant_id: String,
    pub context_id: String,
    pub content: String,
    pub chunk_index: i64,
    pub total_chunks: i64,
    pub source_tag: String,
    pub created_at: String,
}

/// Write model for a new embedding; the store assigns the rowid.
#[derive(Debug, Clone)]
pub struct NewEmbedding {
    pub tenant_id: String,
    pub context_id: String,
    pub content: String,
    pub chunk_index: i64,
    pub total_chunks: i64,
    pub source_tag: String,
}

/// Ownership record for a tenant's chatbot.
#[derive(Debug, Clone)]
pub struct ChatbotRecord {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub created_at: String,
}

/// A knowledge submission for one tenant.
#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub tenant_id: String,
    pub title: String,
    pub content: String,
    pub metadata: ContextMetadata,
    /// When set, split strictly on this literal delimiter instead of the
    /// sliding window (catalog-style content).
    pub record_delimiter: Option<String>,
}

/// Edit to an existing context. `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ContextUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Result of an ingestion or update call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestOutcome {
    pub context_id: String,
    pub embeddings_created: usize,
    pub embeddings_skipped: usize,
}

/// One ranked result from the query pipeline.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub embedding_id: i64,
    pub context_id: String,
    pub tenant_id: String,
    pub title: String,
    pub content: String,
    pub source_tag: String,
    pub chunk_index: i64,
    /// Cosine similarity in [-1, 1], descending across the result list.
    pub score: f32,
}
