//! RAG engine configuration types.
//!
//! Resolved (non-optional) settings consumed by `tessel-rag`. Every knob
//! carries a serde default so a partial `[rag]` TOML section works.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Resolved RAG engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagSettings {
    /// Base URL of the embedding backend (Ollama-compatible `/api/embed`).
    #[serde(default = "default_embedding_url")]
    pub embedding_url: String,
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Vector dimensionality of the embedding model. Must match the vector
    /// index recorded in the store; checked once at engine startup.
    #[serde(default = "default_embedding_dim")]
    pub embedding_dim: usize,
    /// Maximum chunk size, in characters.
    #[serde(default = "default_chunk_max_chars")]
    pub chunk_max_chars: usize,
    /// Characters of context shared by consecutive chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    /// Cosine similarity at or above which a chunk counts as a duplicate
    /// of something already stored for the tenant.
    #[serde(default = "default_dedup_threshold")]
    pub dedup_threshold: f32,
    /// Override the database path. Primarily for testing.
    #[serde(default)]
    pub db_path_override: Option<PathBuf>,
    #[serde(default)]
    pub search: SearchDefaults,
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            embedding_url: default_embedding_url(),
            embedding_model: default_embedding_model(),
            embedding_dim: default_embedding_dim(),
            chunk_max_chars: default_chunk_max_chars(),
            chunk_overlap: default_chunk_overlap(),
            dedup_threshold: default_dedup_threshold(),
            db_path_override: None,
            search: SearchDefaults::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl RagSettings {
    /// Resolved database path: the override if set, otherwise
    /// `<data_dir>/tessel/contexts.sqlite3`.
    pub fn db_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.db_path_override {
            return Some(path.clone());
        }
        dirs::data_dir().map(|dir| dir.join("tessel").join("contexts.sqlite3"))
    }
}

/// Search tuning knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchDefaults {
    /// Results returned when the caller does not ask for a specific count.
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Over-fetch factor for the ANN backend: `num_candidates = top_k *
    /// candidate_multiplier`. Floored at 4 by the query pipeline.
    #[serde(default = "default_candidate_multiplier")]
    pub candidate_multiplier: usize,
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            candidate_multiplier: default_candidate_multiplier(),
        }
    }
}

/// Bounded exponential backoff for embedding provider calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    #[serde(default = "default_retry_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_retry_attempts(),
            base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

fn default_embedding_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

fn default_embedding_dim() -> usize {
    768
}

fn default_chunk_max_chars() -> usize {
    2000
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_dedup_threshold() -> f32 {
    0.85
}

fn default_top_k() -> usize {
    5
}

fn default_candidate_multiplier() -> usize {
    4
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    250
}
