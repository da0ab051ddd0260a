//! Secrets loaded from environment variables only.
//!
//! Sensitive values are never read from files on disk. The local default
//! embedding backend (Ollama) needs no key, so every secret is optional.

use std::env;

/// Secrets loaded exclusively from environment variables.
#[derive(Debug, Clone, Default)]
pub struct Secrets {
    /// API key for a hosted embedding provider (env: `EMBEDDING_API_KEY`).
    pub embedding_api_key: Option<String>,
}

impl Secrets {
    /// Load secrets from environment variables, reading `.env` first if
    /// present (development convenience).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_env_inner()
    }

    pub(crate) fn from_env_inner() -> Self {
        Self {
            embedding_api_key: env::var("EMBEDDING_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
        }
    }
}
