//! Configuration management for tessel.
//!
//! Secrets (API keys) come exclusively from environment variables;
//! settings come from a TOML file in the XDG config directory
//! (`~/.config/tessel/config.toml`):
//!
//! ```toml
//! [rag]
//! embedding_url = "http://127.0.0.1:11434"
//! embedding_model = "nomic-embed-text"
//! embedding_dim = 768
//! dedup_threshold = 0.85
//!
//! [rag.search]
//! top_k = 5
//! candidate_multiplier = 4
//! ```

pub mod rag;
mod secrets;
mod settings;

pub use rag::{RagSettings, RetryPolicy, SearchDefaults};
pub use secrets::Secrets;
pub use settings::{Settings, SettingsError};

/// Load a `.env` file if present. Safe to call multiple times.
pub fn load_dotenv() {
    let _ = dotenvy::dotenv();
}

/// Combined configuration: secrets from the environment, settings from TOML.
#[derive(Debug, Clone)]
pub struct Config {
    pub secrets: Secrets,
    pub settings: Settings,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("settings error: {0}")]
    Settings(#[from] SettingsError),
}

impl Config {
    /// Load configuration from all sources.
    pub fn load() -> Result<Self, ConfigError> {
        let secrets = Secrets::from_env();
        let settings = Settings::load()?;
        Ok(Self { secrets, settings })
    }
}
