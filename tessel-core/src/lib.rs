pub mod config;

pub use config::{
    Config, ConfigError, RagSettings, RetryPolicy, SearchDefaults, Secrets, Settings,
    SettingsError, load_dotenv,
};
