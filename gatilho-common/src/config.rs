//! Bootstrap configuration loading
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority, parsed by the binary)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! A missing or unreadable TOML file never stops startup: a warning is
//! logged and compiled defaults are used.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit TOML config file
pub const CONFIG_ENV_VAR: &str = "GATILHO_CONFIG";

/// Environment variable overriding the database location
pub const DATABASE_ENV_VAR: &str = "GATILHO_DATABASE";

/// Port the service listens on when nothing else is configured
pub const DEFAULT_PORT: u16 = 3001;

/// Address the service binds to when nothing else is configured
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1";

/// Value substituted for a missing provider key.
///
/// A provider holding this key is inert: it reports itself unavailable
/// instead of failing at startup.
pub const PLACEHOLDER_API_KEY: &str = "demo-key";

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change while the service runs.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// Path to SQLite database file
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// HTTP server port
    #[serde(default)]
    pub port: Option<u16>,

    /// HTTP bind address
    #[serde(default)]
    pub bind_address: Option<String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// External text-provider API keys
    #[serde(default)]
    pub providers: ProvidersConfig,

    /// Pipeline pacing overrides
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[providers]` section
#[derive(Debug, Clone, Deserialize, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default)]
    pub groq_api_key: Option<String>,
}

/// `[pipeline]` section, all values in milliseconds
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PipelineConfig {
    #[serde(default)]
    pub market_collection_delay_ms: Option<u64>,
    #[serde(default)]
    pub provider_pacing_ms: Option<u64>,
    #[serde(default)]
    pub simulated_generation_delay_ms: Option<u64>,
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid TOML config: {}", e)))
    }

    /// Load the config file if one can be found, otherwise use defaults
    ///
    /// Lookup order: explicit path, `GATILHO_CONFIG`, platform config dir.
    pub fn load_or_default(explicit: Option<&Path>) -> Self {
        let candidate = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_ENV_VAR).ok().map(PathBuf::from))
            .or_else(default_config_path);

        let Some(path) = candidate else {
            info!("No config directory available, using compiled defaults");
            return Self::default();
        };

        if !path.exists() {
            info!("Config file not found at {}, using compiled defaults", path.display());
            return Self::default();
        }

        match Self::load(&path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Failed to load config {}: {} (using compiled defaults)", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Platform config file location (`<config_dir>/gatilho/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("gatilho").join("config.toml"))
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("gatilho"))
        .unwrap_or_else(|| PathBuf::from("./gatilho_data"))
        .join("gatilho.db")
}

/// Resolve the database path
///
/// `cli_arg` already includes the `GATILHO_DATABASE` fallback when the
/// binary parses arguments with clap; the variable is consulted again here
/// for library callers.
pub fn resolve_database_path(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(DATABASE_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(path) = &toml_config.database_path {
        return path.clone();
    }

    default_database_path()
}

/// Whether a provider key is real (neither empty nor the placeholder)
pub fn is_configured_key(key: &str) -> bool {
    let key = key.trim();
    !key.is_empty() && key != PLACEHOLDER_API_KEY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let config = TomlConfig::parse(
            r#"
            database_path = "/tmp/gatilho.db"
            port = 4000

            [logging]
            level = "debug"

            [providers]
            openai_api_key = "sk-test"

            [pipeline]
            provider_pacing_ms = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.database_path, Some(PathBuf::from("/tmp/gatilho.db")));
        assert_eq!(config.port, Some(4000));
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.providers.openai_api_key.as_deref(), Some("sk-test"));
        assert!(config.providers.gemini_api_key.is_none());
        assert_eq!(config.pipeline.provider_pacing_ms, Some(0));
        assert!(config.pipeline.market_collection_delay_ms.is_none());
    }

    #[test]
    fn test_parse_empty_config_uses_defaults() {
        let config = TomlConfig::parse("").unwrap();
        assert!(config.database_path.is_none());
        assert!(config.port.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_invalid_config_is_config_error() {
        let err = TomlConfig::parse("port = \"not a number\"").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_placeholder_key_is_not_configured() {
        assert!(!is_configured_key(PLACEHOLDER_API_KEY));
        assert!(!is_configured_key(""));
        assert!(!is_configured_key("   "));
        assert!(is_configured_key("sk-real"));
    }

    #[test]
    fn test_default_database_path_file_name() {
        assert!(default_database_path().ends_with("gatilho.db"));
    }
}
