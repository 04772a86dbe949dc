//! Runtime configuration resolution for gatilho-server
//!
//! Provider keys resolve Environment → TOML → placeholder. A placeholder key
//! leaves its provider inert; the service still starts.

use gatilho_common::config::{
    is_configured_key, PipelineConfig, ProvidersConfig, PLACEHOLDER_API_KEY,
};
use std::time::Duration;
use tracing::{info, warn};

pub const OPENAI_KEY_ENV: &str = "OPENAI_API_KEY";
pub const GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";
pub const GROQ_KEY_ENV: &str = "GROQ_API_KEY";

/// Resolved external provider keys
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderKeys {
    pub openai: String,
    pub gemini: String,
    pub groq: String,
}

impl ProviderKeys {
    /// Resolve all keys from environment and TOML
    pub fn resolve(toml_config: &ProvidersConfig) -> Self {
        Self {
            openai: resolve_key("OpenAI", OPENAI_KEY_ENV, toml_config.openai_api_key.as_deref()),
            gemini: resolve_key("Gemini", GEMINI_KEY_ENV, toml_config.gemini_api_key.as_deref()),
            groq: resolve_key("Groq", GROQ_KEY_ENV, toml_config.groq_api_key.as_deref()),
        }
    }

    /// All providers inert
    pub fn placeholders() -> Self {
        Self {
            openai: PLACEHOLDER_API_KEY.to_string(),
            gemini: PLACEHOLDER_API_KEY.to_string(),
            groq: PLACEHOLDER_API_KEY.to_string(),
        }
    }

    /// Number of keys that activate a provider
    pub fn configured_count(&self) -> usize {
        [&self.openai, &self.gemini, &self.groq]
            .iter()
            .filter(|key| is_configured_key(key))
            .count()
    }
}

fn resolve_key(provider: &str, env_var: &str, toml_value: Option<&str>) -> String {
    let env_value = std::env::var(env_var).ok().filter(|key| is_configured_key(key));
    let toml_value = toml_value.filter(|key| is_configured_key(key));

    if env_value.is_some() && toml_value.is_some() {
        warn!(
            "{} API key found in environment and TOML config. Using environment (highest priority).",
            provider
        );
    }

    if let Some(key) = env_value {
        info!("{} API key loaded from environment variable", provider);
        return key;
    }

    if let Some(key) = toml_value {
        info!("{} API key loaded from TOML config", provider);
        return key.to_string();
    }

    info!("{} API key not configured, provider inactive", provider);
    PLACEHOLDER_API_KEY.to_string()
}

/// Fixed delays of the stage sequencer
///
/// These are pacing constants, not rate limiting: they never adapt to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineTiming {
    /// Simulated market search during DATA_COLLECTION
    pub market_collection_delay: Duration,
    /// Pause after each prompt during AI_ANALYSIS
    pub provider_pacing: Duration,
    /// Work time of the simulated text provider
    pub simulated_generation_delay: Duration,
}

impl Default for PipelineTiming {
    fn default() -> Self {
        Self {
            market_collection_delay: Duration::from_millis(2000),
            provider_pacing: Duration::from_millis(1000),
            simulated_generation_delay: Duration::from_millis(1500),
        }
    }
}

impl PipelineTiming {
    /// No delays at all
    pub fn immediate() -> Self {
        Self {
            market_collection_delay: Duration::ZERO,
            provider_pacing: Duration::ZERO,
            simulated_generation_delay: Duration::ZERO,
        }
    }

    /// Defaults overridden by the TOML `[pipeline]` section
    pub fn from_config(config: &PipelineConfig) -> Self {
        let defaults = Self::default();
        Self {
            market_collection_delay: config
                .market_collection_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.market_collection_delay),
            provider_pacing: config
                .provider_pacing_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.provider_pacing),
            simulated_generation_delay: config
                .simulated_generation_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.simulated_generation_delay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var(OPENAI_KEY_ENV);
        std::env::remove_var(GEMINI_KEY_ENV);
        std::env::remove_var(GROQ_KEY_ENV);
    }

    #[test]
    #[serial]
    fn test_missing_keys_fall_back_to_placeholder() {
        clear_env();
        let keys = ProviderKeys::resolve(&ProvidersConfig::default());
        assert_eq!(keys, ProviderKeys::placeholders());
        assert_eq!(keys.configured_count(), 0);
    }

    #[test]
    #[serial]
    fn test_environment_wins_over_toml() {
        clear_env();
        std::env::set_var(OPENAI_KEY_ENV, "sk-env");
        let toml = ProvidersConfig {
            openai_api_key: Some("sk-toml".to_string()),
            gemini_api_key: Some("gm-toml".to_string()),
            groq_api_key: None,
        };

        let keys = ProviderKeys::resolve(&toml);
        clear_env();

        assert_eq!(keys.openai, "sk-env");
        assert_eq!(keys.gemini, "gm-toml");
        assert_eq!(keys.groq, PLACEHOLDER_API_KEY);
        assert_eq!(keys.configured_count(), 2);
    }

    #[test]
    #[serial]
    fn test_placeholder_in_environment_is_ignored() {
        clear_env();
        std::env::set_var(GROQ_KEY_ENV, PLACEHOLDER_API_KEY);
        let toml = ProvidersConfig {
            groq_api_key: Some("gsk-toml".to_string()),
            ..Default::default()
        };

        let keys = ProviderKeys::resolve(&toml);
        clear_env();

        assert_eq!(keys.groq, "gsk-toml");
    }

    #[test]
    fn test_timing_overrides() {
        let timing = PipelineTiming::from_config(&PipelineConfig {
            market_collection_delay_ms: Some(0),
            provider_pacing_ms: None,
            simulated_generation_delay_ms: Some(10),
        });

        assert_eq!(timing.market_collection_delay, Duration::ZERO);
        assert_eq!(timing.provider_pacing, Duration::from_millis(1000));
        assert_eq!(timing.simulated_generation_delay, Duration::from_millis(10));
    }
}
