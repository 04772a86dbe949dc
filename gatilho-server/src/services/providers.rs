//! External text providers
//!
//! Every provider implements [`TextProvider`]. A provider without a real
//! API key reports itself unavailable and is skipped by [`ProviderChain`];
//! the simulated provider is always available and terminates the chain.

use crate::config::{PipelineTiming, ProviderKeys};
use async_trait::async_trait;
use gatilho_common::config::is_configured_key;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const OPENAI_MODEL: &str = "gpt-4o-mini";
const GROQ_MODEL: &str = "llama-3.1-8b-instant";
const GEMINI_MODEL: &str = "gemini-1.5-flash";

const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Text provider errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Provider {0} is not configured")]
    Unavailable(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("All providers failed: {0}")]
    Exhausted(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Network(err.to_string())
    }
}

/// Pluggable text generation backend
#[async_trait]
pub trait TextProvider: Send + Sync {
    /// Provider identifier for logging (e.g. "openai", "simulated")
    fn name(&self) -> &str;

    /// Whether the provider can be called (key configured, etc.)
    fn is_available(&self) -> bool {
        true
    }

    /// Generate text for one prompt
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError>;
}

/// Offline provider: waits, then returns a templated analysis of the prompt
pub struct SimulatedProvider {
    delay: Duration,
}

impl SimulatedProvider {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

/// Text produced by [`SimulatedProvider`] for a prompt
pub fn simulated_text(prompt: &str) -> String {
    format!(
        "Análise detalhada baseada em: \"{}\". Esta análise incorpora técnicas avançadas de \
         psicologia do consumidor, identificando padrões comportamentais específicos e \
         oportunidades de persuasão ética. Os insights gerados consideram tanto aspectos \
         emocionais quanto racionais da tomada de decisão do público-alvo.",
        prompt
    )
}

#[async_trait]
impl TextProvider for SimulatedProvider {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(simulated_text(prompt))
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

/// OpenAI chat-completions API (also served by Groq)
pub struct OpenAiCompatibleProvider {
    name: String,
    base_url: String,
    model: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl OpenAiCompatibleProvider {
    pub fn new(
        name: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()?;

        Ok(Self {
            name: name.into(),
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
            http_client,
        })
    }

    pub fn openai(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new("openai", OPENAI_BASE_URL, OPENAI_MODEL, api_key)
    }

    pub fn groq(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        Self::new("groq", GROQ_BASE_URL, GROQ_MODEL, api_key)
    }
}

#[async_trait]
impl TextProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        is_configured_key(&self.api_key)
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        if !self.is_available() {
            return Err(ProviderError::Unavailable(self.name.clone()));
        }

        let url = format!("{}/chat/completions", self.base_url);
        tracing::debug!(provider = %self.name, "Requesting chat completion");

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.model,
                "messages": [{"role": "user", "content": prompt}],
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(status.as_u16(), body));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ProviderError::Parse("response without choices".to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

/// Google Gemini `generateContent` API
pub struct GeminiProvider {
    base_url: String,
    model: String,
    api_key: String,
    http_client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()?;

        Ok(Self {
            base_url: GEMINI_BASE_URL.to_string(),
            model: GEMINI_MODEL.to_string(),
            api_key: api_key.into(),
            http_client,
        })
    }
}

#[async_trait]
impl TextProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn is_available(&self) -> bool {
        is_configured_key(&self.api_key)
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        if !self.is_available() {
            return Err(ProviderError::Unavailable("gemini".to_string()));
        }

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );

        let response = self
            .http_client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "contents": [{"parts": [{"text": prompt}]}],
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api(status.as_u16(), body));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Parse(e.to_string()))?;

        parsed
            .candidates
            .into_iter()
            .flat_map(|candidate| candidate.content.parts)
            .find_map(|part| part.text)
            .ok_or_else(|| ProviderError::Parse("response without candidates".to_string()))
    }
}

/// Ordered fallback over several providers
///
/// Unavailable providers are skipped; the first successful answer wins.
pub struct ProviderChain {
    providers: Vec<Arc<dyn TextProvider>>,
}

impl ProviderChain {
    pub fn new(providers: Vec<Arc<dyn TextProvider>>) -> Self {
        Self { providers }
    }

    /// OpenAI, Gemini, Groq, then the simulated provider
    pub fn from_keys(keys: &ProviderKeys, timing: &PipelineTiming) -> Self {
        let mut providers: Vec<Arc<dyn TextProvider>> = Vec::new();

        match OpenAiCompatibleProvider::openai(keys.openai.clone()) {
            Ok(provider) => providers.push(Arc::new(provider)),
            Err(e) => tracing::error!("Failed to initialize OpenAI client: {}", e),
        }
        match GeminiProvider::new(keys.gemini.clone()) {
            Ok(provider) => providers.push(Arc::new(provider)),
            Err(e) => tracing::error!("Failed to initialize Gemini client: {}", e),
        }
        match OpenAiCompatibleProvider::groq(keys.groq.clone()) {
            Ok(provider) => providers.push(Arc::new(provider)),
            Err(e) => tracing::error!("Failed to initialize Groq client: {}", e),
        }
        providers.push(Arc::new(SimulatedProvider::new(
            timing.simulated_generation_delay,
        )));

        Self::new(providers)
    }

    /// Names of providers that would be tried, in order
    pub fn active_providers(&self) -> Vec<String> {
        self.providers
            .iter()
            .filter(|p| p.is_available())
            .map(|p| p.name().to_string())
            .collect()
    }
}

#[async_trait]
impl TextProvider for ProviderChain {
    fn name(&self) -> &str {
        "chain"
    }

    fn is_available(&self) -> bool {
        self.providers.iter().any(|p| p.is_available())
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let mut failures = Vec::new();

        for provider in self.providers.iter().filter(|p| p.is_available()) {
            match provider.generate(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    tracing::warn!(provider = provider.name(), error = %e, "Text provider failed, trying next");
                    failures.push(format!("{}: {}", provider.name(), e));
                }
            }
        }

        if failures.is_empty() {
            return Err(ProviderError::Unavailable("chain".to_string()));
        }
        Err(ProviderError::Exhausted(failures.join("; ")))
    }
}
