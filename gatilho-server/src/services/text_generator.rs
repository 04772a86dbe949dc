//! Multi-source text generator (AI_ANALYSIS phase)
//!
//! Three prompts are sent to the configured provider one after another,
//! with a fixed pause after each answer. If any prompt fails, all three
//! sections are replaced by static fallback texts and the result is
//! flagged as degraded.

use crate::services::market_data::MarketData;
use crate::services::providers::TextProvider;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// The three prompts of one analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisPrompts {
    pub market: String,
    pub psychology: String,
    pub positioning: String,
}

impl AnalysisPrompts {
    /// Prompts in the order they are sent
    pub fn ordered(&self) -> [(&'static str, &str); 3] {
        [
            ("market", self.market.as_str()),
            ("psychology", self.psychology.as_str()),
            ("positioning", self.positioning.as_str()),
        ]
    }
}

pub fn build_prompts(product: &str, target: &str, market_data: &MarketData) -> AnalysisPrompts {
    let market_json = serde_json::to_string(market_data).unwrap_or_default();

    AnalysisPrompts {
        market: format!(
            "Analise o produto \"{}\" para o público \"{}\" considerando: {}",
            product, target, market_json
        ),
        psychology: format!(
            "Identifique os gatilhos psicológicos mais eficazes para vender \"{}\" para \"{}\"",
            product, target
        ),
        positioning: format!(
            "Crie um posicionamento único para \"{}\" que se destaque da concorrência",
            product
        ),
    }
}

/// Generated text, one entry per prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextSections {
    pub market: String,
    pub psychology: String,
    pub positioning: String,
}

/// Static texts used when providers fail
pub fn fallback_sections(product: &str, target: &str) -> TextSections {
    TextSections {
        market: format!(
            "Análise de mercado para \"{}\" direcionado a \"{}\": Identificado potencial de \
             mercado significativo com oportunidades de diferenciação baseadas em proposta de \
             valor única e posicionamento estratégico.",
            product, target
        ),
        psychology: format!(
            "Perfil psicológico de \"{}\": Motivações primárias centradas em crescimento, \
             reconhecimento e superação de limitações. Gatilhos eficazes incluem urgência, \
             comparação social e validação de potencial.",
            target
        ),
        positioning: format!(
            "Posicionamento estratégico para \"{}\": Diferencial competitivo baseado em \
             metodologia comprovada, resultados mensuráveis e abordagem personalizada que \
             supera soluções genéricas do mercado.",
            product
        ),
    }
}

/// Outcome of the AI_ANALYSIS phase
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextAnalysis {
    /// Every section came from a provider
    Generated(TextSections),
    /// A provider failed; sections hold the static fallback texts
    Degraded { sections: TextSections, reason: String },
}

impl TextAnalysis {
    pub fn sections(&self) -> &TextSections {
        match self {
            TextAnalysis::Generated(sections) => sections,
            TextAnalysis::Degraded { sections, .. } => sections,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, TextAnalysis::Degraded { .. })
    }

    pub fn degradation_reason(&self) -> Option<&str> {
        match self {
            TextAnalysis::Generated(_) => None,
            TextAnalysis::Degraded { reason, .. } => Some(reason),
        }
    }
}

pub struct MultiSourceGenerator {
    provider: Arc<dyn TextProvider>,
    pacing: Duration,
}

impl MultiSourceGenerator {
    pub fn new(provider: Arc<dyn TextProvider>, pacing: Duration) -> Self {
        Self { provider, pacing }
    }

    pub async fn generate(&self, product: &str, target: &str, market_data: &MarketData) -> TextAnalysis {
        let prompts = build_prompts(product, target, market_data);
        let mut answers: [String; 3] = Default::default();

        for (slot, (section, prompt)) in answers.iter_mut().zip(prompts.ordered()) {
            match self.provider.generate(prompt).await {
                Ok(text) => {
                    debug!(section, provider = self.provider.name(), "Text section generated");
                    *slot = text;
                }
                Err(e) => {
                    let reason = format!("{} prompt failed: {}", section, e);
                    warn!(%reason, "Text generation degraded, using fallback analysis");
                    return TextAnalysis::Degraded {
                        sections: fallback_sections(product, target),
                        reason,
                    };
                }
            }

            if !self.pacing.is_zero() {
                tokio::time::sleep(self.pacing).await;
            }
        }

        let [market, psychology, positioning] = answers;
        TextAnalysis::Generated(TextSections {
            market,
            psychology,
            positioning,
        })
    }
}
