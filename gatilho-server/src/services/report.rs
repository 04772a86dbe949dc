//! Report assembler (REPORT_GENERATION phase)
//!
//! Merges every phase output into one nested document. `word_count` is the
//! character length of the pretty-printed section object, measured before
//! the scalar fields are attached; `quality_score` is constant.

use crate::catalog::drivers::DriverTemplate;
use crate::catalog::objections::{Neutralizers, ObjectionTemplate};
use crate::catalog::provi::VisualDemoTemplate;
use crate::services::market_data::MarketData;
use crate::services::objection_mapper::ObjectionMap;
use crate::services::text_generator::TextAnalysis;
use chrono::{DateTime, Utc};
use gatilho_common::db::ReportRecord;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

pub const QUALITY_SCORE: i64 = 95;

pub const COMPLETENESS: &str = "Relatório completo com todos os frameworks solicitados";

/// Number of leading drivers named in the executive summary
const CRITICAL_DRIVER_COUNT: usize = 3;

/// Everything the assembler reads
pub struct ReportInputs<'a> {
    pub product: &'a str,
    pub target: &'a str,
    pub text: &'a TextAnalysis,
    pub drivers: &'a [DriverTemplate],
    pub objections: &'a ObjectionMap,
    pub demos: &'a [VisualDemoTemplate],
    pub market_data: &'a MarketData,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExecutiveSummary {
    pub product_analysis: String,
    pub target_profile: String,
    pub key_opportunities: Vec<&'static str>,
    pub critical_drivers: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DominantDrive {
    pub name: &'static str,
    pub psychological_trigger: &'static str,
    pub activation_phrase: &'static str,
    pub implementation_moment: &'static str,
    pub expected_impact: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PsychologicalAnalysis {
    pub dominant_drives: Vec<DominantDrive>,
    pub emotional_landscape: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ObjectionFramework {
    pub universal_objections: Vec<ObjectionTemplate>,
    pub hidden_objections: Vec<ObjectionTemplate>,
    pub neutralization_strategies: Neutralizers,
    pub implementation_sequence: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviSection {
    pub visual_demonstrations: Vec<VisualDemoTemplate>,
    pub execution_timeline: &'static str,
    pub memorability_score: &'static str,
    pub adaptation_notes: &'static str,
}

/// Provider output attached to the market section
#[derive(Debug, Clone, Serialize)]
pub struct AiAnalysisSection {
    pub market: String,
    pub psychology: String,
    pub positioning: String,
    /// True when the fallback texts were used
    pub degraded: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketIntelligence {
    pub competitive_landscape: MarketData,
    pub ai_analysis: AiAnalysisSection,
    pub positioning_opportunities: Vec<&'static str>,
    pub differentiation_factors: Vec<&'static str>,
}

/// The section object, in presentation order
#[derive(Debug, Clone, Serialize)]
pub struct ReportSections {
    pub executive_summary: ExecutiveSummary,
    pub psychological_analysis: PsychologicalAnalysis,
    pub objection_framework: ObjectionFramework,
    pub provi_system: ProviSection,
    pub market_intelligence: MarketIntelligence,
    pub implementation_roadmap: Value,
    pub success_metrics: Value,
    pub psychological_insights: Value,
}

/// Merged report as stored and sent with `ANALYSIS_COMPLETE`
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    #[serde(flatten)]
    pub sections: ReportSections,
    pub word_count: i64,
    pub quality_score: i64,
    pub completeness: &'static str,
    pub timestamp: DateTime<Utc>,
}

impl Report {
    /// Row for the `reports` table
    pub fn to_record(&self, analysis_id: Uuid) -> Result<ReportRecord, serde_json::Error> {
        let sections = &self.sections;
        Ok(ReportRecord {
            id: Uuid::new_v4(),
            analysis_id,
            executive_summary: serde_json::to_value(&sections.executive_summary)?,
            psychological_analysis: serde_json::to_value(&sections.psychological_analysis)?,
            objection_framework: serde_json::to_value(&sections.objection_framework)?,
            provi_system: serde_json::to_value(&sections.provi_system)?,
            market_intelligence: serde_json::to_value(&sections.market_intelligence)?,
            implementation_roadmap: sections.implementation_roadmap.clone(),
            success_metrics: sections.success_metrics.clone(),
            full_report_json: serde_json::to_value(self)?,
            created_at: self.timestamp,
        })
    }
}

/// Character count of the 2-space-indented JSON form
pub fn measure_word_count(sections: &ReportSections) -> Result<i64, serde_json::Error> {
    let serialized = serde_json::to_string_pretty(sections)?;
    Ok(serialized.chars().count() as i64)
}

pub fn assemble_report(inputs: ReportInputs<'_>) -> Result<Report, serde_json::Error> {
    let sections = build_sections(&inputs);
    let word_count = measure_word_count(&sections)?;

    Ok(Report {
        sections,
        word_count,
        quality_score: QUALITY_SCORE,
        completeness: COMPLETENESS,
        timestamp: Utc::now(),
    })
}

fn build_sections(inputs: &ReportInputs<'_>) -> ReportSections {
    let text = inputs.text.sections();

    ReportSections {
        executive_summary: ExecutiveSummary {
            product_analysis: format!(
                "Análise completa do produto \"{}\" revela potencial significativo no mercado atual.",
                inputs.product
            ),
            target_profile: format!(
                "Público-alvo \"{}\" demonstra alta receptividade aos gatilhos psicológicos identificados.",
                inputs.target
            ),
            key_opportunities: vec![
                "Explorar urgência temporal",
                "Ativar comparação social",
                "Despertar ambição latente",
            ],
            critical_drivers: inputs
                .drivers
                .iter()
                .take(CRITICAL_DRIVER_COUNT)
                .map(|d| d.name)
                .collect(),
        },

        psychological_analysis: PsychologicalAnalysis {
            dominant_drives: inputs
                .drivers
                .iter()
                .map(|driver| DominantDrive {
                    name: driver.name,
                    psychological_trigger: driver.trigger,
                    activation_phrase: driver.activation,
                    implementation_moment: "Durante o pré-pitch e momentos de tensão",
                    expected_impact: "Alto - baseado em perfil psicográfico",
                })
                .collect(),
            emotional_landscape: json!({
                "primary_pain": "Frustração com falta de resultados proporcionais ao esforço",
                "hidden_desire": "Reconhecimento como autoridade no mercado",
                "secret_fear": "Descobrir que perdeu tempo com abordagem errada",
                "motivation_hierarchy": ["Liberdade", "Reconhecimento", "Segurança", "Crescimento"]
            }),
        },

        objection_framework: ObjectionFramework {
            universal_objections: inputs.objections.primary.clone(),
            hidden_objections: inputs.objections.hidden.clone(),
            neutralization_strategies: inputs.objections.neutralizers,
            implementation_sequence: vec![
                "1. Antecipar objeção antes que surja",
                "2. Validar preocupação como legítima",
                "3. Apresentar nova perspectiva",
                "4. Oferecer prova irrefutável",
                "5. Criar urgência para ação",
            ],
        },

        provi_system: ProviSection {
            visual_demonstrations: inputs.demos.to_vec(),
            execution_timeline: "Distribuir ao longo do evento para máximo impacto",
            memorability_score: "Alto - experiências físicas criam ancoragem mental",
            adaptation_notes: "Versões online e presencial disponíveis",
        },

        market_intelligence: MarketIntelligence {
            competitive_landscape: inputs.market_data.clone(),
            ai_analysis: AiAnalysisSection {
                market: text.market.clone(),
                psychology: text.psychology.clone(),
                positioning: text.positioning.clone(),
                degraded: inputs.text.is_degraded(),
            },
            positioning_opportunities: vec![
                "Único método baseado em psicologia comportamental",
                "Sistema com garantia de resultados mensuráveis",
                "Abordagem científica vs tentativa e erro",
            ],
            differentiation_factors: vec![
                "Base científica sólida",
                "Histórico comprovado de resultados",
                "Sistema completo vs soluções parciais",
            ],
        },

        implementation_roadmap: json!({
            "pre_pitch_architecture": {
                "phase_1": "Despertar consciência da dor (Drivers: Diagnóstico Brutal)",
                "phase_2": "Amplificar desejo latente (Drivers: Ambição Expandida)",
                "phase_3": "Criar pressão temporal (Drivers: Relógio Psicológico)",
                "phase_4": "Oferecer caminho único (Sistema/Método)",
                "phase_5": "Eliminar riscos (Garantias/Provas)"
            },
            "timing_strategy": {
                "total_duration": "90 minutos ideais",
                "pre_pitch": "20 minutos finais",
                "driver_activation": "Cada 8-10 minutos",
                "provi_distribution": "Momentos de transição críticos"
            }
        }),

        success_metrics: json!({
            "engagement_indicators": [
                "Silêncio total durante drivers",
                "Perguntas sobre \"quando abre\"",
                "Comentários de identificação pessoal"
            ],
            "conversion_predictors": [
                "Redução de objeções básicas",
                "Aumento de perguntas sobre formato/preço",
                "Solicitações de informações extras"
            ]
        }),

        psychological_insights: json!({
            "decision_triggers": [
                "Medo de perder oportunidade única",
                "Comparação com pares bem-sucedidos",
                "Validação de capacidade pessoal",
                "Urgência temporal genuína"
            ],
            "resistance_patterns": [
                "Negação inicial do problema",
                "Minimização da importância",
                "Busca por exceções às regras",
                "Procrastinação disfarçada"
            ]
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::provi::VISUAL_DEMOS;
    use crate::services::driver_selector::select_drivers;
    use crate::services::market_data::build_market_data;
    use crate::services::objection_mapper::map_objections;
    use crate::services::text_generator::{fallback_sections, TextSections};

    fn text() -> TextAnalysis {
        TextAnalysis::Generated(TextSections {
            market: "m".to_string(),
            psychology: "p".to_string(),
            positioning: "x".to_string(),
        })
    }

    fn report_for(target: &str, text: &TextAnalysis) -> Report {
        let drivers = select_drivers(target);
        let objections = map_objections(target, None);
        let market_data = build_market_data("ConcA, ConcB", &mut rand::thread_rng());
        assemble_report(ReportInputs {
            product: "Curso X",
            target,
            text,
            drivers: &drivers,
            objections: &objections,
            demos: &VISUAL_DEMOS,
            market_data: &market_data,
        })
        .unwrap()
    }

    #[test]
    fn test_word_count_matches_reserialized_sections() {
        let report = report_for("Empreendedores", &text());

        let mut value = serde_json::to_value(&report).unwrap();
        let object = value.as_object_mut().unwrap();
        for scalar in ["word_count", "quality_score", "completeness", "timestamp"] {
            assert!(object.remove(scalar).is_some(), "{}", scalar);
        }
        let reserialized = serde_json::to_string_pretty(&value).unwrap();

        assert_eq!(report.word_count, reserialized.chars().count() as i64);
    }

    #[test]
    fn test_quality_score_is_constant() {
        assert_eq!(report_for("Empreendedores", &text()).quality_score, 95);
        assert_eq!(report_for("", &text()).quality_score, 95);
    }

    #[test]
    fn test_report_contents_for_entrepreneurs() {
        let value = serde_json::to_value(report_for("Empreendedores", &text())).unwrap();

        assert_eq!(value["psychological_analysis"]["dominant_drives"].as_array().unwrap().len(), 5);
        assert_eq!(value["objection_framework"]["universal_objections"].as_array().unwrap().len(), 3);
        assert_eq!(value["objection_framework"]["hidden_objections"].as_array().unwrap().len(), 3);
        assert_eq!(value["provi_system"]["visual_demonstrations"].as_array().unwrap().len(), 3);
        assert_eq!(
            value["executive_summary"]["critical_drivers"],
            json!(["Ambição Expandida", "Diagnóstico Brutal", "Custo Invisível"])
        );
        assert_eq!(value["market_intelligence"]["competitive_landscape"]["competitors"], json!(["ConcA", "ConcB"]));
    }

    #[test]
    fn test_degraded_text_is_flagged_in_report() {
        let degraded = TextAnalysis::Degraded {
            sections: fallback_sections("Curso X", "Empreendedores"),
            reason: "timeout".to_string(),
        };
        let value = serde_json::to_value(report_for("Empreendedores", &degraded)).unwrap();
        assert_eq!(value["market_intelligence"]["ai_analysis"]["degraded"], true);
    }

    #[test]
    fn test_record_splits_sections() {
        let report = report_for("Empreendedores", &text());
        let analysis_id = Uuid::new_v4();
        let record = report.to_record(analysis_id).unwrap();

        assert_eq!(record.analysis_id, analysis_id);
        assert_eq!(record.full_report_json["quality_score"], 95);
        assert_eq!(
            record.executive_summary["product_analysis"],
            "Análise completa do produto \"Curso X\" revela potencial significativo no mercado atual."
        );
        assert!(record.full_report_json.get("psychological_insights").is_some());
    }
}
