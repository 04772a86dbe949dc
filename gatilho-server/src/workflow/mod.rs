//! Stage sequencer workflow
//!
//! Phase progression (strictly sequential, one task per analysis):
//! INITIALIZATION → DATA_COLLECTION → AI_ANALYSIS → MENTAL_DRIVERS →
//! OBJECTION_ANALYSIS → PROVI_SYSTEM → REPORT_GENERATION → COMPLETE
//!
//! Any failure ends the analysis in status `error`, phase `ERROR`.

pub mod sequencer;

pub use sequencer::{AnalysisOutcome, AnalysisSequencer};

use gatilho_common::db::AnalysisRequest;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

/// Phase label stored on a failed analysis
pub const ERROR_PHASE: &str = "ERROR";

/// Prefix of the message carried by the terminal ERROR event
pub const ERROR_MESSAGE_PREFIX: &str = "Erro na análise: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Initialization,
    DataCollection,
    AiAnalysis,
    MentalDrivers,
    ObjectionAnalysis,
    ProviSystem,
    ReportGeneration,
    Complete,
}

impl Phase {
    /// Execution order
    pub const ALL: [Phase; 8] = [
        Phase::Initialization,
        Phase::DataCollection,
        Phase::AiAnalysis,
        Phase::MentalDrivers,
        Phase::ObjectionAnalysis,
        Phase::ProviSystem,
        Phase::ReportGeneration,
        Phase::Complete,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Initialization => "INITIALIZATION",
            Phase::DataCollection => "DATA_COLLECTION",
            Phase::AiAnalysis => "AI_ANALYSIS",
            Phase::MentalDrivers => "MENTAL_DRIVERS",
            Phase::ObjectionAnalysis => "OBJECTION_ANALYSIS",
            Phase::ProviSystem => "PROVI_SYSTEM",
            Phase::ReportGeneration => "REPORT_GENERATION",
            Phase::Complete => "COMPLETE",
        }
    }

    /// Literal progress percentage announced at phase entry
    pub fn progress(&self) -> u8 {
        match self {
            Phase::Initialization => 5,
            Phase::DataCollection => 15,
            Phase::AiAnalysis => 35,
            Phase::MentalDrivers => 55,
            Phase::ObjectionAnalysis => 70,
            Phase::ProviSystem => 85,
            Phase::ReportGeneration => 95,
            Phase::Complete => 100,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Phase::Initialization => "Inicializando análise psicológica...",
            Phase::DataCollection => "Coletando inteligência de mercado...",
            Phase::AiAnalysis => "Analisando com múltiplas IAs...",
            Phase::MentalDrivers => "Identificando gatilhos psicológicos...",
            Phase::ObjectionAnalysis => "Mapeando objeções e resistências...",
            Phase::ProviSystem => "Criando provas visuais instantâneas...",
            Phase::ReportGeneration => "Compilando relatório psicológico...",
            Phase::Complete => "Análise concluída",
        }
    }

    pub fn from_label(label: &str) -> Option<Phase> {
        Phase::ALL.iter().copied().find(|phase| phase.label() == label)
    }
}

/// Failure inside a phase
///
/// The Display text is what clients see after [`ERROR_MESSAGE_PREFIX`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Store(#[from] gatilho_common::Error),

    #[error("Falha ao serializar relatório: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Run an analysis on a background task
///
/// The caller must already have stored the record in status `queued`.
pub fn spawn_analysis(
    sequencer: Arc<AnalysisSequencer>,
    analysis: AnalysisRequest,
) -> JoinHandle<AnalysisOutcome> {
    let analysis_id = analysis.id;

    tokio::spawn(async move {
        tracing::info!(analysis_id = %analysis_id, "Background analysis task started");

        let outcome = sequencer.run(analysis).await;

        match &outcome {
            AnalysisOutcome::Completed { word_count, .. } => tracing::info!(
                analysis_id = %analysis_id,
                word_count,
                "Background analysis task completed successfully"
            ),
            AnalysisOutcome::Failed { phase, message } => tracing::error!(
                analysis_id = %analysis_id,
                phase = phase.label(),
                error = %message,
                "Background analysis task failed"
            ),
        }

        outcome
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_sequence_is_strictly_increasing() {
        let progress: Vec<u8> = Phase::ALL.iter().map(|p| p.progress()).collect();
        assert_eq!(progress, vec![5, 15, 35, 55, 70, 85, 95, 100]);
    }

    #[test]
    fn test_label_lookup() {
        for phase in Phase::ALL {
            assert_eq!(Phase::from_label(phase.label()), Some(phase));
        }
        assert_eq!(Phase::from_label(ERROR_PHASE), None);
    }

    #[test]
    fn test_serialized_name_matches_label() {
        for phase in Phase::ALL {
            assert_eq!(serde_json::to_value(phase).unwrap(), phase.label());
        }
    }

    #[test]
    fn test_invalid_input_message_is_raw() {
        let err = PipelineError::InvalidInput("campo de concorrentes ausente".to_string());
        assert_eq!(
            format!("{}{}", ERROR_MESSAGE_PREFIX, err),
            "Erro na análise: campo de concorrentes ausente"
        );
    }
}
