//! Database models
//!
//! Flat records mirroring the persisted tables. Child records belong to
//! exactly one [`AnalysisRequest`] through `analysis_id`.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Phase label of a record that has not started processing
pub const PENDING_PHASE: &str = "PENDING";

/// Lifecycle status of an analysis request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    /// Created, pipeline not started
    Queued,
    /// Stage sequencer running
    Processing,
    /// Report attached
    Completed,
    /// Sequencer hit a failure
    Error,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Queued => "queued",
            AnalysisStatus::Processing => "processing",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "queued" => Ok(AnalysisStatus::Queued),
            "processing" => Ok(AnalysisStatus::Processing),
            "completed" => Ok(AnalysisStatus::Completed),
            "error" => Ok(AnalysisStatus::Error),
            other => Err(Error::InvalidRecord(format!("Unknown analysis status: {}", other))),
        }
    }

    /// Completed and Error are terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, AnalysisStatus::Completed | AnalysisStatus::Error)
    }
}

/// Requested analysis flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    /// Drivers, objections and visual demonstrations
    #[default]
    Complete,
    Drivers,
    Objections,
    Provi,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::Complete => "complete",
            AnalysisType::Drivers => "drivers",
            AnalysisType::Objections => "objections",
            AnalysisType::Provi => "provi",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "complete" => Ok(AnalysisType::Complete),
            "drivers" => Ok(AnalysisType::Drivers),
            "objections" => Ok(AnalysisType::Objections),
            "provi" => Ok(AnalysisType::Provi),
            other => Err(Error::InvalidRecord(format!("Unknown analysis type: {}", other))),
        }
    }
}

/// Processing priority chosen at intake
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Normal,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            other => Err(Error::InvalidRecord(format!("Unknown priority: {}", other))),
        }
    }
}

/// One analysis submitted by a client session
///
/// Mutated only by the stage sequencer once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub id: Uuid,
    pub product_name: String,
    pub target_audience: String,
    /// Comma-separated competitor list
    pub competitors: Option<String>,
    pub additional_details: Option<String>,
    pub analysis_type: AnalysisType,
    pub priority: Priority,
    pub status: AnalysisStatus,
    /// 0-100
    pub progress: u8,
    pub current_phase: String,
    pub quality_score: i64,
    pub word_count: i64,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl AnalysisRequest {
    /// Create a queued request with a fresh identifier
    pub fn new(
        product_name: impl Into<String>,
        target_audience: impl Into<String>,
        competitors: Option<String>,
        additional_details: Option<String>,
        analysis_type: AnalysisType,
        priority: Priority,
    ) -> Self {
        Self::with_id(
            Uuid::new_v4(),
            product_name,
            target_audience,
            competitors,
            additional_details,
            analysis_type,
            priority,
        )
    }

    /// Create a queued request under a caller-chosen identifier
    pub fn with_id(
        id: Uuid,
        product_name: impl Into<String>,
        target_audience: impl Into<String>,
        competitors: Option<String>,
        additional_details: Option<String>,
        analysis_type: AnalysisType,
        priority: Priority,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            product_name: product_name.into(),
            target_audience: target_audience.into(),
            competitors,
            additional_details,
            analysis_type,
            priority,
            status: AnalysisStatus::Queued,
            progress: 0,
            current_phase: PENDING_PHASE.to_string(),
            quality_score: 0,
            word_count: 0,
            created_at: now,
            completed_at: None,
            updated_at: now,
        }
    }
}

/// Psychological driver selected for an analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MentalDriverRecord {
    pub id: Uuid,
    pub analysis_id: Uuid,
    pub driver_name: String,
    pub driver_category: String,
    pub trigger_phrase: String,
    pub activation_phrase: String,
    pub effectiveness_score: i64,
    pub examples: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Resistance pattern mapped for an analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectionRecord {
    pub id: Uuid,
    pub analysis_id: Uuid,
    pub objection_type: String,
    pub objection_content: String,
    pub frequency_percentage: i64,
    pub is_hidden: bool,
    pub neutralization_strategy: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Visual demonstration ("PROVI") attached to an analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisualDemoRecord {
    pub id: Uuid,
    pub analysis_id: Uuid,
    pub provi_name: String,
    pub concept: String,
    pub materials: Vec<String>,
    pub execution_steps: String,
    pub impact_level: String,
    pub memorability_score: i64,
    pub created_at: DateTime<Utc>,
}

/// Final report stored once per completed analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRecord {
    pub id: Uuid,
    pub analysis_id: Uuid,
    pub executive_summary: serde_json::Value,
    pub psychological_analysis: serde_json::Value,
    pub objection_framework: serde_json::Value,
    pub provi_system: serde_json::Value,
    pub market_intelligence: serde_json::Value,
    pub implementation_roadmap: serde_json::Value,
    pub success_metrics: serde_json::Value,
    pub full_report_json: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request_is_queued() {
        let request = AnalysisRequest::new(
            "Curso X",
            "Empreendedores",
            Some("ConcA, ConcB".to_string()),
            None,
            AnalysisType::default(),
            Priority::default(),
        );

        assert_eq!(request.status, AnalysisStatus::Queued);
        assert_eq!(request.progress, 0);
        assert_eq!(request.current_phase, PENDING_PHASE);
        assert_eq!(request.analysis_type, AnalysisType::Complete);
        assert_eq!(request.priority, Priority::Normal);
        assert!(request.completed_at.is_none());
    }

    #[test]
    fn test_status_strings_match_serde() {
        for status in [
            AnalysisStatus::Queued,
            AnalysisStatus::Processing,
            AnalysisStatus::Completed,
            AnalysisStatus::Error,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(AnalysisStatus::parse(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!AnalysisStatus::Queued.is_terminal());
        assert!(!AnalysisStatus::Processing.is_terminal());
        assert!(AnalysisStatus::Completed.is_terminal());
        assert!(AnalysisStatus::Error.is_terminal());
    }

    #[test]
    fn test_unknown_enum_values_rejected() {
        assert!(AnalysisType::parse("express").is_err());
        assert!(Priority::parse("low").is_err());
        assert!(matches!(
            AnalysisStatus::parse("paused"),
            Err(Error::InvalidRecord(_))
        ));
    }
}
