//! Analysis stage sequencer
//!
//! At every phase entry the sequencer publishes a PROGRESS_UPDATE on the
//! analysis channel, then persists phase and progress. Completion is
//! persisted before it is announced, so a client never sees
//! ANALYSIS_COMPLETE for a record that is not stored as completed.

use super::{PipelineError, Phase, ERROR_MESSAGE_PREFIX, ERROR_PHASE};
use crate::config::PipelineTiming;
use crate::db::{analyses, children};
use crate::services::driver_selector::{driver_records, select_drivers};
use crate::services::objection_mapper::map_objections;
use crate::services::provi_generator::{demo_records, generate_demos};
use crate::services::report::{assemble_report, ReportInputs};
use crate::services::{MarketDataCollector, MultiSourceGenerator, TextProvider};
use gatilho_common::db::AnalysisRequest;
use gatilho_common::events::{AnalysisEvent, AnalysisPublisher, ProgressRegistry};
use sqlx::SqlitePool;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Terminal result of one sequencer run
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    Completed {
        report: serde_json::Value,
        quality_score: i64,
        word_count: i64,
    },
    Failed {
        /// Phase that was running when the failure happened
        phase: Phase,
        /// Message sent with the ERROR event
        message: String,
    },
}

impl AnalysisOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, AnalysisOutcome::Completed { .. })
    }
}

struct CompletedReport {
    report: serde_json::Value,
    quality_score: i64,
    word_count: i64,
}

pub struct AnalysisSequencer {
    db: SqlitePool,
    registry: ProgressRegistry,
    collector: MarketDataCollector,
    text_generator: MultiSourceGenerator,
}

impl AnalysisSequencer {
    pub fn new(
        db: SqlitePool,
        registry: ProgressRegistry,
        provider: Arc<dyn TextProvider>,
        timing: PipelineTiming,
    ) -> Self {
        Self {
            db,
            registry,
            collector: MarketDataCollector::new(timing.market_collection_delay),
            text_generator: MultiSourceGenerator::new(provider, timing.provider_pacing),
        }
    }

    /// Drive one stored analysis to COMPLETE or ERROR
    ///
    /// Never returns early: every run ends with exactly one terminal event
    /// on the analysis channel.
    pub async fn run(&self, analysis: AnalysisRequest) -> AnalysisOutcome {
        let analysis_id = analysis.id;
        let start_time = Instant::now();
        let publisher = self.registry.publisher(analysis_id).await;
        let mut current = Phase::Initialization;

        tracing::info!(
            analysis_id = %analysis_id,
            product = %analysis.product_name,
            analysis_type = analysis.analysis_type.as_str(),
            priority = analysis.priority.as_str(),
            "Starting analysis"
        );

        let outcome = match self.execute(&analysis, &publisher, &mut current).await {
            Ok(completed) => {
                publisher.emit_lossy(progress_event(analysis_id, Phase::Complete));
                publisher.emit_lossy(AnalysisEvent::AnalysisComplete {
                    analysis_id,
                    progress: Phase::Complete.progress(),
                    report: completed.report.clone(),
                });

                tracing::info!(
                    analysis_id = %analysis_id,
                    word_count = completed.word_count,
                    duration_ms = start_time.elapsed().as_millis() as u64,
                    "Analysis completed"
                );

                AnalysisOutcome::Completed {
                    report: completed.report,
                    quality_score: completed.quality_score,
                    word_count: completed.word_count,
                }
            }
            Err(e) => self.handle_failure(&publisher, current, e).await,
        };

        self.registry.close(analysis_id).await;
        outcome
    }

    async fn execute(
        &self,
        analysis: &AnalysisRequest,
        publisher: &AnalysisPublisher,
        current: &mut Phase,
    ) -> Result<CompletedReport, PipelineError> {
        let analysis_id = analysis.id;
        let product = analysis.product_name.as_str();
        let target = analysis.target_audience.as_str();

        self.enter_phase(publisher, Phase::Initialization, current).await?;

        self.enter_phase(publisher, Phase::DataCollection, current).await?;
        let market_data = self.collector.collect(analysis.competitors.as_deref()).await?;

        self.enter_phase(publisher, Phase::AiAnalysis, current).await?;
        let text = self.text_generator.generate(product, target, &market_data).await;
        if let Some(reason) = text.degradation_reason() {
            tracing::warn!(analysis_id = %analysis_id, %reason, "Continuing with fallback text analysis");
        }

        self.enter_phase(publisher, Phase::MentalDrivers, current).await?;
        let drivers = select_drivers(target);
        for record in driver_records(analysis_id, &drivers) {
            children::insert_driver(&self.db, &record).await?;
        }

        self.enter_phase(publisher, Phase::ObjectionAnalysis, current).await?;
        let objections = map_objections(target, analysis.additional_details.as_deref());
        for record in objections.records(analysis_id) {
            children::insert_objection(&self.db, &record).await?;
        }

        self.enter_phase(publisher, Phase::ProviSystem, current).await?;
        let demos = generate_demos(product, &drivers);
        for record in demo_records(analysis_id, &demos) {
            children::insert_demo(&self.db, &record).await?;
        }

        self.enter_phase(publisher, Phase::ReportGeneration, current).await?;
        let report = assemble_report(ReportInputs {
            product,
            target,
            text: &text,
            drivers: &drivers,
            objections: &objections,
            demos: &demos,
            market_data: &market_data,
        })?;
        let record = report.to_record(analysis_id)?;
        children::insert_report(&self.db, &record).await?;

        *current = Phase::Complete;
        analyses::mark_completed(
            &self.db,
            analysis_id,
            Phase::Complete.label(),
            report.quality_score,
            report.word_count,
        )
        .await?;

        Ok(CompletedReport {
            report: record.full_report_json,
            quality_score: report.quality_score,
            word_count: report.word_count,
        })
    }

    async fn enter_phase(
        &self,
        publisher: &AnalysisPublisher,
        phase: Phase,
        current: &mut Phase,
    ) -> Result<(), PipelineError> {
        let analysis_id = publisher.analysis_id();
        *current = phase;

        tracing::info!(
            analysis_id = %analysis_id,
            phase = phase.label(),
            progress = phase.progress(),
            "Entering phase"
        );

        publisher.emit_lossy(progress_event(analysis_id, phase));

        if phase == Phase::Initialization {
            analyses::mark_processing(&self.db, analysis_id, phase.label(), phase.progress()).await?;
        } else {
            analyses::update_phase(&self.db, analysis_id, phase.label(), phase.progress()).await?;
        }

        Ok(())
    }

    /// Mark the record failed and send the single ERROR event
    ///
    /// Child records written before the failure are kept.
    async fn handle_failure(
        &self,
        publisher: &AnalysisPublisher,
        phase: Phase,
        error: PipelineError,
    ) -> AnalysisOutcome {
        let analysis_id = publisher.analysis_id();
        let message = format!("{}{}", ERROR_MESSAGE_PREFIX, error);

        tracing::error!(
            analysis_id = %analysis_id,
            phase = phase.label(),
            error = %error,
            "Analysis failed"
        );

        if let Err(store_error) = analyses::mark_error(&self.db, analysis_id, ERROR_PHASE).await {
            tracing::error!(
                analysis_id = %analysis_id,
                error = %store_error,
                "Failed to mark analysis as failed"
            );
        }

        publisher.emit_lossy(AnalysisEvent::Error {
            analysis_id: Some(analysis_id),
            message: message.clone(),
        });

        AnalysisOutcome::Failed { phase, message }
    }
}

fn progress_event(analysis_id: Uuid, phase: Phase) -> AnalysisEvent {
    AnalysisEvent::ProgressUpdate {
        analysis_id,
        phase: phase.label().to_string(),
        progress: phase.progress(),
        message: phase.message().to_string(),
    }
}
