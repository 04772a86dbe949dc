//! Visual demonstration generator (PROVI_SYSTEM phase)

use crate::catalog::drivers::DriverTemplate;
use crate::catalog::provi::{VisualDemoTemplate, DEFAULT_MEMORABILITY, VISUAL_DEMOS};
use gatilho_common::db::VisualDemoRecord;
use uuid::Uuid;

/// Always the full catalog, whatever the product or drivers
pub fn generate_demos(_product: &str, _drivers: &[DriverTemplate]) -> Vec<VisualDemoTemplate> {
    VISUAL_DEMOS.to_vec()
}

pub fn demo_records(analysis_id: Uuid, demos: &[VisualDemoTemplate]) -> Vec<VisualDemoRecord> {
    let now = chrono::Utc::now();
    demos
        .iter()
        .map(|demo| VisualDemoRecord {
            id: Uuid::new_v4(),
            analysis_id,
            provi_name: demo.name.to_string(),
            concept: demo.concept.to_string(),
            materials: demo.materials.iter().map(|m| m.to_string()).collect(),
            execution_steps: demo.execution.to_string(),
            impact_level: demo.impact.to_string(),
            memorability_score: DEFAULT_MEMORABILITY,
            created_at: now,
        })
        .collect()
}
