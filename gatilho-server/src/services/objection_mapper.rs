//! Objection mapping (OBJECTION_ANALYSIS phase)
//!
//! The map is the static catalog; audience and details do not change it.

use crate::catalog::objections::{
    Neutralizers, ObjectionTemplate, HIDDEN_OBJECTIONS, NEUTRALIZERS, PRIMARY_OBJECTIONS,
};
use gatilho_common::db::ObjectionRecord;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectionMap {
    pub primary: Vec<ObjectionTemplate>,
    pub hidden: Vec<ObjectionTemplate>,
    pub neutralizers: Neutralizers,
}

pub fn map_objections(_target: &str, _details: Option<&str>) -> ObjectionMap {
    ObjectionMap {
        primary: PRIMARY_OBJECTIONS.to_vec(),
        hidden: HIDDEN_OBJECTIONS.to_vec(),
        neutralizers: NEUTRALIZERS,
    }
}

impl ObjectionMap {
    /// Records for persistence: primary entries first, then hidden ones
    pub fn records(&self, analysis_id: Uuid) -> Vec<ObjectionRecord> {
        let now = chrono::Utc::now();
        let primary = self.primary.iter().map(|o| (o, false));
        let hidden = self.hidden.iter().map(|o| (o, true));

        primary
            .chain(hidden)
            .map(|(objection, is_hidden)| ObjectionRecord {
                id: Uuid::new_v4(),
                analysis_id,
                objection_type: objection.kind.to_string(),
                objection_content: objection.content.to_string(),
                frequency_percentage: i64::from(objection.frequency),
                is_hidden,
                neutralization_strategy: self.neutralizers.get(objection.kind).map(str::to_string),
                created_at: now,
            })
            .collect()
    }
}
