//! Objection catalog
//!
//! Frequencies are the claimed share of prospects voicing each objection.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ObjectionTemplate {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub content: &'static str,
    /// Percentage, 0-100
    pub frequency: u8,
}

/// Objections prospects say out loud
pub const PRIMARY_OBJECTIONS: [ObjectionTemplate; 3] = [
    ObjectionTemplate {
        kind: "TEMPO",
        content: "Não tenho tempo para implementar",
        frequency: 85,
    },
    ObjectionTemplate {
        kind: "DINHEIRO",
        content: "Muito caro para meu momento atual",
        frequency: 78,
    },
    ObjectionTemplate {
        kind: "CONFIANÇA",
        content: "Preciso de mais garantias",
        frequency: 65,
    },
];

/// Objections prospects hold but rarely voice
pub const HIDDEN_OBJECTIONS: [ObjectionTemplate; 3] = [
    ObjectionTemplate {
        kind: "AUTOSSUFICIENCIA",
        content: "Posso fazer sozinho",
        frequency: 92,
    },
    ObjectionTemplate {
        kind: "MEDO_MUDANCA",
        content: "Não é o momento certo",
        frequency: 71,
    },
    ObjectionTemplate {
        kind: "AUTOESTIMA",
        content: "Já tentei antes e não deu certo",
        frequency: 56,
    },
];

/// Neutralization strategy per objection type, in presentation order
pub const NEUTRALIZERS: Neutralizers = Neutralizers(&[
    ("TEMPO", "Cálculo do custo de oportunidade + automatização"),
    ("DINHEIRO", "ROI demonstrado + comparação com custo da inação"),
    ("CONFIANÇA", "Casos similares + garantia robusta"),
]);

/// Ordered type→strategy table, serialized as a JSON object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neutralizers(pub &'static [(&'static str, &'static str)]);

impl Neutralizers {
    pub fn get(&self, kind: &str) -> Option<&'static str> {
        self.0
            .iter()
            .find(|(entry_kind, _)| *entry_kind == kind)
            .map(|(_, strategy)| *strategy)
    }
}

impl Serialize for Neutralizers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (kind, strategy) in self.0 {
            map.serialize_entry(kind, strategy)?;
        }
        map.end()
    }
}
