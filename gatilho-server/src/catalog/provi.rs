//! Visual demonstration ("PROVI") catalog

use serde::Serialize;

/// Memorability score recorded for every persisted demonstration
pub const DEFAULT_MEMORABILITY: i64 = 85;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VisualDemoTemplate {
    pub name: &'static str,
    pub concept: &'static str,
    pub materials: &'static [&'static str],
    pub execution: &'static str,
    pub impact: &'static str,
}

pub const VISUAL_DEMOS: [VisualDemoTemplate; 3] = [
    VisualDemoTemplate {
        name: "Experimento da Ampulheta Dourada",
        concept: "Visualização da perda de oportunidades no tempo",
        materials: &["Ampulheta", "Moedas douradas", "Timer"],
        execution: "Demonstrar como cada grão que cai representa oportunidade perdida",
        impact: "Alto - conecta tempo com dinheiro perdido",
    },
    VisualDemoTemplate {
        name: "Analogia da Máquina Quebrada",
        concept: "Mostrar diferença entre sistema e tentativa aleatória",
        materials: &["Quebra-cabeça", "Peças soltas", "Imagem referência"],
        execution: "Tentar montar sem/com a imagem de referência",
        impact: "Médio-Alto - evidencia valor do método",
    },
    VisualDemoTemplate {
        name: "Demonstração do Iceberg Mental",
        concept: "Revelar problemas ocultos não percebidos",
        materials: &["Iceberg visual", "Apresentação interativa"],
        execution: "Mostrar apenas 10% visível vs 90% submerso",
        impact: "Alto - expõe dores não conscientes",
    },
];
