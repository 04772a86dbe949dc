//! Mental driver catalog
//!
//! Ten universal psychological triggers, each with an activation template
//! whose bracketed slots are filled in by the copywriter.

use serde::Serialize;

/// Category recorded for every persisted driver
pub const DEFAULT_CATEGORY: &str = "Geral";

/// Effectiveness score recorded for every persisted driver
pub const DEFAULT_EFFECTIVENESS: i64 = 85;

/// One catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DriverTemplate {
    /// Stable catalog key (e.g. "FERIDA_EXPOSTA")
    pub key: &'static str,
    pub name: &'static str,
    pub trigger: &'static str,
    pub activation: &'static str,
}

pub const FERIDA_EXPOSTA: DriverTemplate = DriverTemplate {
    key: "FERIDA_EXPOSTA",
    name: "Ferida Exposta",
    trigger: "Dor não resolvida",
    activation: "Você ainda [comportamento doloroso] mesmo sabendo que [consequência]?",
};

pub const TROFEU_SECRETO: DriverTemplate = DriverTemplate {
    key: "TROFEU_SECRETO",
    name: "Troféu Secreto",
    trigger: "Desejo inconfessável",
    activation: "Não é sobre dinheiro, é sobre [desejo real oculto]",
};

pub const INVEJA_PRODUTIVA: DriverTemplate = DriverTemplate {
    key: "INVEJA_PRODUTIVA",
    name: "Inveja Produtiva",
    trigger: "Comparação com pares",
    activation: "Enquanto você [situação atual], outros como você [resultado desejado]",
};

pub const RELOGIO_PSICOLOGICO: DriverTemplate = DriverTemplate {
    key: "RELOGIO_PSICOLOGICO",
    name: "Relógio Psicológico",
    trigger: "Urgência existencial",
    activation: "Quantos [período] você ainda vai [desperdício]?",
};

pub const IDENTIDADE_APRISIONADA: DriverTemplate = DriverTemplate {
    key: "IDENTIDADE_APRISIONADA",
    name: "Identidade Aprisionada",
    trigger: "Conflito entre quem é e quem poderia ser",
    activation: "Você não é [rótulo limitante], você é [potencial real]",
};

pub const CUSTO_INVISIVEL: DriverTemplate = DriverTemplate {
    key: "CUSTO_INVISIVEL",
    name: "Custo Invisível",
    trigger: "Perda não percebida",
    activation: "Cada dia sem [solução] custa [perda específica]",
};

pub const AMBICAO_EXPANDIDA: DriverTemplate = DriverTemplate {
    key: "AMBICAO_EXPANDIDA",
    name: "Ambição Expandida",
    trigger: "Sonhos pequenos demais",
    activation: "Se o esforço é o mesmo, por que você está pedindo tão pouco?",
};

pub const DIAGNOSTICO_BRUTAL: DriverTemplate = DriverTemplate {
    key: "DIAGNOSTICO_BRUTAL",
    name: "Diagnóstico Brutal",
    trigger: "Confronto com a realidade atual",
    activation: "Olhe seus números/situação. Até quando você vai aceitar isso?",
};

pub const AMBIENTE_VAMPIRO: DriverTemplate = DriverTemplate {
    key: "AMBIENTE_VAMPIRO",
    name: "Ambiente Vampiro",
    trigger: "Consciência do entorno tóxico",
    activation: "Seu ambiente te impulsiona ou te mantém pequeno?",
};

pub const MENTOR_SALVADOR: DriverTemplate = DriverTemplate {
    key: "MENTOR_SALVADOR",
    name: "Mentor Salvador",
    trigger: "Necessidade de orientação externa",
    activation: "Você precisa de alguém que veja seu potencial quando você não consegue",
};

/// Full catalog in presentation order
pub const MENTAL_DRIVERS: [DriverTemplate; 10] = [
    FERIDA_EXPOSTA,
    TROFEU_SECRETO,
    INVEJA_PRODUTIVA,
    RELOGIO_PSICOLOGICO,
    IDENTIDADE_APRISIONADA,
    CUSTO_INVISIVEL,
    AMBICAO_EXPANDIDA,
    DIAGNOSTICO_BRUTAL,
    AMBIENTE_VAMPIRO,
    MENTOR_SALVADOR,
];

/// Audience keywords that pull a fixed set of drivers into the selection
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule {
    /// Lower-case substrings; any match fires the rule
    pub keywords: &'static [&'static str],
    pub drivers: &'static [DriverTemplate],
}

/// Rules evaluated in order against the lower-cased audience text
pub const KEYWORD_RULES: [KeywordRule; 2] = [
    // Business owners
    KeywordRule {
        keywords: &["empreend", "negócio"],
        drivers: &[AMBICAO_EXPANDIDA, DIAGNOSTICO_BRUTAL, CUSTO_INVISIVEL],
    },
    // Managers and leaders
    KeywordRule {
        keywords: &["gest", "lider"],
        drivers: &[MENTOR_SALVADOR, AMBIENTE_VAMPIRO],
    },
];

/// Appended to every selection
pub const UNIVERSAL_DRIVERS: [DriverTemplate; 2] = [RELOGIO_PSICOLOGICO, TROFEU_SECRETO];

/// Look up a catalog entry by key
pub fn find(key: &str) -> Option<&'static DriverTemplate> {
    MENTAL_DRIVERS.iter().find(|driver| driver.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_catalog_keys_unique() {
        let keys: HashSet<_> = MENTAL_DRIVERS.iter().map(|d| d.key).collect();
        assert_eq!(keys.len(), MENTAL_DRIVERS.len());
    }

    #[test]
    fn test_rule_drivers_come_from_catalog() {
        for rule in KEYWORD_RULES.iter() {
            for driver in rule.drivers {
                assert_eq!(find(driver.key), Some(driver));
            }
        }
        for driver in UNIVERSAL_DRIVERS.iter() {
            assert_eq!(find(driver.key), Some(driver));
        }
    }

    #[test]
    fn test_keywords_are_lower_case() {
        for rule in KEYWORD_RULES.iter() {
            for keyword in rule.keywords {
                assert_eq!(*keyword, keyword.to_lowercase());
            }
        }
    }

    #[test]
    fn test_find_unknown_key() {
        assert!(find("NOPE").is_none());
    }
}
