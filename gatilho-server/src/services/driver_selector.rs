//! Driver selection by audience keywords (MENTAL_DRIVERS phase)

use crate::catalog::drivers::{
    DriverTemplate, DEFAULT_CATEGORY, DEFAULT_EFFECTIVENESS, KEYWORD_RULES, UNIVERSAL_DRIVERS,
};
use gatilho_common::db::MentalDriverRecord;
use uuid::Uuid;

/// Select drivers for an audience description
///
/// Every matching keyword rule contributes its drivers in rule order; the
/// universal drivers always close the list. Overlapping rules are not
/// deduplicated.
pub fn select_drivers(target: &str) -> Vec<DriverTemplate> {
    let target = target.to_lowercase();
    let mut selected = Vec::new();

    for rule in KEYWORD_RULES.iter() {
        if rule.keywords.iter().any(|keyword| target.contains(keyword)) {
            selected.extend_from_slice(rule.drivers);
        }
    }

    selected.extend_from_slice(&UNIVERSAL_DRIVERS);
    selected
}

/// Persistable records for the selected drivers
pub fn driver_records(analysis_id: Uuid, drivers: &[DriverTemplate]) -> Vec<MentalDriverRecord> {
    let now = chrono::Utc::now();
    drivers
        .iter()
        .map(|driver| MentalDriverRecord {
            id: Uuid::new_v4(),
            analysis_id,
            driver_name: driver.name.to_string(),
            driver_category: DEFAULT_CATEGORY.to_string(),
            trigger_phrase: driver.trigger.to_string(),
            activation_phrase: driver.activation.to_string(),
            effectiveness_score: DEFAULT_EFFECTIVENESS,
            examples: Vec::new(),
            created_at: now,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::drivers::{
        AMBICAO_EXPANDIDA, AMBIENTE_VAMPIRO, CUSTO_INVISIVEL, DIAGNOSTICO_BRUTAL, MENTOR_SALVADOR,
        RELOGIO_PSICOLOGICO, TROFEU_SECRETO,
    };

    #[test]
    fn test_entrepreneurs_get_business_and_universal_drivers() {
        let drivers = select_drivers("Empreendedores digitais");
        assert_eq!(
            drivers,
            vec![
                AMBICAO_EXPANDIDA,
                DIAGNOSTICO_BRUTAL,
                CUSTO_INVISIVEL,
                RELOGIO_PSICOLOGICO,
                TROFEU_SECRETO
            ]
        );
    }

    #[test]
    fn test_unmatched_audience_gets_universal_only() {
        assert_eq!(select_drivers("Estudantes"), UNIVERSAL_DRIVERS.to_vec());
        assert_eq!(select_drivers(""), UNIVERSAL_DRIVERS.to_vec());
    }

    #[test]
    fn test_both_rules_fire_in_order() {
        let drivers = select_drivers("Gestores de negócio");
        let keys: Vec<_> = drivers.iter().map(|d| d.key).collect();
        assert_eq!(
            keys,
            vec![
                AMBICAO_EXPANDIDA.key,
                DIAGNOSTICO_BRUTAL.key,
                CUSTO_INVISIVEL.key,
                MENTOR_SALVADOR.key,
                AMBIENTE_VAMPIRO.key,
                RELOGIO_PSICOLOGICO.key,
                TROFEU_SECRETO.key
            ]
        );
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert_eq!(select_drivers("LIDERES"), select_drivers("lideres"));
        assert_eq!(select_drivers("LIDERES").len(), 4);
    }

    #[test]
    fn test_selection_ignores_product_text() {
        // Only the audience is an input
        assert_eq!(select_drivers("empreendedor").len(), 5);
    }

    #[test]
    fn test_records_use_default_category_and_score() {
        let analysis_id = Uuid::new_v4();
        let records = driver_records(analysis_id, &select_drivers("empreendedor"));

        assert_eq!(records.len(), 5);
        for record in &records {
            assert_eq!(record.analysis_id, analysis_id);
            assert_eq!(record.driver_category, "Geral");
            assert_eq!(record.effectiveness_score, 85);
            assert!(record.examples.is_empty());
        }
        assert_eq!(records[0].driver_name, AMBICAO_EXPANDIDA.name);
    }
}
