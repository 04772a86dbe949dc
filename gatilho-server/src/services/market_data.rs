//! Market data generator
//!
//! Stands in for a web search: the competitor list comes from the request,
//! everything else is static apart from a random search volume.

use crate::workflow::PipelineError;
use rand::Rng;
use serde::Serialize;
use std::ops::Range;
use std::time::Duration;

/// Search volume is drawn from this half-open range
pub const SEARCH_VOLUME_RANGE: Range<u32> = 1000..11000;

pub const MARKET_TRENDS: [&str; 3] = ["Marketing Digital", "Psicologia de Vendas", "Automação"];

pub const COMPETITION_LEVEL: &str = "Médio-Alto";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketData {
    pub competitors: Vec<String>,
    pub market_trends: Vec<String>,
    pub search_volume: u32,
    pub competition_level: String,
}

/// Split a comma-separated competitor field, trimming each entry
///
/// Order is preserved and blank entries are kept, so `""` yields `[""]`.
pub fn parse_competitors(raw: &str) -> Vec<String> {
    raw.split(',').map(|name| name.trim().to_string()).collect()
}

/// Assemble market data with a caller-supplied random source
pub fn build_market_data<R: Rng>(competitors: &str, rng: &mut R) -> MarketData {
    MarketData {
        competitors: parse_competitors(competitors),
        market_trends: MARKET_TRENDS.iter().map(|t| t.to_string()).collect(),
        search_volume: rng.gen_range(SEARCH_VOLUME_RANGE),
        competition_level: COMPETITION_LEVEL.to_string(),
    }
}

/// DATA_COLLECTION phase worker
#[derive(Debug, Clone)]
pub struct MarketDataCollector {
    delay: Duration,
}

impl MarketDataCollector {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Collect market data after the simulated search delay
    ///
    /// A missing competitor field fails the phase.
    pub async fn collect(&self, competitors: Option<&str>) -> Result<MarketData, PipelineError> {
        let competitors = competitors.ok_or_else(|| {
            PipelineError::InvalidInput("campo de concorrentes ausente".to_string())
        })?;

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        Ok(build_market_data(competitors, &mut rand::thread_rng()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_competitors_trimmed_in_order() {
        assert_eq!(parse_competitors("A, B, C"), vec!["A", "B", "C"]);
        assert_eq!(parse_competitors("  ConcA ,ConcB  "), vec!["ConcA", "ConcB"]);
    }

    #[test]
    fn test_blank_competitor_entries_kept() {
        assert_eq!(parse_competitors(""), vec![""]);
        assert_eq!(parse_competitors("A,, ,B"), vec!["A", "", "", "B"]);
    }

    #[test]
    fn test_search_volume_always_in_range() {
        let mut rng = rand::thread_rng();
        for _ in 0..10_000 {
            let data = build_market_data("A", &mut rng);
            assert!(SEARCH_VOLUME_RANGE.contains(&data.search_volume));
        }
    }

    #[test]
    fn test_static_fields() {
        let data = build_market_data("A", &mut rand::thread_rng());
        assert_eq!(data.market_trends, MARKET_TRENDS);
        assert_eq!(data.competition_level, COMPETITION_LEVEL);
    }

    #[test]
    fn test_wire_field_names() {
        let value = serde_json::to_value(build_market_data("A", &mut rand::thread_rng())).unwrap();
        assert!(value.get("marketTrends").is_some());
        assert!(value.get("searchVolume").is_some());
        assert!(value.get("competitionLevel").is_some());
    }

    #[tokio::test]
    async fn test_collect_without_competitors_fails() {
        let collector = MarketDataCollector::new(Duration::ZERO);
        let err = collector.collect(None).await.unwrap_err();
        assert!(matches!(err, PipelineError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_collect_keeps_empty_competitor_field() {
        let collector = MarketDataCollector::new(Duration::ZERO);
        let data = collector.collect(Some("")).await.unwrap();
        assert_eq!(data.competitors, vec![""]);
    }

    #[tokio::test]
    async fn test_collect_with_competitors() {
        let collector = MarketDataCollector::new(Duration::ZERO);
        let data = collector.collect(Some("A, B, C")).await.unwrap();
        assert_eq!(data.competitors, vec!["A", "B", "C"]);
    }
}
