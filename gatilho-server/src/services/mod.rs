//! Content generators used by the stage sequencer

pub mod driver_selector;
pub mod market_data;
pub mod objection_mapper;
pub mod providers;
pub mod provi_generator;
pub mod report;
pub mod text_generator;

pub use market_data::{MarketData, MarketDataCollector};
pub use providers::{ProviderChain, ProviderError, SimulatedProvider, TextProvider};
pub use report::{assemble_report, Report, ReportInputs};
pub use text_generator::{MultiSourceGenerator, TextAnalysis};
