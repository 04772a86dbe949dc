//! Read-only catalogs backing the content generators
//!
//! All tables are `const` data compiled into the binary.

pub mod drivers;
pub mod objections;
pub mod provi;

pub use drivers::{DriverTemplate, MENTAL_DRIVERS};
pub use objections::{ObjectionTemplate, HIDDEN_OBJECTIONS, NEUTRALIZERS, PRIMARY_OBJECTIONS};
pub use provi::{VisualDemoTemplate, VISUAL_DEMOS};
