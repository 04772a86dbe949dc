//! # Gatilho Common Library
//!
//! Shared code for the gatilho analysis service:
//! - Domain records (analysis requests, drivers, objections, visual demos, reports)
//! - Event types for the WebSocket and SSE channels
//! - Per-analysis event registry
//! - Bootstrap configuration loading
//! - Database initialization

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod sse;
pub mod time;

pub use error::{Error, Result};
