//! Database queries for gatilho-server
//!
//! Schema lives in `gatilho_common::db::init`.

pub mod analyses;
pub mod children;
