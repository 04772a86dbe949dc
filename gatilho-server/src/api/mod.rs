//! HTTP and WebSocket API

pub mod analysis;
pub mod drivers;
pub mod health;
pub mod sse;
pub mod ws;

pub use analysis::analysis_routes;
pub use drivers::driver_routes;
pub use health::health_routes;
pub use ws::ws_routes;
