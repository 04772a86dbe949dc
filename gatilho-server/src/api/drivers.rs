//! GET /api/drivers - the static driver catalog

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::catalog::{DriverTemplate, MENTAL_DRIVERS};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct DriverCatalogResponse {
    pub drivers: &'static [DriverTemplate],
    pub total: usize,
}

pub async fn list_drivers() -> Json<DriverCatalogResponse> {
    Json(DriverCatalogResponse {
        drivers: &MENTAL_DRIVERS,
        total: MENTAL_DRIVERS.len(),
    })
}

pub fn driver_routes() -> Router<AppState> {
    Router::new().route("/api/drivers", get(list_drivers))
}
