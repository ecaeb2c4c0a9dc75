use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::AppState;
use crate::device::DeviceConfig;
use crate::ocr::{Availability, Engine};

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HealthData {
    /// `ok` when every engine is ready, `degraded` otherwise.
    pub status: String,
    pub version: String,
    pub device: DeviceConfig,
    pub preprocessing: bool,
    pub gate: GateStatus,
    pub engines: Vec<EngineStatus>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct GateStatus {
    pub capacity: usize,
    pub in_flight: usize,
    /// Highest concurrency observed since startup.
    pub peak: usize,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct EngineStatus {
    pub engine: Engine,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// `GET /health`
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service health status", body = HealthData),
    )
)]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthData> {
    let engines: Vec<EngineStatus> = Engine::ALL
        .iter()
        .map(|&engine| match state.ocr.availability(engine) {
            Availability::Ready => EngineStatus {
                engine,
                status: "ready".to_string(),
                reason: None,
            },
            Availability::Unavailable(reason) => EngineStatus {
                engine,
                status: "unavailable".to_string(),
                reason: Some(reason),
            },
        })
        .collect();

    let status = if engines.iter().all(|e| e.reason.is_none()) {
        "ok"
    } else {
        "degraded"
    };

    let gate = state.ocr.gate();
    Json(HealthData {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        device: state.ocr.device(),
        preprocessing: state.ocr.preprocessing_enabled(),
        gate: GateStatus {
            capacity: gate.capacity(),
            in_flight: gate.in_flight(),
            peak: gate.peak(),
        },
        engines,
    })
}
