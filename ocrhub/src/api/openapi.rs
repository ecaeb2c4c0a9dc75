use axum::Json;
use utoipa::OpenApi;
use utoipa_redoc::{Redoc, Servable};

use super::dto;
use super::handlers;
use crate::device::DeviceConfig;
use crate::models;
use crate::ocr::Engine;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ocrhub API",
        version = "0.1.0",
        description = "Run easyocr, Tesseract, PaddleOCR or Surya over an uploaded image and get the text back in one shape.",
    ),
    paths(
        handlers::ocr::get_ocr_list,
        handlers::ocr::get_ocr,
        handlers::ocr::legacy_ocr,
        handlers::health::health_check,
    ),
    components(schemas(
        Engine,
        DeviceConfig,
        models::OcrResult,
        models::OcrResponse,
        models::BatchOcrResponse,
        models::AvailableEngines,
        dto::OcrUploadForm,
        dto::OcrJsonRequest,
        dto::LegacyOcrRequest,
        dto::ErrorBody,
        handlers::health::HealthData,
        handlers::health::GateStatus,
        handlers::health::EngineStatus,
    )),
    tags(
        (name = "ocr", description = "Text recognition"),
        (name = "health", description = "Health check"),
    ),
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn redoc_router<S: Clone + Send + Sync + 'static>() -> axum::Router<S> {
    Redoc::with_url("/docs", ApiDoc::openapi()).into()
}
