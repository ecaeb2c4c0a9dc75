//! OCR endpoints.
//!
//! `POST /GetOcr` is the canonical contract: one image, one engine, a
//! `result` object back. `POST /ocr` is the older batch form kept for
//! existing callers.

use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::header;
use axum::Json;
use tracing::{debug, warn};

use crate::api::dto::{ErrorBody, LegacyOcrRequest, OcrJsonRequest, OcrUploadForm};
use crate::api::extractors::AppJson;
use crate::api::AppState;
use crate::config::parse_bool;
use crate::error::{OcrHubError, Result};
use crate::models::{AvailableEngines, BatchOcrResponse, OcrResponse};
use crate::ocr::{decode_base64, decode_image, Engine, TextLayout};

/// A `/GetOcr` submission after the transport encoding has been stripped.
struct Submission {
    image: Vec<u8>,
    engine: String,
    use_gpu: Option<bool>,
}

/// `GET /GetOcrList`
#[utoipa::path(
    get,
    path = "/GetOcrList",
    tag = "ocr",
    responses(
        (status = 200, description = "Engines this service can dispatch to", body = AvailableEngines),
    )
)]
pub async fn get_ocr_list() -> Json<AvailableEngines> {
    Json(AvailableEngines::default())
}

/// `POST /GetOcr`
///
/// Accepts either a multipart upload (`file`, `engine`, optional `use_gpu`)
/// or a JSON body with the image base64-encoded.
#[utoipa::path(
    post,
    path = "/GetOcr",
    tag = "ocr",
    request_body(
        content_type = "multipart/form-data",
        content = OcrUploadForm,
        description = "Image upload. A JSON body shaped like OcrJsonRequest is accepted as well."
    ),
    responses(
        (status = 200, description = "Recognized text", body = OcrResponse),
        (status = 400, description = "Undecodable image, unknown engine or missing field", body = ErrorBody),
        (status = 413, description = "Upload exceeds the configured limit", body = ErrorBody),
        (status = 503, description = "Engine unavailable or OCR queue full", body = ErrorBody),
        (status = 500, description = "Engine failure", body = ErrorBody),
    )
)]
pub async fn get_ocr(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<OcrResponse>> {
    let submission = if is_multipart(&request) {
        let multipart = Multipart::from_request(request, &state).await?;
        read_upload(multipart).await?
    } else {
        let AppJson(body) = AppJson::<OcrJsonRequest>::from_request(request, &state).await?;
        Submission {
            image: decode_base64(&body.file)?,
            engine: body.engine,
            use_gpu: body.use_gpu,
        }
    };

    let engine: Engine = submission.engine.parse()?;
    let image = decode_image(&submission.image)?;
    debug!(%engine, width = image.width(), height = image.height(), "Image decoded");

    let result = state
        .ocr
        .recognize(engine, image, submission.use_gpu, TextLayout::Lines)
        .await?;

    Ok(Json(OcrResponse { result }))
}

/// `POST /ocr`
///
/// Deprecated batch form: every listed engine runs over the same image and
/// the text uses the single-line layout.
#[utoipa::path(
    post,
    path = "/ocr",
    tag = "ocr",
    request_body = LegacyOcrRequest,
    responses(
        (status = 200, description = "One result per requested engine, in request order", body = BatchOcrResponse),
        (status = 400, description = "Undecodable image, unknown engine or empty engine list", body = ErrorBody),
        (status = 503, description = "Engine unavailable or OCR queue full", body = ErrorBody),
    )
)]
pub async fn legacy_ocr(
    State(state): State<AppState>,
    AppJson(body): AppJson<LegacyOcrRequest>,
) -> Result<Json<BatchOcrResponse>> {
    warn!("POST /ocr is deprecated; use POST /GetOcr");

    if body.engines.is_empty() {
        return Err(OcrHubError::Validation(
            "At least one engine must be requested".to_string(),
        ));
    }
    let engines = body
        .engines
        .iter()
        .map(|id| id.parse::<Engine>())
        .collect::<Result<Vec<_>>>()?;

    let bytes = decode_base64(&body.file)?;
    let image = decode_image(&bytes)?;

    let results = state
        .ocr
        .recognize_many(&engines, image, body.use_gpu, TextLayout::Flat)
        .await?;

    Ok(Json(BatchOcrResponse { results }))
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| {
            value
                .trim_start()
                .to_ascii_lowercase()
                .starts_with("multipart/form-data")
        })
        .unwrap_or(false)
}

async fn read_upload(mut multipart: Multipart) -> Result<Submission> {
    let mut image = None;
    let mut engine = None;
    let mut use_gpu = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => image = Some(field.bytes().await?.to_vec()),
            "engine" => engine = Some(field.text().await?),
            "use_gpu" => {
                let raw = field.text().await?;
                let value = parse_bool(&raw).ok_or_else(|| {
                    OcrHubError::Validation(format!("Invalid use_gpu value: {raw}"))
                })?;
                use_gpu = Some(value);
            }
            other => debug!(field = other, "Ignoring unknown multipart field"),
        }
    }

    Ok(Submission {
        image: image
            .ok_or_else(|| OcrHubError::Validation("Missing required field: file".to_string()))?,
        engine: engine
            .ok_or_else(|| OcrHubError::Validation("Missing required field: engine".to_string()))?,
        use_gpu,
    })
}
