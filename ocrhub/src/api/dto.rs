//! Request bodies accepted by the OCR endpoints.

use serde::Deserialize;
use utoipa::ToSchema;

/// `POST /GetOcr` as `multipart/form-data`.
///
/// Only used for the OpenAPI document; the handler reads the parts itself.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct OcrUploadForm {
    /// Image file (PNG, JPEG, BMP, TIFF, WebP, ...).
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// One of the identifiers from `GET /GetOcrList`.
    #[schema(example = "tesseract")]
    pub engine: String,
    /// `false` forces CPU for this request. Ignored when no GPU is present.
    pub use_gpu: Option<bool>,
}

/// `POST /GetOcr` as `application/json`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct OcrJsonRequest {
    /// Base64 image bytes; a `data:` URL prefix is accepted.
    pub file: String,
    #[schema(example = "easyocr")]
    pub engine: String,
    #[serde(default)]
    pub use_gpu: Option<bool>,
}

/// `POST /ocr`, the deprecated batch form.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LegacyOcrRequest {
    pub file: String,
    #[schema(example = json!(["tesseract", "easyocr"]))]
    pub engines: Vec<String>,
    #[serde(default)]
    pub use_gpu: Option<bool>,
}

/// Error body shared by every failing endpoint.
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct ErrorBody {
    #[schema(example = "Unsupported OCR engine: kraken")]
    pub error: String,
    #[schema(example = 400)]
    pub code: u16,
}
