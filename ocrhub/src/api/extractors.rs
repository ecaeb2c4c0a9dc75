use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;

use crate::error::OcrHubError;

/// `Json` extractor whose rejections come back in the service's error shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(OcrHubError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for OcrHubError {
    fn from(rejection: JsonRejection) -> Self {
        map_json_rejection(rejection)
    }
}

impl From<MultipartRejection> for OcrHubError {
    fn from(rejection: MultipartRejection) -> Self {
        OcrHubError::Validation(format!("Invalid multipart request: {}", rejection.body_text()))
    }
}

impl From<MultipartError> for OcrHubError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return OcrHubError::PayloadTooLarge(err.body_text());
        }
        OcrHubError::Validation(format!("Failed to read multipart body: {}", err.body_text()))
    }
}

fn map_json_rejection(rejection: JsonRejection) -> OcrHubError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let message = err.body_text();
            if let Some(field) = extract_missing_field(&message) {
                OcrHubError::Validation(format!("Missing required field: {field}"))
            } else {
                OcrHubError::Validation(format!("Invalid JSON: {message}"))
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            OcrHubError::Validation(format!("JSON syntax error: {}", err.body_text()))
        }
        JsonRejection::MissingJsonContentType(_) => {
            OcrHubError::Validation("Missing `Content-Type: application/json` header".to_string())
        }
        JsonRejection::BytesRejection(err) if err.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            OcrHubError::PayloadTooLarge(err.body_text())
        }
        JsonRejection::BytesRejection(err) => {
            OcrHubError::Validation(format!("Failed to read request body: {}", err.body_text()))
        }
        _ => OcrHubError::Validation(rejection.body_text()),
    }
}

fn extract_missing_field(message: &str) -> Option<&str> {
    let prefix = "missing field `";
    let start = message.find(prefix)? + prefix.len();
    let remaining = message.get(start..)?;
    let end = remaining.find('`')?;
    remaining.get(..end)
}
