use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrHubError {
    #[error("Image decoding error: {0}")]
    ImageDecode(String),

    #[error("Unsupported OCR engine: {0}")]
    UnsupportedEngine(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),

    #[error("OCR engine error: {0}")]
    Engine(String),

    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Timed out after {waited_secs} seconds waiting for a free OCR slot")]
    QueueTimeout { waited_secs: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl OcrHubError {
    pub fn status(&self) -> StatusCode {
        match self {
            OcrHubError::ImageDecode(_)
            | OcrHubError::UnsupportedEngine(_)
            | OcrHubError::Validation(_) => StatusCode::BAD_REQUEST,
            OcrHubError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            OcrHubError::EngineUnavailable(_) | OcrHubError::QueueTimeout { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            OcrHubError::Engine(_) | OcrHubError::Io(_) | OcrHubError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for OcrHubError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            OcrHubError::ImageDecode(_)
            | OcrHubError::UnsupportedEngine(_)
            | OcrHubError::PayloadTooLarge(_) => self.to_string(),
            OcrHubError::Validation(msg) => msg.clone(),
            OcrHubError::EngineUnavailable(_) | OcrHubError::QueueTimeout { .. } => {
                tracing::warn!(error = %self, "OCR request could not be served");
                self.to_string()
            }
            internal @ (OcrHubError::Engine(_)
            | OcrHubError::Io(_)
            | OcrHubError::Internal(_)) => {
                tracing::error!(error = %internal, "Internal error while serving OCR request");
                "An internal error occurred while running OCR".to_string()
            }
        };

        let body = Json(json!({
            "error": message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, OcrHubError>;

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn unsupported_engine_names_identifier() {
        let response = OcrHubError::UnsupportedEngine("kraken".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert_eq!(json["code"], 400);
        assert!(json["error"].as_str().unwrap().contains("kraken"));
    }

    #[tokio::test]
    async fn image_decode_is_client_error() {
        let response = OcrHubError::ImageDecode("invalid base64".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("invalid base64"));
    }

    #[tokio::test]
    async fn engine_failure_does_not_leak_details() {
        let response =
            OcrHubError::Engine("CUDA out of memory at 0xdeadbeef".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let json = body_json(response).await;
        let message = json["error"].as_str().unwrap();
        assert!(!message.contains("CUDA"));
        assert!(!message.contains("deadbeef"));
    }

    #[test]
    fn unavailable_and_timeout_map_to_503() {
        assert_eq!(
            OcrHubError::EngineUnavailable("tesseract".into()).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            OcrHubError::QueueTimeout { waited_secs: 3 }.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
