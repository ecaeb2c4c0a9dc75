use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ocr::{format_execution_time, Engine};

/// One engine's answer for one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OcrResult {
    pub engine: Engine,
    /// Seconds spent inside the engine call, formatted with two decimals.
    #[schema(example = "0.42")]
    pub execution_time: String,
    pub text: String,
}

impl OcrResult {
    pub fn new(engine: Engine, elapsed: Duration, text: String) -> Self {
        Self {
            engine,
            execution_time: format_execution_time(elapsed),
            text,
        }
    }
}

/// `POST /GetOcr` success body.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct OcrResponse {
    pub result: OcrResult,
}

/// `POST /ocr` success body (deprecated batch contract).
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BatchOcrResponse {
    pub results: Vec<OcrResult>,
}

/// `GET /GetOcrList` body.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct AvailableEngines {
    pub available_engines: Vec<Engine>,
}

impl Default for AvailableEngines {
    fn default() -> Self {
        Self {
            available_engines: Engine::ALL.to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn result_serializes_flat_record() {
        let result = OcrResult::new(Engine::Tesseract, Duration::from_millis(1505), String::new());
        let value = serde_json::to_value(OcrResponse { result }).unwrap();
        assert_eq!(
            value,
            json!({"result": {"engine": "tesseract", "execution_time": "1.50", "text": ""}})
        );
    }

    #[test]
    fn engine_list_serializes_identifiers() {
        let value = serde_json::to_value(AvailableEngines::default()).unwrap();
        assert_eq!(
            value,
            json!({"available_engines": ["easyocr", "tesseract", "paddleocr", "suryaocr"]})
        );
    }
}
