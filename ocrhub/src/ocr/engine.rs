use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OcrHubError;

/// The closed set of OCR engines this service can dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
pub enum Engine {
    #[serde(rename = "easyocr")]
    EasyOcr,
    #[serde(rename = "tesseract")]
    Tesseract,
    #[serde(rename = "paddleocr")]
    PaddleOcr,
    #[serde(rename = "suryaocr")]
    SuryaOcr,
}

impl Engine {
    /// Every supported engine, in the order `GetOcrList` reports them.
    pub const ALL: [Engine; 4] = [
        Engine::EasyOcr,
        Engine::Tesseract,
        Engine::PaddleOcr,
        Engine::SuryaOcr,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Engine::EasyOcr => "easyocr",
            Engine::Tesseract => "tesseract",
            Engine::PaddleOcr => "paddleocr",
            Engine::SuryaOcr => "suryaocr",
        }
    }

    /// Engines that are reached through the Python bridge process.
    pub fn uses_bridge(&self) -> bool {
        !matches!(self, Engine::Tesseract)
    }

    pub fn identifiers() -> Vec<&'static str> {
        Self::ALL.iter().map(Engine::as_str).collect()
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Engine {
    type Err = OcrHubError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|engine| engine.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                OcrHubError::UnsupportedEngine(format!(
                    "{wanted} (available: {})",
                    Self::identifiers().join(", ")
                ))
            })
    }
}
