use std::sync::Arc;

use leptess::LepTess;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::backend::Availability;
use crate::config::EngineConfig;
use crate::error::{OcrHubError, Result};

enum TesseractState {
    Ready { handle: Arc<Mutex<LepTess>> },
    Unavailable { reason: String },
}

/// In-process Tesseract via leptess.
///
/// A single handle is shared behind a mutex, so Tesseract calls are serialized
/// even when the gate admits several requests at once.
pub struct TesseractBackend {
    state: TesseractState,
}

fn create_tesseract(datapath: Option<&str>, languages: &str) -> std::result::Result<LepTess, String> {
    LepTess::new(datapath, languages).map_err(|e| e.to_string())
}

impl TesseractBackend {
    pub fn new(config: &EngineConfig) -> Self {
        let state = match create_tesseract(
            config.tessdata_path.as_deref(),
            &config.tesseract_languages,
        ) {
            Ok(lt) => {
                info!(languages = %config.tesseract_languages, "Tesseract OCR initialized");
                TesseractState::Ready {
                    handle: Arc::new(Mutex::new(lt)),
                }
            }
            Err(e) => {
                let reason = format!("Tesseract not available: {e}");
                warn!("{}", reason);
                TesseractState::Unavailable { reason }
            }
        };

        Self { state }
    }

    pub fn availability(&self) -> Availability {
        match &self.state {
            TesseractState::Ready { .. } => Availability::Ready,
            TesseractState::Unavailable { reason } => Availability::Unavailable(reason.clone()),
        }
    }

    pub async fn recognize(&self, png: &[u8]) -> Result<String> {
        let handle = match &self.state {
            TesseractState::Ready { handle } => Arc::clone(handle),
            TesseractState::Unavailable { reason } => {
                return Err(OcrHubError::EngineUnavailable(reason.clone()))
            }
        };
        let bytes = png.to_vec();

        tokio::task::spawn_blocking(move || {
            let mut lt = handle.blocking_lock();
            lt.set_image_from_mem(&bytes)
                .map_err(|e| OcrHubError::Engine(format!("Failed to set image: {e}")))?;
            lt.get_utf8_text()
                .map_err(|e| OcrHubError::Engine(format!("Failed to extract text: {e}")))
        })
        .await
        .map_err(|e| OcrHubError::Engine(format!("Tesseract task panicked: {e}")))?
    }
}
