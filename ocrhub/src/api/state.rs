use std::sync::Arc;

use crate::config::Config;
use crate::ocr::OcrService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ocr: OcrService,
}

impl AppState {
    pub fn new(config: Config, ocr: OcrService) -> Self {
        Self {
            config: Arc::new(config),
            ocr,
        }
    }
}
