use async_trait::async_trait;

use super::bridge::BridgeRunner;
use super::engine::Engine;
use super::tesseract::TesseractBackend;
use crate::config::EngineConfig;
use crate::error::Result;

/// An image ready to be handed to an engine: PNG-encoded, plus its size.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// What an engine hands back before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum RawOutput {
    /// Whole-image recognition returning a single string.
    Text(String),
    /// Structured per-line output, in the engine's own shape.
    Json(serde_json::Value),
}

/// Availability of one engine, as reported by `/health`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Ready,
    Unavailable(String),
}

/// Seam between dispatch and the external OCR providers.
#[async_trait]
pub trait EngineBackend: Send + Sync {
    async fn invoke(&self, engine: Engine, image: &PreparedImage, use_gpu: bool)
        -> Result<RawOutput>;

    fn availability(&self, engine: Engine) -> Availability;
}

/// Production backend: Tesseract in-process, everything else via the bridge.
pub struct NativeBackend {
    tesseract: TesseractBackend,
    bridge: BridgeRunner,
}

impl NativeBackend {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            tesseract: TesseractBackend::new(config),
            bridge: BridgeRunner::new(config),
        }
    }
}

#[async_trait]
impl EngineBackend for NativeBackend {
    async fn invoke(
        &self,
        engine: Engine,
        image: &PreparedImage,
        use_gpu: bool,
    ) -> Result<RawOutput> {
        if engine.uses_bridge() {
            self.bridge
                .run(engine, &image.png, use_gpu)
                .await
                .map(RawOutput::Json)
        } else {
            self.tesseract.recognize(&image.png).await.map(RawOutput::Text)
        }
    }

    fn availability(&self, engine: Engine) -> Availability {
        if engine.uses_bridge() {
            self.bridge.availability()
        } else {
            self.tesseract.availability()
        }
    }
}
