use std::sync::Arc;
use std::time::{Duration, Instant};

use image::{DynamicImage, ImageFormat, RgbImage};
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use super::backend::{Availability, EngineBackend, PreparedImage};
use super::engine::Engine;
use super::gate::OcrGate;
use super::normalize::{normalize, TextLayout};
use super::preprocessing::preprocess_image;
use crate::device::DeviceConfig;
use crate::error::{OcrHubError, Result};
use crate::models::OcrResult;

/// Dispatches decoded images to engines and normalizes what comes back.
#[derive(Clone)]
pub struct OcrService {
    backend: Arc<dyn EngineBackend>,
    gate: OcrGate,
    device: DeviceConfig,
    preprocess: bool,
}

impl OcrService {
    pub fn new(
        backend: Arc<dyn EngineBackend>,
        gate: OcrGate,
        device: DeviceConfig,
        preprocess: bool,
    ) -> Self {
        Self {
            backend,
            gate,
            device,
            preprocess,
        }
    }

    pub fn gate(&self) -> &OcrGate {
        &self.gate
    }

    pub fn device(&self) -> DeviceConfig {
        self.device
    }

    pub fn preprocessing_enabled(&self) -> bool {
        self.preprocess
    }

    pub fn availability(&self, engine: Engine) -> Availability {
        self.backend.availability(engine)
    }

    /// Run one engine over one image.
    ///
    /// Preparation happens on the blocking pool before the gate. Once a permit
    /// is granted the engine call runs in its own task that owns the permit,
    /// so a caller that goes away cannot free the slot while the engine is
    /// still working. `execution_time` covers the engine call alone.
    pub async fn recognize(
        &self,
        engine: Engine,
        image: RgbImage,
        use_gpu: Option<bool>,
        layout: TextLayout,
    ) -> Result<OcrResult> {
        let prepared = self.prepare(image).await?;
        self.run_prepared(engine, prepared, use_gpu, layout).await
    }

    /// Run several engines one after another over the same image.
    pub async fn recognize_many(
        &self,
        engines: &[Engine],
        image: RgbImage,
        use_gpu: Option<bool>,
        layout: TextLayout,
    ) -> Result<Vec<OcrResult>> {
        let prepared = self.prepare(image).await?;
        let mut results = Vec::with_capacity(engines.len());
        for &engine in engines {
            results.push(
                self.run_prepared(engine, Arc::clone(&prepared), use_gpu, layout)
                    .await?,
            );
        }
        Ok(results)
    }

    async fn run_prepared(
        &self,
        engine: Engine,
        prepared: Arc<PreparedImage>,
        use_gpu: Option<bool>,
        layout: TextLayout,
    ) -> Result<OcrResult> {
        let job_id = Uuid::new_v4();
        let use_gpu = self.device.effective(use_gpu);
        let span = info_span!(
            "ocr_job",
            %job_id,
            %engine,
            use_gpu,
            width = prepared.width,
            height = prepared.height
        );

        // Dropped callers leave the queue here without starting anything.
        let permit = self.gate.acquire().instrument(span.clone()).await?;

        let backend = Arc::clone(&self.backend);
        let job = tokio::spawn(
            async move {
                let _permit = permit;

                let started = Instant::now();
                let raw = backend.invoke(engine, &prepared, use_gpu).await?;
                let elapsed = started.elapsed();

                let text = normalize(engine, raw, layout)?;
                info!(
                    elapsed_ms = elapsed.as_millis() as u64,
                    chars = text.chars().count(),
                    "OCR finished"
                );

                Ok::<_, OcrHubError>(OcrResult::new(engine, elapsed, text))
            }
            .instrument(span),
        );

        job.await
            .map_err(|e| OcrHubError::Internal(format!("OCR job {job_id} failed: {e}")))?
    }

    async fn prepare(&self, image: RgbImage) -> Result<Arc<PreparedImage>> {
        let preprocess = self.preprocess;
        tokio::task::spawn_blocking(move || encode_prepared(image, preprocess))
            .await
            .map_err(|e| OcrHubError::Internal(format!("Image preparation task failed: {e}")))?
            .map(Arc::new)
    }
}

fn encode_prepared(image: RgbImage, preprocess: bool) -> Result<PreparedImage> {
    let dynamic = if preprocess {
        DynamicImage::ImageLuma8(preprocess_image(&image))
    } else {
        DynamicImage::ImageRgb8(image)
    };

    let mut png = Vec::new();
    dynamic
        .write_to(&mut std::io::Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| OcrHubError::Internal(format!("Failed to encode image: {e}")))?;

    Ok(PreparedImage {
        png,
        width: dynamic.width(),
        height: dynamic.height(),
    })
}

/// Format an engine duration the way results report it: seconds, two decimals.
pub fn format_execution_time(elapsed: Duration) -> String {
    format!("{:.2}", elapsed.as_secs_f64())
}
