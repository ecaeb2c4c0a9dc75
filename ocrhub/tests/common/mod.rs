//! Shared helpers for router-level tests.
//!
//! The engines are replaced with [`ScriptedBackend`], so these tests need
//! neither Tesseract data files nor the Python bridge.

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use image::{ImageFormat, Rgb, RgbImage};
use serde_json::{json, Value};

use ocrhub::api::{create_router, AppState};
use ocrhub::config::Config;
use ocrhub::device::DeviceConfig;
use ocrhub::error::{OcrHubError, Result};
use ocrhub::ocr::{Availability, Engine, EngineBackend, OcrGate, OcrService, PreparedImage, RawOutput};

pub const BOUNDARY: &str = "ocrhub-test-boundary";

static INIT: Once = Once::new();

/// Initialize tracing subscriber once for tests
pub fn init_test_logger() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Stand-in engines with fixed outputs and a short artificial delay.
///
/// Surya is reported unavailable so the 503 path can be exercised.
#[derive(Default)]
pub struct ScriptedBackend {
    pub calls: AtomicUsize,
    running: AtomicUsize,
    pub max_running: AtomicUsize,
    pub delay: Duration,
}

impl ScriptedBackend {
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::default()
        }
    }
}

#[async_trait]
impl EngineBackend for ScriptedBackend {
    async fn invoke(&self, engine: Engine, _image: &PreparedImage, _use_gpu: bool) -> Result<RawOutput> {
        if let Availability::Unavailable(reason) = self.availability(engine) {
            return Err(OcrHubError::EngineUnavailable(reason));
        }

        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.running.fetch_sub(1, Ordering::SeqCst);

        Ok(match engine {
            // Blank page: Tesseract emits only a form feed.
            Engine::Tesseract => RawOutput::Text("\u{c}".to_string()),
            Engine::EasyOcr => RawOutput::Json(json!([
                [[[0, 0], [40, 0], [40, 10], [0, 10]], "Hello", 0.97],
                [[[0, 12], [40, 12], [40, 22], [0, 22]], "world", 0.93]
            ])),
            Engine::PaddleOcr => RawOutput::Json(json!([null])),
            Engine::SuryaOcr => RawOutput::Json(json!([])),
        })
    }

    fn availability(&self, engine: Engine) -> Availability {
        match engine {
            Engine::SuryaOcr => Availability::Unavailable("surya models not installed".to_string()),
            _ => Availability::Ready,
        }
    }
}

pub struct TestApp {
    pub router: Router,
    pub ocr: OcrService,
    pub backend: Arc<ScriptedBackend>,
}

pub fn test_app(backend: ScriptedBackend) -> TestApp {
    test_app_with_config(backend, Config::default())
}

pub fn test_app_with_config(backend: ScriptedBackend, config: Config) -> TestApp {
    init_test_logger();
    let backend = Arc::new(backend);
    let gate = OcrGate::new(config.ocr.max_concurrency, None);
    let ocr = OcrService::new(backend.clone(), gate, DeviceConfig::cpu_only(), false);
    let router = create_router(AppState::new(config, ocr.clone()));
    TestApp { router, ocr, backend }
}

/// A solid white PNG.
pub fn blank_png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .expect("encode test PNG");
    png
}

/// Build a multipart body; `file` is sent as an `image/png` upload.
pub fn multipart_body(file: Option<&[u8]>, fields: &[(&str, &str)]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some(bytes) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"page.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn multipart_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .expect("build multipart request")
}

pub fn json_request(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("build JSON request")
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("build GET request")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("body is JSON")
}
