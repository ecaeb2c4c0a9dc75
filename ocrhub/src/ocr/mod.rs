//! OCR dispatch.
//!
//! Engines are external capability providers. This module owns what happens
//! around them:
//! - `ingest` decodes base64/multipart payloads into an RGB bitmap
//! - `preprocessing` holds the optional denoise/sharpen/binarize pipeline
//! - `engine` is the closed set of supported engines
//! - `backend` is the seam to the providers: Tesseract runs in-process via
//!   leptess, easyocr/PaddleOCR/Surya go through the bridge process
//! - `normalize` folds each engine's output shape into a single string
//! - `gate` caps concurrent engine invocations
//! - `service` ties these together per request

mod backend;
mod bridge;
mod engine;
mod gate;
mod ingest;
mod normalize;
mod preprocessing;
mod service;
mod tesseract;

pub use backend::{Availability, EngineBackend, NativeBackend, PreparedImage, RawOutput};
pub use engine::Engine;
pub use gate::{GatePermit, OcrGate};
pub use ingest::{decode_base64, decode_image};
pub use normalize::{normalize, TextLayout};
pub use preprocessing::preprocess_image;
pub use service::{format_execution_time, OcrService};
