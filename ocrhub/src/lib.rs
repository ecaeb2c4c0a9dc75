//! ocrhub: one HTTP contract in front of several OCR engines.
//!
//! The service decodes an uploaded image, optionally cleans it up, hands it
//! to the requested engine under a bounded concurrency gate and normalizes
//! whatever the engine returns into `{engine, execution_time, text}`.

pub mod api;
pub mod config;
pub mod device;
pub mod error;
pub mod models;
pub mod ocr;
