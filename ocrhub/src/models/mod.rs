mod ocr;

pub use ocr::{AvailableEngines, BatchOcrResponse, OcrResponse, OcrResult};
