use serde::Deserialize;
use std::env;

pub(crate) fn parse_env_or<T: std::str::FromStr>(var: &str, default: T) -> T
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) => match val.parse() {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Using default.", val, var, e);
                default
            }
        },
        Err(_) => default,
    }
}

fn parse_env_opt<T: std::str::FromStr>(var: &str) -> Option<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(var) {
        Ok(val) if val.trim().is_empty() => None,
        Ok(val) => match val.parse() {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Invalid value '{}' for {}: {}. Ignoring.", val, var, e);
                None
            }
        },
        Err(_) => None,
    }
}

/// Lenient boolean parsing for flags such as `USE_GPU`.
///
/// Accepts `true/false`, `1/0`, `yes/no` and `on/off` in any case.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_bool(var: &str, default: bool) -> bool {
    match env::var(var) {
        Ok(val) => parse_bool(&val).unwrap_or_else(|| {
            tracing::warn!("Invalid boolean '{}' for {}. Using default.", val, var);
            default
        }),
        Err(_) => default,
    }
}

fn env_list(var: &str, default: &str) -> Vec<String> {
    let raw = env::var(var).unwrap_or_else(|_| default.to_string());
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
    pub engines: EngineConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    /// GPU preference. Only honoured when a device is detected at startup.
    pub use_gpu: bool,
    /// Run the denoise/sharpen/binarize pipeline before dispatch.
    pub preprocess: bool,
    pub max_concurrency: usize,
    /// `None` means callers wait for a permit indefinitely.
    pub queue_timeout_secs: Option<u64>,
}

/// Per-engine settings for the external OCR providers.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Program and leading arguments used to reach the Python engines.
    pub bridge_command: Vec<String>,
    pub tessdata_path: Option<String>,
    pub tesseract_languages: String,
    pub easyocr_languages: Vec<String>,
    pub paddleocr_language: String,
    pub surya_languages: Vec<String>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            use_gpu: false,
            preprocess: false,
            max_concurrency: 5,
            queue_timeout_secs: None,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bridge_command: vec!["python3".to_string(), "scripts/ocr_bridge.py".to_string()],
            tessdata_path: None,
            tesseract_languages: "rus+eng".to_string(),
            easyocr_languages: vec!["ru".to_string(), "en".to_string()],
            paddleocr_language: "en".to_string(),
            surya_languages: vec!["ru".to_string(), "en".to_string()],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let ocr_defaults = OcrConfig::default();
        let engine_defaults = EngineConfig::default();

        Self {
            server: ServerConfig {
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or("PORT", 8000),
                max_upload_bytes: parse_env_or("MAX_UPLOAD_BYTES", 20 * 1024 * 1024),
            },
            ocr: OcrConfig {
                use_gpu: env_bool("USE_GPU", ocr_defaults.use_gpu),
                preprocess: env_bool("OCR_PREPROCESS", ocr_defaults.preprocess),
                max_concurrency: parse_env_or("OCR_MAX_CONCURRENCY", ocr_defaults.max_concurrency)
                    .max(1),
                queue_timeout_secs: parse_env_opt("OCR_QUEUE_TIMEOUT"),
            },
            engines: EngineConfig {
                bridge_command: env::var("OCR_BRIDGE_COMMAND")
                    .map(|cmd| cmd.split_whitespace().map(String::from).collect())
                    .ok()
                    .filter(|parts: &Vec<String>| !parts.is_empty())
                    .unwrap_or(engine_defaults.bridge_command),
                tessdata_path: env::var("TESSDATA_PREFIX").ok(),
                tesseract_languages: env::var("TESSERACT_LANGUAGES")
                    .unwrap_or(engine_defaults.tesseract_languages),
                easyocr_languages: env_list("EASYOCR_LANGUAGES", "ru,en"),
                paddleocr_language: env::var("PADDLEOCR_LANGUAGE")
                    .unwrap_or(engine_defaults.paddleocr_language),
                surya_languages: env_list("SURYA_LANGUAGES", "ru,en"),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default()
    }
}
