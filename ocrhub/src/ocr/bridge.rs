//! Out-of-process runner for the Python-only engines.
//!
//! easyocr, PaddleOCR and Surya are reached through a bridge command
//! (`scripts/ocr_bridge.py` by default). Each call writes the image to a
//! temporary PNG and runs:
//!
//! ```text
//! <command...> --engine <id> --image <path> --lang <langs> [--gpu]
//! ```
//!
//! The bridge prints the engine's raw result as JSON on stdout. Anything the
//! engine libraries log before that is tolerated as long as the last
//! non-empty line is the JSON document.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, instrument, warn};

use super::backend::Availability;
use super::engine::Engine;
use crate::config::EngineConfig;
use crate::error::{OcrHubError, Result};

const STDERR_TAIL_CHARS: usize = 2000;

pub struct BridgeRunner {
    program: Option<String>,
    args: Vec<String>,
    easyocr_languages: String,
    paddleocr_language: String,
    surya_languages: String,
    availability: Availability,
}

impl BridgeRunner {
    pub fn new(config: &EngineConfig) -> Self {
        let mut parts = config.bridge_command.iter().cloned();
        let program = parts.next();
        let args: Vec<String> = parts.collect();

        let availability = match &program {
            None => Availability::Unavailable("OCR bridge command is empty".to_string()),
            Some(program) if resolve_program(program).is_none() => {
                let reason = format!("OCR bridge program '{program}' not found");
                warn!("{}", reason);
                Availability::Unavailable(reason)
            }
            Some(_) => Availability::Ready,
        };

        Self {
            program,
            args,
            easyocr_languages: config.easyocr_languages.join(","),
            paddleocr_language: config.paddleocr_language.clone(),
            surya_languages: config.surya_languages.join(","),
            availability,
        }
    }

    pub fn availability(&self) -> Availability {
        self.availability.clone()
    }

    fn languages_for(&self, engine: Engine) -> &str {
        match engine {
            Engine::EasyOcr => &self.easyocr_languages,
            Engine::PaddleOcr => &self.paddleocr_language,
            Engine::SuryaOcr => &self.surya_languages,
            Engine::Tesseract => "",
        }
    }

    #[instrument(level = "debug", skip(self, png), fields(bytes = png.len()))]
    pub async fn run(&self, engine: Engine, png: &[u8], use_gpu: bool) -> Result<serde_json::Value> {
        let program = match (&self.program, &self.availability) {
            (Some(program), Availability::Ready) => program,
            (_, Availability::Unavailable(reason)) => {
                return Err(OcrHubError::EngineUnavailable(reason.clone()))
            }
            (None, _) => {
                return Err(OcrHubError::EngineUnavailable(
                    "OCR bridge command is empty".to_string(),
                ))
            }
        };

        let input = tempfile::Builder::new()
            .prefix("ocrhub-")
            .suffix(".png")
            .tempfile()?;
        tokio::fs::write(input.path(), png).await?;

        let mut command = Command::new(program);
        command
            .args(&self.args)
            .arg("--engine")
            .arg(engine.as_str())
            .arg("--image")
            .arg(input.path())
            .arg("--lang")
            .arg(self.languages_for(engine))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if use_gpu {
            command.arg("--gpu");
        }

        let output = command
            .output()
            .await
            .map_err(|e| OcrHubError::Engine(format!("cannot run OCR bridge for {engine}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrHubError::Engine(format!(
                "OCR bridge for {engine} exited with {}: {}",
                output.status,
                tail(stderr.trim(), STDERR_TAIL_CHARS)
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        debug!(engine = %engine, stdout_bytes = output.stdout.len(), "OCR bridge finished");
        parse_bridge_output(&stdout).map_err(|e| {
            OcrHubError::Engine(format!("OCR bridge for {engine} produced invalid JSON: {e}"))
        })
    }
}

/// Parse the bridge's stdout, falling back to the last non-empty line when
/// the engine libraries printed progress output first.
fn parse_bridge_output(stdout: &str) -> std::result::Result<serde_json::Value, serde_json::Error> {
    match serde_json::from_str(stdout.trim()) {
        Ok(value) => Ok(value),
        Err(whole_err) => match stdout.lines().rev().find(|line| !line.trim().is_empty()) {
            Some(last) => serde_json::from_str(last.trim()).map_err(|_| whole_err),
            None => Err(whole_err),
        },
    }
}

fn tail(text: &str, max_chars: usize) -> &str {
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    let skip = count - max_chars;
    match text.char_indices().nth(skip) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}

/// Locate `program` the way a shell would: paths are checked directly, bare
/// names are searched on `PATH`.
fn resolve_program(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }

    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .map(|dir| dir.join(program))
        .find(|full| full.is_file())
}
