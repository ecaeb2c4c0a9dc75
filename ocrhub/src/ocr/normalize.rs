//! Converging each engine's output shape onto a single text string.

use serde::Deserialize;
use serde_json::Value;

use super::backend::RawOutput;
use super::engine::Engine;
use crate::error::{OcrHubError, Result};

/// How recognized lines are stitched together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextLayout {
    /// One recognized line per output line.
    #[default]
    Lines,
    /// Single-line output used by the deprecated batch endpoint: lines are
    /// joined with a space and Tesseract newlines become two spaces.
    Flat,
}

impl TextLayout {
    fn separator(&self) -> &'static str {
        match self {
            TextLayout::Lines => "\n",
            TextLayout::Flat => " ",
        }
    }
}

/// easyocr `readtext` detail row: `[box, text, confidence]`.
#[derive(Debug, Deserialize)]
struct EasyOcrDetection(#[allow(dead_code)] Value, String, #[allow(dead_code)] f64);

/// PaddleOCR line: `[box, [text, confidence]]`.
#[derive(Debug, Deserialize)]
struct PaddleLine(#[allow(dead_code)] Value, (String, f64));

/// One page of PaddleOCR output. Classic `ocr()` returns a list of lines or
/// `null` for a page without detections; `predict()` returns a result map.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PaddlePage {
    Classic(Option<Vec<PaddleLine>>),
    Predict { rec_texts: Vec<String> },
}

#[derive(Debug, Deserialize)]
struct SuryaLine {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct SuryaPage {
    #[serde(default)]
    text_lines: Vec<SuryaLine>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
        }
    }
}

/// Turn raw engine output into the text field of an OCR result.
///
/// An engine that found nothing produces an empty string, not an error.
pub fn normalize(engine: Engine, raw: RawOutput, layout: TextLayout) -> Result<String> {
    match engine {
        Engine::EasyOcr => easyocr_text(expect_json(engine, raw)?, layout),
        Engine::Tesseract => tesseract_text(raw, layout),
        Engine::PaddleOcr => paddleocr_text(expect_json(engine, raw)?, layout),
        Engine::SuryaOcr => suryaocr_text(expect_json(engine, raw)?, layout),
    }
}

fn expect_json(engine: Engine, raw: RawOutput) -> Result<Value> {
    match raw {
        RawOutput::Json(value) => Ok(value),
        RawOutput::Text(_) => Err(OcrHubError::Engine(format!(
            "{engine} returned plain text where structured output was expected"
        ))),
    }
}

fn shape_error(engine: Engine, err: serde_json::Error) -> OcrHubError {
    OcrHubError::Engine(format!("unexpected {engine} output shape: {err}"))
}

fn join_lines<'a>(lines: impl Iterator<Item = &'a str>, layout: TextLayout) -> String {
    lines
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(layout.separator())
}

fn easyocr_text(value: Value, layout: TextLayout) -> Result<String> {
    if value.is_null() {
        return Ok(String::new());
    }
    let detections: Vec<EasyOcrDetection> =
        serde_json::from_value(value).map_err(|e| shape_error(Engine::EasyOcr, e))?;
    Ok(join_lines(
        detections.iter().map(|d| d.1.as_str()),
        layout,
    ))
}

fn tesseract_text(raw: RawOutput, layout: TextLayout) -> Result<String> {
    let text = match raw {
        RawOutput::Text(text) => text,
        RawOutput::Json(Value::String(text)) => text,
        RawOutput::Json(Value::Null) => String::new(),
        RawOutput::Json(other) => {
            return Err(OcrHubError::Engine(format!(
                "tesseract returned non-text output: {other}"
            )))
        }
    };

    let text = text.trim();
    Ok(match layout {
        TextLayout::Lines => text.to_string(),
        TextLayout::Flat => text.replace('\n', "  "),
    })
}

fn paddleocr_text(value: Value, layout: TextLayout) -> Result<String> {
    if value.is_null() {
        return Ok(String::new());
    }
    let pages: Vec<PaddlePage> = serde_json::from_value::<OneOrMany<PaddlePage>>(value)
        .map_err(|e| shape_error(Engine::PaddleOcr, e))?
        .into_vec();

    let texts: Vec<String> = pages
        .into_iter()
        .flat_map(|page| match page {
            PaddlePage::Classic(Some(lines)) => {
                lines.into_iter().map(|PaddleLine(_, (text, _))| text).collect()
            }
            PaddlePage::Classic(None) => Vec::new(),
            PaddlePage::Predict { rec_texts } => rec_texts,
        })
        .collect();

    Ok(join_lines(texts.iter().map(String::as_str), layout))
}

fn suryaocr_text(value: Value, layout: TextLayout) -> Result<String> {
    if value.is_null() {
        return Ok(String::new());
    }
    let pages = serde_json::from_value::<OneOrMany<SuryaPage>>(value)
        .map_err(|e| shape_error(Engine::SuryaOcr, e))?
        .into_vec();

    Ok(join_lines(
        pages
            .iter()
            .flat_map(|page| page.text_lines.iter().map(|line| line.text.as_str())),
        layout,
    ))
}
