//! Turning request payloads into a decoded bitmap.

use base64::Engine as _;
use image::{ImageReader, RgbImage};

use crate::error::{OcrHubError, Result};

/// Decode a base64 image payload.
///
/// Both bare base64 and `data:<mime>;base64,<payload>` URLs are accepted, since
/// browsers hand out the latter from `FileReader.readAsDataURL`.
pub fn decode_base64(payload: &str) -> Result<Vec<u8>> {
    let trimmed = payload.trim();
    let encoded = match trimmed.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(',')
            .map(|(_, data)| data)
            .ok_or_else(|| OcrHubError::ImageDecode("malformed data URL".to_string()))?,
        None => trimmed,
    };

    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(OcrHubError::ImageDecode("image payload is empty".to_string()));
    }

    base64::engine::general_purpose::STANDARD
        .decode(compact.as_bytes())
        .map_err(|e| OcrHubError::ImageDecode(format!("invalid base64: {e}")))
}

/// Decode image bytes into an RGB8 bitmap.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage> {
    if bytes.is_empty() {
        return Err(OcrHubError::ImageDecode("image payload is empty".to_string()));
    }

    if let Some(kind) = infer::get(bytes) {
        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(OcrHubError::ImageDecode(format!(
                "payload is {}, not an image",
                kind.mime_type()
            )));
        }
    }

    let reader = ImageReader::new(std::io::Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| OcrHubError::ImageDecode(format!("failed to read image: {e}")))?;

    if reader.format().is_none() {
        return Err(OcrHubError::ImageDecode(
            "unrecognized image container".to_string(),
        ));
    }

    let img = reader
        .decode()
        .map_err(|e| OcrHubError::ImageDecode(format!("failed to decode image: {e}")))?;

    Ok(img.to_rgb8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

    fn encode(img: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut output = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut output), format)
            .unwrap();
        output
    }

    #[test]
    fn test_decode_plain_base64() {
        let bytes = decode_base64("aGVsbG8=").unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn test_decode_data_url() {
        let bytes = decode_base64("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn test_decode_base64_ignores_line_breaks() {
        let bytes = decode_base64("aGVs\nbG8=\n").unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn test_malformed_base64_is_decode_error() {
        let err = decode_base64("not base64!!").unwrap_err();
        assert!(matches!(err, OcrHubError::ImageDecode(_)));
        assert!(err.to_string().contains("invalid base64"));
    }

    #[test]
    fn test_empty_base64_is_decode_error() {
        assert!(matches!(
            decode_base64("   "),
            Err(OcrHubError::ImageDecode(_))
        ));
        assert!(matches!(
            decode_base64("data:image/png;base64,"),
            Err(OcrHubError::ImageDecode(_))
        ));
    }

    #[test]
    fn test_data_url_without_comma() {
        assert!(matches!(
            decode_base64("data:image/png;base64"),
            Err(OcrHubError::ImageDecode(_))
        ));
    }

    #[test]
    fn test_decode_png_to_rgb() {
        let png = encode(DynamicImage::new_rgb8(32, 16), ImageFormat::Png);
        let img = decode_image(&png).unwrap();
        assert_eq!(img.dimensions(), (32, 16));
    }

    #[test]
    fn test_decode_rgba_drops_alpha() {
        let rgba = RgbaImage::from_pixel(4, 4, Rgba([10, 20, 30, 0]));
        let png = encode(DynamicImage::ImageRgba8(rgba), ImageFormat::Png);
        let img = decode_image(&png).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [10, 20, 30]);
    }

    #[test]
    fn test_decode_jpeg() {
        let jpeg = encode(DynamicImage::new_rgb8(20, 20), ImageFormat::Jpeg);
        assert!(decode_image(&jpeg).is_ok());
    }

    #[test]
    fn test_garbage_bytes_are_decode_error() {
        let err = decode_image(&[0u8, 1, 2, 3, 4, 5]).unwrap_err();
        assert!(matches!(err, OcrHubError::ImageDecode(_)));
    }

    #[test]
    fn test_non_image_container_is_rejected() {
        let err = decode_image(b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n").unwrap_err();
        assert!(matches!(err, OcrHubError::ImageDecode(_)));
    }

    #[test]
    fn test_truncated_png_is_decode_error() {
        let png = encode(DynamicImage::new_rgb8(64, 64), ImageFormat::Png);
        let err = decode_image(&png[..png.len() / 2]).unwrap_err();
        assert!(matches!(err, OcrHubError::ImageDecode(_)));
    }

    #[test]
    fn test_empty_bytes() {
        assert!(matches!(decode_image(&[]), Err(OcrHubError::ImageDecode(_))));
    }
}
