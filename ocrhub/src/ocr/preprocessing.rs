use image::imageops::{self, FilterType};
use image::{GrayImage, ImageBuffer, Luma, RgbImage};
use imageproc::contrast::otsu_level;
use imageproc::filter::median_filter;

/// Side length of the adaptive threshold neighbourhood.
const ADAPTIVE_BLOCK_SIZE: u32 = 11;
/// Constant subtracted from the weighted neighbourhood mean.
const ADAPTIVE_OFFSET: f32 = 2.0;
const UPSCALE_FACTOR: u32 = 2;

const SHARPEN_KERNEL: [f32; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];

/// Prepare a decoded bitmap for OCR.
///
/// The sequence is fixed:
/// 1. Colour-preserving denoise (3x3 median per channel)
/// 2. Grayscale conversion
/// 3. 3x3 sharpening convolution
/// 4. 2x upscale with cubic interpolation
/// 5. Adaptive Gaussian threshold
/// 6. Otsu binarization
///
/// The result contains only pure black (0) and white (255) pixels.
pub fn preprocess_image(img: &RgbImage) -> GrayImage {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return GrayImage::new(width * UPSCALE_FACTOR, height * UPSCALE_FACTOR);
    }

    let denoised = denoise(img);
    let gray = imageops::grayscale(&denoised);
    let sharpened = sharpen(&gray);
    let upscaled = upscale(&sharpened, UPSCALE_FACTOR);
    let thresholded = adaptive_gaussian_threshold(&upscaled, ADAPTIVE_BLOCK_SIZE, ADAPTIVE_OFFSET);
    binarize_otsu(&thresholded)
}

fn denoise(img: &RgbImage) -> RgbImage {
    median_filter(img, 1, 1)
}

/// Convolve with [`SHARPEN_KERNEL`], replicating border pixels.
fn sharpen(gray: &GrayImage) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }

    ImageBuffer::from_fn(width, height, |x, y| {
        let mut acc = 0.0f32;
        for ky in 0..3i64 {
            for kx in 0..3i64 {
                let sx = (x as i64 + kx - 1).clamp(0, width as i64 - 1) as u32;
                let sy = (y as i64 + ky - 1).clamp(0, height as i64 - 1) as u32;
                let weight = SHARPEN_KERNEL[(ky * 3 + kx) as usize];
                acc += weight * gray.get_pixel(sx, sy)[0] as f32;
            }
        }
        Luma([acc.round().clamp(0.0, 255.0) as u8])
    })
}

fn upscale(gray: &GrayImage, factor: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    imageops::resize(
        gray,
        width.saturating_mul(factor),
        height.saturating_mul(factor),
        FilterType::CatmullRom,
    )
}

/// Pixels brighter than the Gaussian-weighted mean of their neighbourhood
/// (minus `offset`) become white, everything else black.
fn adaptive_gaussian_threshold(gray: &GrayImage, block_size: u32, offset: f32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 {
        return gray.clone();
    }

    // Conventional sigma for a Gaussian aperture of this size.
    let sigma = 0.3 * ((block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8;
    let local_mean = imageops::blur(gray, sigma);

    ImageBuffer::from_fn(width, height, |x, y| {
        let value = gray.get_pixel(x, y)[0] as f32;
        let threshold = local_mean.get_pixel(x, y)[0] as f32 - offset;
        if value > threshold {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

fn binarize_otsu(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] > level {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn assert_binary(img: &GrayImage) {
        for pixel in img.pixels() {
            assert!(
                pixel[0] == 0 || pixel[0] == 255,
                "expected pure black/white, found {}",
                pixel[0]
            );
        }
    }

    fn text_like_image() -> RgbImage {
        let mut img = RgbImage::from_pixel(60, 30, Rgb([240, 240, 240]));
        for x in 10..50 {
            for y in 12..18 {
                img.put_pixel(x, y, Rgb([20, 20, 20]));
            }
        }
        img
    }

    #[test]
    fn test_preprocess_doubles_dimensions() {
        let img = RgbImage::from_pixel(40, 25, Rgb([255, 255, 255]));
        let processed = preprocess_image(&img);
        assert_eq!(processed.dimensions(), (80, 50));
    }

    #[test]
    fn test_preprocess_output_is_binary() {
        let processed = preprocess_image(&text_like_image());
        assert_binary(&processed);
    }

    #[test]
    fn test_blank_image_stays_white() {
        let img = RgbImage::from_pixel(32, 32, Rgb([255, 255, 255]));
        let processed = preprocess_image(&img);
        assert_binary(&processed);
        // A flat page has no foreground.
        assert!(processed.pixels().all(|p| p[0] == processed.get_pixel(0, 0)[0]));
    }

    #[test]
    fn test_dark_stroke_leaves_black_edges() {
        let processed = preprocess_image(&text_like_image());
        // Upper edge of the stroke, scaled by 2.
        assert!(processed.pixels().any(|p| p[0] == 0));
        assert_eq!(processed.get_pixel(60, 24)[0], 0);
        // Far background corner.
        assert_eq!(processed.get_pixel(2, 2)[0], 255);
    }

    #[test]
    fn test_sharpen_preserves_flat_regions() {
        let gray = GrayImage::from_pixel(8, 8, Luma([128]));
        let sharpened = sharpen(&gray);
        assert!(sharpened.pixels().all(|p| p[0] == 128));
    }

    #[test]
    fn test_sharpen_boosts_edges() {
        let mut gray = GrayImage::from_pixel(5, 5, Luma([100]));
        gray.put_pixel(2, 2, Luma([150]));
        let sharpened = sharpen(&gray);
        assert!(sharpened.get_pixel(2, 2)[0] > 150);
        assert!(sharpened.get_pixel(1, 2)[0] < 100);
    }

    #[test]
    fn test_denoise_removes_isolated_speck() {
        let mut img = RgbImage::from_pixel(9, 9, Rgb([200, 10, 10]));
        img.put_pixel(4, 4, Rgb([0, 255, 0]));
        let cleaned = denoise(&img);
        assert_eq!(cleaned.get_pixel(4, 4).0, [200, 10, 10]);
    }

    #[test]
    fn test_adaptive_threshold_flat_image_is_white() {
        let gray = GrayImage::from_pixel(16, 16, Luma([90]));
        let out = adaptive_gaussian_threshold(&gray, ADAPTIVE_BLOCK_SIZE, ADAPTIVE_OFFSET);
        assert!(out.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_otsu_splits_bimodal_image() {
        let mut gray = GrayImage::from_pixel(10, 10, Luma([30]));
        for x in 5..10 {
            for y in 0..10 {
                gray.put_pixel(x, y, Luma([220]));
            }
        }
        let out = binarize_otsu(&gray);
        assert_eq!(out.get_pixel(0, 0)[0], 0);
        assert_eq!(out.get_pixel(9, 9)[0], 255);
    }

    #[test]
    fn test_empty_image_does_not_panic() {
        let img = RgbImage::new(0, 0);
        let processed = preprocess_image(&img);
        assert_eq!(processed.dimensions(), (0, 0));
    }
}
