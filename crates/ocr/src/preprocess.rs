use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use imageproc::contrast::equalize_histogram;
use imageproc::filter::{gaussian_blur_f32, median_filter};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Images whose longer side is below this are upscaled before recognition.
const UPSCALE_BELOW_PX: u32 = 1200;
const UPSCALE_FACTOR: f64 = 1.5;
/// 3×3 median window.
const MEDIAN_RADIUS: u32 = 1;
/// Adaptive threshold neighbourhood (pixels, odd).
const THRESHOLD_BLOCK: u32 = 31;
/// Subtracted from the local Gaussian mean before comparing.
const THRESHOLD_OFFSET: i16 = 15;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Image not found or not decodable: {path}: {source}")]
    ImageNotFound {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("Failed to encode processed image: {0}")]
    Encode(String),
}

/// Single-channel image containing only 0 and 255, ready for recognition.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedImage(GrayImage);

impl NormalizedImage {
    pub fn width(&self) -> u32 {
        self.0.width()
    }

    pub fn height(&self) -> u32 {
        self.0.height()
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.0
    }

    /// PNG encoding, the hand-off format for external recognizers.
    pub fn to_png(&self) -> Result<Vec<u8>, PreprocessError> {
        let mut buf = Vec::new();
        self.0
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .map_err(|e| PreprocessError::Encode(e.to_string()))?;
        Ok(buf)
    }
}

/// Decode the image at `path` and normalize it. The file is closed before returning.
pub fn normalize_path(path: &Path) -> Result<NormalizedImage, PreprocessError> {
    let img = image::open(path).map_err(|source| PreprocessError::ImageNotFound {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(normalize(img))
}

/// grayscale → equalize → upscale small images → median blur → adaptive threshold.
pub fn normalize(img: DynamicImage) -> NormalizedImage {
    let gray = equalize_histogram(&img.to_luma8());
    drop(img);

    let gray = upscale_small(gray);
    let gray = median_filter(&gray, MEDIAN_RADIUS, MEDIAN_RADIUS);
    NormalizedImage(adaptive_gaussian_threshold(&gray, THRESHOLD_BLOCK, THRESHOLD_OFFSET))
}

fn upscale_small(gray: GrayImage) -> GrayImage {
    let (w, h) = gray.dimensions();
    if w.max(h) >= UPSCALE_BELOW_PX {
        return gray;
    }
    let new_w = ((w as f64 * UPSCALE_FACTOR) as u32).max(1);
    let new_h = ((h as f64 * UPSCALE_FACTOR) as u32).max(1);
    image::imageops::resize(&gray, new_w, new_h, FilterType::CatmullRom)
}

/// Sigma OpenCV derives for a Gaussian kernel of width `block`.
fn block_sigma(block: u32) -> f32 {
    0.3 * ((block as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// A pixel becomes white when it is brighter than its Gaussian-weighted
/// neighbourhood mean minus `offset`, black otherwise.
fn adaptive_gaussian_threshold(gray: &GrayImage, block: u32, offset: i16) -> GrayImage {
    let local_mean = gaussian_blur_f32(gray, block_sigma(block));
    ImageBuffer::from_fn(gray.width(), gray.height(), |x, y| {
        let src = gray.get_pixel(x, y)[0] as i16;
        let mean = local_mean.get_pixel(x, y)[0] as i16;
        if src > mean - offset {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid_gray(width: u32, height: u32, value: u8) -> DynamicImage {
        let img: GrayImage = ImageBuffer::from_fn(width, height, |_, _| Luma([value]));
        DynamicImage::ImageLuma8(img)
    }

    /// White page with a thin dark vertical stroke through the middle.
    fn stroke_page(size: u32) -> DynamicImage {
        let img: GrayImage = ImageBuffer::from_fn(size, size, |x, _| {
            if (size / 2 - 2..size / 2 + 2).contains(&x) {
                Luma([0u8])
            } else {
                Luma([255u8])
            }
        });
        DynamicImage::ImageLuma8(img)
    }

    fn is_binary(img: &NormalizedImage) -> bool {
        img.as_gray().pixels().all(|p| p[0] == 0 || p[0] == 255)
    }

    #[test]
    fn uniform_image_survives() {
        let result = normalize(solid_gray(10, 10, 128));
        assert!(result.width() > 0 && result.height() > 0);
        assert!(is_binary(&result));
    }

    #[test]
    fn small_image_is_upscaled() {
        let result = normalize(solid_gray(100, 80, 200));
        assert_eq!((result.width(), result.height()), (150, 120));
    }

    #[test]
    fn large_image_keeps_its_size() {
        let result = normalize(solid_gray(1300, 20, 200));
        assert_eq!((result.width(), result.height()), (1300, 20));
    }

    #[test]
    fn boundary_size_is_not_upscaled() {
        let result = normalize(solid_gray(1200, 4, 50));
        assert_eq!(result.width(), 1200);
    }

    #[test]
    fn colour_input_becomes_single_channel_binary() {
        let rgb = image::RgbImage::from_fn(40, 30, |x, y| image::Rgb([x as u8 * 6, y as u8 * 8, 90]));
        let result = normalize(DynamicImage::ImageRgb8(rgb));
        assert!(is_binary(&result));
    }

    #[test]
    fn thin_stroke_stays_dark_on_white_page() {
        let result = normalize(stroke_page(200));
        let gray = result.as_gray();
        assert!(is_binary(&result));
        // Stroke centre (x = 100 before the 1.5× upscale) is ink, margins are paper.
        assert_eq!(gray.get_pixel(150, 150)[0], 0);
        assert_eq!(gray.get_pixel(20, 150)[0], 255);
    }

    #[test]
    fn sigma_matches_block_width() {
        assert!((block_sigma(31) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn normalize_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bill.png");
        solid_gray(20, 20, 180).save(&path).unwrap();
        let result = normalize_path(&path).unwrap();
        assert_eq!((result.width(), result.height()), (30, 30));
    }

    #[test]
    fn missing_file_is_image_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = normalize_path(&dir.path().join("nope.png")).unwrap_err();
        assert!(matches!(err, PreprocessError::ImageNotFound { .. }));
    }

    #[test]
    fn undecodable_file_is_image_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bill.png");
        std::fs::write(&path, b"definitely not a png").unwrap();
        let err = normalize_path(&path).unwrap_err();
        assert!(matches!(err, PreprocessError::ImageNotFound { .. }));
    }

    #[test]
    fn png_encoding_has_magic_bytes() {
        let png = normalize(solid_gray(4, 4, 100)).to_png().unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
    }
}
