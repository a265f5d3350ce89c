use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, ImageEncoder};
use thiserror::Error;

pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

/// Bounding box and encoder settings applied to every ingested image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeOptions {
    pub max_width: u32,
    pub max_height: u32,
    pub jpeg_quality: u8,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            max_width: 1920,
            max_height: 1024,
            jpeg_quality: 85,
        }
    }
}

#[derive(Debug)]
pub struct ProcessedImage {
    pub image_data: Vec<u8>,
    pub content_type: &'static str,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Error)]
pub enum ImageProcessingError {
    #[error("not a recognizable image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("failed to encode JPEG: {0}")]
    Encode(#[source] image::ImageError),
}

/// Decode `bytes`, shrink the picture to fit inside the configured box while
/// keeping its aspect ratio, and re-encode it as JPEG.
///
/// Pictures already inside the box keep their size. Transparency is dropped
/// because JPEG has no alpha channel.
pub fn normalize_image_bytes(
    bytes: &[u8],
    options: NormalizeOptions,
) -> Result<ProcessedImage, ImageProcessingError> {
    let decoded = image::load_from_memory(bytes).map_err(ImageProcessingError::Decode)?;

    let (width, height) = fit_within(
        decoded.width(),
        decoded.height(),
        options.max_width,
        options.max_height,
    );
    let resized = if (width, height) == (decoded.width(), decoded.height()) {
        decoded
    } else {
        decoded.resize_exact(width, height, FilterType::CatmullRom)
    };

    let rgb = resized.to_rgb8();
    let mut image_data = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut image_data, options.jpeg_quality);
    encoder
        .write_image(rgb.as_raw(), width, height, ColorType::Rgb8.into())
        .map_err(ImageProcessingError::Encode)?;

    Ok(ProcessedImage {
        image_data,
        content_type: JPEG_CONTENT_TYPE,
        width,
        height,
    })
}

/// Largest size with the same aspect ratio that fits in `max_width` x
/// `max_height`. Never upscales; never returns a zero side, even for a zero
/// box.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let (max_width, max_height) = (max_width.max(1), max_height.max(1));
    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let (w, h) = (u64::from(width), u64::from(height));
    let (max_w, max_h) = (u64::from(max_width), u64::from(max_height));

    // Compare w/h against max_w/max_h without floating point.
    if w * max_h >= h * max_w {
        let scaled = (h * max_w / w).max(1);
        (max_width, scaled as u32)
    } else {
        let scaled = (w * max_h / h).max(1);
        (scaled as u32, max_height)
    }
}
