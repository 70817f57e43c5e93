use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{ColorType, DynamicImage, ImageOutputFormat, RgbaImage};
use std::io::Cursor;
use std::path::Path;

use super::orientation;
use crate::services::error::PipelineError;

/// Encoding chosen for a finalized image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageTarget {
    Png,
    Jpeg,
}

impl ImageTarget {
    /// `.png` stays PNG; `.jpg`, `.jpeg` and every other extension become JPEG.
    pub fn for_filename(filename: &str) -> Self {
        match extension(filename).as_deref() {
            Some("png") => ImageTarget::Png,
            _ => ImageTarget::Jpeg,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageTarget::Png => ".png",
            ImageTarget::Jpeg => ".jpg",
        }
    }

    pub fn content_type(&self) -> mime::Mime {
        match self {
            ImageTarget::Png => mime::IMAGE_PNG,
            ImageTarget::Jpeg => mime::IMAGE_JPEG,
        }
    }
}

fn extension(filename: &str) -> Option<String> {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// `filename` with its extension replaced by the target's (`a.jpeg` -> `a.jpg`,
/// `a.heic` -> `a.jpg`, `a` -> `a.jpg`).
pub fn destination_filename(filename: &str, target: ImageTarget) -> String {
    let stem = match filename.rfind('.') {
        Some(idx) if idx > 0 => &filename[..idx],
        _ => filename,
    };
    format!("{}{}", stem, target.extension())
}

/// HEIC/HEIF detection from any of the historical signals: declared type,
/// file extension, or the container's magic bytes.
pub fn is_heif(filetype: &str, filename: &str, data: &[u8]) -> bool {
    if matches!(filetype, "image/heic" | "image/heif" | "image/heic-sequence" | "image/heif-sequence") {
        return true;
    }
    if matches!(extension(filename).as_deref(), Some("heic" | "heif")) {
        return true;
    }
    infer::get(data)
        .map(|kind| kind.mime_type() == "image/heif")
        .unwrap_or(false)
}

/// Scales `watermark` to the full width of `base`, keeping its aspect ratio,
/// and alpha-composites it vertically centred.
pub fn composite_watermark(base: &mut RgbaImage, watermark: &DynamicImage) {
    let (base_w, base_h) = base.dimensions();
    let (wm_w, wm_h) = (watermark.width(), watermark.height());
    if wm_w == 0 || wm_h == 0 || base_w == 0 {
        return;
    }

    let scaled_h = ((wm_h as f64 * base_w as f64 / wm_w as f64).round() as u32).max(1);
    let scaled = imageops::resize(&watermark.to_rgba8(), base_w, scaled_h, FilterType::Triangle);

    let y = (base_h as i64 - scaled_h as i64) / 2;
    imageops::overlay(base, &scaled, 0, y);
}

/// Orient, optionally watermark, then encode. CPU bound; run it off the async executor.
pub fn render(
    decoded: DynamicImage,
    orientation_code: u32,
    watermark: Option<&DynamicImage>,
    target: ImageTarget,
    jpeg_quality: u8,
) -> Result<Vec<u8>, PipelineError> {
    let mut upright = orientation::normalize(&decoded.to_rgba8(), orientation_code);

    if let Some(watermark) = watermark {
        composite_watermark(&mut upright, watermark);
    }

    encode(DynamicImage::ImageRgba8(upright), target, jpeg_quality)
}

pub fn encode(
    img: DynamicImage,
    target: ImageTarget,
    jpeg_quality: u8,
) -> Result<Vec<u8>, PipelineError> {
    let mut out_data = Vec::new();
    match target {
        ImageTarget::Png => {
            img.write_to(&mut Cursor::new(&mut out_data), ImageOutputFormat::Png)?;
        }
        ImageTarget::Jpeg => {
            // JPEG has no alpha channel
            let rgb = img.to_rgb8();
            JpegEncoder::new_with_quality(&mut out_data, jpeg_quality).encode(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                ColorType::Rgb8,
            )?;
        }
    }
    Ok(out_data)
}
