use image::RgbaImage;
use std::io::Cursor;

/// EXIF orientation values (TIFF tag 0x0112).
pub const NORMAL: u32 = 1;
pub const MIRROR_HORIZONTAL: u32 = 2;
pub const ROTATE_180: u32 = 3;
pub const MIRROR_VERTICAL: u32 = 4;
pub const TRANSPOSE: u32 = 5;
pub const ROTATE_90: u32 = 6;
pub const TRANSVERSE: u32 = 7;
pub const ROTATE_270: u32 = 8;

/// Reads the orientation tag from any container kamadak-exif understands
/// (JPEG, HEIF, PNG, WebP, TIFF). Missing or unreadable metadata means [`NORMAL`].
pub fn read_orientation(data: &[u8]) -> u32 {
    let exif = match exif::Reader::new().read_from_container(&mut Cursor::new(data)) {
        Ok(exif) => exif,
        Err(e) => {
            tracing::debug!("No EXIF orientation available: {}", e);
            return NORMAL;
        }
    };

    exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .unwrap_or(NORMAL)
}

/// Produces an upright copy of `src` for the given orientation code.
///
/// Every pixel is remapped explicitly; codes 5-8 swap width and height, codes
/// 2-4 keep them. Code 1 and unknown codes return a straight copy.
pub fn normalize(src: &RgbaImage, orientation: u32) -> RgbaImage {
    let (w, h) = src.dimensions();
    let (out_w, out_h) = match orientation {
        TRANSPOSE | ROTATE_90 | TRANSVERSE | ROTATE_270 => (h, w),
        _ => (w, h),
    };

    let mut out = RgbaImage::new(out_w, out_h);
    for (x, y, pixel) in src.enumerate_pixels() {
        let (dx, dy) = match orientation {
            MIRROR_HORIZONTAL => (w - 1 - x, y),
            ROTATE_180 => (w - 1 - x, h - 1 - y),
            MIRROR_VERTICAL => (x, h - 1 - y),
            TRANSPOSE => (y, x),
            ROTATE_90 => (h - 1 - y, x),
            TRANSVERSE => (h - 1 - y, w - 1 - x),
            ROTATE_270 => (y, w - 1 - x),
            _ => (x, y),
        };
        out.put_pixel(dx, dy, *pixel);
    }
    out
}

/// Orientation code that undoes `orientation`.
pub fn inverse(orientation: u32) -> u32 {
    match orientation {
        ROTATE_90 => ROTATE_270,
        ROTATE_270 => ROTATE_90,
        MIRROR_HORIZONTAL | ROTATE_180 | MIRROR_VERTICAL | TRANSPOSE | TRANSVERSE => orientation,
        _ => NORMAL,
    }
}
