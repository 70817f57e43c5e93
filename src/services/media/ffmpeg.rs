use std::ffi::OsString;
use std::path::Path;

/// Scales the watermark (input 1) to the video's width (input 0), keeping the
/// watermark's aspect ratio, and overlays it at the top-left corner.
pub const WATERMARK_FILTER: &str =
    "[1:v][0:v]scale2ref=w=main_w:h=ow/a[wm][base];[base][wm]overlay=0:0";

/// Extract the primary HEIF image as PNG, leaving orientation untouched so it
/// can be applied from the EXIF tag.
pub fn heif_frame_args(input: &Path, output: &Path) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-noautorotate".into(),
        "-i".into(),
        input.into(),
        "-frames:v".into(),
        "1".into(),
        output.into(),
    ]
}

pub fn watermark_overlay_args(input: &Path, watermark: &Path, output: &Path) -> Vec<OsString> {
    vec![
        "-y".into(),
        "-i".into(),
        input.into(),
        "-i".into(),
        watermark.into(),
        "-filter_complex".into(),
        WATERMARK_FILTER.into(),
        "-c:a".into(),
        "copy".into(),
        output.into(),
    ]
}
