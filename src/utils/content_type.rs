use regex::Regex;
use std::fmt::Write;
use std::sync::LazyLock;

static MIME_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]+/[a-z0-9\-+.]+$").expect("static mime pattern"));

/// Types a browser may render inline without exposing the origin to active content.
pub const INLINE_MIME_TYPES: &[&str] = &[
    "text/plain",
    "application/json",
    // Images
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/bmp",
    "image/webp",
    // Audio
    "audio/wave",
    "audio/wav",
    "audio/mp3",
    "audio/x-wav",
    "audio/x-pn-wav",
    "audio/webm",
    "audio/ogg",
    // Video
    "video/webm",
    "video/ogg",
    "application/ogg",
];

/// Content-Type and Content-Disposition values safe to serve for an upload.
///
/// A well formed `filetype` is forwarded as the content type, but only the
/// types in [`INLINE_MIME_TYPES`] are shown inline. Everything else is served
/// as `application/octet-stream` and forced to download.
pub fn classify(filetype: &str, filename: &str) -> (String, String) {
    let (content_type, disposition) = if MIME_TYPE.is_match(filetype) {
        let disposition = if INLINE_MIME_TYPES.contains(&filetype) {
            "inline"
        } else {
            "attachment"
        };
        (filetype.to_string(), disposition)
    } else {
        (mime::APPLICATION_OCTET_STREAM.to_string(), "attachment")
    };

    (
        content_type,
        format!("{};filename={}", disposition, quote(filename)),
    )
}

/// Code point ranges written as escapes even though they are not controls:
/// Unicode format characters (category Cf) plus the private-use and
/// noncharacter blocks.
const NON_PRINTABLE: &[(u32, u32)] = &[
    (0x00AD, 0x00AD),
    (0x0600, 0x0605),
    (0x061C, 0x061C),
    (0x06DD, 0x06DD),
    (0x070F, 0x070F),
    (0x0890, 0x0891),
    (0x08E2, 0x08E2),
    (0x180E, 0x180E),
    (0x200B, 0x200F),
    (0x202A, 0x202E),
    (0x2060, 0x2064),
    (0x2066, 0x206F),
    (0xE000, 0xF8FF),
    (0xFEFF, 0xFEFF),
    (0xFFF9, 0xFFFB),
    (0xFFFE, 0xFFFF),
    (0x110BD, 0x110BD),
    (0x110CD, 0x110CD),
    (0x13430, 0x1343F),
    (0x1BCA0, 0x1BCA3),
    (0x1D173, 0x1D17A),
    (0xE0001, 0xE0001),
    (0xE0020, 0xE007F),
    (0xF0000, 0x10FFFF),
];

fn is_printable(c: char) -> bool {
    if c == ' ' {
        return true;
    }
    if c.is_control() || c.is_whitespace() {
        return false;
    }
    let code = c as u32;
    !NON_PRINTABLE
        .iter()
        .any(|&(lo, hi)| (lo..=hi).contains(&code))
}

/// Double-quoted literal with quotes and backslashes escaped. Anything not
/// printable is written as a hex escape, including whitespace other than the
/// ASCII space.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\u{b}' => out.push_str("\\v"),
            '\u{c}' => out.push_str("\\f"),
            c if (c as u32) < 0x80 && c.is_control() => {
                let _ = write!(out, "\\x{:02x}", c as u32);
            }
            c if is_printable(c) => out.push(c),
            c if (c as u32) > 0xFFFF => {
                let _ = write!(out, "\\U{:08x}", c as u32);
            }
            c => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_image() {
        assert_eq!(
            classify("image/png", "a.png"),
            ("image/png".to_string(), "inline;filename=\"a.png\"".to_string())
        );
    }

    #[test]
    fn test_malformed_type_falls_back_to_octet_stream() {
        assert_eq!(
            classify("bogus", "a.bin"),
            (
                "application/octet-stream".to_string(),
                "attachment;filename=\"a.bin\"".to_string()
            )
        );
        assert_eq!(classify("", "x").0, "application/octet-stream");
        assert_eq!(classify("Image/PNG", "x").0, "application/octet-stream");
        assert_eq!(classify("text/html; charset=utf-8", "x").0, "application/octet-stream");
    }

    #[test]
    fn test_well_formed_but_not_inline() {
        let (content_type, disposition) = classify("text/html", "index.html");
        assert_eq!(content_type, "text/html");
        assert_eq!(disposition, "attachment;filename=\"index.html\"");

        let (content_type, _) = classify("image/svg+xml", "logo.svg");
        assert_eq!(content_type, "image/svg+xml");
    }

    #[test]
    fn test_filename_is_escaped() {
        let (_, disposition) = classify("text/plain", "evil\"; x=\\.txt");
        assert_eq!(disposition, "inline;filename=\"evil\\\"; x=\\\\.txt\"");

        let (_, disposition) = classify("text/plain", "line\nbreak\u{1}");
        assert_eq!(disposition, "inline;filename=\"line\\nbreak\\x01\"");

        let (_, disposition) = classify("text/plain", "фото.txt");
        assert_eq!(disposition, "inline;filename=\"фото.txt\"");
    }

    #[test]
    fn test_invisible_characters_are_escaped() {
        let (_, disposition) = classify("text/plain", "a\u{2028}b\u{200b}c.txt");
        assert_eq!(disposition, "inline;filename=\"a\\u2028b\\u200bc.txt\"");

        let (_, disposition) = classify("text/plain", "\u{202e}gpj.exe\u{a0}\u{feff}");
        assert_eq!(disposition, "inline;filename=\"\\u202egpj.exe\\u00a0\\ufeff\"");

        let (_, disposition) = classify("text/plain", "tag\u{e0041}");
        assert_eq!(disposition, "inline;filename=\"tag\\U000e0041\"");
    }

    #[test]
    fn test_classify_is_deterministic() {
        for filetype in ["image/jpeg", "", "video/mp4", "???", "a/b/c"] {
            assert_eq!(classify(filetype, "f"), classify(filetype, "f"));
        }
    }
}
