use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("`{0}` env var must be defined")]
    Missing(&'static str),

    #[error("JPEG quality must be between 1 and 100, got {0}")]
    InvalidQuality(u16),
}

/// Hook pipeline configuration
#[derive(Debug, Clone)]
pub struct HookConfig {
    /// Shared HMAC secret used to verify upload tokens
    pub jwt_secret: String,

    /// Request header carrying the upload token (default: "Upload-Token")
    pub upload_token_header: String,

    /// Bucket the upload server stages raw uploads in (default: "rent_swamp")
    pub staging_bucket: String,

    /// Bucket holding finalized, public artifacts
    pub record_bucket: String,

    /// S3-compatible endpoint shared by both buckets
    pub s3_endpoint: String,
    pub s3_region: String,
    pub s3_access_key: String,
    pub s3_secret_key: String,

    /// Overlay composited onto finalized images. `None` disables image watermarking.
    pub image_watermark_path: Option<PathBuf>,

    /// Overlay burned into finalized videos. `None` disables the video branch.
    pub video_watermark_path: Option<PathBuf>,

    /// ffmpeg binary (default: "ffmpeg")
    pub ffmpeg_path: String,

    /// Upper bound for a single transcoder run (default: 600 seconds)
    pub transcode_timeout: Duration,

    /// Lossy encoder quality, 1 to 100 (default: 90)
    pub jpeg_quality: u16,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            upload_token_header: "Upload-Token".to_string(),
            staging_bucket: "rent_swamp".to_string(),
            record_bucket: String::new(),
            s3_endpoint: "http://127.0.0.1:9000".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_access_key: String::new(),
            s3_secret_key: String::new(),
            image_watermark_path: None,
            video_watermark_path: None,
            ffmpeg_path: "ffmpeg".to_string(),
            transcode_timeout: Duration::from_secs(600),
            jpeg_quality: 90,
        }
    }
}

impl HookConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            jwt_secret: env::var("JWT_SECRET").unwrap_or(default.jwt_secret),

            upload_token_header: env::var("UPLOAD_TOKEN_HEADER")
                .unwrap_or(default.upload_token_header),

            staging_bucket: env::var("STAGING_BUCKET").unwrap_or(default.staging_bucket),

            record_bucket: env::var("RECORD_BUCKET").unwrap_or(default.record_bucket),

            s3_endpoint: env::var("S3_ENDPOINT").unwrap_or(default.s3_endpoint),
            s3_region: env::var("S3_REGION").unwrap_or(default.s3_region),
            s3_access_key: env::var("S3_ACCESS_KEY").unwrap_or(default.s3_access_key),
            s3_secret_key: env::var("S3_SECRET_KEY").unwrap_or(default.s3_secret_key),

            image_watermark_path: env::var("IMAGE_WATERMARK_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),

            video_watermark_path: env::var("VIDEO_WATERMARK_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from),

            ffmpeg_path: env::var("FFMPEG_PATH").unwrap_or(default.ffmpeg_path),

            transcode_timeout: env::var("TRANSCODE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.transcode_timeout),

            jpeg_quality: parse_quality(env::var("JPEG_QUALITY").ok(), default.jpeg_quality),
        }
    }

    /// Startup check for the values the pipeline cannot run without.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("JWT_SECRET", &self.jwt_secret),
            ("RECORD_BUCKET", &self.record_bucket),
            ("S3_ACCESS_KEY", &self.s3_access_key),
            ("S3_SECRET_KEY", &self.s3_secret_key),
        ];

        for (name, value) in required {
            if value.is_empty() {
                return Err(ConfigError::Missing(name));
            }
        }

        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(ConfigError::InvalidQuality(self.jpeg_quality));
        }

        Ok(())
    }
}

/// Unset or blank keeps the default. Anything else is taken as written so
/// `validate` can report it; text that is not a number becomes 0.
fn parse_quality(raw: Option<String>, default: u16) -> u16 {
    match raw.as_deref().map(str::trim) {
        None | Some("") => default,
        Some(value) => value.parse().unwrap_or_else(|_| {
            tracing::warn!("JPEG_QUALITY `{}` is not a number", value);
            0
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> HookConfig {
        HookConfig {
            jwt_secret: "secret".to_string(),
            record_bucket: "records".to_string(),
            s3_access_key: "minioadmin".to_string(),
            s3_secret_key: "minioadmin".to_string(),
            ..HookConfig::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = HookConfig::default();
        assert_eq!(config.upload_token_header, "Upload-Token");
        assert_eq!(config.staging_bucket, "rent_swamp");
        assert_eq!(config.jpeg_quality, 90);
        assert_eq!(config.transcode_timeout, Duration::from_secs(600));
        assert!(config.image_watermark_path.is_none());
    }

    #[test]
    fn test_validate_reports_first_missing_var() {
        assert_eq!(
            HookConfig::default().validate(),
            Err(ConfigError::Missing("JWT_SECRET"))
        );

        let config = HookConfig {
            record_bucket: String::new(),
            ..complete()
        };
        assert_eq!(config.validate(), Err(ConfigError::Missing("RECORD_BUCKET")));
    }

    #[test]
    fn test_validate_quality_bounds() {
        assert!(complete().validate().is_ok());

        let config = HookConfig {
            jpeg_quality: 0,
            ..complete()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidQuality(0)));

        let config = HookConfig {
            jpeg_quality: 300,
            ..complete()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidQuality(300)));
    }

    #[test]
    fn test_out_of_range_quality_is_not_swallowed() {
        assert_eq!(parse_quality(None, 90), 90);
        assert_eq!(parse_quality(Some(" ".to_string()), 90), 90);
        assert_eq!(parse_quality(Some("75".to_string()), 90), 75);
        assert_eq!(parse_quality(Some("300".to_string()), 90), 300);
        assert_eq!(parse_quality(Some("high".to_string()), 90), 0);

        let config = HookConfig {
            jpeg_quality: parse_quality(Some("300".to_string()), 90),
            ..complete()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidQuality(300)));
    }
}
