pub mod ffmpeg;
pub mod orientation;
pub mod raster;

use bytes::Bytes;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempPath;

use crate::config::HookConfig;
use crate::models::{MediaKind, UploadMetadata};
use crate::services::command::CommandRunner;
use crate::services::error::PipelineError;
use crate::services::storage::ObjectBody;
use crate::utils::content_type;
use raster::ImageTarget;

/// Settings the engine needs from [`HookConfig`].
#[derive(Debug, Clone)]
pub struct MediaSettings {
    pub ffmpeg_path: String,
    pub transcode_timeout: Duration,
    pub image_watermark_path: Option<PathBuf>,
    pub video_watermark_path: Option<PathBuf>,
    pub jpeg_quality: u8,
}

impl From<&HookConfig> for MediaSettings {
    fn from(config: &HookConfig) -> Self {
        Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            transcode_timeout: config.transcode_timeout,
            image_watermark_path: config.image_watermark_path.clone(),
            video_watermark_path: config.video_watermark_path.clone(),
            // validated to 1..=100 at startup
            jpeg_quality: config.jpeg_quality.clamp(1, 100) as u8,
        }
    }
}

/// The artifact to write at the permanent key.
#[derive(Debug)]
pub struct TransformOutput {
    pub body: ObjectBody,
    /// Filename for the permanent key; differs from the upload's when the
    /// image branch re-encodes to another format.
    pub filename: String,
    pub content_type: String,
    pub content_disposition: String,
    /// A watermarked derivative was produced, so the untouched upload is kept too.
    pub keep_original: bool,
    /// Owns any file `body` points into; deleted on drop.
    scratch: Option<TempPath>,
}

impl TransformOutput {
    fn passthrough(source: &Path, filetype: &str, filename: &str) -> Self {
        let (content_type, content_disposition) = content_type::classify(filetype, filename);
        Self {
            body: ObjectBody::File(source.to_path_buf()),
            filename: filename.to_string(),
            content_type,
            content_disposition,
            keep_original: false,
            scratch: None,
        }
    }

    pub fn is_passthrough(&self) -> bool {
        !self.keep_original && self.scratch.is_none() && matches!(self.body, ObjectBody::File(_))
    }
}

pub struct MediaTransformEngine {
    runner: Arc<dyn CommandRunner>,
    settings: MediaSettings,
}

impl MediaTransformEngine {
    pub fn new(runner: Arc<dyn CommandRunner>, settings: MediaSettings) -> Self {
        Self { runner, settings }
    }

    /// Produce the final artifact for the staged file at `source`.
    ///
    /// Branch selection is driven by `mediatype`: images are oriented,
    /// watermarked and re-encoded, videos get the overlay when a video
    /// watermark is configured, anything else is passed through.
    pub async fn transform(
        &self,
        source: &Path,
        meta: &UploadMetadata<'_>,
        filename: &str,
    ) -> Result<TransformOutput, PipelineError> {
        match (meta.media, &self.settings.video_watermark_path) {
            (Some(MediaKind::Image), _) => self.transform_image(source, meta.filetype, filename).await,
            (Some(MediaKind::Video), Some(watermark)) => {
                self.transform_video(source, watermark, meta.filetype, filename)
                    .await
            }
            _ => Ok(TransformOutput::passthrough(source, meta.filetype, filename)),
        }
    }

    async fn transform_image(
        &self,
        source: &Path,
        filetype: &str,
        filename: &str,
    ) -> Result<TransformOutput, PipelineError> {
        let data = tokio::fs::read(source).await?;
        let orientation_code = orientation::read_orientation(&data);

        let frame = if raster::is_heif(filetype, filename, &data) {
            tracing::info!("🖼️ Decoding HEIF upload {} through {}", filename, self.settings.ffmpeg_path);
            Some(self.decode_heif(source).await?)
        } else {
            None
        };

        let watermark = match &self.settings.image_watermark_path {
            Some(path) => Some(tokio::fs::read(path).await?),
            None => None,
        };
        let keep_original = watermark.is_some();

        let target = ImageTarget::for_filename(filename);
        let quality = self.settings.jpeg_quality;
        let encoded = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, PipelineError> {
            let decoded = image::load_from_memory(frame.as_deref().unwrap_or(&data[..]))?;
            let watermark = watermark
                .as_deref()
                .map(image::load_from_memory)
                .transpose()?;
            raster::render(decoded, orientation_code, watermark.as_ref(), target, quality)
        })
        .await
        .map_err(|e| PipelineError::Transform(format!("image worker failed: {}", e)))??;

        let filename = raster::destination_filename(filename, target);
        let (content_type, content_disposition) =
            content_type::classify(target.content_type().as_ref(), &filename);

        Ok(TransformOutput {
            body: ObjectBody::Bytes(Bytes::from(encoded)),
            filename,
            content_type,
            content_disposition,
            keep_original,
            scratch: None,
        })
    }

    /// Primary HEIF image as PNG bytes, orientation left as stored.
    async fn decode_heif(&self, source: &Path) -> Result<Vec<u8>, PipelineError> {
        let frame = tempfile::Builder::new()
            .prefix("hook-heif-")
            .suffix(".png")
            .tempfile()?
            .into_temp_path();

        let args = ffmpeg::heif_frame_args(source, &frame);
        self.runner
            .run(&self.settings.ffmpeg_path, &args, self.settings.transcode_timeout)
            .await?;

        Ok(tokio::fs::read(&frame).await?)
    }

    async fn transform_video(
        &self,
        source: &Path,
        watermark: &Path,
        filetype: &str,
        filename: &str,
    ) -> Result<TransformOutput, PipelineError> {
        let suffix = Path::new(filename)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_else(|| ".mp4".to_string());
        let output = tempfile::Builder::new()
            .prefix("hook-video-")
            .suffix(&suffix)
            .tempfile()?
            .into_temp_path();

        let args = ffmpeg::watermark_overlay_args(source, watermark, &output);
        tracing::info!("🎬 Watermarking video {}", filename);
        self.runner
            .run(&self.settings.ffmpeg_path, &args, self.settings.transcode_timeout)
            .await?;

        let (content_type, content_disposition) = content_type::classify(filetype, filename);
        Ok(TransformOutput {
            body: ObjectBody::File(output.to_path_buf()),
            filename: filename.to_string(),
            content_type,
            content_disposition,
            keep_original: false,
            scratch: Some(output),
        })
    }
}
