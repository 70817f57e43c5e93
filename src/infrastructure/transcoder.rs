use crate::config::HookConfig;
use crate::services::command::{CommandRunner, SystemCommandRunner};
use std::sync::Arc;
use tracing::{info, warn};

pub async fn setup_transcoder(config: &HookConfig) -> Arc<dyn CommandRunner> {
    let runner = SystemCommandRunner;

    if runner.health_check(&config.ffmpeg_path).await {
        info!("🎞️  Transcoder: {} is available", config.ffmpeg_path);
    } else {
        warn!(
            "⚠️  Transcoder: {} could not be started. HEIF images and video watermarking will fail until it is installed.",
            config.ffmpeg_path
        );
    }

    match (&config.image_watermark_path, &config.video_watermark_path) {
        (None, None) => info!("💧 Watermarking disabled"),
        (image, video) => info!(
            "💧 Watermarks: image={:?}, video={:?}",
            image, video
        ),
    }

    Arc::new(runner)
}
