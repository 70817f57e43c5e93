use crate::config::HookConfig;
use crate::services::storage::{S3StorageService, StorageService};
use aws_sdk_s3::config::Region;
use std::sync::Arc;
use tracing::info;

/// Staging and records buckets, sharing one client.
pub struct Buckets {
    pub staging: Arc<dyn StorageService>,
    pub records: Arc<dyn StorageService>,
}

pub async fn setup_storage(config: &HookConfig) -> Buckets {
    info!(
        "☁️  S3 Storage: {} (Staging: {}, Records: {})",
        config.s3_endpoint, config.staging_bucket, config.record_bucket
    );

    let aws_config = aws_config::from_env()
        .endpoint_url(&config.s3_endpoint)
        .region(Region::new(config.s3_region.clone()))
        .credentials_provider(aws_sdk_s3::config::Credentials::new(
            config.s3_access_key.clone(),
            config.s3_secret_key.clone(),
            None,
            None,
            "static",
        ))
        .load()
        .await;

    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .force_path_style(true)
        .build();

    let s3_client = aws_sdk_s3::Client::from_conf(s3_config);
    Buckets {
        staging: Arc::new(S3StorageService::new(
            s3_client.clone(),
            config.staging_bucket.clone(),
        )),
        records: Arc::new(S3StorageService::new(
            s3_client,
            config.record_bucket.clone(),
        )),
    }
}
