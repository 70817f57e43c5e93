use async_trait::async_trait;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

use crate::hooks::dispatcher::HookHandler;
use crate::models::{HookKind, HookResponse, LifecycleEvent, UploadMetadata};
use crate::services::error::PipelineError;
use crate::services::media::MediaTransformEngine;
use crate::services::storage::{ObjectBody, PutOptions, StorageService};
use crate::utils::content_type;

/// Staging key of an upload: the part of the upload id before the first `+`.
/// The remainder (the multipart id) is not needed once the upload finished.
pub fn split_upload_id(upload_id: &str) -> &str {
    upload_id
        .split_once('+')
        .map_or(upload_id, |(primary, _)| primary)
}

pub fn record_key(id: &str, filename: &str) -> String {
    format!("{}/{}", id, filename)
}

pub fn original_key(id: &str, filename: &str) -> String {
    format!("{}/{}-original-{}", id, id, filename)
}

/// Moves finished single-record uploads from the staging bucket to their
/// permanent key in the records bucket, finalizing media on the way.
pub struct ObjectRelocator {
    staging: Arc<dyn StorageService>,
    records: Arc<dyn StorageService>,
    engine: Arc<MediaTransformEngine>,
}

impl ObjectRelocator {
    pub fn new(
        staging: Arc<dyn StorageService>,
        records: Arc<dyn StorageService>,
        engine: Arc<MediaTransformEngine>,
    ) -> Self {
        Self {
            staging,
            records,
            engine,
        }
    }

    /// Fetch, transform and write one upload. Returns the metadata patch for
    /// the upload record, empty when the filename did not change.
    pub async fn relocate(
        &self,
        upload_id: &str,
        id: &str,
        filename: &str,
        meta: &UploadMetadata<'_>,
    ) -> Result<HookResponse, PipelineError> {
        let staged_key = split_upload_id(upload_id);

        let staged = tempfile::Builder::new()
            .prefix("hook-staged-")
            .tempfile()?;
        {
            let mut reader = self.staging.get_object_stream(staged_key).await?;
            let mut file = tokio::fs::File::from_std(staged.reopen()?);
            let copied = tokio::io::copy(&mut reader, &mut file).await?;
            file.flush().await?;
            tracing::debug!(key = staged_key, bytes = copied, "Staged object buffered");
        }

        let output = self.engine.transform(staged.path(), meta, filename).await?;

        if let Some(replace) = meta.replace {
            let key = record_key(id, replace);
            if let Err(e) = self.records.delete_file(&key).await {
                tracing::warn!(key = %key, error = %e, "Could not delete replaced object");
            }
        }

        let final_key = record_key(id, &output.filename);
        let options = PutOptions {
            content_type: Some(output.content_type.clone()),
            content_disposition: Some(output.content_disposition.clone()),
            public_read: true,
        };
        self.records
            .put_object(&final_key, output.body.clone(), &options)
            .await?;
        tracing::info!("📦 Relocated upload {} to {}/{}", upload_id, self.records.bucket(), final_key);

        if output.keep_original {
            let (content_type, content_disposition) = content_type::classify(meta.filetype, filename);
            let key = original_key(id, filename);
            let options = PutOptions {
                content_type: Some(content_type),
                content_disposition: Some(content_disposition),
                public_read: true,
            };
            self.records
                .put_object(&key, ObjectBody::File(staged.path().to_path_buf()), &options)
                .await?;
            tracing::debug!(key = %key, "Original kept next to watermarked derivative");
        }

        let mut response = HookResponse::default();
        if output.filename != filename {
            response = response
                .with_patch("filename", output.filename.as_str())
                .with_patch("filetype", output.content_type.as_str());
        }
        Ok(response)
    }
}

#[async_trait]
impl HookHandler for ObjectRelocator {
    fn name(&self) -> &'static str {
        "object-relocator"
    }

    async fn invoke(&self, event: &LifecycleEvent) -> Result<HookResponse, PipelineError> {
        if event.kind != HookKind::PostFinish {
            return Ok(HookResponse::default());
        }

        let meta = event.upload_metadata();
        if !meta.is_single_record() {
            tracing::info!(
                upload_id = %event.upload_id,
                record_type = meta.record_type.unwrap_or_default(),
                "Record not single, leaving upload in staging"
            );
            return Ok(HookResponse::default());
        }

        let (Some(id), Some(filename)) = (meta.id, meta.filename) else {
            tracing::info!(
                upload_id = %event.upload_id,
                "Upload metadata lacks id or filename, skipping relocation"
            );
            return Ok(HookResponse::default());
        };

        match self.relocate(&event.upload_id, id, filename, &meta).await {
            Ok(response) => Ok(response),
            Err(e) => {
                tracing::error!(
                    upload_id = %event.upload_id,
                    kind = %e.kind(),
                    error = %e,
                    "Relocation failed"
                );
                Ok(HookResponse::default())
            }
        }
    }
}
