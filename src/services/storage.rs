use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use bytes::Bytes;
use std::path::PathBuf;
use tokio::io::AsyncRead;

/// Payload for a write: in-memory bytes or a local file streamed from disk.
#[derive(Debug, Clone)]
pub enum ObjectBody {
    Bytes(Bytes),
    File(PathBuf),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOptions {
    pub content_type: Option<String>,
    pub content_disposition: Option<String>,
    pub public_read: bool,
}

pub type ObjectReader = Box<dyn AsyncRead + Unpin + Send>;

#[async_trait]
pub trait StorageService: Send + Sync {
    fn bucket(&self) -> &str;
    async fn get_object_stream(&self, key: &str) -> Result<ObjectReader>;
    async fn put_object(&self, key: &str, body: ObjectBody, options: &PutOptions) -> Result<()>;
    async fn delete_file(&self, key: &str) -> Result<()>;
    async fn file_exists(&self, key: &str) -> Result<bool>;
}

pub struct S3StorageService {
    client: Client,
    bucket: String,
}

impl S3StorageService {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl StorageService for S3StorageService {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    async fn get_object_stream(&self, key: &str) -> Result<ObjectReader> {
        let res = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;
        Ok(Box::new(res.body.into_async_read()))
    }

    async fn put_object(&self, key: &str, body: ObjectBody, options: &PutOptions) -> Result<()> {
        let stream = match body {
            ObjectBody::Bytes(data) => ByteStream::from(data),
            ObjectBody::File(path) => ByteStream::from_path(&path).await?,
        };

        let mut req = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(stream)
            .set_content_type(options.content_type.clone())
            .set_content_disposition(options.content_disposition.clone());
        if options.public_read {
            req = req.acl(ObjectCannedAcl::PublicRead);
        }

        if let Err(e) = req.send().await {
            tracing::error!(
                "S3 put_object failed: bucket={}, key={}, error={:?}",
                self.bucket,
                key,
                e
            );
            return Err(e.into());
        }
        Ok(())
    }

    async fn delete_file(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;
        Ok(())
    }

    async fn file_exists(&self, key: &str) -> Result<bool> {
        let res = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match res {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    Ok(false)
                } else {
                    Err(anyhow::anyhow!(service_error))
                }
            }
        }
    }
}
