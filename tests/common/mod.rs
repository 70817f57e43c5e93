#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use image::{DynamicImage, ImageOutputFormat, Rgba, RgbaImage};
use rust_upload_hooks::config::HookConfig;
use rust_upload_hooks::hooks::standard_pipeline;
use rust_upload_hooks::services::command::{CommandOutput, CommandRunner};
use rust_upload_hooks::services::error::PipelineError;
use rust_upload_hooks::services::storage::{ObjectBody, ObjectReader, PutOptions, StorageService};
use rust_upload_hooks::{AppState, create_app};
use std::collections::HashMap;
use std::ffi::OsString;
use std::io::Cursor;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const SECRET: &str = "integration-secret";

/// Bucket kept in memory, recording writes in order.
#[derive(Default)]
pub struct MemoryBucket {
    objects: Mutex<HashMap<String, (Vec<u8>, PutOptions)>>,
    log: Mutex<Vec<String>>,
}

impl MemoryBucket {
    pub fn insert(&self, key: &str, data: &[u8]) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data.to_vec(), PutOptions::default()));
    }

    pub fn get(&self, key: &str) -> Option<(Vec<u8>, PutOptions)> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    /// `"put <key>"` / `"delete <key>"` in call order.
    pub fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorageService for MemoryBucket {
    fn bucket(&self) -> &str {
        "memory"
    }

    async fn get_object_stream(&self, key: &str) -> anyhow::Result<ObjectReader> {
        let (data, _) = self
            .get(key)
            .ok_or_else(|| anyhow::anyhow!("NoSuchKey: {}", key))?;
        Ok(Box::new(Cursor::new(data)))
    }

    async fn put_object(
        &self,
        key: &str,
        body: ObjectBody,
        options: &PutOptions,
    ) -> anyhow::Result<()> {
        self.log.lock().unwrap().push(format!("put {}", key));
        let data = match body {
            ObjectBody::Bytes(data) => data.to_vec(),
            ObjectBody::File(path) => tokio::fs::read(path).await?,
        };
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data, options.clone()));
        Ok(())
    }

    async fn delete_file(&self, key: &str) -> anyhow::Result<()> {
        self.log.lock().unwrap().push(format!("delete {}", key));
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn file_exists(&self, key: &str) -> anyhow::Result<bool> {
        Ok(self.objects.lock().unwrap().contains_key(key))
    }
}

/// Stands in for ffmpeg: writes `output` to the last argument.
pub struct ScriptedFfmpeg {
    pub output: Vec<u8>,
    pub invocations: Mutex<Vec<Vec<OsString>>>,
}

impl ScriptedFfmpeg {
    pub fn new(output: Vec<u8>) -> Arc<Self> {
        Arc::new(Self {
            output,
            invocations: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl CommandRunner for ScriptedFfmpeg {
    async fn run(
        &self,
        _program: &str,
        args: &[OsString],
        _timeout: Duration,
    ) -> Result<CommandOutput, PipelineError> {
        self.invocations.lock().unwrap().push(args.to_vec());
        if let Some(out) = args.last() {
            tokio::fs::write(out, &self.output).await?;
        }
        Ok(CommandOutput::default())
    }
}

pub struct TestApp {
    pub router: Router,
    pub staging: Arc<MemoryBucket>,
    pub records: Arc<MemoryBucket>,
    pub ffmpeg: Arc<ScriptedFfmpeg>,
}

pub fn config() -> HookConfig {
    HookConfig {
        jwt_secret: SECRET.to_string(),
        record_bucket: "records".to_string(),
        s3_access_key: "test".to_string(),
        s3_secret_key: "test".to_string(),
        ..HookConfig::default()
    }
}

pub fn test_app(config: HookConfig) -> TestApp {
    test_app_with_ffmpeg(config, b"transcoded".to_vec())
}

/// App whose ffmpeg stand-in produces `ffmpeg_output` for every run.
pub fn test_app_with_ffmpeg(config: HookConfig, ffmpeg_output: Vec<u8>) -> TestApp {
    let staging = Arc::new(MemoryBucket::default());
    let records = Arc::new(MemoryBucket::default());
    let ffmpeg = ScriptedFfmpeg::new(ffmpeg_output);

    let dispatcher = standard_pipeline(&config, staging.clone(), records.clone(), ffmpeg.clone());
    let router = create_app(AppState {
        dispatcher: Arc::new(dispatcher),
        records: records.clone(),
        config,
    });

    TestApp {
        router,
        staging,
        records,
        ffmpeg,
    }
}

pub fn png(w: u32, h: u32, color: [u8; 4]) -> Vec<u8> {
    let mut out = Vec::new();
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(w, h, Rgba(color)))
        .write_to(&mut Cursor::new(&mut out), ImageOutputFormat::Png)
        .unwrap();
    out
}
