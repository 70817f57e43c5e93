use std::fmt;
use thiserror::Error;

/// Failure while finalizing an upload.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),

    #[error("Local I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Transform failed: {0}")]
    Transform(String),

    #[error("{program} exited with {status}: {output}")]
    Transcode {
        program: String,
        status: String,
        output: String,
    },

    #[error("{program} did not finish within {seconds}s")]
    Timeout { program: String, seconds: u64 },
}

/// Coarse class of a [`PipelineError`], used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transform,
    Storage,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Transform => f.write_str("transform"),
            FailureKind::Storage => f.write_str("storage"),
        }
    }
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::Storage(_) | PipelineError::Io(_) => FailureKind::Storage,
            PipelineError::Image(_)
            | PipelineError::Transform(_)
            | PipelineError::Transcode { .. }
            | PipelineError::Timeout { .. } => FailureKind::Transform,
        }
    }
}
