use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{ClientError, ClientResult};

/// Where an uploaded file's bytes come from.
#[derive(Debug, Clone)]
pub enum FileSource {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

impl FileSource {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(Arc::from(bytes.into()))
    }

    /// Reads the whole payload. Each call starts a fresh read.
    pub async fn read(&self) -> ClientResult<Vec<u8>> {
        match self {
            Self::Path(path) => tokio::fs::read(path)
                .await
                .map_err(|error| ClientError::file_read_failed(path, &error.to_string())),
            Self::Bytes(bytes) => Ok(bytes.to_vec()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Path(path) => Some(path),
            Self::Bytes(_) => None,
        }
    }
}
