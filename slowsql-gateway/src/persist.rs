//! Persisting validated batches for the analyzer to read.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::models::ConnectionDescriptor;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{0}")]
    Encode(#[from] serde_json::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("system clock is outside the representable nanosecond range")]
    Clock,
}

/// A batch written to `<dir>/<unix_nanos>.json`.
///
/// The file is owned by the request that wrote it. It is only removed on an
/// explicit [`BatchFile::remove`]; error paths leave it on disk.
#[derive(Debug)]
pub struct BatchFile {
    path: PathBuf,
}

impl BatchFile {
    /// Serialize `batch` and write it under `dir`, creating `dir` if needed.
    pub async fn write(dir: &Path, batch: &[ConnectionDescriptor]) -> Result<Self, PersistError> {
        let bytes = serde_json::to_vec(batch)?;
        let nanos = chrono::Utc::now()
            .timestamp_nanos_opt()
            .ok_or(PersistError::Clock)?;
        let path = dir.join(format!("{nanos}.json"));

        tokio::fs::create_dir_all(dir).await?;

        let mut opts = tokio::fs::OpenOptions::new();
        opts.write(true).create(true).truncate(true);
        #[cfg(unix)]
        opts.mode(0o644);

        let mut file = opts.open(&path).await?;
        file.write_all(&bytes).await?;
        file.flush().await?;

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Best-effort delete; failures are logged and otherwise ignored.
    pub async fn remove(self) {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => debug!(path = %self.path.display(), "batch file removed"),
            Err(e) => warn!(path = %self.path.display(), error = %e, "failed to remove batch file"),
        }
    }
}
