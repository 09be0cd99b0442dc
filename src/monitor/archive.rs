//! Monitor archive
//!
//! Appends raw monitor frames to a per-session file, `log_<unix>.txt`.

use std::path::{Path, PathBuf};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

pub struct MonitorArchive {
    file: File,
    path: PathBuf,
}

impl MonitorArchive {
    /// Open a fresh archive file in `dir`, named after the current time.
    pub async fn create(dir: &Path) -> std::io::Result<Self> {
        tokio::fs::create_dir_all(dir).await?;
        let path = dir.join(format!("log_{}.txt", chrono::Utc::now().timestamp()));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;

        tracing::info!(path = %path.display(), "Archiving monitor stream");
        Ok(Self { file, path })
    }

    /// Append one raw frame, terminator included.
    pub async fn append(&mut self, frame: &[u8]) -> std::io::Result<()> {
        self.file.write_all(frame).await
    }

    pub async fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush().await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
