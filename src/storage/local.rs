//! Local filesystem storage.
//!
//! ## Layout
//!
//! ```text
//! data/
//! ├── deals.json              # Committed snapshot (JSON array of deals)
//! ├── .deals.json.XXXXXX.tmp  # Staged copy, one per writer, only mid-write
//! └── stats.json              # Statistics of the last committed run
//! ```
//!
//! Every write goes to its own uniquely named hidden file in the destination
//! directory and is renamed over the final path. Readers see either the old
//! file or the new one in full, and concurrent writers never share a
//! temporary file.

use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Deal, OutputConfig, RunStats};
use crate::storage::SnapshotMirror;

/// Owner of the authoritative snapshot and the stats file.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    snapshot_path: PathBuf,
    stats_path: PathBuf,
}

impl SnapshotStore {
    pub fn new(snapshot_path: impl Into<PathBuf>, stats_path: impl Into<PathBuf>) -> Self {
        Self {
            snapshot_path: snapshot_path.into(),
            stats_path: stats_path.into(),
        }
    }

    pub fn from_config(output: &OutputConfig) -> Self {
        Self::new(&output.snapshot_path, &output.stats_path)
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    pub fn stats_path(&self) -> &Path {
        &self.stats_path
    }

    /// Load the committed snapshot. A missing file is an empty snapshot;
    /// an undecodable one is an error.
    pub async fn load_previous(&self) -> Result<Vec<Deal>> {
        match read_json::<Vec<Deal>>(&self.snapshot_path).await {
            Ok(Some(deals)) => {
                log::info!(
                    "Loaded {} deals from {}",
                    deals.len(),
                    self.snapshot_path.display()
                );
                Ok(deals)
            }
            Ok(None) => {
                log::info!(
                    "No previous snapshot at {}, starting fresh",
                    self.snapshot_path.display()
                );
                Ok(Vec::new())
            }
            Err(AppError::Json(e)) => Err(AppError::corrupt(&self.snapshot_path, e)),
            Err(e) => Err(e),
        }
    }

    /// Write `deals` next to the snapshot without replacing it.
    ///
    /// Dropping the returned [`StagedSnapshot`] without committing removes
    /// the temporary file and leaves the committed snapshot as it was.
    pub async fn stage(&self, deals: &[Deal]) -> Result<StagedSnapshot> {
        let commit_err = |source: io::Error| AppError::Commit {
            path: self.snapshot_path.clone(),
            source,
        };
        let bytes = serde_json::to_vec_pretty(deals)?;
        let tmp = write_temp(&self.snapshot_path, &bytes)
            .await
            .map_err(commit_err)?;

        Ok(StagedSnapshot {
            tmp,
            final_path: self.snapshot_path.clone(),
            count: deals.len(),
        })
    }

    /// Atomically replace the committed snapshot with `deals`.
    pub async fn commit(&self, deals: &[Deal]) -> Result<()> {
        self.stage(deals).await?.commit().await
    }

    pub async fn write_stats(&self, stats: &RunStats) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(stats)?;
        write_atomic(&self.stats_path, &bytes).await?;
        Ok(())
    }

    pub async fn load_stats(&self) -> Result<Option<RunStats>> {
        read_json(&self.stats_path).await
    }
}

/// A fully written snapshot waiting to be renamed into place.
///
/// The temporary file is deleted when this is dropped uncommitted.
#[derive(Debug)]
pub struct StagedSnapshot {
    tmp: TempPath,
    final_path: PathBuf,
    count: usize,
}

impl StagedSnapshot {
    pub fn temp_path(&self) -> &Path {
        &self.tmp
    }

    /// Rename the staged file over the committed snapshot.
    pub async fn commit(self) -> Result<()> {
        let Self {
            tmp,
            final_path,
            count,
        } = self;
        if let Err(e) = tmp.persist(&final_path) {
            return Err(AppError::Commit {
                path: final_path,
                source: e.error,
            });
        }
        log::info!("Committed {} deals to {}", count, final_path.display());
        Ok(())
    }
}

/// Fast-path mirror writing the snapshot into a local directory.
#[derive(Debug, Clone)]
pub struct LocalMirror {
    path: PathBuf,
}

impl LocalMirror {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl SnapshotMirror for LocalMirror {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn publish(&self, deals: &[Deal]) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(deals)?;
        write_atomic(&self.path, &bytes)
            .await
            .map_err(|e| AppError::mirror(format!("{}: {}", self.path.display(), e)))
    }
}

/// Write `bytes` to a fresh hidden sibling of `path`, flushed and synced.
async fn write_temp(path: &Path, bytes: &[u8]) -> io::Result<TempPath> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    tokio::fs::create_dir_all(dir).await?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "snapshot".to_string());
    let (file, tmp) = tempfile::Builder::new()
        .prefix(&format!(".{name}."))
        .suffix(".tmp")
        .tempfile_in(dir)?
        .into_parts();

    // on error `tmp` is dropped and the file removed
    let mut file = tokio::fs::File::from_std(file);
    file.write_all(bytes).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(tmp)
}

/// Write bytes atomically (write to temp, then rename).
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let tmp = write_temp(path, bytes).await?;
    tmp.persist(path).map_err(|e| e.error)
}

/// Read JSON data, returning None if the file doesn't exist.
async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::Io(e)),
    }
}
