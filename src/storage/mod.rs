//! Snapshot persistence and fast-path mirrors.
//!
//! The committed snapshot on local disk is authoritative. Mirrors receive
//! best-effort copies (partial ones after each category, the full one after
//! commit) and their failures never fail a run.

pub mod local;
#[cfg(feature = "s3")]
pub mod s3;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::models::{Deal, MirrorConfig, OutputConfig};

pub use local::{LocalMirror, SnapshotStore, StagedSnapshot};
#[cfg(feature = "s3")]
pub use s3::S3Mirror;

/// Destination for best-effort snapshot copies.
#[async_trait]
pub trait SnapshotMirror: Send + Sync {
    /// Human-readable destination for logs.
    fn describe(&self) -> String;

    /// Replace the mirrored copy with `deals`.
    async fn publish(&self, deals: &[Deal]) -> Result<()>;
}

/// Publishes to several mirrors; fails if any of them failed.
pub struct MirrorSet {
    mirrors: Vec<Arc<dyn SnapshotMirror>>,
}

impl MirrorSet {
    pub fn new(mirrors: Vec<Arc<dyn SnapshotMirror>>) -> Self {
        Self { mirrors }
    }
}

#[async_trait]
impl SnapshotMirror for MirrorSet {
    fn describe(&self) -> String {
        self.mirrors
            .iter()
            .map(|m| m.describe())
            .collect::<Vec<_>>()
            .join(", ")
    }

    async fn publish(&self, deals: &[Deal]) -> Result<()> {
        let mut first_err = None;
        for mirror in &self.mirrors {
            if let Err(e) = mirror.publish(deals).await {
                log::warn!("Mirror {} failed: {}", mirror.describe(), e);
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

/// Build the configured mirror. `None` when nothing is configured.
///
/// Fails if the local mirror would write a file owned by `output`.
pub async fn open_mirror(
    mirror: &MirrorConfig,
    output: &OutputConfig,
) -> Result<Option<Arc<dyn SnapshotMirror>>> {
    mirror.check_targets(output)?;
    let mut mirrors: Vec<Arc<dyn SnapshotMirror>> = Vec::new();

    if let Some(target) = mirror.local_target(output) {
        mirrors.push(Arc::new(LocalMirror::new(target)));
    }

    if let Some(bucket) = &mirror.s3_bucket {
        #[cfg(feature = "s3")]
        mirrors.push(Arc::new(
            S3Mirror::from_env(bucket.clone(), mirror.s3_key.clone()).await,
        ));
        #[cfg(not(feature = "s3"))]
        log::warn!(
            "mirror.s3_bucket = {} ignored: built without the `s3` feature",
            bucket
        );
    }

    Ok(match mirrors.len() {
        0 => None,
        1 => mirrors.pop(),
        _ => Some(Arc::new(MirrorSet::new(mirrors)) as Arc<dyn SnapshotMirror>),
    })
}

/// Background publisher feeding one mirror.
///
/// Snapshots are handed over through a `watch` channel; if the mirror is
/// still busy when a newer snapshot arrives, the older one is skipped. The
/// last snapshot handed over before [`finish`](Self::finish) is always
/// published.
pub struct MirrorPublisher {
    tx: Option<watch::Sender<Option<Arc<[Deal]>>>>,
    task: Option<JoinHandle<()>>,
}

impl MirrorPublisher {
    /// Spawn the publishing task. Without a mirror every call is a no-op.
    pub fn spawn(mirror: Option<Arc<dyn SnapshotMirror>>) -> Self {
        let Some(mirror) = mirror else {
            return Self::disabled();
        };

        let (tx, mut rx) = watch::channel::<Option<Arc<[Deal]>>>(None);
        let task = tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let latest = rx.borrow_and_update().clone();
                let Some(deals) = latest else {
                    continue;
                };
                match mirror.publish(&deals).await {
                    Ok(()) => log::debug!(
                        "Published {} deals to {}",
                        deals.len(),
                        mirror.describe()
                    ),
                    Err(e) => log::warn!(
                        "Publish to {} failed, skipping: {}",
                        mirror.describe(),
                        e
                    ),
                }
            }
        });

        Self {
            tx: Some(tx),
            task: Some(task),
        }
    }

    pub fn disabled() -> Self {
        Self {
            tx: None,
            task: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Queue `deals` for publishing without waiting for the mirror.
    pub fn publish(&self, deals: Vec<Deal>) {
        if let Some(tx) = &self.tx {
            tx.send_replace(Some(deals.into()));
        }
    }

    /// Close the channel and wait until the last queued snapshot is out.
    pub async fn finish(mut self) {
        drop(self.tx.take());
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::warn!("Mirror publisher task ended abnormally: {}", e);
            }
        }
    }
}
