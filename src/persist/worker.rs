//! Background disk worker for the persist store
//!
//! Operations are applied one at a time in the order they were queued.
//! Failures are logged and counted; they never reach the caller that
//! queued the operation.

use crate::error::{CatalinkError, CatalinkResult};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::fs;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

#[derive(Debug)]
pub(crate) enum DiskOp {
    /// Write `bytes` to `path`, creating parent directories
    Write { path: PathBuf, bytes: Vec<u8> },
    /// Remove one artifact
    Delete { path: PathBuf },
    /// Remove a whole directory tree
    Purge { dir: PathBuf },
    /// Signal once everything queued before it has been applied
    Flush(oneshot::Sender<()>),
}

#[derive(Debug)]
pub(crate) struct DiskQueue {
    tx: mpsc::UnboundedSender<DiskOp>,
    failures: Arc<AtomicU64>,
}

impl DiskQueue {
    /// Start the worker on the current Tokio runtime
    pub(crate) fn spawn() -> CatalinkResult<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            CatalinkError::Internal(format!("persist store needs a Tokio runtime: {}", e))
        })?;
        let (tx, rx) = mpsc::unbounded_channel();
        let failures = Arc::new(AtomicU64::new(0));
        runtime.spawn(run(rx, Arc::clone(&failures)));
        Ok(Self { tx, failures })
    }

    pub(crate) fn send(&self, op: DiskOp) {
        if let Err(e) = self.tx.send(op) {
            warn!("Disk worker stopped, dropping {:?}", e.0);
            self.record_failure();
        }
    }

    pub(crate) async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        self.send(DiskOp::Flush(tx));
        // A closed channel means the worker is gone; nothing left to wait for
        let _ = rx.await;
    }

    pub(crate) fn record_failure(&self) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }
}

async fn run(mut rx: mpsc::UnboundedReceiver<DiskOp>, failures: Arc<AtomicU64>) {
    while let Some(op) = rx.recv().await {
        if let Err(e) = apply(op).await {
            warn!("Persist store disk operation failed: {}", e);
            failures.fetch_add(1, Ordering::Relaxed);
        }
    }
    debug!("Disk worker exiting");
}

async fn apply(op: DiskOp) -> CatalinkResult<()> {
    match op {
        DiskOp::Write { path, bytes } => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    CatalinkError::io(format!("creating store directory {}", parent.display()), e)
                })?;
            }
            // Write beside the target and rename so readers never see a partial file
            let partial = path.with_extension("partial");
            fs::write(&partial, bytes).await.map_err(|e| {
                CatalinkError::io(format!("writing artifact {}", partial.display()), e)
            })?;
            fs::rename(&partial, &path).await.map_err(|e| {
                CatalinkError::io(format!("moving artifact into {}", path.display()), e)
            })?;
            debug!("Persisted {}", path.display());
        }
        DiskOp::Delete { path } => match fs::remove_file(&path).await {
            Ok(()) => debug!("Deleted {}", path.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(CatalinkError::io(
                    format!("deleting artifact {}", path.display()),
                    e,
                ))
            }
        },
        DiskOp::Purge { dir } => match fs::remove_dir_all(&dir).await {
            Ok(()) => debug!("Removed {}", dir.display()),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                return Err(CatalinkError::io(
                    format!("removing store directory {}", dir.display()),
                    e,
                ))
            }
        },
        DiskOp::Flush(done) => {
            let _ = done.send(());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn applies_in_order() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("store");
        let path = dir.join("a.json");
        let queue = DiskQueue::spawn().unwrap();

        queue.send(DiskOp::Write {
            path: path.clone(),
            bytes: b"{}".to_vec(),
        });
        queue.send(DiskOp::Purge { dir: dir.clone() });
        queue.send(DiskOp::Write {
            path: path.clone(),
            bytes: b"{}".to_vec(),
        });
        queue.flush().await;

        assert!(path.exists());
        assert!(!path.with_extension("partial").exists());
        assert_eq!(queue.failures(), 0);
    }

    #[tokio::test]
    async fn missing_targets_are_not_failures() {
        let temp = TempDir::new().unwrap();
        let queue = DiskQueue::spawn().unwrap();

        queue.send(DiskOp::Delete {
            path: temp.path().join("nope.json"),
        });
        queue.send(DiskOp::Purge {
            dir: temp.path().join("nope"),
        });
        queue.flush().await;

        assert_eq!(queue.failures(), 0);
    }

    #[tokio::test]
    async fn failures_are_counted() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let queue = DiskQueue::spawn().unwrap();

        // Parent is a regular file, so the directory cannot be created
        queue.send(DiskOp::Write {
            path: blocker.join("a.json"),
            bytes: vec![],
        });
        queue.flush().await;

        assert_eq!(queue.failures(), 1);
    }

    #[test]
    fn spawn_outside_runtime_is_an_error() {
        let err = DiskQueue::spawn().unwrap_err();
        assert!(matches!(err, CatalinkError::Internal(_)));
    }
}
