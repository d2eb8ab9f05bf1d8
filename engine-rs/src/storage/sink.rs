use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{DocumentStore, StorageKey};

#[derive(Debug, Clone)]
pub enum WriteOp {
    Save(StorageKey, Value),
    Remove(StorageKey),
}

/// Where committed snapshots go. Callers never wait on the outcome; write
/// failures are logged and dropped.
#[derive(Clone)]
pub enum PersistSink {
    /// Writes on the calling thread. Used by tests and tools.
    Inline(Arc<dyn DocumentStore>),
    /// Hands writes to a background task.
    WriteBehind(mpsc::UnboundedSender<WriteOp>),
}

impl PersistSink {
    pub fn inline(store: Arc<dyn DocumentStore>) -> Self {
        PersistSink::Inline(store)
    }

    /// Spawns the writer on tokio's blocking pool. The task ends once every
    /// sender is dropped and the queue has drained.
    pub fn write_behind(store: Arc<dyn DocumentStore>) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<WriteOp>();
        let handle = tokio::task::spawn_blocking(move || {
            while let Some(op) = rx.blocking_recv() {
                apply(store.as_ref(), op);
            }
            tracing::debug!("persistence writer drained");
        });
        (PersistSink::WriteBehind(tx), handle)
    }

    pub fn submit(&self, op: WriteOp) {
        match self {
            PersistSink::Inline(store) => apply(store.as_ref(), op),
            PersistSink::WriteBehind(tx) => {
                if tx.send(op).is_err() {
                    tracing::warn!("persistence writer is gone; dropping write");
                }
            }
        }
    }
}

fn apply(store: &dyn DocumentStore, op: WriteOp) {
    let (key, result) = match op {
        WriteOp::Save(key, doc) => (key, store.save(key, &doc)),
        WriteOp::Remove(key) => (key, store.remove(key)),
    };
    if let Err(e) = result {
        tracing::warn!(key = %key, error = %e, "durable write failed");
    }
}
