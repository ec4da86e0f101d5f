//! Audit log - best-effort record of mutations kept as a JSON array on disk.
//!
//! The file is rewritten whole on every append, so appends are funneled
//! through one writer task. Handlers only enqueue; a failed or slow write
//! never reaches the HTTP response. The queue is bounded and records that
//! do not fit are dropped and logged.
//!
//! # Error Handling
//!
//! Read/write failures are logged with `tracing::error!` and otherwise
//! dropped. A missing or unparsable file is treated as an empty log.

use crate::models::audit::AuditRecord;
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::sync::{
    mpsc::{self, error::TrySendError},
    oneshot,
};

/// Errors raised inside the writer task. Never surfaced to clients.
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("audit log I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("audit log serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Records that may wait for the writer before new ones are dropped.
const QUEUE_CAPACITY: usize = 1024;

enum Command {
    Append(AuditRecord),
    Flush(oneshot::Sender<()>),
}

/// Handle to the audit writer. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AuditLog {
    tx: Option<mpsc::Sender<Command>>,
}

impl AuditLog {
    /// Spawn the writer task for the log at `path`.
    ///
    /// Must be called from within a tokio runtime. The task ends once every
    /// handle has been dropped and the queue is drained.
    pub fn spawn(path: impl Into<PathBuf>) -> Self {
        Self::spawn_with_capacity(path, QUEUE_CAPACITY)
    }

    /// Like [`AuditLog::spawn`] with an explicit queue bound.
    pub fn spawn_with_capacity(path: impl Into<PathBuf>, capacity: usize) -> Self {
        let path = path.into();
        let (tx, rx) = mpsc::channel(capacity);
        tokio::spawn(run_writer(path, rx));
        Self { tx: Some(tx) }
    }

    /// A log that discards every record.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Enqueue a record. Returns immediately; drops the record if the queue is full.
    pub fn record(&self, record: AuditRecord) {
        let Some(tx) = &self.tx else { return };

        match tx.try_send(Command::Append(record)) {
            Ok(()) => {}
            Err(TrySendError::Full(Command::Append(record))) => {
                tracing::error!(action = ?record.action, id = ?record.id, "audit queue full, record dropped");
            }
            Err(_) => tracing::error!("audit writer has stopped, record dropped"),
        }
    }

    /// Wait until every record enqueued before this call has been processed.
    pub async fn flush(&self) {
        let Some(tx) = &self.tx else { return };

        let (done_tx, done_rx) = oneshot::channel();
        if tx.send(Command::Flush(done_tx)).await.is_ok() {
            let _ = done_rx.await;
        }
    }
}

async fn run_writer(path: PathBuf, mut rx: mpsc::Receiver<Command>) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Append(record) => {
                if let Err(err) = append(&path, record).await {
                    tracing::error!(error = %err, path = %path.display(), "failed to write audit log");
                }
            }
            Command::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}

/// Read the whole array, push one record, write it back.
async fn append(path: &Path, record: AuditRecord) -> Result<(), AuditError> {
    let mut records = read_records(path).await?;
    records.push(record);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let bytes = serde_json::to_vec(&records)?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

/// Load existing records. A missing, empty or corrupt file yields an empty list.
pub async fn read_records(path: &Path) -> Result<Vec<AuditRecord>, AuditError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(err.into()),
    };

    match serde_json::from_slice(&bytes) {
        Ok(records) => Ok(records),
        Err(err) => {
            tracing::warn!(error = %err, path = %path.display(), "audit log unreadable, starting a new one");
            Ok(Vec::new())
        }
    }
}
