use crate::clean_statement;
use crate::Result;
use chrono::{SecondsFormat, Utc};
use crossbeam_channel::{Receiver, Sender};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{error, info};

#[cfg(test)]
use mockall::automock;

/// The tracing target used by [TracingAuditSink].
pub const AUDIT_TARGET: &str = "sqlaudit::audit";

/// A destination for audit entries.
///
/// An audit entry is the text of a SQL statement, recorded before the statement reaches the database. Sinks cannot fail
/// the caller: a sink that is not able to persist an entry reports the failure through `tracing`.
#[cfg_attr(test, automock)]
pub trait AuditSink: Send + Sync {
    fn record(&self, text: &str);
}

/// Emits each audit entry as an `INFO` event on the [AUDIT_TARGET] target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, text: &str) {
        info!(target: AUDIT_TARGET, "{}", text);
    }
}

/// Discards all audit entries.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _text: &str) {}
}

/// Keeps audit entries in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<String>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the entries recorded so far, in recording order.
    pub fn entries(&self) -> Vec<String> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<String>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, text: &str) {
        self.lock().push(text.to_string());
    }
}

/// Appends audit entries to a file.
///
/// Each entry is written on its own line, prefixed by the UTC time of the recording:
/// `2024-07-03T08:56:05.001Z SELECT * FROM employee WHERE id = ?`. Line breaks in the statement are collapsed. The file
/// is flushed after each entry.
pub struct FileAuditSink {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl FileAuditSink {
    /// Open the file in append mode, creating it if it does not exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self { path, writer: Mutex::new(BufWriter::new(file)) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_entry(&self, text: &str) -> std::io::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        writeln!(writer, "{} {}", Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true), clean_statement(text))?;
        writer.flush()
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, text: &str) {
        if let Err(e) = self.write_entry(text) {
            error!("Unable to write audit entry to {}: {}", self.path.display(), e);
        }
    }
}

/// Forwards audit entries to a channel.
///
/// The receiving end is consumed by the application, typically from a dedicated thread persisting the entries. With a
/// bounded channel, recording blocks while the channel is full.
pub struct ChannelAuditSink {
    sender: Sender<String>,
}

impl ChannelAuditSink {
    pub fn unbounded() -> (Self, Receiver<String>) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (Self { sender }, receiver)
    }

    pub fn bounded(capacity: usize) -> (Self, Receiver<String>) {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        (Self { sender }, receiver)
    }
}

impl AuditSink for ChannelAuditSink {
    fn record(&self, text: &str) {
        if self.sender.send(text.to_string()).is_err() {
            error!("Unable to forward audit entry, the receiver has been dropped: {}", clean_statement(text));
        }
    }
}
