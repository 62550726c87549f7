//! In-memory history of commands sent to the mount.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::VecDeque;

/// Which send path produced a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogOrigin {
    /// `send_command`
    Single,
    /// `send_commands`
    Batch,
}

/// One command and the reply it got.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandLogEntry {
    /// Command text sent
    pub command: String,
    /// Reply text, empty when the controller gave none
    pub response: String,
    /// When the entry was logged
    pub date: DateTime<Utc>,
    /// Caller-supplied system flag
    pub system: bool,
    pub origin: LogOrigin,
    /// Friendly name the caller filed a batched command under
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl CommandLogEntry {
    /// Create an entry stamped with the current time.
    pub fn new(
        command: impl Into<String>,
        response: impl Into<String>,
        system: bool,
        origin: LogOrigin,
    ) -> Self {
        Self {
            command: command.into(),
            response: response.into(),
            date: Utc::now(),
            system,
            origin,
            key: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

/// Most-recent-first command history.
///
/// Unbounded and process-lifetime only. Reads never wait on the transport
/// gate, so a snapshot can include entries from a call that finished while
/// another one is still in flight.
#[derive(Debug, Default)]
pub struct CommandLog {
    entries: RwLock<VecDeque<CommandLogEntry>>,
}

impl CommandLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put one entry at the front.
    pub fn prepend(&self, entry: CommandLogEntry) {
        self.entries.write().push_front(entry);
    }

    /// Put a whole batch at the front, keeping the batch's own order.
    pub fn prepend_batch(&self, batch: Vec<CommandLogEntry>) {
        let mut entries = self.entries.write();
        for entry in batch.into_iter().rev() {
            entries.push_front(entry);
        }
    }

    /// Copy of the history, most recent first.
    pub fn snapshot(&self) -> Vec<CommandLogEntry> {
        self.entries.read().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
