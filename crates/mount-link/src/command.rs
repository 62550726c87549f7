//! A single mount command and its slot in a batch.

use crate::command_log::{CommandLogEntry, LogOrigin};
use crate::transport::{Params, ResponseMap};

/// Prefix of the wire slot name for a batched command.
pub const SLOT_PREFIX: &str = "cmd_";

/// One command inside a batch.
///
/// `key` is whatever the caller wants the response filed under; `index`
/// decides the wire slot `cmd_<index>`. Built fresh for every send and
/// dropped once its response has been read back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command<K = String> {
    text: String,
    key: K,
    index: usize,
}

impl<K> Command<K> {
    pub fn new(text: impl Into<String>, key: K, index: usize) -> Self {
        Self {
            text: text.into(),
            key,
            index,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Wire slot name, `cmd_<index>`.
    pub fn slot(&self) -> String {
        format!("{SLOT_PREFIX}{}", self.index)
    }

    /// Request fragment `{ cmd_<index>: text }`.
    pub fn payload(&self) -> (String, String) {
        (self.slot(), self.text.clone())
    }

    /// This command's response, or `""` when the slot is missing.
    pub fn extract_value(&self, response: &ResponseMap) -> String {
        self.find_value(response).unwrap_or_default()
    }

    /// This command's response, or `None` when the slot is missing.
    pub fn find_value(&self, response: &ResponseMap) -> Option<String> {
        response.get(&self.slot()).cloned()
    }

    /// Build a log entry for this command from a batch response.
    pub fn log_entry(&self, response: &ResponseMap, system: bool) -> CommandLogEntry
    where
        K: ToString,
    {
        CommandLogEntry::new(
            self.text.clone(),
            self.extract_value(response),
            system,
            LogOrigin::Batch,
        )
        .with_key(self.key.to_string())
    }
}

impl<K: Clone> Command<K> {
    /// `(key, value)` pair for rebuilding the caller's keyed result.
    pub fn extract_entry(&self, response: &ResponseMap) -> (K, String) {
        (self.key.clone(), self.extract_value(response))
    }
}

/// Merge the payloads of a batch into one request body.
pub fn batch_payload<K>(commands: &[Command<K>]) -> Params {
    commands.iter().map(|c| c.payload()).collect()
}

/// Check a command against the LX200 framing the controller expects.
///
/// Returns the message to report when the command is rejected.
pub fn validate_command(text: &str) -> Result<(), String> {
    if text.starts_with(':') && text.ends_with('#') {
        return Ok(());
    }

    Err(format!(
        "Command {text} was not valid. It needs to begin with : and end with #"
    ))
}
