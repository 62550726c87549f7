//! Command dispatch over the shared request channel.
//!
//! All three send paths go through one async gate, so only one request is
//! ever outstanding against the controller no matter how many callers are
//! sending at once. Each logical call's request/response round trip is
//! atomic with respect to every other call; calls complete in the order
//! the gate admits them.

use crate::command::{batch_payload, validate_command, Command};
use crate::command_log::{CommandLog, CommandLogEntry, LogOrigin};
use crate::config::{BATCH_ENDPOINT, SINGLE_ENDPOINT};
use crate::error::{LinkError, LinkResult};
use crate::status::{DetachedMonitor, MountStatus, StatusMonitor, StatusSink};
use crate::transport::{Params, ResponseMap, Transport};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Slots the SWS reads from one batch request (`cmd_0` to `cmd_99`).
pub const MAX_BATCH_COMMANDS: usize = 100;

/// Receives the message for every rejected command.
pub type ErrorCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Receives every status change reported by the monitor.
pub type StatusCallback = Arc<dyn Fn(&MountStatus) + Send + Sync>;

/// Whether a keyed batch is written to the command log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogMode {
    #[default]
    Log,
    NoLog,
}

/// Serializes commands to the mount and keeps the command log.
pub struct Dispatcher {
    transport: Arc<dyn Transport>,
    monitor: Arc<dyn StatusMonitor>,
    /// Held for the duration of every transport call.
    gate: Mutex<()>,
    log: CommandLog,
    on_error: ErrorCallback,
    on_status: RwLock<Option<StatusCallback>>,
}

impl Dispatcher {
    /// Create a dispatcher and start its status monitor.
    ///
    /// `make_monitor` gets a weak handle back to the dispatcher (for the
    /// heartbeat to send its queries through) and the sink it must push
    /// status changes into. Firmware versions reported by the transport are
    /// forwarded to the monitor.
    pub fn new<F>(transport: Arc<dyn Transport>, on_error: ErrorCallback, make_monitor: F) -> Arc<Self>
    where
        F: FnOnce(Weak<Dispatcher>, StatusSink) -> Arc<dyn StatusMonitor>,
    {
        let dispatcher = Arc::new_cyclic(|weak: &Weak<Self>| {
            let owner = weak.clone();
            let sink: StatusSink = Arc::new(move |status: &MountStatus| {
                if let Some(dispatcher) = owner.upgrade() {
                    dispatcher.notify_status(status);
                }
            });

            Self {
                transport,
                monitor: make_monitor(weak.clone(), sink),
                gate: Mutex::new(()),
                log: CommandLog::new(),
                on_error,
                on_status: RwLock::new(None),
            }
        });

        let monitor = dispatcher.monitor.clone();
        dispatcher
            .transport
            .on_version_available(Arc::new(move |version: &str| {
                monitor.set_sws_version(version)
            }));

        dispatcher.monitor.start_heartbeat();
        dispatcher
    }

    /// Create a dispatcher backed by a [`DetachedMonitor`].
    pub fn detached(transport: Arc<dyn Transport>, on_error: ErrorCallback) -> Arc<Self> {
        Self::new(transport, on_error, |_, sink| {
            Arc::new(DetachedMonitor::new(sink)) as Arc<dyn StatusMonitor>
        })
    }

    /// Register the status change callback, replacing any previous one.
    pub fn on_status_update<F>(&self, callback: F) -> &Self
    where
        F: Fn(&MountStatus) + Send + Sync + 'static,
    {
        *self.on_status.write() = Some(Arc::new(callback));
        self
    }

    /// Stop the status heartbeat.
    pub fn disconnect(&self) {
        self.monitor.stop_heartbeat();
    }

    /// Ask the monitor for a fresh status.
    pub async fn refresh_status(&self) -> LinkResult<MountStatus> {
        self.monitor.refresh_status().await
    }

    /// Last known status.
    pub fn status(&self) -> MountStatus {
        self.monitor.status()
    }

    /// Command history, most recent first.
    pub fn command_log(&self) -> Vec<CommandLogEntry> {
        self.log.snapshot()
    }

    /// Send commands as one batch and return the replies in input order.
    ///
    /// Commands are not syntax-checked on this path and nothing is logged.
    /// A reply missing from the response comes back as `""`.
    pub async fn send_command_array<S: AsRef<str>>(&self, commands: &[S]) -> LinkResult<Vec<String>> {
        Ok(self
            .send_command_slots(commands)
            .await?
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect())
    }

    /// Like [`Dispatcher::send_command_array`], but a reply missing from the
    /// response comes back as `None` instead of `""`.
    pub async fn send_command_slots<S: AsRef<str>>(&self, commands: &[S]) -> LinkResult<Vec<Option<String>>> {
        let batch: Vec<Command> = commands
            .iter()
            .enumerate()
            .map(|(index, text)| Command::new(text.as_ref(), index.to_string(), index))
            .collect();

        let response = self.batch_request(&batch).await?;

        Ok(batch.iter().map(|c| c.find_value(&response)).collect())
    }

    /// Send named commands as one batch and return the replies by name.
    ///
    /// Every command is checked before anything is sent; the first malformed
    /// one aborts the whole batch. The result has exactly the input's keys.
    pub async fn send_commands<K, C, I>(&self, commands: I, log_mode: LogMode) -> LinkResult<HashMap<K, String>>
    where
        I: IntoIterator<Item = (K, C)>,
        K: Eq + Hash + Clone + ToString,
        C: Into<String>,
    {
        let mut batch = Vec::new();
        for (index, (key, text)) in commands.into_iter().enumerate() {
            let text: String = text.into();
            self.validate(&text)?;
            batch.push(Command::new(text, key, index));
        }

        let response = self.batch_request(&batch).await?;

        let replies: HashMap<K, String> = batch.iter().map(|c| c.extract_entry(&response)).collect();

        if log_mode == LogMode::Log {
            self.log
                .prepend_batch(batch.iter().map(|c| c.log_entry(&response, false)).collect());
        }

        Ok(replies)
    }

    /// Send a single command and return the controller's raw reply.
    ///
    /// Always logged, flagged with `log_as_system`.
    pub async fn send_command(&self, text: &str, log_as_system: bool) -> LinkResult<String> {
        self.validate(text)?;

        let params: Params = [("cmd".to_string(), text.to_string())].into_iter().collect();

        debug!(command = %text, "Sending single command");

        let response = self
            .exclusive(|| self.transport.get_without_parse(SINGLE_ENDPOINT, &params))
            .await?
            .data;

        self.log.prepend(CommandLogEntry::new(
            text,
            response.clone(),
            log_as_system,
            LogOrigin::Single,
        ));

        Ok(response)
    }

    async fn batch_request<K>(&self, batch: &[Command<K>]) -> LinkResult<ResponseMap> {
        if batch.len() > MAX_BATCH_COMMANDS {
            warn!(
                commands = batch.len(),
                max = MAX_BATCH_COMMANDS,
                "Batch exceeds controller slots, trailing commands will not be answered"
            );
        }

        let params = batch_payload(batch);

        debug!(commands = batch.len(), "Sending command batch");

        self.exclusive(|| self.transport.get(BATCH_ENDPOINT, &params))
            .await
    }

    /// Run one transport call under the gate.
    ///
    /// The gate is released when the call settles or the future is dropped.
    async fn exclusive<T, F, Fut>(&self, request: F) -> LinkResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = LinkResult<T>>,
    {
        let _guard = self.gate.lock().await;
        request().await
    }

    fn validate(&self, text: &str) -> LinkResult<()> {
        validate_command(text).map_err(|message| {
            warn!(command = %text, "Rejected malformed command");
            (self.on_error)(&message);
            LinkError::InvalidCommand(message)
        })
    }

    fn notify_status(&self, status: &MountStatus) {
        let callback = self.on_status.read().clone();
        if let Some(callback) = callback {
            callback(status);
        }
    }
}
