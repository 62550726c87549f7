//! mount-link: serialized command link to an OnStep SmartWebServer mount.
//!
//! Every request to the controller goes through one shared channel. The
//! [`Dispatcher`] lets many logical callers issue commands concurrently
//! while guaranteeing the wire only ever carries one request at a time.
//!
//! # Core Invariants
//!
//! 1. **One In-Flight**: every transport call holds the same gate
//! 2. **Order-Preserving**: batch results come back in input order, keyed
//!    results with exactly the input key set
//! 3. **Validate Before Send**: a keyed command that is not `:...#` never
//!    reaches the transport
//! 4. **Tolerant Demux**: a missing slot in a batch response reads as `""`
//!
//! # Architecture
//!
//! ```text
//! caller -> Dispatcher -> [gate] -> Transport (ajax/cmds, ajax/cmd)
//!              |                         |
//!              +-- command log <---------+
//!
//! heartbeat -> AxisDriverSet -> AxisDriver (:GXU<n>#) -> AxisStatus
//! ```

pub mod axis;
pub mod command;
pub mod command_log;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod http_transport;
pub mod status;
pub mod transport;

#[cfg(test)]
mod tests;

pub use axis::{AxisDriver, AxisDriverSet, AxisHealth, AxisName, AxisStatus, OutputState, PollState};
pub use command::{validate_command, Command};
pub use command_log::{CommandLog, CommandLogEntry, LogOrigin};
pub use config::LinkConfig;
pub use dispatcher::{Dispatcher, ErrorCallback, LogMode, StatusCallback};
pub use error::{LinkError, LinkResult};
pub use http_transport::{parse_batch_body, HttpTransport};
pub use status::{DetachedMonitor, MountStatus, StatusMonitor, StatusSink};
pub use transport::{Params, RawResponse, ResponseMap, Transport, VersionCallback};
