//! Dispatcher tests against a scripted transport.
//!
//! - `harness.rs`     - MockTransport, MockMonitor, TestHarness
//! - `ordering.rs`    - result order and key sets of batches
//! - `validation.rs`  - command syntax checks per send path
//! - `exclusion.rs`   - one transport call at a time
//! - `logging.rs`     - command history
//! - `monitor.rs`     - status collaborator pass-through
//! - `diagnostics.rs` - axis polling through the dispatcher

mod logging;
mod monitor;
