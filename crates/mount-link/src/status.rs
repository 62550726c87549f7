//! The mount status collaborator.
//!
//! The heartbeat that keeps [`MountStatus`] fresh is owned by a
//! [`StatusMonitor`] implementation; the dispatcher builds one at
//! construction time and only forwards to it.

use crate::axis::AxisStatus;
use crate::error::LinkResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Snapshot of what is known about the mount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MountStatus {
    /// SmartWebServer firmware version, once reported
    pub sws_version: Option<String>,
    /// Driver diagnostics per axis
    pub axes: Vec<AxisStatus>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Where a monitor pushes status changes.
pub type StatusSink = Arc<dyn Fn(&MountStatus) + Send + Sync>;

/// Heartbeat and status owner.
#[async_trait]
pub trait StatusMonitor: Send + Sync {
    /// Begin periodic status polling.
    fn start_heartbeat(&self);

    /// Stop periodic status polling.
    fn stop_heartbeat(&self);

    /// Poll once now and return the fresh status.
    async fn refresh_status(&self) -> LinkResult<MountStatus>;

    /// Current snapshot.
    fn status(&self) -> MountStatus;

    /// Record the firmware version reported by the transport.
    fn set_sws_version(&self, version: &str);
}

/// A monitor without a heartbeat.
///
/// Holds whatever it is told and reports it back. Used for one-shot tools
/// that drive axis polling themselves.
pub struct DetachedMonitor {
    status: RwLock<MountStatus>,
    sink: StatusSink,
}

impl DetachedMonitor {
    pub fn new(sink: StatusSink) -> Self {
        Self {
            status: RwLock::new(MountStatus::default()),
            sink,
        }
    }

    /// Replace the axis statuses and notify the sink.
    pub fn set_axes(&self, axes: Vec<AxisStatus>) {
        self.update(|status| status.axes = axes);
    }

    fn update(&self, apply: impl FnOnce(&mut MountStatus)) {
        let snapshot = {
            let mut status = self.status.write();
            apply(&mut status);
            status.updated_at = Some(Utc::now());
            status.clone()
        };
        (self.sink)(&snapshot);
    }
}

#[async_trait]
impl StatusMonitor for DetachedMonitor {
    fn start_heartbeat(&self) {
        debug!("Detached monitor has no heartbeat to start");
    }

    fn stop_heartbeat(&self) {
        debug!("Detached monitor has no heartbeat to stop");
    }

    async fn refresh_status(&self) -> LinkResult<MountStatus> {
        Ok(self.status())
    }

    fn status(&self) -> MountStatus {
        self.status.read().clone()
    }

    fn set_sws_version(&self, version: &str) {
        let version = version.to_string();
        self.update(|status| status.sws_version = Some(version));
    }
}
