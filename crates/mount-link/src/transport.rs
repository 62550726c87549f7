//! The request channel to the controller.
//!
//! The dispatcher only ever talks to the mount through [`Transport`]; the
//! HTTP implementation lives in [`crate::http_transport`].

use crate::error::LinkResult;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Request parameters, e.g. `cmd_0 -> :GVP#`. Ordered so the wire form is
/// stable.
pub type Params = BTreeMap<String, String>;

/// Parsed keyed response, e.g. `cmd_0 -> On-Step`.
pub type ResponseMap = HashMap<String, String>;

/// Called with the SWS firmware version whenever a response carries it.
pub type VersionCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Unparsed response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RawResponse {
    /// Response body as received
    pub data: String,
}

impl RawResponse {
    pub fn new(data: impl Into<String>) -> Self {
        Self { data: data.into() }
    }
}

/// Request channel to the mount controller.
///
/// Implementations must not serialize calls themselves; the dispatcher
/// guarantees at most one call is outstanding.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a request and parse the body into a keyed response map.
    async fn get(&self, endpoint: &str, params: &Params) -> LinkResult<ResponseMap>;

    /// Issue a request and return the body untouched.
    async fn get_without_parse(&self, endpoint: &str, params: &Params) -> LinkResult<RawResponse>;

    /// Register for firmware version notifications.
    ///
    /// May fire once or many times over the life of the transport.
    fn on_version_available(&self, callback: VersionCallback);
}
