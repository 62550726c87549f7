//! Configuration for the mount link.

use crate::error::{LinkError, LinkResult};
use url::Url;

/// Address of the SWS when it runs as its own Wi-Fi access point.
pub const DEFAULT_BASE_URL: &str = "http://192.168.0.1";

/// Endpoint that runs a keyed batch of commands.
pub const BATCH_ENDPOINT: &str = "ajax/cmds";

/// Endpoint that runs a single command and returns the raw reply.
pub const SINGLE_ENDPOINT: &str = "ajax/cmd";

/// Axes polled for diagnostics when nothing else is configured (RA and Dec).
pub const DEFAULT_AXIS_COUNT: usize = 2;

/// Mount link configuration.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Base URL of the SmartWebServer
    pub base_url: Url,

    /// Number of axes to poll for driver diagnostics
    pub axis_count: usize,
}

impl LinkConfig {
    /// Create a config pointing at the given base URL.
    pub fn new(base_url: &str) -> LinkResult<Self> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            axis_count: DEFAULT_AXIS_COUNT,
        })
    }

    /// Create a config from the environment.
    ///
    /// `MOUNT_URL` selects the controller and `MOUNT_AXIS_COUNT` the number
    /// of axes to poll; unparsable counts fall back to the default.
    pub fn from_env() -> LinkResult<Self> {
        let base_url = std::env::var("MOUNT_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let axis_count: usize = std::env::var("MOUNT_AXIS_COUNT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_AXIS_COUNT);

        let mut config = Self::new(&base_url)?;
        config.axis_count = axis_count;
        Ok(config)
    }

    /// Resolve an endpoint against the base URL.
    pub fn endpoint_url(&self, endpoint: &str) -> LinkResult<Url> {
        self.base_url
            .join(endpoint.trim_start_matches('/'))
            .map_err(|e| LinkError::Config(format!("Invalid endpoint {endpoint}: {e}")))
    }
}

/// Parse a base URL, forcing a trailing slash so relative joins append.
fn parse_base_url(raw: &str) -> LinkResult<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };

    let url = Url::parse(&normalized)
        .map_err(|e| LinkError::Config(format!("Invalid mount URL {raw}: {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(LinkError::Config(format!(
            "Unsupported scheme {other} in mount URL {raw}"
        ))),
    }
}
