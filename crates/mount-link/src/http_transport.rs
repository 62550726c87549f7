//! HTTP transport to the SmartWebServer ajax endpoints.
//!
//! The batch endpoint answers with one `<slot>|<reply>` line per command it
//! ran, followed by a `sws_version|<version>` line:
//!
//! ```text
//! cmd_0|On-Step
//! cmd_1|12:34:56
//! sws_version|2.4
//! ```

use crate::config::LinkConfig;
use crate::error::{LinkError, LinkResult};
use crate::transport::{Params, RawResponse, ResponseMap, Transport, VersionCallback};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use tracing::{debug, error};

/// Key of the firmware version line in a batch response.
const VERSION_KEY: &str = "sws_version";

/// Parse a batch response body.
///
/// Returns the slot replies and the firmware version, if the body carried
/// one. Lines without a `|` separator are skipped; a reply may itself
/// contain `|`.
pub fn parse_batch_body(body: &str) -> (ResponseMap, Option<String>) {
    let mut replies = ResponseMap::new();
    let mut version = None;

    for line in body.lines() {
        let Some((key, value)) = line.split_once('|') else {
            continue;
        };

        if key == VERSION_KEY {
            version = Some(value.to_string());
        } else {
            replies.insert(key.to_string(), value.to_string());
        }
    }

    (replies, version)
}

fn summarize_response_body(body: &str) -> String {
    const MAX_CHARS: usize = 64;
    if body.chars().count() <= MAX_CHARS {
        return format!("len={},body={body:?}", body.len());
    }
    let head: String = body.chars().take(MAX_CHARS).collect();
    format!("len={},head={head:?}", body.len())
}

#[derive(Default)]
struct VersionState {
    known: Option<String>,
    callbacks: Vec<VersionCallback>,
}

/// [`Transport`] over plain HTTP GET requests.
pub struct HttpTransport {
    config: LinkConfig,
    client: Client,
    version: Mutex<VersionState>,
}

impl HttpTransport {
    pub fn new(config: LinkConfig) -> Self {
        Self::with_client(config, Client::new())
    }

    /// Use a preconfigured client, e.g. one with a proxy.
    pub fn with_client(config: LinkConfig, client: Client) -> Self {
        Self {
            config,
            client,
            version: Mutex::new(VersionState::default()),
        }
    }

    /// Last firmware version seen, if any.
    pub fn sws_version(&self) -> Option<String> {
        self.version.lock().known.clone()
    }

    async fn fetch(&self, endpoint: &str, params: &Params) -> LinkResult<String> {
        let url = self.config.endpoint_url(endpoint)?;

        debug!(url = %url, params = params.len(), "Requesting controller");

        let response = self.client.get(url).query(params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body_summary = summarize_response_body(&body);
            error!(status = status.as_u16(), body_summary = %body_summary, "Controller error");
            return Err(LinkError::Status {
                status: status.as_u16(),
                body_summary,
            });
        }

        Ok(response.text().await?)
    }

    fn publish_version(&self, version: String) {
        let callbacks = {
            let mut state = self.version.lock();
            if state.known.as_deref() != Some(version.as_str()) {
                debug!(version = %version, "SWS version reported");
            }
            state.known = Some(version.clone());
            state.callbacks.clone()
        };

        for callback in callbacks {
            callback(&version);
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, endpoint: &str, params: &Params) -> LinkResult<ResponseMap> {
        let body = self.fetch(endpoint, params).await?;
        let (replies, version) = parse_batch_body(&body);

        if let Some(version) = version {
            self.publish_version(version);
        }

        Ok(replies)
    }

    async fn get_without_parse(&self, endpoint: &str, params: &Params) -> LinkResult<RawResponse> {
        Ok(RawResponse::new(self.fetch(endpoint, params).await?))
    }

    /// Called immediately if a version is already known.
    fn on_version_available(&self, callback: VersionCallback) {
        let known = {
            let mut state = self.version.lock();
            state.callbacks.push(callback.clone());
            state.known.clone()
        };

        if let Some(version) = known {
            callback(&version);
        }
    }
}
