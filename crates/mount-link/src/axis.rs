//! Per-axis stepper driver diagnostics.
//!
//! Each axis answers `:GXU<slot>#` with a comma separated set of flags
//! reported by its stepper driver (`ST`, `OA`, `OB`, `GA`, `GB`, `OT`,
//! `PW`, `GF`), or with `0` when the driver status could not be read.
//! Drivers that keep answering `0` are dropped from polling for good.

use crate::dispatcher::Dispatcher;
use crate::error::LinkResult;
use serde::{Serialize, Serializer};
use std::fmt;
use tracing::{debug, warn};

/// Token the controller sends when it cannot read a driver.
const FAILED_TOKEN: &str = "0";

/// Failures tolerated before an axis is no longer polled.
pub const MAX_FAILED_QUERIES: u32 = 3;

/// Flag set a driver reports when it has lost contact with the controller.
const COMMS_FAILURE_SIGNATURE: &str = "ST,OA,OB,GA,GB,OT,PW";

/// Display name of an axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisName {
    Ra,
    Dec,
    /// 1-based axis number for everything past RA and Dec
    Numbered(usize),
}

impl AxisName {
    /// Name for a zero-based axis index.
    pub fn for_index(index: usize) -> Self {
        match index {
            0 => Self::Ra,
            1 => Self::Dec,
            n => Self::Numbered(n + 1),
        }
    }
}

impl fmt::Display for AxisName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ra => f.write_str("ra"),
            Self::Dec => f.write_str("dec"),
            Self::Numbered(n) => write!(f, "{n}"),
        }
    }
}

/// `"ra"`, `"dec"`, or the axis number as a JSON number.
impl Serialize for AxisName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Numbered(n) => serializer.serialize_u64(*n as u64),
            named => serializer.collect_str(named),
        }
    }
}

/// State of one driver output (motor coil).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct OutputState {
    pub open: bool,
    pub short: bool,
}

/// Decoded driver health for one axis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisHealth {
    pub name: AxisName,
    pub comms_failure: bool,
    pub stand_still: bool,
    pub output_a: OutputState,
    pub output_b: OutputState,
    pub over_temp: bool,
    pub almost_over_temp: bool,
    pub fault: bool,
}

impl AxisHealth {
    /// Decode a flag token. Flags are plain substrings and may appear in any
    /// order or combination.
    pub fn decode(name: AxisName, token: &str) -> Self {
        let has = |flag: &str| token.contains(flag);

        Self {
            name,
            comms_failure: has(COMMS_FAILURE_SIGNATURE),
            stand_still: has("ST"),
            output_a: OutputState {
                open: has("OA"),
                short: has("GA"),
            },
            output_b: OutputState {
                open: has("OB"),
                short: has("GB"),
            },
            over_temp: has("OT"),
            almost_over_temp: has("PW"),
            fault: has("GF"),
        }
    }
}

/// Last decoded status of an axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AxisStatus {
    Invalid,
    Valid(AxisHealth),
}

/// Wire shape of a status: `{ "valid": false }` or the health fields with
/// `"valid": true`.
#[derive(Serialize)]
struct TaggedStatus<'a> {
    valid: bool,
    #[serde(flatten)]
    health: Option<&'a AxisHealth>,
}

impl Serialize for AxisStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TaggedStatus {
            valid: self.is_valid(),
            health: self.health(),
        }
        .serialize(serializer)
    }
}

impl AxisStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }

    pub fn health(&self) -> Option<&AxisHealth> {
        match self {
            Self::Valid(health) => Some(health),
            Self::Invalid => None,
        }
    }
}

/// Whether an axis is still being polled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Enabled { failures: u32 },
    /// Terminal; the axis is never queried again.
    Disabled,
}

/// Diagnostics decoder for a single axis.
#[derive(Debug, Clone)]
pub struct AxisDriver {
    index: usize,
    state: PollState,
    status: Option<AxisStatus>,
}

impl AxisDriver {
    /// Create a driver for a zero-based axis index.
    pub fn new(index: usize) -> Self {
        Self {
            index,
            state: PollState::Enabled { failures: 0 },
            status: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> AxisName {
        AxisName::for_index(self.index)
    }

    pub fn state(&self) -> PollState {
        self.state
    }

    pub fn is_disabled(&self) -> bool {
        self.state == PollState::Disabled
    }

    /// Status from the last response, `None` before the first one.
    pub fn status(&self) -> Option<&AxisStatus> {
        self.status.as_ref()
    }

    /// Diagnostic query for this axis, or `None` once it is disabled.
    pub fn query_command(&self) -> Option<String> {
        match self.state {
            PollState::Enabled { .. } => Some(format!(":GXU{}#", self.index + 1)),
            PollState::Disabled => None,
        }
    }

    /// Decode this axis's token out of the full response array.
    ///
    /// A response array too short to hold this axis leaves the previous
    /// status untouched.
    pub fn handle_response<S: AsRef<str>>(&mut self, responses: &[S]) {
        let Some(token) = responses.get(self.index) else {
            return;
        };
        let token = token.as_ref();

        if token == FAILED_TOKEN {
            self.record_failure();
            self.status = Some(AxisStatus::Invalid);
            return;
        }

        self.status = Some(AxisStatus::Valid(AxisHealth::decode(self.name(), token)));
    }

    fn record_failure(&mut self) {
        let PollState::Enabled { failures } = self.state else {
            return;
        };

        let failures = failures + 1;
        if failures > MAX_FAILED_QUERIES {
            warn!(
                axis = %self.name(),
                failures,
                "Axis driver status unreadable, no longer polling"
            );
            self.state = PollState::Disabled;
        } else {
            debug!(axis = %self.name(), failures, "Axis driver status unreadable");
            self.state = PollState::Enabled { failures };
        }
    }
}

/// Diagnostics decoders for every axis of a mount.
#[derive(Debug, Clone)]
pub struct AxisDriverSet {
    drivers: Vec<AxisDriver>,
}

impl AxisDriverSet {
    pub fn new(axis_count: usize) -> Self {
        Self {
            drivers: (0..axis_count).map(AxisDriver::new).collect(),
        }
    }

    pub fn drivers(&self) -> &[AxisDriver] {
        &self.drivers
    }

    /// Current status of every axis, indexed by axis. An axis that has never
    /// answered reads as [`AxisStatus::Invalid`].
    pub fn statuses(&self) -> Vec<AxisStatus> {
        self.drivers
            .iter()
            .map(|d| d.status().cloned().unwrap_or(AxisStatus::Invalid))
            .collect()
    }

    /// Query every enabled axis in one batch and decode the answers.
    ///
    /// Answers are put back at their axis position before decoding, so a
    /// disabled axis in the middle does not shift its neighbours. An axis
    /// whose slot is missing from the response keeps its previous status.
    pub async fn poll(&mut self, dispatcher: &Dispatcher) -> LinkResult<()> {
        let queries: Vec<(usize, String)> = self
            .drivers
            .iter()
            .filter_map(|d| d.query_command().map(|q| (d.index(), q)))
            .collect();

        if queries.is_empty() {
            debug!("All axes disabled, skipping diagnostics poll");
            return Ok(());
        }

        let commands: Vec<&str> = queries.iter().map(|(_, q)| q.as_str()).collect();
        let answers = dispatcher.send_command_slots(&commands).await?;

        let mut responses = vec![String::new(); self.drivers.len()];
        let mut answered = Vec::with_capacity(queries.len());
        for ((index, _), answer) in queries.iter().zip(answers) {
            match answer {
                Some(answer) => {
                    responses[*index] = answer;
                    answered.push(*index);
                }
                None => debug!(axis = %self.drivers[*index].name(), "No diagnostics reply"),
            }
        }

        for index in answered {
            self.drivers[index].handle_response(&responses);
        }

        Ok(())
    }
}
