use crate::error::Result;
use crate::histogram::Histogram;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One line of the pipeline's wire protocol: `{"type": <kind>, "object": <payload>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "object", rename_all = "kebab-case")]
pub enum Record {
    RxPacket(PacketEvent),
    /// Dropped-packet / sequence-error report from the receiver; carried
    /// through decoding only so it can be recognized and ignored.
    RxError(Value),
    Latency(LatencySample),
    Histogram(Histogram),
}

impl Record {
    /// Decode a single line. Anything that is not a well-formed record of a
    /// known type is a [`crate::Error::Parse`].
    pub fn decode(line: impl AsRef<[u8]>) -> Result<Self> {
        Ok(serde_json::from_slice(line.as_ref())?)
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Record::RxPacket(_) => "rx-packet",
            Record::RxError(_) => "rx-error",
            Record::Latency(_) => "latency",
            Record::Histogram(_) => "histogram",
        }
    }
}

/// Timestamps of one received test packet, as ISO-8601 strings.
///
/// Fields are optional at the decoding layer so that a packet with a missing
/// timestamp surfaces as a malformed event rather than an unknown line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PacketEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_user_timestamp: Option<String>,
    /// Not produced by the receiver yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hw_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rx_hw_timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rx_user_timestamp: Option<String>,
}

/// Latencies of one packet in microseconds. Negative values mean the clocks
/// disagree about ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencySample {
    #[serde(rename = "latency-user-hw")]
    pub user_hw: i64,
    #[serde(rename = "latency-user-user")]
    pub user_user: i64,
}
