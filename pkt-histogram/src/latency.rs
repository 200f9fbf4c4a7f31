use crate::error::{Error, Result};
use crate::record::{LatencySample, PacketEvent, Record};
use crate::stage::Stage;
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use log::{debug, warn};

/// Compute both latencies of a received packet.
///
/// Differences are truncated toward zero to whole microseconds. Negative
/// results are kept as is.
pub fn compute_latency(event: &PacketEvent) -> Result<LatencySample> {
    let tx_user = timestamp("tx-user-timestamp", event.tx_user_timestamp.as_deref())?;
    let rx_hw = timestamp("rx-hw-timestamp", event.rx_hw_timestamp.as_deref())?;
    let rx_user = timestamp("rx-user-timestamp", event.rx_user_timestamp.as_deref())?;

    Ok(LatencySample {
        user_hw: micros(rx_hw - tx_user)?,
        user_user: micros(rx_user - tx_user)?,
    })
}

/// Parse an ISO-8601 point in time. Values without an offset are taken as UTC.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|ts| ts.and_utc())
}

fn timestamp(name: &str, value: Option<&str>) -> Result<DateTime<Utc>> {
    let value = value.ok_or_else(|| Error::MalformedEvent(format!("missing {name}")))?;
    parse_timestamp(value)
        .ok_or_else(|| Error::MalformedEvent(format!("invalid {name} {value:?}")))
}

fn micros(delta: TimeDelta) -> Result<i64> {
    delta
        .num_microseconds()
        .ok_or_else(|| Error::MalformedEvent(format!("latency out of range: {delta}")))
}

/// Turns `rx-packet` records into `latency` records. Holds no state.
#[derive(Debug, Default)]
pub struct Extractor;

impl Stage for Extractor {
    fn process(&mut self, record: Record) -> Option<Record> {
        match record {
            Record::RxPacket(event) => match compute_latency(&event) {
                Ok(sample) => Some(Record::Latency(sample)),
                Err(e) => {
                    warn!("skipping packet: {e}");
                    None
                }
            },
            other => {
                debug!("ignoring {} record", other.kind());
                None
            }
        }
    }

    fn finish(self) -> Option<Record> {
        None
    }
}
