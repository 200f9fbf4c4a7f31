use serde::{Deserialize, Serialize};

/// Number of 1 µs buckets; latencies at or above this are outliers.
pub const BUCKETS: usize = 100;

type LatencyMicros = i64;

/// Latency distribution of one window: fixed 1 µs buckets covering
/// `[0, BUCKETS)` plus counters for what falls outside them.
///
/// `count == buckets.sum() + outliers + time_error` holds after every
/// [`Histogram::fold`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Histogram {
    count: u64,
    min: Option<LatencyMicros>,
    max: Option<LatencyMicros>,
    outliers: u64,
    time_error: u64,
    #[serde(rename = "histogram", with = "buckets")]
    buckets: [u64; BUCKETS],
}

impl Histogram {
    /// Return an empty histogram
    pub fn new() -> Self {
        Histogram {
            count: 0,
            min: None,
            max: None,
            outliers: 0,
            time_error: 0,
            buckets: [0; BUCKETS],
        }
    }

    /// Add a latency measurement
    pub fn fold(&mut self, latency: LatencyMicros) -> &mut Self {
        self.count += 1;

        if self.max.is_none_or(|max| latency > max) {
            self.max = Some(latency);
        }
        if self.min.is_none_or(|min| latency < min) {
            self.min = Some(latency);
        }

        if latency < 0 {
            self.time_error += 1;
        } else if latency < BUCKETS as LatencyMicros {
            self.buckets[latency as usize] += 1;
        } else {
            self.outliers += 1;
        }

        self
    }

    /// Get the number of samples folded in
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Smallest latency seen, `None` while empty
    pub fn min(&self) -> Option<LatencyMicros> {
        self.min
    }

    /// Largest latency seen, `None` while empty
    pub fn max(&self) -> Option<LatencyMicros> {
        self.max
    }

    /// Samples at or above `BUCKETS` µs
    pub fn outliers(&self) -> u64 {
        self.outliers
    }

    /// Samples with negative latency
    pub fn time_error(&self) -> u64 {
        self.time_error
    }

    pub fn buckets(&self) -> &[u64; BUCKETS] {
        &self.buckets
    }

    /// Samples that landed in a bucket
    pub fn in_range(&self) -> u64 {
        self.buckets.iter().sum()
    }

    /// Returns the p99 of the bucketed samples
    pub fn p99(&self) -> Option<LatencyMicros> {
        self.quantile(0.99)
    }

    /// Returns the p90 of the bucketed samples
    pub fn p90(&self) -> Option<LatencyMicros> {
        self.quantile(0.90)
    }

    /// Returns the p50 of the bucketed samples
    pub fn p50(&self) -> Option<LatencyMicros> {
        self.quantile(0.50)
    }

    /// Return the lower bound of the bucket holding quantile `q` (0.0->1.0)
    /// of the in-range samples. Outliers and time errors are not ranked.
    pub fn quantile(&self, q: f64) -> Option<LatencyMicros> {
        let total = self.in_range();
        if total == 0 {
            return None;
        }

        let target = ((total as f64 * q.clamp(0.0, 1.0)).ceil() as u64).max(1);
        let mut running = 0;
        for (bucket, count) in self.buckets.iter().enumerate() {
            running += count;
            if running >= target {
                return Some(bucket as LatencyMicros);
            }
        }
        None
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

/// serde only derives arrays up to 32 elements; the bucket array goes over the
/// wire as a plain JSON list and must come back with exactly `BUCKETS` entries.
mod buckets {
    use super::BUCKETS;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(buckets: &[u64; BUCKETS], s: S) -> Result<S::Ok, S::Error> {
        s.collect_seq(buckets.iter())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<[u64; BUCKETS], D::Error> {
        let v = Vec::<u64>::deserialize(d)?;
        let len = v.len();
        v.try_into()
            .map_err(|_| D::Error::invalid_length(len, &"100 histogram buckets"))
    }
}
