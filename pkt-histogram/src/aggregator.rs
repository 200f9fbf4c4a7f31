use crate::histogram::Histogram;
use crate::record::{LatencySample, Record};
use crate::stage::Stage;
use log::{debug, info};
use std::mem;
use std::time::Instant;

const PROGRESS_EVERY: u64 = 1000;

/// Whether a window of `window` accepted samples is complete. A window of 0
/// never completes; the histogram is then only flushed at end of stream.
pub fn should_flush(accepted: u64, window: u64) -> bool {
    window != 0 && accepted >= window
}

/// Owns the in-flight histogram and decides when it is emitted.
///
/// Each flush hands the current histogram to the caller and starts a fresh,
/// empty one in its place.
#[derive(Debug)]
pub struct Aggregator {
    window: u64,
    accepted: u64,
    current: Histogram,
    total: u64,
    start: Instant,
}

impl Aggregator {
    pub fn new(window: u64) -> Self {
        Aggregator {
            window,
            accepted: 0,
            current: Histogram::new(),
            total: 0,
            start: Instant::now(),
        }
    }

    /// Fold one sample. Returns the completed histogram when this sample
    /// closes a window.
    pub fn fold(&mut self, sample: &LatencySample) -> Option<Histogram> {
        // latency-user-user is carried on the wire but not aggregated
        self.current.fold(sample.user_hw);
        self.accepted += 1;
        self.total += 1;

        if self.total % PROGRESS_EVERY == 0 {
            let elapsed = self.start.elapsed().as_secs_f64();
            debug!(
                "{} samples in {:.1}s = {:.1} samples/sec",
                self.total,
                elapsed,
                self.total as f64 / elapsed
            );
        }

        self.should_flush().then(|| self.flush())
    }

    pub fn should_flush(&self) -> bool {
        should_flush(self.accepted, self.window)
    }

    /// Emit the current histogram and replace it with an empty one.
    pub fn flush(&mut self) -> Histogram {
        self.accepted = 0;
        mem::take(&mut self.current)
    }

    pub fn current(&self) -> &Histogram {
        &self.current
    }

    /// Samples accepted since the last flush
    pub fn accepted(&self) -> u64 {
        self.accepted
    }

    /// Final flush at end of stream. Always yields a histogram, even an
    /// empty one.
    pub fn finish(mut self) -> Histogram {
        info!("end of stream after {} samples", self.total);
        self.flush()
    }
}

impl Stage for Aggregator {
    fn process(&mut self, record: Record) -> Option<Record> {
        match record {
            Record::Latency(sample) => self.fold(&sample).map(Record::Histogram),
            other => {
                debug!("ignoring {} record", other.kind());
                None
            }
        }
    }

    fn finish(self) -> Option<Record> {
        Some(Record::Histogram(Aggregator::finish(self)))
    }
}
