use crate::error::{Error, Result};
use crate::histogram::Histogram;
use crate::record::Record;
use log::debug;
use std::fmt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

const BAR_WIDTH: f64 = 50.0;

/// Scan `input` for the first histogram record.
pub async fn find_histogram<R: AsyncBufRead + Unpin>(input: R) -> Result<Histogram> {
    let mut lines = input.split(b'\n');
    while let Some(line) = lines.next_segment().await? {
        match Record::decode(&line) {
            Ok(Record::Histogram(histogram)) => return Ok(histogram),
            Ok(other) => debug!("skipping {} record", other.kind()),
            Err(e) => debug!("dropping line: {e}"),
        }
    }
    Err(Error::NoHistogramFound)
}

/// Text rendering of a histogram: a summary line, then one row per bucket up
/// to the highest non-empty one, bar lengths on a log scale.
pub struct Report<'a>(pub &'a Histogram);

impl fmt::Display for Report<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let histogram = self.0;
        writeln!(
            f,
            "counts: {}, min: {} µs, max: {} µs, outliers: {}, time errors: {}",
            histogram.count(),
            bound(histogram.min()),
            bound(histogram.max()),
            histogram.outliers(),
            histogram.time_error(),
        )?;

        let Some(last) = histogram.buckets().iter().rposition(|&c| c > 0) else {
            return writeln!(f, "no samples in range");
        };

        writeln!(
            f,
            "p50: {} µs, p90: {} µs, p99: {} µs",
            bound(histogram.p50()),
            bound(histogram.p90()),
            bound(histogram.p99()),
        )?;

        let peak = histogram.buckets().iter().copied().max().unwrap_or(0);
        let scale = (peak as f64).ln_1p();
        for (bucket, &count) in histogram.buckets()[..=last].iter().enumerate() {
            let width = if count == 0 {
                0
            } else {
                ((count as f64).ln_1p() / scale * BAR_WIDTH).ceil() as usize
            };
            writeln!(f, "{bucket:>3} µs | {:<50} {count}", "#".repeat(width))?;
        }
        Ok(())
    }
}

pub fn render(histogram: &Histogram) -> String {
    Report(histogram).to_string()
}

fn bound(value: Option<i64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
