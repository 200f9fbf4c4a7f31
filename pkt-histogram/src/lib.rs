//! Packet latency extraction and windowed histogram aggregation.
//!
//! Records travel between stages as newline-delimited JSON of the form
//! `{"type": <kind>, "object": <payload>}`:
//!
//! ```text
//! rx-packet ──[Extractor]──> latency ──[Aggregator]──> histogram ──> report
//! ```
//!
//! Each stage is a [`Stage`] driven by [`stage::run`], which reads one record
//! at a time and finishes the stage at end of input or on interrupt.
pub mod aggregator;
mod error;
pub mod histogram;
pub mod io;
pub mod latency;
mod record;
pub mod report;
pub mod stage;

pub use aggregator::Aggregator;
pub use error::{Error, Result};
pub use histogram::{BUCKETS, Histogram};
pub use latency::{Extractor, compute_latency};
pub use record::{LatencySample, PacketEvent, Record};
pub use stage::Stage;
