use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    /// A line that is not a `{"type": .., "object": ..}` record, or whose
    /// payload does not match its type.
    #[error("unparseable record: {0}")]
    Parse(String),
    /// An `rx-packet` whose timestamps are missing or not valid points in time.
    #[error("malformed rx-packet: {0}")]
    MalformedEvent(String),
    #[error("no valid histogram data found")]
    NoHistogramFound,
    #[error("i/o error")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Parse(e.to_string())
    }
}
