use crate::error::Result;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{self, AsyncBufRead, AsyncWrite, BufReader, BufWriter};

pub type Input = Box<dyn AsyncBufRead + Unpin + Send>;
pub type Output = Box<dyn AsyncWrite + Unpin + Send>;

/// Open a record source. `-` means standard input.
pub async fn open_input(path: &Path) -> Result<Input> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(BufReader::new(io::stdin())));
    }
    Ok(Box::new(BufReader::new(File::open(path).await?)))
}

/// Open a record sink, creating or truncating `path`. `None` or `-` means
/// standard output.
pub async fn open_output(path: Option<&Path>) -> Result<Output> {
    match path {
        Some(path) if path.as_os_str() != "-" => {
            Ok(Box::new(BufWriter::new(File::create(path).await?)))
        }
        _ => Ok(Box::new(io::stdout())),
    }
}
