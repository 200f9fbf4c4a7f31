use crate::error::Result;
use crate::record::Record;
use log::{debug, info, warn};
use std::future::Future;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::signal;

/// One step of the pipeline: zero or one output record per input record,
/// plus whatever is left over once the input ends.
pub trait Stage {
    fn process(&mut self, record: Record) -> Option<Record>;

    /// Called exactly once, at end of input, on a read error, or on interrupt.
    fn finish(self) -> Option<Record>;
}

/// Drive `stage` over the newline-delimited records of `input`, writing its
/// output to `output` one line per record.
///
/// Lines that do not decode are dropped. Reading stops at end of input, on a
/// read error, or as soon as `cancel` completes; in every case the stage is
/// finished and its final record written before returning. A read error is
/// returned after that final write.
pub async fn run<S, R, W, C>(mut stage: S, input: R, mut output: W, cancel: C) -> Result<()>
where
    S: Stage,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    C: Future<Output = ()>,
{
    let mut lines = input.split(b'\n');
    let mut read_error = None;
    tokio::pin!(cancel);

    loop {
        tokio::select! {
            _ = &mut cancel => {
                info!("interrupted, finishing up");
                break;
            }
            line = lines.next_segment() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("read failed, finishing up: {e}");
                        read_error = Some(e);
                        break;
                    }
                };
                let record = match Record::decode(&line) {
                    Ok(record) => record,
                    Err(e) => {
                        debug!("dropping line: {e}");
                        continue;
                    }
                };
                if let Some(out) = stage.process(record) {
                    write_record(&mut output, &out).await?;
                }
            }
        }
    }

    if let Some(out) = stage.finish() {
        write_record(&mut output, &out).await?;
    }
    match read_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

async fn write_record<W: AsyncWrite + Unpin>(output: &mut W, record: &Record) -> Result<()> {
    let mut line = record.encode()?;
    line.push('\n');
    output.write_all(line.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}

/// Completes on the first ctrl-c. If the handler cannot be installed the
/// future never completes, so the stage simply runs to end of input.
pub async fn interrupted() {
    if let Err(e) = signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
}
