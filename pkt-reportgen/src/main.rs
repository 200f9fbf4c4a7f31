use anyhow::{Context as _, bail};
use clap::Parser;
use pkt_histogram::report::{find_histogram, render};
use pkt_histogram::{io, stage};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

/// Render the first histogram record of the input as a text report.
#[derive(Parser, Debug)]
#[command(name = "reportgen", version)]
struct Cli {
    /// Histogram records to read, `-` for stdin
    #[arg(default_value = "-")]
    input: PathBuf,

    /// Write the report here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(run(cli));
    // a pending stdin read can't be cancelled; don't wait for it
    rt.shutdown_background();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let input = io::open_input(&cli.input)
        .await
        .with_context(|| format!("opening {}", cli.input.display()))?;

    let histogram = tokio::select! {
        _ = stage::interrupted() => bail!("interrupted before a histogram was found"),
        found = find_histogram(input) => found?,
    };

    let mut output = io::open_output(cli.output.as_deref())
        .await
        .context("opening output")?;
    output.write_all(render(&histogram).as_bytes()).await?;
    output.flush().await?;
    Ok(())
}
