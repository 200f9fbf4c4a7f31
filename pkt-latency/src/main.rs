use anyhow::Context as _;
use clap::Parser;
use log::info;
use pkt_histogram::{Extractor, io, stage};
use std::path::PathBuf;

/// Turn received-packet records into per-packet latency records.
#[derive(Parser, Debug)]
#[command(name = "latency", version)]
struct Cli {
    /// Packet records to read, `-` for stdin
    #[arg(default_value = "-")]
    input: PathBuf,

    /// Where to write latency records, stdout if omitted
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
    let output = io::open_output(cli.output.as_deref())
        .await
        .context("opening output")?;

    info!("reading packets from {}", cli.input.display());
    stage::run(Extractor, input, output, stage::interrupted()).await?;
    Ok(())
}
