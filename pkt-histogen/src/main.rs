use anyhow::Context as _;
use clap::Parser;
use log::info;
use pkt_histogram::{Aggregator, io, stage};
use std::path::PathBuf;

/// Fold latency records into 1 µs histograms.
#[derive(Parser, Debug)]
#[command(name = "histogen", version)]
struct Cli {
    /// Emit a histogram every N latency samples; 0 emits once at end of input
    #[arg(short, long, default_value_t = 0)]
    count: u64,

    /// Latency records to read, `-` for stdin
    #[arg(default_value = "-")]
    input: PathBuf,

    /// Where to write histogram records, stdout if omitted
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

    match cli.count {
        0 => info!("aggregating until end of input"),
        n => info!("emitting a histogram every {n} samples"),
    }
    stage::run(Aggregator::new(cli.count), input, output, stage::interrupted()).await?;
    Ok(())
}
