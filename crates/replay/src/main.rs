//! Drowsiness Trace Replay - Main Entry Point

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use drowsiness::MonitorSession;
use drowsy_replay::{init_logging, run_replay, OutputFormat, ReplayOptions, ReplaySettings};
use tokio::io::{AsyncBufRead, BufReader};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "drowsy-replay", version, about = "Replay an EAR/MAR trace through the drowsiness classifier")]
struct Args {
    /// Trace file with one `ear,mar` pair per line, `-` for stdin
    #[arg(short, long, default_value = "-")]
    input: String,

    /// Optional settings file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Report format written to stdout
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Pace frames at the configured frame rate
    #[arg(long)]
    realtime: bool,

    /// Acknowledge DANGER alerts as soon as they are raised
    #[arg(long)]
    auto_ack: bool,

    /// Calibrate thresholds from the first face frames
    #[arg(long)]
    calibrate: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_json);

    info!("=== Drowsiness Replay v{} ===", env!("CARGO_PKG_VERSION"));

    let settings = ReplaySettings::load(args.config.as_deref()).context("Failed to load settings")?;
    let mut session = MonitorSession::new(settings.detector, settings.calibration)?;

    let input: Box<dyn AsyncBufRead + Unpin> = if args.input == "-" {
        Box::new(BufReader::new(tokio::io::stdin()))
    } else {
        let file = tokio::fs::File::open(&args.input)
            .await
            .with_context(|| format!("Failed to open trace {}", args.input))?;
        Box::new(BufReader::new(file))
    };

    let options = ReplayOptions {
        format: args.format,
        realtime: args.realtime,
        auto_ack: args.auto_ack,
        calibrate: args.calibrate,
    };

    let mut out = std::io::BufWriter::new(std::io::stdout());
    run_replay(&mut session, input, &mut out, &options).await?;

    Ok(())
}
