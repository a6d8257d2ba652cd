//! Drowsiness Monitor - Main Entry Point

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use dms::ClassificationMode;
use monitor_cli::{init_logging, run, MonitorSettings};
use tokio::io::{AsyncBufRead, BufReader};
use tracing::info;

/// Classify drowsiness from recorded facial landmarks (JSON lines)
#[derive(Debug, Parser)]
#[command(name = "drowsiness-monitor", version, about)]
struct Cli {
    /// Landmark frames to replay; reads stdin when omitted
    input: Option<PathBuf>,

    /// Settings file (TOML, JSON or YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the classification mode
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Emit JSON log lines on stderr
    #[arg(long)]
    json_logs: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Threshold,
    Hysteresis,
}

impl From<ModeArg> for ClassificationMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Threshold => ClassificationMode::Threshold,
            ModeArg::Hysteresis => ClassificationMode::Hysteresis,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut settings = MonitorSettings::load(cli.config.as_deref())?;
    if let Some(mode) = cli.mode {
        settings.dms.mode = mode.into();
    }
    if cli.json_logs {
        settings.log.json = true;
    }
    init_logging(&settings.log)?;

    info!("=== Drowsiness Monitor v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "Mode: {:?}, scheme: {:?}",
        settings.dms.mode, settings.scheme
    );

    let input: Box<dyn AsyncBufRead + Unpin + Send> = match &cli.input {
        Some(path) => Box::new(BufReader::new(tokio::fs::File::open(path).await?)),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let (summary, _) = run(input, tokio::io::stdout(), settings).await?;

    for subject in &summary.subjects {
        info!(
            "{}: {} frames, {} errors, {} alerts",
            subject.subject, subject.frames, subject.errors, subject.alerts
        );
    }
    if summary.malformed_lines > 0 {
        info!("{} malformed lines skipped", summary.malformed_lines);
    }

    Ok(())
}
