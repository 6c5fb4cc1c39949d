//! mocap-rig - Landmark retargeting CLI
//!
//! Reads a rig description and a JSON-lines stream of detection frames, and
//! writes one pose snapshot per frame as JSON lines.

use anyhow::Context;
use clap::Parser;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use mocap_rig::{
    avatar::{AvatarBinding, Mirroring, RigDescription},
    config::Config,
    retarget::Retargeter,
    tracking::DetectionFrame,
};

/// mocap-rig - Retarget MediaPipe Holistic landmarks onto a rigged avatar
#[derive(Parser, Debug)]
#[command(name = "mocap-rig", version, about, long_about = None)]
struct Args {
    /// Rig description (JSON) exported from the avatar
    #[arg(short, long)]
    rig: PathBuf,

    /// Detection frames, one JSON object per line (stdin if omitted or "-")
    input: Option<PathBuf>,

    /// Write pose snapshots here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Smoothing factor (overrides config)
    #[arg(short, long)]
    smoothing: Option<f32>,

    /// Map user sides one-to-one onto the avatar instead of mirroring
    #[arg(long)]
    direct: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Counters for one run over a frame stream
#[derive(Debug, Default, PartialEq, Eq)]
struct RunStats {
    frames: usize,
    skipped: usize,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging; stdout carries the snapshots
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    info!("Starting {} v{}", mocap_rig::NAME, mocap_rig::VERSION);

    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };
    if let Some(smoothing) = args.smoothing {
        config.retarget.smoothing = smoothing;
    }
    if args.direct {
        config.retarget.mirroring = Mirroring::Direct;
    }

    let retargeter = Retargeter::new(&config)?;
    let rig = RigDescription::from_file(&args.rig)?;
    let mut binding = AvatarBinding::bind(&rig, &config.rig);

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) if path.as_os_str() != "-" => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open frames file {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        _ => Box::new(BufReader::new(io::stdin().lock())),
    };

    let mut writer: Box<dyn Write> = match &args.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file {}", path.display()))?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let stats = run(&retargeter, &mut binding, reader, &mut writer)?;

    info!(
        "Processed {} frames ({} malformed lines skipped)",
        stats.frames, stats.skipped
    );
    Ok(())
}

/// Retarget every frame in `reader`, writing one snapshot line per frame.
fn run<R: BufRead, W: Write>(
    retargeter: &Retargeter,
    binding: &mut AvatarBinding,
    reader: R,
    writer: &mut W,
) -> anyhow::Result<RunStats> {
    let mut stats = RunStats::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read frame stream")?;
        if line.trim().is_empty() {
            continue;
        }

        let frame: DetectionFrame = match serde_json::from_str(&line) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Skipping malformed frame on line {}: {}", index + 1, e);
                stats.skipped += 1;
                continue;
            }
        };

        let report = retargeter.apply(binding, &frame);
        debug!(line = index + 1, ?report, "Frame retargeted");

        serde_json::to_writer(&mut *writer, &binding.snapshot())?;
        writer.write_all(b"\n")?;
        stats.frames += 1;
    }

    writer.flush()?;
    Ok(stats)
}
