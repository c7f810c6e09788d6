//! Replays a recorded face pose trace through the gaze tracker.

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::{unbounded, RecvTimeoutError};
use gaze_estimation::{config::Config, projection::Orientation, sensor::ReplaySensor, session::GazeTracker};
use log::{info, warn};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

/// How often the drain loop checks whether the replay has finished
const DRAIN_POLL: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Recorded pose trace (JSON lines)
    #[arg(short, long)]
    trace: String,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Viewport width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Viewport height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Interface orientation (portrait, portrait-upside-down, landscape-left, landscape-right)
    #[arg(short, long)]
    orientation: Option<Orientation>,

    /// Pace frames by their recorded capture times
    #[arg(long)]
    realtime: bool,

    /// Print the example configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if args.print_config {
        print!("{}", gaze_estimation::config::EXAMPLE_CONFIG);
        return Ok(());
    }

    // Load configuration if provided
    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path);
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    if let Some(width) = args.width {
        config.display.width = width;
    }
    if let Some(height) = args.height {
        config.display.height = height;
    }
    if let Some(orientation) = args.orientation {
        config.display.orientation = orientation;
    }
    config.replay.realtime |= args.realtime;

    let sensor = ReplaySensor::from_file(&args.trace)
        .with_context(|| format!("Failed to load trace {}", args.trace))?
        .realtime(config.replay.realtime);
    let expected = sensor.len();

    let (frames_tx, frames_rx) = unbounded();
    let mut tracker = GazeTracker::from_config(&config, Box::new(sensor), Arc::new(frames_tx))?;

    tracker.start()?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut emitted = 0usize;

    // Throttled frames produce no output, so the sink going quiet says nothing
    // about progress; the drain ends once the replay stream is exhausted
    loop {
        match frames_rx.recv_timeout(DRAIN_POLL) {
            Ok(frame) => {
                writeln!(out, "{}", frame.to_json()?)?;
                emitted += 1;
            }
            Err(RecvTimeoutError::Timeout) if tracker.stream_ended() => break,
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }

    // Frames pushed just before the worker finished
    for frame in frames_rx.try_iter() {
        writeln!(out, "{}", frame.to_json()?)?;
        emitted += 1;
    }
    out.flush()?;

    tracker.stop()?;
    info!("Emitted {} gaze frames from {} trace records", emitted, expected);

    Ok(())
}
