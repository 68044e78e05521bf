use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use facemood::facs::{EmotionClassifier, FeatureVector, Point3D};
use facemood::core::FrameRenderer;
use facemood::{logging, EmotionConfig, EmotionSession, FrameReport};
use serde::Deserialize;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "facemood-cli")]
#[command(about = "Classify coarse emotions from recorded face-mesh landmarks", long_about = None)]
struct Cli {
    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a JSON-lines landmark recording through a session
    Replay {
        /// One `{"landmarks": [...] | null}` object per line
        #[arg(short, long)]
        input: PathBuf,
        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Include features and baseline deviations in each report
        #[arg(long)]
        debug: bool,
        /// Override the smoothing window size
        #[arg(long)]
        window: Option<usize>,
    },
    /// Run the decision list on explicit feature values
    Classify {
        #[arg(long)]
        mar: f32,
        #[arg(long)]
        mouth_width: f32,
        #[arg(long)]
        avg_ear: f32,
        #[arg(long, default_value_t = 0.0)]
        eyebrow_raise: f32,
    },
    /// Print the default configuration as JSON
    Config {
        /// Use the 5-frame smoothing preset
        #[arg(long)]
        responsive: bool,
    },
}

#[derive(Deserialize)]
struct RecordedFrame {
    landmarks: Option<Vec<Point3D>>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(&cli.log_level);

    match cli.command {
        Commands::Replay {
            input,
            config,
            debug,
            window,
        } => {
            let mut config = match config {
                Some(path) => EmotionConfig::from_json_file(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => EmotionConfig::default(),
            };
            if let Some(k) = window {
                config.smoothing.capacity = k;
                config.validate()?;
            }
            config.debug_overlay |= debug;

            let file = File::open(&input)
                .with_context(|| format!("Failed to open {}", input.display()))?;
            replay(BufReader::new(file), config, io::stdout().lock())?;
        }
        Commands::Classify {
            mar,
            mouth_width,
            avg_ear,
            eyebrow_raise,
        } => {
            let features = FeatureVector {
                left_ear: avg_ear,
                right_ear: avg_ear,
                avg_ear,
                mar,
                mouth_open: 0.0,
                mouth_width,
                eyebrow_raise,
            };
            let sample = EmotionClassifier::default().classify(&features);
            println!("{}", serde_json::to_string(&sample)?);
        }
        Commands::Config { responsive } => {
            let config = if responsive {
                EmotionConfig::responsive()
            } else {
                EmotionConfig::default()
            };
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// Parses a JSON-lines recording, skipping blank and unparseable lines.
fn recorded_frames(reader: impl BufRead) -> impl Iterator<Item = Option<Vec<Point3D>>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(line_no, line)| {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!(line = line_no + 1, error = %e, "failed to read input");
                    return None;
                }
            };
            if line.trim().is_empty() {
                return None;
            }
            match serde_json::from_str::<RecordedFrame>(&line) {
                Ok(frame) => Some(frame.landmarks),
                Err(e) => {
                    warn!(line = line_no + 1, error = %e, "unparseable frame");
                    None
                }
            }
        })
}

/// Writes one JSON report per line.
struct JsonLinesRenderer<W: Write>(W);

impl<W: Write> FrameRenderer for JsonLinesRenderer<W> {
    fn render(&mut self, report: &FrameReport) -> facemood::Result<()> {
        writeln!(self.0, "{}", report.to_json())?;
        Ok(())
    }
}

fn replay(reader: impl BufRead, config: EmotionConfig, out: impl Write) -> Result<usize> {
    let mut session = EmotionSession::new(config);
    session.start();
    let written = session.run(recorded_frames(reader), &mut JsonLinesRenderer(out))?;
    session.stop();
    info!(frames = written, "replay finished");
    Ok(written)
}
