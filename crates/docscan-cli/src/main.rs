// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docscan — Document scanner from the command line.
//
// Entry point. Initialises logging, parses the command, and reports failures
// in plain English.

mod cli;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use docscan_core::human_errors::humanize_error;
use docscan_core::{DetectorKind, OsVersion};

#[derive(Parser)]
#[command(name = "docscan")]
#[command(about = "Find, flatten, and crop documents in camera images")]
#[command(version)]
struct Cli {
    /// Scanner configuration (JSON). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live auto-capture pipeline on replayed frames or the platform camera
    Scan {
        /// Directory of preview frames, played in file-name order. Without
        /// it the platform camera host is used.
        #[arg(short, long)]
        frames: Option<PathBuf>,

        /// Where to write the rectified page (JPEG)
        #[arg(short, long)]
        output: PathBuf,

        /// Image served as the captured still (default: the last frame)
        #[arg(long)]
        still: Option<PathBuf>,

        /// Host OS version to emulate, e.g. 16.0
        #[arg(long, default_value = "16.0")]
        os_version: OsVersion,

        /// Delay between preview frames
        #[arg(long, default_value = "33")]
        interval_ms: u64,

        /// Press the shutter after this long if nothing has settled
        #[arg(long)]
        manual_after_ms: Option<u64>,
    },

    /// Detect the document in a single image and rectify it
    Rectify {
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,

        /// Corner detector to run on the image
        #[arg(long, value_enum, default_value_t = DetectorArg::Segmentation)]
        detector: DetectorArg,
    },

    /// Encode a batch of page images as JPEGs
    Pages {
        /// Directory to write page-001.jpg, page-002.jpg, ...
        #[arg(long)]
        output_dir: PathBuf,

        /// Page images, in order
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DetectorArg {
    Segmentation,
    Rectangle,
}

impl From<DetectorArg> for DetectorKind {
    fn from(arg: DetectorArg) -> Self {
        match arg {
            DetectorArg::Segmentation => DetectorKind::DocumentSegmentation,
            DetectorArg::Rectangle => DetectorKind::RectangleDetection,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Cli::parse();
    let config = match cli::load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => return report(&err),
    };

    let outcome = match args.command {
        Commands::Scan {
            frames,
            output,
            still,
            os_version,
            interval_ms,
            manual_after_ms,
        } => {
            let options = cli::ScanOptions {
                frames,
                output,
                still,
                os_version,
                interval_ms,
                manual_after_ms,
            };
            cli::scan(config, options).await
        }
        Commands::Rectify {
            input,
            output,
            detector,
        } => cli::rectify(&config, &input, &output, detector.into()),
        Commands::Pages { output_dir, files } => cli::pages(&config, &output_dir, &files),
    };

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err),
    }
}

fn report(err: &docscan_core::ScanError) -> ExitCode {
    let human = humanize_error(err);
    tracing::debug!(code = err.code(), error = %err, "command failed");
    eprintln!("error: {}", human.message);
    eprintln!("  {}", human.suggestion);
    eprintln!("  ({}: {err})", err.code());
    ExitCode::FAILURE
}
