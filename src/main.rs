// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use preview_capture::Config;
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "preview-capture")]
#[command(about = "Capture a frame into per-profile JPEG outputs")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one frame through every configured profile
    Capture {
        /// Input frame file
        #[arg(short, long)]
        input: PathBuf,

        /// Frame layout: nv21, nv12, i420, or encoded (JPEG/PNG)
        #[arg(short, long, default_value = "encoded")]
        format: String,

        /// Frame width (planar formats only)
        #[arg(long)]
        width: Option<u32>,

        /// Frame height (planar formats only)
        #[arg(long)]
        height: Option<u32>,
    },

    /// Print the effective configuration
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load_or_default(cli.config.as_deref())?;

    // RUST_LOG takes precedence over the configured filter
    // Examples: RUST_LOG=debug, RUST_LOG=preview_capture=debug
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_filter)),
        )
        .with_target(true)
        .with_level(true)
        .init();

    match cli.command {
        Commands::Capture {
            input,
            format,
            width,
            height,
        } => cli::capture(&config, &input, &format, width, height),
        Commands::Config => cli::print_config(&config),
    }
}
