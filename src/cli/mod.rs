//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "tubesent",
    version,
    about = "Sentiment analysis for YouTube comment sections",
    long_about = "Tubesent fetches the top-level comments of a YouTube video, cleans them, classifies \
                  each one as positive, neutral or negative with a pretrained Indonesian sentiment model, \
                  and summarizes the distribution, sample comments, frequent terms and timeline."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/tubesent/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Profile to apply on top of the configuration (e.g., "quick", "deep")
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find a video by link or identifier and select it in the current session
    Find {
        /// Video link (watch, youtu.be, shorts, embed) or bare 11-character id
        url: String,
    },

    /// Analyze the comments of the selected video
    Analyze {
        /// Maximum number of comments to fetch (clamped to 100-5000)
        #[arg(short, long)]
        max: Option<usize>,
    },

    /// Find a video and analyze it in one step
    Run {
        /// Video link or bare id
        url: String,

        /// Maximum number of comments to fetch (clamped to 100-5000)
        #[arg(short, long)]
        max: Option<usize>,
    },

    /// Show the current session and its cached result
    Status,

    /// Render a report for the cached analysis
    Report {
        /// Report format
        #[arg(short, long, value_parser = ["markdown", "json"], default_value = "markdown")]
        format: String,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Discard the selected video and any cached result
    Reset,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Validate configuration file
    Validate {
        /// Path to config file (defaults to standard location)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Initialize default configuration
    Init {
        /// Force overwrite existing config
        #[arg(short, long)]
        force: bool,
    },
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
