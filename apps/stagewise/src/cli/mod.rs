//! # Stagewise CLI Module
//!
//! This module implements the CLI interface for Stagewise.
//!
//! ## Available Commands
//!
//! - `classify` - Classify a save file
//! - `compare` - Compare a local save against a cloud save
//! - `catchup` - Show the catch-up summary for a save
//! - `stages` - List the standard stage table
//! - `export` - Write the standard stage table to a file
//! - `import` - Read and validate a stage-table file

mod commands;

use crate::config::Config;
use clap::{Parser, Subcommand, ValueEnum};
use stagewise_core::ProgressError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// Stagewise - progress stages for incremental game saves
///
/// Classifies a save into the highest stage it has reached and reports how
/// far along that stage it is.
#[derive(Parser, Debug)]
#[command(name = "stagewise")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress banner output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Path to a stagewise.toml config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Stage-table file format.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Json,
    Binary,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify a save file
    Classify {
        /// Path to the save (JSON)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Compare two saves and report which is further along
    Compare {
        /// Path to the local save
        #[arg(long)]
        local: PathBuf,

        /// Path to the cloud save
        #[arg(long)]
        cloud: PathBuf,
    },

    /// Show the stages a save has passed through
    Catchup {
        /// Path to the save (JSON)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// List the standard stage table
    Stages,

    /// Export the standard stage table
    Export {
        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Export format
        #[arg(short = 't', long, value_enum, default_value = "json")]
        format: TableFormat,
    },

    /// Import and validate a stage table (format detected from content)
    Import {
        /// Input file path
        #[arg(short, long)]
        input: PathBuf,
    },
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli, config: &Config) -> Result<(), ProgressError> {
    let json_mode = cli.json_mode;
    let display = &config.display;

    match cli.command {
        Some(Commands::Classify { file }) => cmd_classify(&file, json_mode, display),
        Some(Commands::Compare { local, cloud }) => {
            cmd_compare(&local, &cloud, json_mode, display)
        }
        Some(Commands::Catchup { file }) => cmd_catchup(&file, json_mode, display),
        Some(Commands::Stages) => cmd_stages(json_mode),
        Some(Commands::Export { output, format }) => cmd_export(&output, format, json_mode),
        Some(Commands::Import { input }) => cmd_import(&input, json_mode),
        None => {
            // No subcommand - list stages by default
            cmd_stages(json_mode)
        }
    }
}
