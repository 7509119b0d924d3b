//! Configuration management for the `klipper-cfg` command line tool.
//!
//! Handles:
//! - Command-line argument parsing
//! - Config directory resolution

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Command-line arguments for `klipper-cfg`
#[derive(Debug, Parser)]
#[command(name = "klipper-cfg")]
#[command(about = "Read and edit Klipper and Moonraker config files without reformatting them")]
#[command(version)]
pub struct Args {
    /// Directory used for relative file arguments that do not exist as given
    #[arg(
        long,
        global = true,
        help = "Config directory (default: ~/printer_data/config)"
    )]
    pub config_dir: Option<PathBuf>,

    /// Log level for the tool
    #[arg(
        long,
        global = true,
        default_value = "warn",
        help = "Log level (trace, debug, info, warn, error)"
    )]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// Where a mutating command writes its result
#[derive(Debug, Clone, clap::Args)]
pub struct OutputArgs {
    #[arg(long, short, help = "Write to this path instead of editing in place")]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List section names in file order
    Sections { file: PathBuf },
    /// List the options of a section
    Options { file: PathBuf, section: String },
    /// Print an option value, one line per value for multi-line options
    Get {
        file: PathBuf,
        section: String,
        option: String,
        #[arg(long, help = "Printed when the section or option is missing")]
        default: Option<String>,
    },
    /// Set an option; several values make a multi-line option
    Set {
        file: PathBuf,
        section: String,
        option: String,
        #[arg(required = true)]
        values: Vec<String>,
        #[arg(long, help = "Write a multi-line option even for a single value")]
        multi: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Remove an option from a section
    RemoveOption {
        file: PathBuf,
        section: String,
        option: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Add an empty section
    AddSection {
        file: PathBuf,
        section: String,
        #[arg(long, help = "Insert before all other sections")]
        top: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Remove a section and its options
    RemoveSection {
        file: PathBuf,
        section: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Apply a TOML patch file
    Apply {
        file: PathBuf,
        patch: PathBuf,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Print the parsed document as JSON
    Dump { file: PathBuf },
    /// Parse a file and verify it renders back unchanged
    Check { file: PathBuf },
}

/// Combined configuration from all sources
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory for relative file arguments
    pub config_dir: Option<PathBuf>,
    /// Log level
    pub log_level: String,
    /// Subcommand to run
    pub command: Command,
}

impl Config {
    /// Create configuration from command-line arguments
    pub fn from_args_and_env() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Create configuration from explicit arguments (useful for testing)
    pub fn from_args(args: Args) -> Result<Self> {
        let config_dir = args.config_dir.or_else(default_config_dir);

        Ok(Config {
            config_dir,
            log_level: args.log_level,
            command: args.command,
        })
    }

    /// Resolve a file argument.
    ///
    /// Absolute paths and relative paths that exist from the working
    /// directory are used as given; anything else is taken relative to the
    /// config directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || path.exists() {
            return path.to_path_buf();
        }
        match &self.config_dir {
            Some(dir) => dir.join(path),
            None => path.to_path_buf(),
        }
    }
}

/// `~/printer_data/config`, the standard location of a Klipper install
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join("printer_data").join("config"))
}
