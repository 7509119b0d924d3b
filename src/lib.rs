//! Klipper Config Editor
//!
//! Lossless reading and editing of Klipper and Moonraker config files.
//!
//! This library provides:
//! - A line classifier and parser for the Klipper config dialect
//! - An ordered document model that renders back byte for byte
//! - Section and option editing with typed getters
//! - TOML patch files and a small command line front end

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod files;
pub mod parser;
pub mod patch;

// Re-exports for clean public API
pub use config::Config;
pub use crate::core::{render, Document, Item, OptionValue, Section};
pub use error::{ConfigError, ConfigResult};
pub use files::{read_file, write_file};
pub use parser::parse_str;
pub use patch::Patch;
