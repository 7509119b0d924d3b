//! Error types for parsing and editing configuration documents.

use std::path::PathBuf;

use thiserror::Error;

/// Every failure the parser, editor and file layer can report.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A section header was declared twice, or `add_section` was called
    /// with a name that already exists.
    #[error("section '{section}' already exists{}", at_line(.line))]
    DuplicateSection {
        section: String,
        line: Option<usize>,
    },

    /// An option was declared twice within one section.
    #[error("option '{option}' in section '{section}' already exists{}", at_line(.line))]
    DuplicateOption {
        section: String,
        option: String,
        line: Option<usize>,
    },

    #[error("section '{0}' does not exist")]
    NoSection(String),

    #[error("option '{option}' in section '{section}' does not exist")]
    NoOption { section: String, option: String },

    /// The stored value could not be coerced to the requested type.
    #[error("option '{option}' in section '{section}': cannot read '{value}' as {expected}")]
    InvalidValue {
        section: String,
        option: String,
        value: String,
        expected: &'static str,
    },

    /// A scalar getter was used on an option that holds several lines.
    #[error("option '{option}' in section '{section}' is a multi-line option")]
    NotSingleLine { section: String, option: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("io error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("patch error: {0}")]
    Patch(String),
}

fn at_line(line: &Option<usize>) -> String {
    match line {
        Some(n) => format!(" (line {n})"),
        None => String::new(),
    }
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// True for the structural errors raised while reading a file.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateSection { line: Some(_), .. } | Self::DuplicateOption { line: Some(_), .. }
        )
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
