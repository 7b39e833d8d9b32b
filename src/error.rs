use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the curation pipeline.
///
/// Per-record problems are usually turned into an [`Outcome`](crate::report::Outcome)
/// instead of being propagated, so that one bad structure never aborts a batch.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Underlying filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error while building, reading or writing a table
    #[error("Table error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Error while parsing a cross-reference XML document
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Configuration file could not be parsed
    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// A structure file could not be parsed
    #[error("Unreadable structure {}: {message}", path.display())]
    Structure {
        /// Path of the structure file
        path: PathBuf,
        /// Breaking errors reported by the reader
        message: String,
    },

    /// A required input file or folder does not exist
    #[error("Missing input: {}", .0.display())]
    MissingInput(PathBuf),

    /// An input line or file did not follow the expected layout
    #[error("Malformed input in {source_name}: {message}")]
    Malformed {
        /// File or record the problem was found in
        source_name: String,
        /// What was wrong
        message: String,
    },
}

impl PipelineError {
    pub(crate) fn malformed(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Malformed {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;
