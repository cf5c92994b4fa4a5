use std::path::PathBuf;

use thiserror::Error;

use crate::processing::resolve::SchemaError;

/// Convenience result type for normalization operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Error type returned by loading, normalization, aggregation and output functions.
///
/// File-scoped variants carry the path of the file that failed so a batch caller can tell which
/// input aborted the run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Underlying I/O error (e.g. output directory missing, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Parquet output error.
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// The file's columns could not be resolved into a usable schema.
    #[error("schema error in '{}': {source}", path.display())]
    Schema {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },

    /// The input file is unreadable or is not structurally valid delimited text.
    #[error("input format error in '{}': {source}", path.display())]
    InputFormat {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A directory scan matched no input files.
    #[error("no input files matching '{pattern}' in '{}'", dir.display())]
    NoInputFiles { dir: PathBuf, pattern: String },

    /// The filename pattern used for a directory scan is not a valid glob.
    #[error("invalid file pattern: {0}")]
    InvalidPattern(#[from] glob::PatternError),

    /// Options could not be loaded or are inconsistent.
    #[error("invalid configuration: {message}")]
    Config { message: String },
}

impl EngineError {
    /// The input path this error is attributed to, when it is file-scoped.
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Schema { path, .. } | Self::InputFormat { path, .. } => Some(path.as_path()),
            Self::NoInputFiles { dir, .. } => Some(dir.as_path()),
            _ => None,
        }
    }
}
