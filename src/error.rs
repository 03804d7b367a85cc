//! Error taxonomy for the analysis pipeline.
//!
//! Errors are classified by where they arise (filesystem, parsing, analysis)
//! and carry enough context to reproduce: path, line/column, channel, dataset.
//! Recoverability is a property of the error kind, not of caller policy.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Classified filesystem failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsErrorKind {
    NotFound,
    PermissionDenied,
    NotADirectory,
    OutOfSpace,
    Other,
}

impl FsErrorKind {
    /// Classify an OS error into our taxonomy.
    pub fn from_io(err: &std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => FsErrorKind::NotFound,
            std::io::ErrorKind::PermissionDenied => FsErrorKind::PermissionDenied,
            std::io::ErrorKind::NotADirectory => FsErrorKind::NotADirectory,
            // ENOSPC has no stable ErrorKind on all platforms; fall back to
            // the raw OS code (28 on Linux).
            _ if err.raw_os_error() == Some(28) => FsErrorKind::OutOfSpace,
            _ => FsErrorKind::Other,
        }
    }
}

impl std::fmt::Display for FsErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            FsErrorKind::NotFound => "not found",
            FsErrorKind::PermissionDenied => "permission denied",
            FsErrorKind::NotADirectory => "not a directory",
            FsErrorKind::OutOfSpace => "out of space",
            FsErrorKind::Other => "I/O error",
        };
        write!(f, "{}", s)
    }
}

/// Errors produced by the dataset pipeline and the analysis engine.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// A filesystem operation failed.
    #[error("filesystem error ({kind}) at {}: {source}", path.display())]
    FileSystem {
        path: PathBuf,
        kind: FsErrorKind,
        #[source]
        source: std::io::Error,
    },

    /// A file contained malformed JSON or a field failed type/enum validation.
    #[error("parse error in {}{}: {message}", path.display(), position_suffix(*line, *column))]
    Parsing {
        path: PathBuf,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    /// A metrics / anomaly / ranking computation failed.
    #[error("analysis error in channel '{channel}'{}: {message}", dataset_suffix(dataset.as_deref()))]
    Analysis {
        channel: &'static str,
        dataset: Option<String>,
        message: String,
    },
}

fn position_suffix(line: Option<usize>, column: Option<usize>) -> String {
    match (line, column) {
        (Some(l), Some(c)) => format!(" at line {} column {}", l, c),
        (Some(l), None) => format!(" at line {}", l),
        _ => String::new(),
    }
}

fn dataset_suffix(dataset: Option<&str>) -> String {
    match dataset {
        Some(d) => format!(" (dataset '{}')", d),
        None => String::new(),
    }
}

impl AnalyzerError {
    /// Wrap an I/O error with its path, classifying the kind.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let kind = FsErrorKind::from_io(&source);
        AnalyzerError::FileSystem {
            path: path.into(),
            kind,
            source,
        }
    }

    /// Build a parsing error from a serde_json failure, preserving position.
    pub fn parsing(path: &Path, err: &serde_json::Error) -> Self {
        let (line, column) = if err.line() > 0 {
            (Some(err.line()), Some(err.column()))
        } else {
            (None, None)
        };
        AnalyzerError::Parsing {
            path: path.to_path_buf(),
            line,
            column,
            message: err.to_string(),
        }
    }

    /// Build a parsing error for a validation failure at no particular position.
    pub fn validation(path: &Path, message: impl Into<String>) -> Self {
        AnalyzerError::Parsing {
            path: path.to_path_buf(),
            line: None,
            column: None,
            message: message.into(),
        }
    }

    /// Build an analysis error tagged with the failing channel.
    pub fn analysis(channel: &'static str, dataset: Option<String>, message: impl Into<String>) -> Self {
        AnalyzerError::Analysis {
            channel,
            dataset,
            message: message.into(),
        }
    }

    /// Whether the continue-on-error policy may skip past this error.
    ///
    /// Out-of-space is the one inherently fatal kind: it aborts the run
    /// regardless of any continue-on-error setting.
    pub fn is_recoverable(&self) -> bool {
        match self {
            AnalyzerError::FileSystem { kind, .. } => *kind != FsErrorKind::OutOfSpace,
            AnalyzerError::Parsing { .. } => true,
            AnalyzerError::Analysis { .. } => true,
        }
    }
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, AnalyzerError>;
