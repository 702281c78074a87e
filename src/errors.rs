//! Typed error definitions for qbot.
//! Provides a small set of well-known failure modes for better logs and tests.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::fs_ops::io_hint;

#[derive(Debug, Error)]
pub enum QbotError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Type of media '{0}' is not supported (expected tv_show, anime or movie)")]
    UnsupportedCategory(String),

    #[error("Unrecognized {kind} '{value}'")]
    UnrecognizedVariant { kind: &'static str, value: String },

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: PathBuf, reason: String },

    #[error("Error walking path '{path}': {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{op} '{source_path}' -> '{dest}': {source}{}", io_hint(.source))]
    Move {
        op: &'static str,
        source_path: PathBuf,
        dest: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Relocation aborted at '{path}' after {moved} file(s): {source}")]
    PartialFailure {
        path: PathBuf,
        moved: usize,
        #[source]
        source: Box<QbotError>,
    },

    #[error("Destination already exists: {path}")]
    DestinationExists { path: PathBuf },

    #[error("Insufficient disk space for destination {dest}: need {required} bytes, have {available} bytes")]
    InsufficientSpace {
        required: u64,
        available: u64,
        dest: PathBuf,
    },

    #[error("No files found for pattern {pattern}")]
    NoMatchingFiles { pattern: String },

    #[error("{message}")]
    Invocation { message: String, output: String },

    #[error("Failed to remove staging directory '{path}': {source}")]
    Cleanup {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Operation interrupted by user")]
    Interrupted,
}

impl QbotError {
    /// Stable short identifier used as a structured log field.
    pub fn code(&self) -> &'static str {
        match self {
            QbotError::Configuration(_) => "configuration",
            QbotError::UnsupportedCategory(_) => "unsupported_category",
            QbotError::UnrecognizedVariant { .. } => "unrecognized_variant",
            QbotError::InvalidPath { .. } => "invalid_path",
            QbotError::Walk { .. } => "walk_failed",
            QbotError::Move { .. } => "move_failed",
            QbotError::PartialFailure { .. } => "partial_failure",
            QbotError::DestinationExists { .. } => "destination_exists",
            QbotError::InsufficientSpace { .. } => "insufficient_space",
            QbotError::NoMatchingFiles { .. } => "no_matching_files",
            QbotError::Invocation { .. } => "invocation_failed",
            QbotError::Cleanup { .. } => "cleanup_failed",
            QbotError::Interrupted => "interrupted",
        }
    }

    /// True for errors raised while validating configuration, before any mutation.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            QbotError::Configuration(_)
                | QbotError::UnsupportedCategory(_)
                | QbotError::UnrecognizedVariant { .. }
                | QbotError::InvalidPath { .. }
        )
    }

    /// The innermost error, looking through `PartialFailure`.
    pub fn root_cause(&self) -> &QbotError {
        match self {
            QbotError::PartialFailure { source, .. } => source.root_cause(),
            other => other,
        }
    }

    pub(crate) fn move_failed(
        op: &'static str,
        source_path: impl Into<PathBuf>,
        dest: impl Into<PathBuf>,
        source: io::Error,
    ) -> Self {
        QbotError::Move {
            op,
            source_path: source_path.into(),
            dest: dest.into(),
            source,
        }
    }
}

pub type Result<T, E = QbotError> = std::result::Result<T, E>;
