//! The [`GbError`] `enum` definition and error messages.
//!
use crate::{track::TrackKind, Position, TrackId};
use thiserror::Error;

/// The [`GbError`] defines the standard set of errors that should
/// be passed to the user.
///
/// The record-level variants ([`GbError::MalformedRecord`],
/// [`GbError::UnresolvedReference`] and [`GbError::FormatMismatch`]) are
/// usually not returned: parsers log them, count them in an
/// [`IngestReport`](crate::reporting::IngestReport) and keep going.
#[derive(Debug, Error)]
pub enum GbError {
    // IO related errors
    #[error("File reading error: {0}")]
    IOError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("TSV error: {0}")]
    CsvError(#[from] csv::Error),

    // Assembly errors
    #[error("Invalid assembly '{value}'. Available assemblies are: {}", available.join(", "))]
    InvalidAssembly {
        value: String,
        available: Vec<String>,
    },

    // Record-level errors
    #[error("Column has invalid type: expected {expected_type}, found '{found_value}' in line '{line}'")]
    InvalidColumnType {
        expected_type: String,
        found_value: String,
        line: String,
    },
    #[error("Malformed {format} record at line {line_number}: {reason}")]
    MalformedRecord {
        format: &'static str,
        line_number: usize,
        reason: String,
    },
    #[error("Unresolved reference at line {line_number}: no parent feature with ID '{parent}'")]
    UnresolvedReference { line_number: usize, parent: String },
    #[error("Sample '{sample}' at line {line_number} has {found} values but FORMAT declares {expected}")]
    FormatMismatch {
        sample: String,
        line_number: usize,
        expected: usize,
        found: usize,
    },
    #[error("Range invalid: start ({0}) must be less than end ({1})")]
    InvalidRange(Position, Position),

    // Sink errors
    #[error("Sequence name '{0}' cannot be used as a file name")]
    InvalidSequenceName(String),
    #[error("No track with id {0}")]
    UnknownTrack(TrackId),
    #[error("Track {0} of kind '{1}' cannot be promoted to exons")]
    InvalidTrackTransition(TrackId, TrackKind),

    // Command line tool related errors
    #[error("Unsupported annotation file format: {0}")]
    UnsupportedFileFormat(String),
    #[error("Command line argument error: {0}")]
    ArgumentError(#[from] clap::error::Error),
}

impl GbError {
    /// Build a [`GbError::MalformedRecord`].
    pub fn malformed(format: &'static str, line_number: usize, reason: impl Into<String>) -> Self {
        GbError::MalformedRecord {
            format,
            line_number,
            reason: reason.into(),
        }
    }
}
