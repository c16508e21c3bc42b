//! Types for standardized reports to the user about ingestion.
//!
//! Parsers never abort a file on a bad record; they skip it. To keep those
//! skips observable, each ingestion returns an [`IngestReport`] with one counter
//! per record-level error kind and the messages of the skipped records.
//!

use log::warn;

use crate::error::GbError;

/// Number of issue messages kept per report. Counters stay exact past it.
pub const MAX_ISSUES: usize = 100;

/// The [`CommandOutput<U>`] type output is generic over some data output
/// from a command, and a [`IngestReport`] that reports information to the user.
#[derive(Debug)]
pub struct CommandOutput<U> {
    pub value: U,
    pub report: IngestReport,
}

impl<U> CommandOutput<U> {
    pub fn new(value: U, report: IngestReport) -> Self {
        Self { value, report }
    }
}

/// Counters and issue messages of one ingestion.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IngestReport {
    /// Data records read (comments and headers excluded).
    pub records: usize,
    /// Segments written to the sink.
    pub segments: usize,
    /// Tracks created in the sink.
    pub tracks: usize,
    pub malformed: usize,
    pub unresolved: usize,
    pub format_mismatch: usize,
    issues: Vec<String>,
    /// Issues counted but not stored, past [`MAX_ISSUES`].
    omitted_issues: usize,
}

impl IngestReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_issue(&mut self, message: String) {
        if self.issues.len() < MAX_ISSUES {
            self.issues.push(message)
        } else {
            self.omitted_issues += 1;
        }
    }

    /// The stored issue messages, at most [`MAX_ISSUES`].
    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    pub fn omitted_issues(&self) -> usize {
        self.omitted_issues
    }

    /// The stored messages, followed by an `... and N more` line when some
    /// were dropped.
    pub fn issue_lines(&self) -> Vec<String> {
        let mut lines = self.issues.clone();
        if self.omitted_issues > 0 {
            lines.push(format!("... and {} more", self.omitted_issues));
        }
        lines
    }

    /// Total number of skipped records, for all reasons.
    pub fn skipped(&self) -> usize {
        self.malformed + self.unresolved + self.format_mismatch
    }

    /// Log a skipped record and count it under its error kind.
    pub fn record_skip(&mut self, error: GbError) {
        match error {
            GbError::UnresolvedReference { .. } => self.unresolved += 1,
            GbError::FormatMismatch { .. } => self.format_mismatch += 1,
            _ => self.malformed += 1,
        }
        warn!("skipping record: {}", error);
        self.add_issue(error.to_string());
    }

    /// Fold another report into this one.
    pub fn merge(&mut self, other: IngestReport) {
        self.records += other.records;
        self.segments += other.segments;
        self.tracks += other.tracks;
        self.malformed += other.malformed;
        self.unresolved += other.unresolved;
        self.format_mismatch += other.format_mismatch;
        for issue in other.issues {
            self.add_issue(issue);
        }
        self.omitted_issues += other.omitted_issues;
    }
}
