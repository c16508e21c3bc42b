//! BED Types and Functionality
//!
//! The BED (Browser Extensible Format) is a TSV format in bioinformatics.
//! It has a fairly strict [specification](https://samtools.github.io/hts-specs/BEDv1.pdf),
//! but in practice it is quite permissive, and in bioinformatics one encounters lots
//! of "BED-like" files.
//!
//! # Design
//!
//! A BED line is loaded positionally into a [`BedRecord`]: the integer columns
//! (start, end, thickStart, thickEnd, blockCount) are parsed, everything else is
//! kept as the original string so that [`BedRecord::to_tsv()`] gives back the
//! line verbatim. Interpreting the strings (strand, score, blocks) happens when a
//! record is turned into a [`Segment`] for a given track kind.
//!

use std::path::PathBuf;

use crate::error::GbError;
use crate::io::{InputStream, LineSource};
use crate::track::{Block, Segment, Strand, TrackKind};
use crate::{Position, TrackId};

use super::utils::parse_column;

/// Zero-indexed columns that are parsed as integers.
pub const INTEGER_COLUMNS: [usize; 5] = [1, 2, 6, 7, 9];

/// One positional BED row.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BedRecord {
    pub seqname: String,
    pub start: Position,
    pub end: Position,
    pub name: Option<String>,
    pub score: Option<String>,
    pub strand: Option<String>,
    pub thick_start: Option<Position>,
    pub thick_end: Option<Position>,
    pub item_rgb: Option<String>,
    pub block_count: Option<u32>,
    pub block_sizes: Option<String>,
    pub block_starts: Option<String>,
    /// Columns past the twelfth, kept verbatim.
    pub extra: Vec<String>,
}

impl BedRecord {
    /// Number of columns of this row.
    pub fn num_columns(&self) -> usize {
        let optional = [
            self.name.is_some(),
            self.score.is_some(),
            self.strand.is_some(),
            self.thick_start.is_some(),
            self.thick_end.is_some(),
            self.item_rgb.is_some(),
            self.block_count.is_some(),
            self.block_sizes.is_some(),
            self.block_starts.is_some(),
        ];
        let last = optional.iter().rposition(|present| *present);
        3 + last.map_or(0, |i| i + 1) + self.extra.len()
    }

    /// Serialize this record back to a TSV line with the same columns it was
    /// parsed from.
    pub fn to_tsv(&self) -> String {
        fn string(value: &Option<String>) -> String {
            value.clone().unwrap_or_default()
        }
        fn number<T: ToString>(value: &Option<T>) -> String {
            value.as_ref().map_or(String::new(), |v| v.to_string())
        }
        let columns = [
            self.seqname.clone(),
            self.start.to_string(),
            self.end.to_string(),
            string(&self.name),
            string(&self.score),
            string(&self.strand),
            number(&self.thick_start),
            number(&self.thick_end),
            string(&self.item_rgb),
            number(&self.block_count),
            string(&self.block_sizes),
            string(&self.block_starts),
        ];
        let n = self.num_columns().min(12);
        let mut out = columns[..n].to_vec();
        out.extend(self.extra.iter().cloned());
        out.join("\t")
    }

    /// The score column as a float, if present.
    pub fn score_value(&self) -> Option<f64> {
        self.score.as_ref().and_then(|s| s.trim().parse::<f64>().ok())
    }

    /// Convert this record into a [`Segment`] of a track of the given kind.
    ///
    /// # Errors
    ///
    /// Numeric tracks ([`TrackKind::Value`], [`TrackKind::Score`]) need a float
    /// score column; block lists must hold exactly `blockCount` entries.
    pub fn into_segment(self, track_id: TrackId, kind: TrackKind) -> Result<Segment, GbError> {
        let line = self.to_tsv();
        if kind.is_numeric() {
            let score = self
                .score
                .as_deref()
                .ok_or_else(|| GbError::InvalidColumnType {
                    expected_type: "f64".to_string(),
                    found_value: String::new(),
                    line: line.clone(),
                })?;
            let _: f64 = parse_column(score.trim(), &line)?;
        }

        let blocks = match self.block_count {
            Some(count) => {
                let sizes = parse_list(self.block_sizes.as_deref().unwrap_or(""), &line)?;
                let starts = parse_list(self.block_starts.as_deref().unwrap_or(""), &line)?;
                if sizes.len() != count as usize || starts.len() != count as usize {
                    return Err(GbError::InvalidColumnType {
                        expected_type: format!("{} block sizes and starts", count),
                        found_value: format!("{} sizes, {} starts", sizes.len(), starts.len()),
                        line,
                    });
                }
                Some(
                    sizes
                        .into_iter()
                        .zip(starts)
                        .map(|(size, start)| Block::new(size, start))
                        .collect(),
                )
            }
            None => None,
        };

        let mut segment = Segment::new(track_id, self.seqname, self.start, self.end)?;
        segment.name = self.name;
        segment.score = self.score;
        segment.strand = self.strand.as_deref().and_then(Strand::from_column);
        segment.thick_start = self.thick_start;
        segment.thick_end = self.thick_end;
        segment.item_rgb = self.item_rgb;
        segment.blocks = blocks;
        Ok(segment)
    }
}

/// Parse a comma separated list of positions (BED12 block columns). A trailing
/// comma is allowed.
fn parse_list(column: &str, line: &str) -> Result<Vec<Position>, GbError> {
    column
        .split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| parse_column(value, line))
        .collect()
}

/// Parses a BED line into a positional [`BedRecord`].
pub fn parse_bed(line: &str, line_number: usize) -> Result<BedRecord, GbError> {
    let columns: Vec<&str> = line.split('\t').collect();
    if columns.len() < 3 {
        return Err(GbError::malformed(
            "BED",
            line_number,
            format!("expected at least 3 columns, found {}", columns.len()),
        ));
    }

    let typed = |index: usize| -> Result<Option<Position>, GbError> {
        columns
            .get(index)
            .map(|column| parse_column::<Position>(column.trim(), line))
            .transpose()
            .map_err(|e| GbError::malformed("BED", line_number, e.to_string()))
    };
    let text = |index: usize| columns.get(index).map(|column| column.to_string());

    let start = typed(1)?.unwrap_or_default();
    let end = typed(2)?.unwrap_or_default();
    if start >= end {
        return Err(GbError::malformed(
            "BED",
            line_number,
            GbError::InvalidRange(start, end).to_string(),
        ));
    }

    Ok(BedRecord {
        seqname: columns[0].to_string(),
        start,
        end,
        name: text(3),
        score: text(4),
        strand: text(5),
        thick_start: typed(6)?,
        thick_end: typed(7)?,
        item_rgb: text(8),
        block_count: typed(9)?,
        block_sizes: text(10),
        block_starts: text(11),
        extra: columns.iter().skip(12).map(|c| c.to_string()).collect(),
    })
}

/// Lines that carry no BED record: blanks, comments, and UCSC `track` /
/// `browser` lines.
fn is_bed_metadata(line: &str) -> bool {
    line.trim().is_empty()
        || line.starts_with('#')
        || line.starts_with("track ")
        || line.starts_with("browser ")
}

/// A parsing iterator over BED rows.
///
/// Each item is the parsed [`BedRecord`] or the [`GbError::MalformedRecord`]
/// of a line that could not be parsed; the iterator keeps going after an error.
pub struct BedIterator<'a> {
    lines: LineSource<'a>,
    line_number: usize,
}

impl<'a> std::fmt::Debug for BedIterator<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BedIterator")
            .field("line_number", &self.line_number)
            .finish_non_exhaustive()
    }
}

impl BedIterator<'static> {
    /// Creates a parsing iterator over a (possibly gzip-compressed) BED file.
    pub fn new(filepath: impl Into<PathBuf>) -> Result<Self, GbError> {
        let lines = InputStream::new(filepath).lines()?;
        Ok(Self::from_lines(lines))
    }
}

impl<'a> BedIterator<'a> {
    pub fn from_lines(lines: LineSource<'a>) -> Self {
        Self {
            lines,
            line_number: 0,
        }
    }

    /// The 1-based line number of the last line read.
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl<'a> Iterator for BedIterator<'a> {
    type Item = Result<BedRecord, GbError>;

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.lines.by_ref() {
            self.line_number += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(e)),
            };
            if is_bed_metadata(&line) {
                continue;
            }
            return Some(parse_bed(&line, self.line_number));
        }
        None
    }
}
