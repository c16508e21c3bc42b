//! GFF3 parsing and exon joining.
//!
//! Each GFF line is a feature. Its `type` column names the track it goes to, and
//! `exon` lines are special: instead of becoming segments of their own, they
//! become blocks of the feature named by their `Parent` attribute, turning that
//! feature into a BED12-style multi-block segment and its track into an
//! [`TrackKind::Exons`] track.
//!
//! Parents must come before their exons. Since a parent can gain blocks until the
//! end of the file, all rows are buffered and written to the sink once the file
//! has been read.
//!
//! [`TrackKind::Exons`]: crate::track::TrackKind::Exons

use indexmap::IndexMap;
use log::{debug, info};
use std::collections::HashMap;

use crate::error::GbError;
use crate::io::LineSource;
use crate::reporting::IngestReport;
use crate::sink::SegmentSink;
use crate::track::{Block, Segment, Strand};
use crate::Position;

use super::utils::{one_based_to_half_open, parse_column};
use super::FeatureTracks;

/// The feature type folded into its parent.
pub const EXON_TYPE: &str = "exon";

/// Decode a GFF attribute column into ordered `key → value` pairs.
///
/// Pairs are separated by `;` and split on the first `=`. Trailing semicolons and
/// empty values are allowed. A fragment without `=` is part of the previous value
/// (it had a `;` in it). Keys must be word characters; anything that does not
/// decode is dropped rather than failing the line.
pub fn parse_attributes(column: &str) -> IndexMap<String, String> {
    let mut attributes: IndexMap<String, String> = IndexMap::new();
    let mut last_key: Option<String> = None;
    for fragment in column.split(';') {
        let fragment = fragment.trim();
        if fragment.is_empty() {
            continue;
        }
        match fragment.split_once('=') {
            Some((key, value)) if is_attribute_key(key) => {
                attributes.insert(key.to_string(), value.to_string());
                last_key = Some(key.to_string());
            }
            _ => {
                if let Some(value) = last_key.as_ref().and_then(|k| attributes.get_mut(k)) {
                    value.push(';');
                    value.push_str(fragment);
                }
            }
        }
    }
    attributes
}

fn is_attribute_key(key: &str) -> bool {
    !key.is_empty() && key.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Coding frame bounds from the phase column.
fn thick_bounds(
    phase: &str,
    strand: Option<Strand>,
    start: Position,
    end: Position,
) -> (Option<Position>, Option<Position>) {
    let phase: Position = match phase {
        "0" => 0,
        "1" => 1,
        "2" => 2,
        _ => return (None, None),
    };
    match strand {
        Some(Strand::Reverse) => (Some(start), Some(end.saturating_sub(phase))),
        _ => (Some(start + phase), Some(end)),
    }
}

/// The GFF parser. One instance can ingest several files; nothing is shared
/// between them.
#[derive(Clone, Debug, Default)]
pub struct GffParser {}

impl GffParser {
    pub fn new() -> Self {
        Self {}
    }

    /// Parse a GFF file into `sink`, creating one track per feature type.
    pub fn ingest<S: SegmentSink + ?Sized>(
        &self,
        lines: LineSource<'_>,
        sink: &mut S,
    ) -> Result<IngestReport, GbError> {
        let mut report = IngestReport::new();
        let mut tracks = FeatureTracks::new();
        let mut rows: Vec<Segment> = Vec::new();
        let mut ids: HashMap<String, usize> = HashMap::new();

        for (index, line) in lines.enumerate() {
            let line = line?;
            let line_number = index + 1;
            if line.starts_with("##FASTA") {
                debug!("GFF sequence section at line {}, stopping", line_number);
                break;
            }
            if line.starts_with('#') || line.trim().is_empty() {
                continue;
            }
            report.records += 1;
            if let Err(error) = self.ingest_line(
                &line,
                line_number,
                sink,
                &mut tracks,
                &mut rows,
                &mut ids,
            ) {
                match error {
                    GbError::MalformedRecord { .. } | GbError::UnresolvedReference { .. } => {
                        report.record_skip(error)
                    }
                    fatal => return Err(fatal),
                }
            }
        }

        for mut row in rows {
            row.sort_blocks();
            sink.append_segment(row)?;
            report.segments += 1;
        }
        report.tracks = tracks.len();
        sink.rebuild_gene_view()?;
        info!(
            "GFF: {} records, {} segments on {} tracks, {} skipped",
            report.records,
            report.segments,
            report.tracks,
            report.skipped()
        );
        Ok(report)
    }

    fn ingest_line<S: SegmentSink + ?Sized>(
        &self,
        line: &str,
        line_number: usize,
        sink: &mut S,
        tracks: &mut FeatureTracks,
        rows: &mut Vec<Segment>,
        ids: &mut HashMap<String, usize>,
    ) -> Result<(), GbError> {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < 8 {
            return Err(GbError::malformed(
                "GFF",
                line_number,
                format!("expected 9 columns, found {}", columns.len()),
            ));
        }
        let feature_type = columns[2];
        let raw_start: Position = parse_column(columns[3].trim(), line)
            .map_err(|e| GbError::malformed("GFF", line_number, e.to_string()))?;
        let raw_end: Position = parse_column(columns[4].trim(), line)
            .map_err(|e| GbError::malformed("GFF", line_number, e.to_string()))?;
        let (start, end) = one_based_to_half_open(raw_start, raw_end).ok_or_else(|| {
            GbError::malformed(
                "GFF",
                line_number,
                format!("invalid 1-based range {}..{}", raw_start, raw_end),
            )
        })?;

        let mut attributes = columns.get(8).map(|c| parse_attributes(c)).unwrap_or_default();
        let name = attributes.shift_remove("Name");
        let id = attributes.shift_remove("ID");

        if feature_type == EXON_TYPE {
            let parent = attributes.shift_remove("Parent").ok_or_else(|| {
                GbError::UnresolvedReference {
                    line_number,
                    parent: String::new(),
                }
            })?;
            let row = *ids.get(&parent).ok_or_else(|| GbError::UnresolvedReference {
                line_number,
                parent: parent.clone(),
            })?;
            let parent_row = &mut rows[row];
            let offset = start.checked_sub(parent_row.start).ok_or_else(|| {
                GbError::malformed(
                    "GFF",
                    line_number,
                    format!("exon starts before its parent '{}'", parent),
                )
            })?;
            let first_exon = parent_row.blocks.is_none();
            parent_row.push_block(Block::new(end - start, offset));
            if first_exon {
                sink.promote_to_exons(parent_row.track_id)?;
            }
            return Ok(());
        }

        let track_id = tracks.get_or_create(sink, feature_type)?;
        let strand = Strand::from_column(columns[6]);
        let (thick_start, thick_end) = thick_bounds(columns[7], strand, start, end);
        let score = if attributes.is_empty() {
            None
        } else {
            Some(
                attributes
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, v))
                    .collect::<Vec<_>>()
                    .join("|"),
            )
        };

        let mut segment = Segment::new(track_id, columns[0], start, end)?;
        segment.name = name.or_else(|| id.clone());
        segment.score = score;
        segment.strand = strand;
        segment.thick_start = thick_start;
        segment.thick_end = thick_end;
        rows.push(segment);

        if let Some(id) = id {
            ids.entry(id).or_insert(rows.len() - 1);
        }
        Ok(())
    }
}
