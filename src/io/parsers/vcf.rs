//! VCF parsing.
//!
//! A VCF file becomes one master track (kind `vcf`) holding one segment per
//! variant, plus one `vcfsample` track per sample column holding the decoded
//! genotype fields of that sample.
//!
//! The `##INFO` and `##FORMAT` header lines are kept as track metadata so the
//! browser can label the `key=value` pairs stored in segment scores. The `CSQ`
//! INFO field (Ensembl VEP consequences) is special: its header describes a
//! `|`-separated format, which is used to expand the first annotation of each
//! variant into named fields.

use indexmap::IndexMap;
use log::{debug, info};
use serde_json::{json, Map, Value};

use crate::error::GbError;
use crate::io::LineSource;
use crate::reporting::IngestReport;
use crate::sink::SegmentSink;
use crate::track::{Segment, TrackKind};
use crate::{Position, TrackId};

/// The INFO key of VEP consequence annotations.
pub const CSQ_KEY: &str = "CSQ";

/// Index of the first sample column.
const FIRST_SAMPLE_COLUMN: usize = 9;

/// Options of a VCF load.
#[derive(Clone, Debug, Default)]
pub struct VcfOptions {
    /// Name of the master track. Callers usually pass the file name.
    pub track_name: Option<String>,
    /// INFO keys the browser should display, stored as `"show"` in the master
    /// track metadata.
    pub show: Option<Vec<String>>,
}

/// Split the `<...>` content of a structured header line on commas, keeping
/// commas that are inside double quotes.
pub fn tokenize_header_fields(content: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in content.chars() {
        match c {
            '"' => {
                quoted = !quoted;
                current.push(c);
            }
            ',' if !quoted => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    if !current.is_empty() {
        fields.push(current);
    }
    fields
}

/// Get the `ID` and `Description` of a `##INFO=<...>` or `##FORMAT=<...>` line.
pub fn parse_header_description(line: &str) -> Option<(String, String)> {
    let start = line.find('<')?;
    let end = line.rfind('>')?;
    if end <= start {
        return None;
    }
    let mut id = None;
    let mut description = String::new();
    for field in tokenize_header_fields(&line[start + 1..end]) {
        match field.split_once('=') {
            Some(("ID", value)) => id = Some(value.to_string()),
            Some(("Description", value)) => description = value.replace('"', ""),
            _ => {}
        }
    }
    id.map(|id| (id, description))
}

/// The ordered field names of a CSQ description (`... Format: a|b|c`).
pub fn csq_fields(description: &str) -> Vec<String> {
    description
        .split_once("Format: ")
        .map(|(_, format)| format.trim().split('|').map(String::from).collect())
        .unwrap_or_default()
}

/// Render the first annotation of a CSQ value as `field=value` pairs, skipping
/// empty values.
pub fn expand_csq(value: &str, fields: &[String]) -> Vec<String> {
    let first = value.split(',').next().unwrap_or("");
    fields
        .iter()
        .zip(first.split('|'))
        .filter(|(_, v)| !v.is_empty())
        .map(|(field, v)| format!("{}={}", field, v))
        .collect()
}

/// The VCF header schema collected before `#CHROM`.
#[derive(Debug, Default)]
struct Header {
    info: IndexMap<String, String>,
    format: IndexMap<String, String>,
    csq: Vec<String>,
}

impl Header {
    fn master_metadata(&self, show: Option<&Vec<String>>) -> Option<Value> {
        let show = show.filter(|keys| !keys.is_empty());
        if self.info.is_empty() && show.is_none() {
            return None;
        }
        let mut metadata = Map::new();
        metadata.insert("info".to_string(), json!(self.info));
        if let Some(keys) = show {
            metadata.insert("show".to_string(), json!(keys));
        }
        Some(Value::Object(metadata))
    }

    fn sample_metadata(&self) -> Value {
        json!(self.format)
    }
}

/// The tracks created at the `#CHROM` line.
#[derive(Debug)]
struct VcfTracks {
    master: TrackId,
    /// `(sample name, track)` in column order.
    samples: Vec<(String, TrackId)>,
}

/// The VCF parser.
#[derive(Clone, Debug, Default)]
pub struct VcfParser {
    options: VcfOptions,
}

impl VcfParser {
    pub fn new(options: VcfOptions) -> Self {
        Self { options }
    }

    /// Parse a VCF file into `sink`.
    pub fn ingest<S: SegmentSink + ?Sized>(
        &self,
        lines: LineSource<'_>,
        sink: &mut S,
    ) -> Result<IngestReport, GbError> {
        let mut report = IngestReport::new();
        let mut header = Header::default();
        let mut tracks: Option<VcfTracks> = None;

        for (index, line) in lines.enumerate() {
            let line = line?;
            let line_number = index + 1;
            if line.starts_with("##INFO=") {
                if let Some((id, description)) = parse_header_description(&line) {
                    if id == CSQ_KEY {
                        header.csq = csq_fields(&description);
                        debug!("CSQ format with {} fields", header.csq.len());
                    } else {
                        header.info.insert(id, description);
                    }
                }
            } else if line.starts_with("##FORMAT=") {
                if let Some((id, description)) = parse_header_description(&line) {
                    header.format.insert(id, description);
                }
            } else if line.starts_with("#CHROM") {
                tracks = Some(self.create_tracks(&line, &header, sink)?);
                report.tracks = tracks.as_ref().map_or(0, |t| t.samples.len() + 1);
            } else if line.starts_with('#') || line.trim().is_empty() {
                continue;
            } else {
                report.records += 1;
                let Some(tracks) = tracks.as_ref() else {
                    report.record_skip(GbError::malformed(
                        "VCF",
                        line_number,
                        "data line before the #CHROM header",
                    ));
                    continue;
                };
                if let Err(error) =
                    self.ingest_line(&line, line_number, &header, tracks, sink, &mut report)
                {
                    match error {
                        GbError::MalformedRecord { .. } => report.record_skip(error),
                        fatal => return Err(fatal),
                    }
                }
            }
        }

        info!(
            "VCF: {} variants, {} segments, {} tracks, {} skipped",
            report.records,
            report.segments,
            report.tracks,
            report.skipped()
        );
        Ok(report)
    }

    fn create_tracks<S: SegmentSink + ?Sized>(
        &self,
        line: &str,
        header: &Header,
        sink: &mut S,
    ) -> Result<VcfTracks, GbError> {
        let name = self.options.track_name.as_deref().unwrap_or("vcf");
        let master = sink.create_track(
            name,
            TrackKind::Vcf,
            None,
            header.master_metadata(self.options.show.as_ref()),
        )?;
        let mut samples = Vec::new();
        for sample in line.split('\t').skip(FIRST_SAMPLE_COLUMN) {
            let id = sink.create_track(
                sample,
                TrackKind::VcfSample,
                None,
                Some(header.sample_metadata()),
            )?;
            samples.push((sample.to_string(), id));
        }
        Ok(VcfTracks { master, samples })
    }

    fn ingest_line<S: SegmentSink + ?Sized>(
        &self,
        line: &str,
        line_number: usize,
        header: &Header,
        tracks: &VcfTracks,
        sink: &mut S,
        report: &mut IngestReport,
    ) -> Result<(), GbError> {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() < 8 {
            return Err(GbError::malformed(
                "VCF",
                line_number,
                format!("expected at least 8 columns, found {}", columns.len()),
            ));
        }
        let pos: Position = columns[1]
            .parse()
            .ok()
            .filter(|pos| *pos > 0)
            .ok_or_else(|| {
                GbError::malformed("VCF", line_number, format!("invalid POS '{}'", columns[1]))
            })?;
        let chrom = columns[0];
        let name = (columns[2] != ".").then(|| columns[2].to_string());

        let mut score = vec![format!("REF={}", columns[3])];
        if columns[4] != "." {
            score.push(format!("ALT={}", columns[4]));
        }
        if columns[5] != "." {
            score.push(format!("QUAL={}", columns[5]));
        }
        if columns[7] != "." {
            for field in columns[7].split(';').filter(|f| !f.is_empty()) {
                match field.strip_prefix("CSQ=") {
                    Some(csq) => score.extend(expand_csq(csq, &header.csq)),
                    None => score.push(field.to_string()),
                }
            }
        }

        let variant_segment = |track_id: TrackId, score: String| -> Result<Segment, GbError> {
            let mut segment = Segment::new(track_id, chrom, pos - 1, pos)?;
            segment.name = name.clone();
            segment.score = Some(score);
            Ok(segment)
        };

        sink.append_segment(variant_segment(tracks.master, score.join("|"))?)?;
        report.segments += 1;

        let format_keys: Vec<&str> = columns
            .get(8)
            .map(|format| format.split(':').collect())
            .unwrap_or_default();
        for (i, (sample, track_id)) in tracks.samples.iter().enumerate() {
            let values: Vec<&str> = columns
                .get(FIRST_SAMPLE_COLUMN + i)
                .map(|value| value.split(':').collect())
                .unwrap_or_default();
            if values.is_empty() || values.len() != format_keys.len() {
                report.record_skip(GbError::FormatMismatch {
                    sample: sample.clone(),
                    line_number,
                    expected: format_keys.len(),
                    found: values.len(),
                });
                continue;
            }
            let sample_score = format_keys
                .iter()
                .zip(values.iter())
                .map(|(key, value)| format!("{}={}", key, value))
                .collect::<Vec<_>>()
                .join("|");
            sink.append_segment(variant_segment(*track_id, sample_score)?)?;
            report.segments += 1;
        }
        Ok(())
    }
}
