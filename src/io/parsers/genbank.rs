//! GenBank flat file parsing.
//!
//! A GenBank file is a series of records, each with a header (`LOCUS`,
//! `VERSION`, ...), a feature table (`FEATURES`) and a sequence (`ORIGIN` up to
//! `//`). The parser is a three-state machine over a line tokenizer:
//!
//! ```text
//!            FEATURES            ORIGIN
//!   Header ──────────▶ Features ────────▶ Sequence
//!     ▲                   │                  │
//!     └── LOCUS, keyword ─┴──── //, LOCUS ───┘
//! ```
//!
//! Every record adds one chromosome to the returned [`Assembly`]; features become
//! segments on one track per feature key, and residues go to a [`SequenceSink`].
//!
//! The feature table is column-based: a feature key starts at
//! [`FEATURE_KEY_COLUMN`], while qualifier and location continuation lines are
//! indented past it.

use log::{debug, info, warn};
use std::mem;

use crate::assembly::{Assembly, Chromosome};
use crate::error::GbError;
use crate::io::LineSource;
use crate::reporting::IngestReport;
use crate::sink::{SegmentSink, SequenceSink};
use crate::track::{Block, Segment, Strand};
use crate::{Position, TrackId};

use super::FeatureTracks;

/// Zero-based column where feature keys start in the feature table. Lines with
/// a blank in this column continue the current feature.
pub const FEATURE_KEY_COLUMN: usize = 5;

/// Feature key that describes the whole record and is never emitted.
pub const SOURCE_FEATURE: &str = "source";

/// One classified GenBank line.
#[derive(Debug, PartialEq)]
pub enum GenbankLine<'a> {
    Locus { name: &'a str, length: &'a str },
    Version(&'a str),
    Features,
    Origin,
    /// `//`, the end of a record.
    Terminator,
    /// Any other header keyword (`DEFINITION`, `REFERENCE`, `BASE COUNT`, ...).
    Keyword,
    FeatureStart { key: &'a str, location: &'a str },
    Continuation(&'a str),
    Residues(String),
    Blank,
}

/// Parser state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    Header,
    Features,
    Sequence,
}

/// Classify one line given the current section.
pub fn classify(line: &str, section: Section) -> GenbankLine<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return GenbankLine::Blank;
    }
    if trimmed == "//" {
        return GenbankLine::Terminator;
    }
    let mut tokens = line.split_whitespace();
    if line.starts_with(|c: char| c.is_ascii_uppercase()) {
        return match tokens.next() {
            Some("LOCUS") => GenbankLine::Locus {
                name: tokens.next().unwrap_or(""),
                length: tokens.next().unwrap_or(""),
            },
            Some("VERSION") => GenbankLine::Version(tokens.next().unwrap_or("")),
            Some("FEATURES") => GenbankLine::Features,
            Some("ORIGIN") => GenbankLine::Origin,
            _ => GenbankLine::Keyword,
        };
    }
    match section {
        Section::Header => GenbankLine::Blank,
        Section::Features => {
            let key_column = line.as_bytes().get(FEATURE_KEY_COLUMN);
            match key_column {
                Some(c) if !c.is_ascii_whitespace() => {
                    let rest = line.get(FEATURE_KEY_COLUMN..).unwrap_or(trimmed).trim();
                    let (key, location) = rest
                        .split_once(char::is_whitespace)
                        .map(|(k, l)| (k, l.trim()))
                        .unwrap_or((rest, ""));
                    GenbankLine::FeatureStart { key, location }
                }
                _ => GenbankLine::Continuation(trimmed),
            }
        }
        // residues, minus the leading line number
        Section::Sequence => GenbankLine::Residues(tokens.skip(1).collect()),
    }
}

/// A decoded feature location.
#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    pub start: Position,
    pub end: Position,
    pub strand: Strand,
    /// Present for `join(...)`/`order(...)` locations.
    pub blocks: Option<Vec<Block>>,
}

fn parse_base_range(range: &str) -> Result<(Position, Position), String> {
    let (a, b) = range.split_once("..").unwrap_or((range, range));
    let a: Position = a
        .parse()
        .map_err(|_| format!("invalid location start '{}'", a))?;
    let b: Position = b
        .parse()
        .map_err(|_| format!("invalid location end '{}'", b))?;
    if a == 0 || b < a {
        return Err(format!("invalid location range '{}'", range));
    }
    Ok((a, b))
}

/// Decode a feature location string into 0-based half-open coordinates.
///
/// Fuzzy boundaries (`<`, `>`) are dropped, `complement(...)` flips the strand,
/// and `join(...)`/`order(...)` produce sorted blocks.
pub fn parse_location(location: &str) -> Result<Location, String> {
    let mut loc: String = location
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '<' && *c != '>')
        .collect();
    let strand = if loc.contains("complement(") {
        loc = loc.replace("complement(", "");
        Strand::Reverse
    } else {
        Strand::Forward
    };
    let multi = loc.starts_with("join(") || loc.starts_with("order(");
    let loc: String = loc
        .replace("join(", "")
        .replace("order(", "")
        .chars()
        .filter(|c| *c != ')')
        .collect();
    if loc.contains(['(', ':', '^']) {
        return Err(format!("unsupported location '{}'", location));
    }

    if !multi {
        let (a, b) = parse_base_range(&loc)?;
        return Ok(Location {
            start: a - 1,
            end: b,
            strand,
            blocks: None,
        });
    }

    let mut ranges = loc
        .split(',')
        .map(parse_base_range)
        .collect::<Result<Vec<_>, _>>()?;
    ranges.sort();
    let start = ranges[0].0 - 1;
    let end = ranges.iter().map(|r| r.1).max().unwrap_or(start + 1);
    let blocks = ranges
        .iter()
        .map(|(a, b)| Block::new(b - (a - 1), (a - 1) - start))
        .collect();
    Ok(Location {
        start,
        end,
        strand,
        blocks: Some(blocks),
    })
}

/// Name and score of a feature from its qualifiers.
///
/// `/gene` names the feature, `/locus_tag` does when no name is set yet,
/// `/translation` is dropped and everything else goes into the score, in file
/// order, as `key=value` with quotes removed.
pub fn qualifiers_to_name_score(qualifiers: &[String]) -> (Option<String>, Option<String>) {
    let mut name: Option<String> = None;
    let mut score: Vec<String> = Vec::new();
    for qualifier in qualifiers {
        let unquoted = qualifier.replace('"', "");
        let (key, value) = unquoted.split_once('=').unwrap_or((&unquoted, ""));
        match key {
            "gene" => name = Some(value.to_string()),
            "locus_tag" if name.is_none() => name = Some(value.to_string()),
            "translation" => {}
            _ => score.push(unquoted.clone()),
        }
    }
    let score = if score.is_empty() {
        None
    } else {
        Some(score.join("|"))
    };
    (name, score)
}

/// A feature whose lines are still being read.
#[derive(Debug)]
struct PendingFeature {
    track_id: TrackId,
    line_number: usize,
    location: String,
    qualifiers: Vec<String>,
}

impl PendingFeature {
    fn push_continuation(&mut self, text: &str) {
        if let Some(qualifier) = text.strip_prefix('/') {
            self.qualifiers.push(qualifier.to_string());
        } else if let Some(last) = self.qualifiers.last_mut() {
            last.push(' ');
            last.push_str(text);
        } else {
            self.location.push_str(text);
        }
    }
}

/// What a GenBank parse produces besides segments.
#[derive(Debug)]
pub struct GenbankIngest {
    /// One chromosome per `LOCUS`, named by `VERSION` when it extends the locus name.
    pub assembly: Assembly,
    pub report: IngestReport,
}

/// The GenBank parser.
#[derive(Clone, Debug, Default)]
pub struct GenbankParser {}

impl GenbankParser {
    pub fn new() -> Self {
        Self {}
    }

    /// Parse a GenBank file, writing features to `sink` and residues to `sequences`.
    pub fn ingest<S, Q>(
        &self,
        lines: LineSource<'_>,
        sink: &mut S,
        sequences: &mut Q,
    ) -> Result<GenbankIngest, GbError>
    where
        S: SegmentSink + ?Sized,
        Q: SequenceSink + ?Sized,
    {
        let mut machine = Machine {
            sink,
            sequences,
            section: Section::Header,
            chromosomes: Vec::new(),
            in_record: false,
            tracks: FeatureTracks::new(),
            pending: None,
            sequence_open: false,
            report: IngestReport::new(),
        };

        for (index, line) in lines.enumerate() {
            let line = line?;
            machine.step(&line, index + 1)?;
        }
        machine.flush()?;
        machine.close_sequence()?;

        machine.report.tracks = machine.tracks.len();
        machine.sink.rebuild_gene_view()?;
        let assembly = Assembly::new(mem::take(&mut machine.chromosomes))?;
        info!(
            "GenBank: {} sequences, {} features, {} segments, {} skipped",
            assembly.len(),
            machine.report.records,
            machine.report.segments,
            machine.report.skipped()
        );
        Ok(GenbankIngest {
            assembly,
            report: machine.report,
        })
    }
}

struct Machine<'a, S: ?Sized, Q: ?Sized> {
    sink: &'a mut S,
    sequences: &'a mut Q,
    section: Section,
    chromosomes: Vec<Chromosome>,
    /// Whether the last `LOCUS` line was accepted.
    in_record: bool,
    tracks: FeatureTracks,
    /// `None` while inside a `source` feature, or outside any feature.
    pending: Option<PendingFeature>,
    sequence_open: bool,
    report: IngestReport,
}

impl<'a, S, Q> Machine<'a, S, Q>
where
    S: SegmentSink + ?Sized,
    Q: SequenceSink + ?Sized,
{
    fn current_chrom(&self) -> Option<&str> {
        if !self.in_record {
            return None;
        }
        self.chromosomes.last().map(|c| c.name.as_str())
    }

    fn enter(&mut self, section: Section, line_number: usize) {
        if self.section != section {
            debug!("GenBank line {}: {:?} -> {:?}", line_number, self.section, section);
        }
        self.section = section;
    }

    fn step(&mut self, line: &str, line_number: usize) -> Result<(), GbError> {
        match classify(line, self.section) {
            GenbankLine::Locus { name, length } => {
                self.flush()?;
                self.close_sequence()?;
                let length: Position = length.parse().map_err(|_| {
                    GbError::malformed(
                        "GenBank",
                        line_number,
                        format!("LOCUS line without a sequence length: '{}'", line),
                    )
                })?;
                self.in_record = false;
                if length == 0 {
                    self.report.record_skip(GbError::malformed(
                        "GenBank",
                        line_number,
                        format!("LOCUS '{}' has a zero sequence length", name),
                    ));
                } else if self.chromosomes.iter().any(|c| c.name == name) {
                    self.report.record_skip(GbError::malformed(
                        "GenBank",
                        line_number,
                        format!("LOCUS '{}' repeats an earlier record", name),
                    ));
                } else {
                    self.chromosomes.push(Chromosome::new(name, 0, length));
                    self.in_record = true;
                }
                self.enter(Section::Header, line_number);
            }
            GenbankLine::Version(accession) => {
                if self.in_record {
                    self.apply_version(accession, line_number);
                }
                self.enter(Section::Header, line_number);
            }
            GenbankLine::Features => self.enter(Section::Features, line_number),
            GenbankLine::Origin => {
                self.flush()?;
                self.enter(Section::Sequence, line_number);
                self.open_sequence(line_number)?;
            }
            GenbankLine::Terminator => {
                self.flush()?;
                self.close_sequence()?;
                self.enter(Section::Header, line_number);
            }
            GenbankLine::Keyword => {
                self.flush()?;
                self.enter(Section::Header, line_number);
            }
            GenbankLine::FeatureStart { key, location } => {
                self.flush()?;
                if key == SOURCE_FEATURE {
                    return Ok(());
                }
                if !self.in_record {
                    self.report.record_skip(GbError::malformed(
                        "GenBank",
                        line_number,
                        "feature outside of an accepted LOCUS record",
                    ));
                    return Ok(());
                }
                let track_id = self.tracks.get_or_create(&mut *self.sink, key)?;
                self.pending = Some(PendingFeature {
                    track_id,
                    line_number,
                    location: location.to_string(),
                    qualifiers: Vec::new(),
                });
            }
            GenbankLine::Continuation(text) => {
                if let Some(pending) = self.pending.as_mut() {
                    pending.push_continuation(text);
                }
            }
            GenbankLine::Residues(residues) => {
                if self.sequence_open {
                    self.sequences.write(&residues)?;
                }
            }
            GenbankLine::Blank => {}
        }
        Ok(())
    }

    /// Rename the current chromosome to `accession` when it extends the locus
    /// name and is not taken by an earlier record.
    fn apply_version(&mut self, accession: &str, line_number: usize) {
        let Some((current, earlier)) = self.chromosomes.split_last_mut() else {
            return;
        };
        if accession.is_empty() || !accession.starts_with(current.name.as_str()) {
            return;
        }
        if earlier.iter().any(|c| c.name == accession) {
            warn!(
                "GenBank line {}: VERSION '{}' is already taken, keeping '{}'",
                line_number, accession, current.name
            );
            return;
        }
        current.name = accession.to_string();
    }

    /// Commit the pending feature, if any, as a segment.
    fn flush(&mut self) -> Result<(), GbError> {
        let Some(feature) = self.pending.take() else {
            return Ok(());
        };
        self.report.records += 1;
        let location = match parse_location(&feature.location) {
            Ok(location) => location,
            Err(reason) => {
                self.report
                    .record_skip(GbError::malformed("GenBank", feature.line_number, reason));
                return Ok(());
            }
        };
        let chrom = self.current_chrom().unwrap_or_default().to_string();
        let (name, score) = qualifiers_to_name_score(&feature.qualifiers);

        let mut segment = Segment::new(feature.track_id, chrom, location.start, location.end)?;
        segment.name = name;
        segment.score = score;
        segment.strand = Some(location.strand);
        if location.blocks.is_some() {
            self.sink.promote_to_exons(feature.track_id)?;
        }
        segment.blocks = location.blocks;
        self.sink.append_segment(segment)?;
        self.report.segments += 1;
        Ok(())
    }

    fn open_sequence(&mut self, line_number: usize) -> Result<(), GbError> {
        self.close_sequence()?;
        match self.current_chrom().map(str::to_string) {
            Some(chrom) => match self.sequences.begin(&chrom) {
                Ok(()) => self.sequence_open = true,
                Err(GbError::InvalidSequenceName(name)) => self.report.record_skip(
                    GbError::malformed(
                        "GenBank",
                        line_number,
                        format!("invalid sequence name '{}'", name),
                    ),
                ),
                Err(error) => return Err(error),
            },
            None => self.report.record_skip(GbError::malformed(
                "GenBank",
                line_number,
                "ORIGIN outside of an accepted LOCUS record",
            )),
        }
        Ok(())
    }

    fn close_sequence(&mut self) -> Result<(), GbError> {
        if self.sequence_open {
            self.sequences.end()?;
            self.sequence_open = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{FastaDirectory, MemorySequences, MemorySink};
    use crate::track::TrackKind;

    fn ingest(text: &str) -> (MemorySink, MemorySequences, GenbankIngest) {
        let mut sink = MemorySink::new();
        let mut sequences = MemorySequences::new();
        let result = GenbankParser::new()
            .ingest(LineSource::from_reader(text.as_bytes()), &mut sink, &mut sequences)
            .unwrap();
        (sink, sequences, result)
    }

    #[test]
    fn test_classify_feature_columns() {
        let start = "     CDS             complement(12..2189)";
        assert_eq!(
            classify(start, Section::Features),
            GenbankLine::FeatureStart {
                key: "CDS",
                location: "complement(12..2189)"
            }
        );
        let cont = "                     /gene=\"thrL\"";
        assert_eq!(
            classify(cont, Section::Features),
            GenbankLine::Continuation("/gene=\"thrL\"")
        );
        assert_eq!(
            classify("        1 agcttttcat tctgactgca", Section::Sequence),
            GenbankLine::Residues("agcttttcattctgactgca".to_string())
        );
        assert_eq!(classify("//", Section::Sequence), GenbankLine::Terminator);
        assert_eq!(classify("BASE COUNT  1 a", Section::Features), GenbankLine::Keyword);
        assert_eq!(
            classify("LOCUS       AB000001   1200 bp    DNA", Section::Sequence),
            GenbankLine::Locus {
                name: "AB000001",
                length: "1200"
            }
        );
    }

    #[test]
    fn test_parse_simple_and_complement() {
        let loc = parse_location("<1..>100").unwrap();
        assert_eq!((loc.start, loc.end, loc.strand), (0, 100, Strand::Forward));
        assert_eq!(loc.blocks, None);
        let loc = parse_location("complement(337..2799)").unwrap();
        assert_eq!((loc.start, loc.end, loc.strand), (336, 2799, Strand::Reverse));
        let loc = parse_location("42").unwrap();
        assert_eq!((loc.start, loc.end), (41, 42));
    }

    #[test]
    fn test_parse_join_unordered() {
        let loc = parse_location("join(500..600,1..100,200..300)").unwrap();
        assert_eq!((loc.start, loc.end), (0, 600));
        let blocks = loc.blocks.unwrap();
        assert_eq!(blocks.len(), 3);
        assert_eq!(
            blocks.iter().map(|b| b.start).collect::<Vec<_>>(),
            vec![0, 199, 499]
        );
        assert_eq!(
            blocks.iter().map(|b| b.size).collect::<Vec<_>>(),
            vec![100, 101, 101]
        );
    }

    #[test]
    fn test_parse_complement_join_forms() {
        for text in [
            "complement(join(10..20,30..40))",
            "join(complement(30..40),complement(10..20))",
        ] {
            let loc = parse_location(text).unwrap();
            assert_eq!(loc.strand, Strand::Reverse);
            assert_eq!((loc.start, loc.end), (9, 40));
            assert_eq!(loc.blocks.unwrap().len(), 2);
        }
    }

    #[test]
    fn test_parse_location_errors() {
        assert!(parse_location("J00194.1:100..202").is_err());
        assert!(parse_location("123^124").is_err());
        assert!(parse_location("20..10").is_err());
        assert!(parse_location("").is_err());
    }

    #[test]
    fn test_qualifiers() {
        let qualifiers = vec![
            "locus_tag=\"b0001\"".to_string(),
            "gene=\"thrL\"".to_string(),
            "product=\"thr operon leader peptide\"".to_string(),
            "translation=\"MKRISTTITTTITITTGNGAG\"".to_string(),
            "pseudo".to_string(),
        ];
        let (name, score) = qualifiers_to_name_score(&qualifiers);
        assert_eq!(name.as_deref(), Some("thrL"));
        assert_eq!(
            score.as_deref(),
            Some("product=thr operon leader peptide|pseudo")
        );

        let qualifiers = vec!["gene=\"a\"".to_string(), "locus_tag=\"b1\"".to_string()];
        let (name, score) = qualifiers_to_name_score(&qualifiers);
        assert_eq!(name.as_deref(), Some("a"));
        assert_eq!(score.as_deref(), Some("locus_tag=b1"));
    }

    const RECORD: &str = "\
LOCUS       NC_0001                  120 bp    DNA     circular BCT 01-JAN-2020
DEFINITION  Test record.
VERSION     NC_0001.2
FEATURES             Location/Qualifiers
     source          1..120
                     /organism=\"Testus\"
     gene            1..60
                     /gene=\"abcA\"
                     /locus_tag=\"T0001\"
     CDS             join(1..20,
                     41..60)
                     /gene=\"abcA\"
                     /note=\"first line
                     second line\"
                     /translation=\"MKV\"
     misc_feature    complement(<70..>90)
                     /note=\"fuzzy\"
ORIGIN
        1 acgtacgtac gtacgtacgt acgtacgtac gtacgtacgt acgtacgtac gtacgtacgt
       61 acgtacgtac gtacgtacgt acgtacgtac gtacgtacgt acgtacgtac gtacgtacgt
//
";

    #[test]
    fn test_full_record() {
        let (sink, sequences, result) = ingest(RECORD);
        let chromosomes: Vec<_> = result.assembly.iter().collect();
        assert_eq!(chromosomes.len(), 1);
        assert_eq!(chromosomes[0].name, "NC_0001.2");
        assert_eq!(chromosomes[0].length, 120);

        assert_eq!(result.report.records, 3);
        assert_eq!(result.report.segments, 3);
        // gene, CDS, misc_feature; no source track
        assert_eq!(sink.tracks().count(), 3);
        assert_eq!(sink.tracks_named("source").count(), 0);

        let segments = sink.segments();
        assert_eq!(segments[0].chrom, "NC_0001.2");
        assert_eq!((segments[0].start, segments[0].end), (0, 60));
        assert_eq!(segments[0].name.as_deref(), Some("abcA"));
        assert_eq!(segments[0].score.as_deref(), Some("locus_tag=T0001"));

        let cds = &segments[1];
        assert_eq!((cds.start, cds.end), (0, 60));
        assert_eq!(cds.block_sizes(), Some(vec![20, 20]));
        assert_eq!(cds.block_starts(), Some(vec![0, 40]));
        assert_eq!(cds.score.as_deref(), Some("note=first line second line"));
        assert_eq!(sink.track(cds.track_id).unwrap().kind, TrackKind::Exons);
        // the plain gene track is not touched
        assert_eq!(sink.track(segments[0].track_id).unwrap().kind, TrackKind::Gene);

        let misc = &segments[2];
        assert_eq!((misc.start, misc.end), (69, 90));
        assert_eq!(misc.strand, Some(Strand::Reverse));
        assert_eq!(sink.track(misc.track_id).unwrap().kind, TrackKind::Domain);

        let sequence = sequences.get("NC_0001.2").unwrap();
        assert_eq!(sequence.len(), 120);
        assert!(sequence.starts_with("acgtacgtac"));
        assert_eq!(sink.gene_view().len(), 2);
    }

    #[test]
    fn test_two_records_and_version_mismatch() {
        let text = "\
LOCUS       A1   10 bp    DNA
VERSION     B1.1
FEATURES             Location/Qualifiers
     gene            1..5
                     /gene=\"x\"
ORIGIN
        1 aaaaaccccc
//
LOCUS       A2   8 bp    DNA
FEATURES             Location/Qualifiers
     gene            2..8
ORIGIN
        1 ggggtttt
//
";
        let (sink, sequences, result) = ingest(text);
        let names: Vec<_> = result.assembly.iter().map(|c| c.name.as_str()).collect();
        // VERSION does not extend the locus name, so it is ignored
        assert_eq!(names, vec!["A1", "A2"]);
        assert_eq!(sink.segments()[0].chrom, "A1");
        assert_eq!(sink.segments()[1].chrom, "A2");
        assert_eq!(sink.segments()[1].name, None);
        assert_eq!(sequences.get("A1"), Some("aaaaaccccc"));
        assert_eq!(sequences.get("A2"), Some("ggggtttt"));
        assert_eq!(sink.tracks().count(), 1);
    }

    #[test]
    fn test_bad_location_is_skipped_and_eof_flush() {
        let text = "\
LOCUS       A1   100 bp    DNA
FEATURES             Location/Qualifiers
     gene            J00194.1:1..5
     gene            10..20
                     /gene=\"last\"";
        let (sink, _, result) = ingest(text);
        assert_eq!(result.report.malformed, 1);
        assert_eq!(sink.segments().len(), 1);
        assert_eq!(sink.segments()[0].name.as_deref(), Some("last"));
    }

    #[test]
    fn test_locus_without_length_fails() {
        let mut sink = MemorySink::new();
        let mut sequences = MemorySequences::new();
        let result = GenbankParser::new().ingest(
            LineSource::from_reader("LOCUS       A1\n".as_bytes()),
            &mut sink,
            &mut sequences,
        );
        assert!(matches!(result, Err(GbError::MalformedRecord { line_number: 1, .. })));
    }

    #[test]
    fn test_repeated_and_empty_locus_are_skipped() {
        let text = "\
LOCUS       A1   10 bp    DNA
FEATURES             Location/Qualifiers
     gene            1..5
ORIGIN
        1 aaaaaccccc
//
LOCUS       A1   8 bp    DNA
FEATURES             Location/Qualifiers
     gene            2..8
ORIGIN
        1 ggggtttt
//
LOCUS       A3   0 bp    DNA
//
LOCUS       A4   4 bp    DNA
ORIGIN
        1 tttt
//
";
        let (sink, sequences, result) = ingest(text);
        assert_eq!(result.assembly.names(), vec!["A1", "A4"]);
        // repeated LOCUS, its feature and ORIGIN, then the empty LOCUS
        assert_eq!(result.report.malformed, 4);
        assert!(result.report.issues()[0].contains("line 7"));
        assert!(result.report.issues()[3].contains("line 13"));
        assert_eq!(sink.segments().len(), 1);
        assert_eq!(sequences.get("A1"), Some("aaaaaccccc"));
        assert_eq!(sequences.get("A4"), Some("tttt"));
    }

    #[test]
    fn test_version_keeps_names_unique() {
        let text = "\
LOCUS       X1   10 bp    DNA
//
LOCUS       X    10 bp    DNA
VERSION     X1
//
";
        let (_, _, result) = ingest(text);
        assert_eq!(result.assembly.names(), vec!["X1", "X"]);
    }

    #[test]
    fn test_unsafe_locus_name_skips_sequence_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = MemorySink::new();
        let mut fasta = FastaDirectory::new(dir.path().join("seqs")).unwrap();
        let text = "\
LOCUS       ../up   4 bp    DNA
FEATURES             Location/Qualifiers
     gene            1..4
ORIGIN
        1 acgt
//
";
        let result = GenbankParser::new()
            .ingest(LineSource::from_reader(text.as_bytes()), &mut sink, &mut fasta)
            .unwrap();
        drop(fasta);
        assert_eq!(result.report.malformed, 1);
        assert!(result.report.issues()[0].contains("line 4"));
        // annotations are kept, only the sequence file is refused
        assert_eq!(sink.segments().len(), 1);
        assert!(!dir.path().join("up.fa").exists());
        assert_eq!(std::fs::read_dir(dir.path().join("seqs")).unwrap().count(), 0);
    }
}
