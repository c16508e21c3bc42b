//! Track loading commands: one function per input format, each taking a path,
//! writing into a sink, and returning what it did in a [`CommandOutput`].

use log::info;
use serde_json::json;
use std::path::Path;

use crate::{
    io::parsers::fasta::copy_sequences, prelude::*, reporting::CommandOutput,
    track::DEFAULT_COLOR, TrackId,
};

/// Options of a BED track load.
#[derive(Clone, Debug, PartialEq)]
pub struct BedTrackOptions {
    /// Track name; the file name when not given.
    pub name: Option<String>,
    pub kind: TrackKind,
    /// Track color; `#000` when not given.
    pub color: Option<String>,
    /// Fixed `[min, max]` drawing scale of `value` and `score` tracks. Ignored for
    /// other kinds.
    pub scale: Option<[f64; 2]>,
}

impl Default for BedTrackOptions {
    fn default() -> Self {
        Self {
            name: None,
            kind: TrackKind::Gene,
            color: None,
            scale: None,
        }
    }
}

/// Load a BED file as one track.
///
/// Malformed rows are skipped and counted. For `value` and `score` tracks the
/// score column must be a float, and without an explicit scale the track
/// metadata becomes the observed `[min, max]`.
pub fn load_bed_track<S: SegmentSink + ?Sized>(
    bedfile: impl AsRef<Path>,
    options: &BedTrackOptions,
    sink: &mut S,
) -> Result<CommandOutput<TrackId>, GbError> {
    let bedfile = bedfile.as_ref();
    let input = InputStream::new(bedfile);
    let name = options.name.clone().unwrap_or_else(|| input.file_name());
    let kind = options.kind;
    let scale = options.scale.filter(|_| kind.is_numeric());

    let track_id = sink.create_track(
        &name,
        kind,
        Some(options.color.as_deref().unwrap_or(DEFAULT_COLOR)),
        scale.map(|scale| json!(scale)),
    )?;

    let mut report = IngestReport::new();
    report.tracks = 1;
    let mut range: Option<[f64; 2]> = None;
    let mut iter = BedIterator::from_lines(input.lines()?);
    while let Some(record) = iter.next() {
        report.records += 1;
        let record = match record {
            Ok(record) => record,
            Err(error @ GbError::MalformedRecord { .. }) => {
                report.record_skip(error);
                continue;
            }
            Err(error) => return Err(error),
        };
        let value = record.score_value();
        let segment = match record.into_segment(track_id, kind) {
            Ok(segment) => segment,
            Err(error) => {
                report.record_skip(GbError::malformed(
                    "BED",
                    iter.line_number(),
                    error.to_string(),
                ));
                continue;
            }
        };
        if let (true, Some(value)) = (kind.is_numeric(), value) {
            range = Some(match range {
                Some([min, max]) => [min.min(value), max.max(value)],
                None => [value, value],
            });
        }
        sink.append_segment(segment)?;
        report.segments += 1;
    }

    if kind.is_numeric() && scale.is_none() {
        sink.set_track_metadata(track_id, range.map(|range| json!(range)))?;
    }
    if kind.is_gene_like() {
        sink.rebuild_gene_view()?;
    }
    info!(
        "{}: track '{}' ({}) with {} segments, {} skipped",
        input.file_name(),
        name,
        kind,
        report.segments,
        report.skipped()
    );
    Ok(CommandOutput::new(track_id, report))
}

/// Load a GFF file, one track per feature type.
pub fn load_gff<S: SegmentSink + ?Sized>(
    gfffile: impl AsRef<Path>,
    sink: &mut S,
) -> Result<CommandOutput<()>, GbError> {
    let lines = InputStream::new(gfffile.as_ref()).lines()?;
    let report = GffParser::new().ingest(lines, sink)?;
    Ok(CommandOutput::new((), report))
}

/// Load a GenBank file, returning the assembly of its records.
pub fn load_genbank<S, Q>(
    gbkfile: impl AsRef<Path>,
    sink: &mut S,
    sequences: &mut Q,
) -> Result<CommandOutput<Assembly>, GbError>
where
    S: SegmentSink + ?Sized,
    Q: SequenceSink + ?Sized,
{
    let lines = InputStream::new(gbkfile.as_ref()).lines()?;
    let result = GenbankParser::new().ingest(lines, sink, sequences)?;
    Ok(CommandOutput::new(result.assembly, result.report))
}

/// Load a VCF file. The master track is named after the file unless
/// `options.track_name` is set.
pub fn load_vcf<S: SegmentSink + ?Sized>(
    vcffile: impl AsRef<Path>,
    options: &VcfOptions,
    sink: &mut S,
) -> Result<CommandOutput<()>, GbError> {
    let input = InputStream::new(vcffile.as_ref());
    let mut options = options.clone();
    if options.track_name.is_none() {
        options.track_name = Some(input.file_name());
    }
    let report = VcfParser::new(options).ingest(input.lines()?, sink)?;
    Ok(CommandOutput::new((), report))
}

/// Copy the sequences of a FASTA file, returning how many were copied.
pub fn load_fasta_sequences<Q: SequenceSink + ?Sized>(
    fastafile: impl AsRef<Path>,
    sequences: &mut Q,
) -> Result<CommandOutput<usize>, GbError> {
    let input = InputStream::new(fastafile.as_ref());
    let report = copy_sequences(input.lines()?, sequences)?;
    let count = report.records - report.skipped();
    info!(
        "{}: {} sequences, {} skipped",
        input.file_name(),
        count,
        report.skipped()
    );
    Ok(CommandOutput::new(count, report))
}

/// Load a file by its detected format, with default options.
pub fn load_file<S, Q>(
    filepath: impl AsRef<Path>,
    sink: &mut S,
    sequences: &mut Q,
) -> Result<IngestReport, GbError>
where
    S: SegmentSink + ?Sized,
    Q: SequenceSink + ?Sized,
{
    let report = match AnnotationFile::detect(filepath.as_ref())? {
        AnnotationFile::Bed(path) => {
            load_bed_track(path, &BedTrackOptions::default(), sink)?.report
        }
        AnnotationFile::Gff(path) => load_gff(path, sink)?.report,
        AnnotationFile::Genbank(path) => load_genbank(path, sink, sequences)?.report,
        AnnotationFile::Vcf(path) => load_vcf(path, &VcfOptions::default(), sink)?.report,
        AnnotationFile::Fasta(path) => load_fasta_sequences(path, sequences)?.report,
        AnnotationFile::Unsupported(path) => {
            return Err(GbError::UnsupportedFileFormat(path.display().to_string()))
        }
    };
    Ok(report)
}

/// Build the genome map of `assembly`, with the rows of an optional value
/// track BED file. Malformed rows are skipped and counted.
pub fn genome_map(
    assembly: &Assembly,
    values: Option<&Path>,
) -> Result<CommandOutput<GenomeMap>, GbError> {
    let mut report = IngestReport::new();
    let Some(bedfile) = values else {
        return Ok(CommandOutput::new(GenomeMap::build(assembly, None), report));
    };
    let mut records = Vec::new();
    for record in BedIterator::new(bedfile)? {
        report.records += 1;
        match record {
            Ok(record) => records.push(record),
            Err(error @ GbError::MalformedRecord { .. }) => report.record_skip(error),
            Err(error) => return Err(error),
        }
    }
    let map = GenomeMap::build(assembly, Some(&records));
    report.segments = map.data.values().map(Vec::len).sum();
    Ok(CommandOutput::new(map, report))
}

/// Write a random value track over `assembly` as BED.
#[cfg(feature = "dev-commands")]
pub fn random_value_bed(
    assembly: &Assembly,
    num: usize,
    output: Option<impl Into<std::path::PathBuf>>,
) -> Result<CommandOutput<()>, GbError> {
    use std::io::Write;

    let output_stream = output.map_or(OutputFile::new_stdout(None), |file| {
        OutputFile::new(file, None)
    });
    let mut writer = output_stream.writer()?;
    for record in crate::test_utilities::random_assembly_records(num, assembly) {
        writeln!(writer, "{}", record.to_tsv())?;
    }
    Ok(CommandOutput::new((), IngestReport::new()))
}
