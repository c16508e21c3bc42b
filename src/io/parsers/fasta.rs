//! FASTA helpers: chromosome lengths for an assembly, and sequence export.
//!
//! Sequences are never validated; a FASTA file is a list of `>` headers, each
//! followed by residue lines. The chromosome name is the first token of the
//! header, split on a space or a `|`.

use log::{debug, warn};
use std::path::Path;

use crate::assembly::Chromosome;
use crate::error::GbError;
use crate::io::{InputStream, LineSource};
use crate::reporting::IngestReport;
use crate::sink::SequenceSink;
use crate::Position;

/// The chromosome name of a `>` header line.
pub fn header_name(line: &str) -> &str {
    let header = line.strip_prefix('>').unwrap_or(line);
    header.split([' ', '|']).next().unwrap_or("")
}

/// Read `(name, 0, length)` records from FASTA lines, where `length` is the
/// number of residues, surrounding whitespace excluded.
pub fn chromosome_lengths(lines: LineSource<'_>) -> Result<Vec<Chromosome>, GbError> {
    let mut chromosomes: Vec<Chromosome> = Vec::new();
    for (index, line) in lines.enumerate() {
        let line = line?;
        let line = line.trim();
        if line.starts_with('>') {
            chromosomes.push(Chromosome::new(header_name(line), 0, 0));
            continue;
        }
        match chromosomes.last_mut() {
            Some(chromosome) => {
                let residues = Position::try_from(line.len()).map_err(|_| {
                    GbError::malformed("FASTA", index + 1, "sequence line too long")
                })?;
                chromosome.length = chromosome.length.checked_add(residues).ok_or_else(|| {
                    GbError::malformed(
                        "FASTA",
                        index + 1,
                        format!("sequence '{}' is too long", chromosome.name),
                    )
                })?;
            }
            None if !line.is_empty() => {
                warn!("FASTA line {} before any header, ignoring", index + 1)
            }
            None => {}
        }
    }
    Ok(chromosomes)
}

/// Chromosome records of several FASTA files, in file order.
pub fn chromosomes_from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Chromosome>, GbError> {
    let mut chromosomes = Vec::new();
    for path in paths {
        let input = InputStream::new(path.as_ref());
        let mut records = chromosome_lengths(input.lines()?)?;
        debug!("{}: {} sequences", input.file_name(), records.len());
        chromosomes.append(&mut records);
    }
    Ok(chromosomes)
}

/// Copy every sequence of a FASTA file to `sequences`, residue lines
/// concatenated. The report counts one record per sequence; sequences whose
/// name the sink refuses are skipped as malformed.
pub fn copy_sequences<Q: SequenceSink + ?Sized>(
    lines: LineSource<'_>,
    sequences: &mut Q,
) -> Result<IngestReport, GbError> {
    let mut report = IngestReport::new();
    let mut open = false;
    for (index, line) in lines.enumerate() {
        let line = line?;
        let line = line.trim_end();
        if line.starts_with('>') {
            report.records += 1;
            open = match sequences.begin(header_name(line)) {
                Ok(()) => true,
                Err(GbError::InvalidSequenceName(name)) => {
                    report.record_skip(GbError::malformed(
                        "FASTA",
                        index + 1,
                        format!("invalid sequence name '{}'", name),
                    ));
                    false
                }
                Err(error) => return Err(error),
            };
        } else if open {
            sequences.write(line)?;
        }
    }
    if open {
        sequences.end()?;
    }
    Ok(report)
}
