//! Test cases and test utility functions.
//!

use flate2::write::GzEncoder;
use flate2::Compression;
use rand::{thread_rng, Rng};
use std::io::Write;
use tempfile::{Builder, NamedTempFile};

use crate::assembly::Assembly;
use crate::io::parsers::bed::BedRecord;
use crate::Position;

// Stochastic test ranges defaults
//
// range length
pub const MIN_LEN: Position = 1;
pub const MAX_LEN: Position = 10000;

// range scores
pub const MIN_VALUE: f64 = -10.0;
pub const MAX_VALUE: f64 = 10.0;

/// Build a random range start/end on a sequence of `chrom_len`.
/// 0-indexed, right exclusive
pub fn random_range(chrom_len: Position) -> (Position, Position) {
    let mut rng = thread_rng();
    let max_len = MAX_LEN.min(chrom_len);
    let len = rng.gen_range(MIN_LEN..=max_len);
    let start = rng.gen_range(0..chrom_len - len + 1);
    (start, start + len)
}

/// Build `n` random value-track records over the given `(chrom, length)` pairs.
/// About one in a hundred records has a non-numeric score.
pub fn random_value_records(n: usize, chromosomes: &[(&str, Position)]) -> Vec<BedRecord> {
    let mut rng = thread_rng();
    (0..n)
        .map(|_| {
            let (chrom, length) = chromosomes[rng.gen_range(0..chromosomes.len())];
            let (start, end) = random_range(length);
            let score = if rng.gen_ratio(1, 100) {
                "NA".to_string()
            } else {
                format!("{:.3}", rng.gen_range(MIN_VALUE..MAX_VALUE))
            };
            BedRecord {
                seqname: chrom.to_string(),
                start,
                end,
                name: Some(".".to_string()),
                score: Some(score),
                ..Default::default()
            }
        })
        .collect()
}

/// Build `n` random value-track records over the chromosomes of an assembly.
pub fn random_assembly_records(n: usize, assembly: &Assembly) -> Vec<BedRecord> {
    let chromosomes: Vec<(&str, Position)> = assembly
        .iter()
        .map(|c| (c.name.as_str(), c.length))
        .collect();
    random_value_records(n, &chromosomes)
}

/// Write `content` to a temporary file with the given suffix.
pub fn temp_text_file(content: &str, suffix: &str) -> NamedTempFile {
    let mut file = Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    file.flush().expect("Failed to flush temp file");
    file
}

/// Write `content` gzip-compressed to a temporary file with the given suffix.
pub fn temp_gzip_file(content: &str, suffix: &str) -> NamedTempFile {
    let file = Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temp file");
    let mut encoder = GzEncoder::new(
        file.reopen().expect("Failed to reopen temp file"),
        Compression::default(),
    );
    encoder
        .write_all(content.as_bytes())
        .expect("Failed to write to temp file");
    encoder.finish().expect("Failed to finish gzip stream");
    file
}

/// Write random value-track records to a temporary BED file.
pub fn temp_value_bedfile(n: usize, assembly: &Assembly) -> NamedTempFile {
    let content: String = random_assembly_records(n, assembly)
        .iter()
        .map(|record| format!("{}\n", record.to_tsv()))
        .collect();
    temp_text_file(&content, ".bed")
}
