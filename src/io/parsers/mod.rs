//! Parsers for the annotation formats a genome browser loads.
//!
//! Each format has its own line-oriented grammar, but all parsers share a shape:
//! they take a [`LineSource`], make exactly one forward pass over it, and write
//! tracks and segments into a [`SegmentSink`]. What comes back is an
//! [`IngestReport`] counting the records read and the records skipped.
//!
//! | format  | parser                | segments per line                     |
//! |---------|-----------------------|---------------------------------------|
//! | BED     | [`bed::BedIterator`]  | one                                   |
//! | GFF     | [`gff::GffParser`]    | one, exons fold into their parent     |
//! | GenBank | [`genbank::GenbankParser`] | one per feature (multi-line)     |
//! | VCF     | [`vcf::VcfParser`]    | one master + one per sample           |
//! | FASTA   | [`fasta`]             | none (lengths and sequences)          |
//!
//! Transient lookup tables (feature type → track, feature ID → row) belong to
//! one parser invocation and are dropped when it returns.
//!
//! [`LineSource`]: crate::io::LineSource
//! [`SegmentSink`]: crate::sink::SegmentSink
//! [`IngestReport`]: crate::reporting::IngestReport

pub mod bed;
pub mod fasta;
pub mod genbank;
pub mod gff;
pub mod utils;
pub mod vcf;

pub use utils::parse_column;

use indexmap::IndexMap;
use std::path::PathBuf;

use crate::error::GbError;
use crate::io::InputStream;
use crate::sink::SegmentSink;
use crate::track::TrackKind;
use crate::TrackId;

use self::utils::get_base_extension;

/// Feature type → track id cache of one GFF/GenBank parse.
#[derive(Debug, Default)]
pub(crate) struct FeatureTracks {
    ids: IndexMap<String, TrackId>,
}

impl FeatureTracks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the track of `feature_type`, creating it on first use with the
    /// default kind and color for that type.
    pub fn get_or_create<S: SegmentSink + ?Sized>(
        &mut self,
        sink: &mut S,
        feature_type: &str,
    ) -> Result<TrackId, GbError> {
        if let Some(id) = self.ids.get(feature_type) {
            return Ok(*id);
        }
        let (kind, color) = TrackKind::for_feature_type(feature_type);
        let id = sink.create_track(feature_type, kind, Some(color), None)?;
        self.ids.insert(feature_type.to_string(), id);
        Ok(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

/// Enum that indicates the format of an annotation file.
#[derive(Debug, PartialEq)]
pub enum AnnotationFile {
    Bed(PathBuf),
    Gff(PathBuf),
    Genbank(PathBuf),
    Vcf(PathBuf),
    Fasta(PathBuf),
    Unsupported(PathBuf),
}

impl AnnotationFile {
    /// Detect the format of an annotation file.
    ///
    /// Detection works like this:
    ///  1. Retrieve the extension, removing compression-related extensions
    ///     (`.gz` and `.bgz`) if present.
    ///  2. Match known extensions (`bed`, `gff`/`gff3`, `gb`/`gbk`/`gbff`/`genbank`,
    ///     `vcf`, `fa`/`fasta`/`fna`).
    ///  3. Otherwise, look at the first non-blank line for a format signature
    ///     (`LOCUS`, `##fileformat=VCF`, `##gff-version`, `>`).
    pub fn detect(filepath: impl Into<PathBuf>) -> Result<Self, GbError> {
        let path: PathBuf = filepath.into();
        let extension = get_base_extension(&path);
        let by_extension = match extension.as_deref() {
            Some("bed") => Some(AnnotationFile::Bed(path.clone())),
            Some("gff") | Some("gff3") => Some(AnnotationFile::Gff(path.clone())),
            Some("gb") | Some("gbk") | Some("gbff") | Some("genbank") => {
                Some(AnnotationFile::Genbank(path.clone()))
            }
            Some("vcf") => Some(AnnotationFile::Vcf(path.clone())),
            Some("fa") | Some("fasta") | Some("fna") => Some(AnnotationFile::Fasta(path.clone())),
            _ => None,
        };
        if let Some(file_type) = by_extension {
            return Ok(file_type);
        }

        let first_line = InputStream::new(&path).first_line()?.unwrap_or_default();
        let file_type = if first_line.starts_with("LOCUS") {
            AnnotationFile::Genbank(path)
        } else if first_line.starts_with("##fileformat=VCF") {
            AnnotationFile::Vcf(path)
        } else if first_line.starts_with("##gff-version") {
            AnnotationFile::Gff(path)
        } else if first_line.starts_with('>') {
            AnnotationFile::Fasta(path)
        } else {
            AnnotationFile::Unsupported(path)
        };
        Ok(file_type)
    }
}
