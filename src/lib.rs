//! # gbtracks
//!
//! Load genomic annotation files (BED, GFF, GenBank, VCF and FASTA) into the
//! track/segment model of a genome browser.
//!
//! Every parser makes a single forward pass over a [`LineSource`] and writes its
//! tracks and segments into a [`SegmentSink`]. Storage is up to the sink; this
//! crate ships [`MemorySink`] as the reference implementation.
//!
//! ```
//! use gbtracks::prelude::*;
//!
//! let gff = "chr1\t.\tgene\t1\t100\t.\t+\t.\tID=g1\n\
//!            chr1\t.\texon\t1\t40\t.\t+\t.\tID=e1;Parent=g1\n\
//!            chr1\t.\texon\t61\t100\t.\t+\t.\tID=e2;Parent=g1\n";
//!
//! let mut sink = MemorySink::new();
//! let report = GffParser::new()
//!     .ingest(LineSource::from_reader(gff.as_bytes()), &mut sink)
//!     .unwrap();
//! assert_eq!(report.records, 3);
//!
//! let gene = &sink.segments()[0];
//! assert_eq!((gene.start, gene.end), (0, 100));
//! assert_eq!(gene.block_sizes(), Some(vec![40, 40]));
//! assert_eq!(sink.track(gene.track_id).unwrap().kind, TrackKind::Exons);
//! ```
//!
//! [`LineSource`]: crate::io::LineSource
//! [`SegmentSink`]: crate::sink::SegmentSink
//! [`MemorySink`]: crate::sink::MemorySink

pub mod assembly;
pub mod commands;
pub mod error;
pub mod genomemap;
pub mod io;
pub mod reporting;
pub mod sink;
pub mod test_utilities;
pub mod track;

/// Zero-based genomic coordinate.
pub type Position = u32;

/// Sink-assigned track identifier.
pub type TrackId = u32;

pub mod prelude {
    pub use crate::assembly::{Assembly, AssemblySpec, Chromosome};
    pub use crate::error::GbError;
    pub use crate::genomemap::{segmentation, GenomeMap};
    pub use crate::io::parsers::{
        bed::{BedIterator, BedRecord},
        genbank::GenbankParser,
        gff::GffParser,
        vcf::{VcfOptions, VcfParser},
        AnnotationFile,
    };
    pub use crate::io::{InputStream, LineSource, OutputFile};
    pub use crate::reporting::IngestReport;
    pub use crate::sink::{MemorySequences, MemorySink, SegmentSink, SequenceSink};
    pub use crate::track::{Block, Segment, Strand, Track, TrackKind};
}
