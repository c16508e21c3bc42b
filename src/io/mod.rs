//! Types and methods for reading and parsing input and writing output.

pub mod file;
pub mod parsers;

pub use file::{InputStream, LineSource, OutputFile};
pub use parsers::{
    bed::BedIterator, genbank::GenbankParser, gff::GffParser, vcf::VcfParser, AnnotationFile,
};
