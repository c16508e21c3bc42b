//! Assemblies: the ordered chromosome list every track is drawn against.
//!
//! An [`Assembly`] can come from four places, described by an [`AssemblySpec`]:
//!
//!  1. A named reference build of the bundled registry (`NCBI36`, `GRCh37`,
//!     `GRCh38`).
//!  2. One BED-like file of literal `chrom offset length` records.
//!  3. One or more FASTA files; lengths are the residue counts.
//!  4. An explicit list, possibly decoded from JSON with
//!     [`Assembly::from_json`].
//!
//! Resolution never guesses: inputs that are ambiguous (a FASTA file mixed with
//! other files, several non-FASTA files) or that do not exist are
//! [`GbError::InvalidAssembly`].

use csv::ReaderBuilder;
use indexmap::IndexMap;
use lazy_static::lazy_static;
use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::GbError;
use crate::io::parsers::fasta::chromosomes_from_files;
use crate::io::parsers::parse_column;
use crate::io::parsers::AnnotationFile;
use crate::io::InputStream;
use crate::Position;

lazy_static! {
    /// The bundled reference builds, as TSV tables of `chrom offset length`.
    static ref REGISTRY: IndexMap<&'static str, &'static str> = [
        ("NCBI36", include_str!("../assemblies/NCBI36.tsv")),
        ("GRCh37", include_str!("../assemblies/GRCh37.tsv")),
        ("GRCh38", include_str!("../assemblies/GRCh38.tsv")),
    ]
    .into_iter()
    .collect();
}

/// The names of the bundled reference builds.
pub fn registry_names() -> Vec<String> {
    REGISTRY.keys().map(|name| name.to_string()).collect()
}

/// One chromosome record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chromosome {
    pub name: String,
    /// Cytoband start or drawing offset.
    pub offset: Position,
    pub length: Position,
}

impl Chromosome {
    pub fn new(name: impl Into<String>, offset: Position, length: Position) -> Self {
        Self {
            name: name.into(),
            offset,
            length,
        }
    }
}

/// Where an assembly comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum AssemblySpec {
    /// An existing file path, or else a registry name.
    Named(String),
    /// FASTA files, or a single BED file.
    Paths(Vec<PathBuf>),
    /// Records given by the caller.
    List(Vec<Chromosome>),
}

impl AssemblySpec {
    /// Build a spec from command line values: one value is a name or path, more
    /// than one are paths.
    pub fn from_args(values: &[String]) -> Self {
        match values {
            [single] => AssemblySpec::Named(single.clone()),
            _ => AssemblySpec::Paths(values.iter().map(PathBuf::from).collect()),
        }
    }

    /// Resolve this spec into a validated [`Assembly`].
    pub fn resolve(&self) -> Result<Assembly, GbError> {
        match self {
            AssemblySpec::Named(value) => {
                if Path::new(value).is_file() {
                    return resolve_paths(&[PathBuf::from(value)]);
                }
                Assembly::from_registry(value)
            }
            AssemblySpec::Paths(paths) => resolve_paths(paths),
            AssemblySpec::List(chromosomes) => Assembly::new(chromosomes.clone()),
        }
    }
}

fn invalid(value: impl Into<String>) -> GbError {
    GbError::InvalidAssembly {
        value: value.into(),
        available: registry_names(),
    }
}

fn resolve_paths(paths: &[PathBuf]) -> Result<Assembly, GbError> {
    if paths.is_empty() {
        return Err(invalid(""));
    }
    if let Some(missing) = paths.iter().find(|path| !path.is_file()) {
        return Err(invalid(missing.display().to_string()));
    }
    let mut all_fasta = true;
    for path in paths {
        if !matches!(AnnotationFile::detect(path)?, AnnotationFile::Fasta(_)) {
            all_fasta = false;
        }
    }
    if all_fasta {
        debug!("assembly from {} FASTA file(s)", paths.len());
        return Assembly::new(chromosomes_from_files(paths)?);
    }
    match paths {
        [bed] => Assembly::from_bed(bed),
        _ => {
            let joined: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
            Err(invalid(joined.join(", ")))
        }
    }
}

/// An ordered list of chromosomes with unique names and non-zero lengths.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Assembly {
    chromosomes: Vec<Chromosome>,
}

impl Assembly {
    /// Validate and wrap chromosome records.
    ///
    /// # Errors
    ///
    /// [`GbError::InvalidAssembly`] on an empty list, a duplicated name or a zero
    /// length.
    pub fn new(chromosomes: Vec<Chromosome>) -> Result<Self, GbError> {
        if chromosomes.is_empty() {
            return Err(invalid("empty assembly"));
        }
        let mut seen: HashSet<&str> = HashSet::new();
        for chromosome in &chromosomes {
            if chromosome.length == 0 {
                return Err(invalid(format!("{} (zero length)", chromosome.name)));
            }
            if !seen.insert(chromosome.name.as_str()) {
                return Err(invalid(format!("{} (duplicated)", chromosome.name)));
            }
        }
        Ok(Self { chromosomes })
    }

    /// Load a bundled reference build.
    pub fn from_registry(name: &str) -> Result<Self, GbError> {
        let table = REGISTRY.get(name).ok_or_else(|| invalid(name))?;
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_reader(table.as_bytes());
        let chromosomes = reader
            .deserialize()
            .collect::<Result<Vec<Chromosome>, csv::Error>>()?;
        Self::new(chromosomes)
    }

    /// Load literal `chrom offset length` records from a (possibly gzipped)
    /// file. Comment and blank lines are skipped, extra columns ignored.
    pub fn from_bed(path: impl AsRef<Path>) -> Result<Self, GbError> {
        let path = path.as_ref();
        let mut chromosomes = Vec::new();
        for line in InputStream::new(path).lines()? {
            let line = line?;
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let columns: Vec<&str> = line.split('\t').collect();
            if columns.len() < 3 {
                return Err(invalid(format!("{}: '{}'", path.display(), line)));
            }
            let offset = parse_column(columns[1].trim(), &line)?;
            let length = parse_column(columns[2].trim(), &line)?;
            chromosomes.push(Chromosome::new(columns[0], offset, length));
        }
        Self::new(chromosomes)
    }

    /// Decode a JSON array of `[name, offset, length]` triples.
    pub fn from_json(json: &str) -> Result<Self, GbError> {
        let value: Value = serde_json::from_str(json)?;
        let items = value.as_array().ok_or_else(|| invalid(json))?;
        let mut chromosomes = Vec::with_capacity(items.len());
        for item in items {
            let record = match item.as_array().map(Vec::as_slice) {
                Some([Value::String(name), offset, length]) => {
                    let offset = offset.as_u64().and_then(|v| Position::try_from(v).ok());
                    let length = length.as_u64().and_then(|v| Position::try_from(v).ok());
                    offset
                        .zip(length)
                        .map(|(offset, length)| Chromosome::new(name.as_str(), offset, length))
                }
                _ => None,
            };
            chromosomes.push(record.ok_or_else(|| invalid(item.to_string()))?);
        }
        Self::new(chromosomes)
    }

    pub fn len(&self) -> usize {
        self.chromosomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chromosomes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Chromosome> {
        self.chromosomes.iter()
    }

    /// Chromosome names, in assembly order.
    pub fn names(&self) -> Vec<&str> {
        self.chromosomes.iter().map(|c| c.name.as_str()).collect()
    }

    /// Find a chromosome by name, ignoring case.
    pub fn find(&self, name: &str) -> Option<&Chromosome> {
        self.chromosomes
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// The length of the longest chromosome.
    pub fn max_length(&self) -> Position {
        self.chromosomes.iter().map(|c| c.length).max().unwrap_or(0)
    }

    /// The sum of all chromosome lengths.
    pub fn total_length(&self) -> u64 {
        self.chromosomes.iter().map(|c| c.length as u64).sum()
    }

    /// Lower-cased chromosome name → list of `[offset, length]`, the band table
    /// the browser draws chromosomes from.
    pub fn chromosome_bands(&self) -> IndexMap<String, Vec<[Position; 2]>> {
        let mut bands: IndexMap<String, Vec<[Position; 2]>> = IndexMap::new();
        for chromosome in &self.chromosomes {
            bands
                .entry(chromosome.name.to_lowercase())
                .or_default()
                .push([chromosome.offset, chromosome.length]);
        }
        bands
    }

    /// Write the assembly as `chrom offset length` TSV.
    pub fn to_tsv(&self) -> String {
        self.chromosomes
            .iter()
            .map(|c| format!("{}\t{}\t{}\n", c.name, c.offset, c.length))
            .collect()
    }
}
