//! The track/segment data model shared by every parser.
//!
//! All coordinates are 0-based and right-exclusive (the BED convention), whatever
//! the convention of the source format.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::{error::GbError, Position, TrackId};

/// Default color of `gene` tracks created from GFF/GenBank feature types.
pub const GENE_COLOR: &str = "cadetblue";
/// Highlight color of tracks promoted to [`TrackKind::Exons`].
pub const EXONS_COLOR: &str = "goldenrod";
/// Color used when nothing else is specified.
pub const DEFAULT_COLOR: &str = "#000";

/// The rendering kind of a track.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Gene,
    Exons,
    Domain,
    Value,
    Score,
    Vcf,
    #[value(name = "vcfsample")]
    VcfSample,
}

impl TrackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrackKind::Gene => "gene",
            TrackKind::Exons => "exons",
            TrackKind::Domain => "domain",
            TrackKind::Value => "value",
            TrackKind::Score => "score",
            TrackKind::Vcf => "vcf",
            TrackKind::VcfSample => "vcfsample",
        }
    }

    /// Segments of these kinds carry a numeric score.
    pub fn is_numeric(&self) -> bool {
        matches!(self, TrackKind::Value | TrackKind::Score)
    }

    /// Segments of these kinds appear in the derived genes view.
    pub fn is_gene_like(&self) -> bool {
        matches!(self, TrackKind::Gene | TrackKind::Exons)
    }

    /// The kind and color of a track created from a GFF/GenBank feature type.
    pub fn for_feature_type(feature_type: &str) -> (TrackKind, &'static str) {
        match feature_type {
            "gene" | "CDS" => (TrackKind::Gene, GENE_COLOR),
            _ => (TrackKind::Domain, DEFAULT_COLOR),
        }
    }
}

impl fmt::Display for TrackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackKind {
    type Err = GbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gene" => Ok(TrackKind::Gene),
            "exons" => Ok(TrackKind::Exons),
            "domain" => Ok(TrackKind::Domain),
            "value" => Ok(TrackKind::Value),
            "score" => Ok(TrackKind::Score),
            "vcf" => Ok(TrackKind::Vcf),
            "vcfsample" => Ok(TrackKind::VcfSample),
            _ => Err(GbError::InvalidColumnType {
                expected_type: "track kind".to_string(),
                found_value: s.to_string(),
                line: s.to_string(),
            }),
        }
    }
}

/// A named, typed collection of segments.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub kind: TrackKind,
    pub color: Option<String>,
    pub metadata: Option<Value>,
}

impl Track {
    pub fn new(
        id: TrackId,
        name: impl Into<String>,
        kind: TrackKind,
        color: Option<String>,
        metadata: Option<Value>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            color,
            metadata,
        }
    }

    /// Move this track to [`TrackKind::Exons`], the only kind change a track
    /// ever goes through. Returns `true` if the kind changed, `false` if the
    /// track already was an exons track.
    pub fn promote_to_exons(&mut self) -> Result<bool, GbError> {
        match self.kind {
            TrackKind::Exons => Ok(false),
            TrackKind::Gene | TrackKind::Domain => {
                self.kind = TrackKind::Exons;
                self.color = Some(EXONS_COLOR.to_string());
                Ok(true)
            }
            other => Err(GbError::InvalidTrackTransition(self.id, other)),
        }
    }
}

/// Nucleotide strand enum type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Strand {
    #[serde(rename = "+")]
    Forward,
    #[serde(rename = "-")]
    Reverse,
}

impl Strand {
    /// Parse a strand column; anything but `+` or `-` is unknown.
    pub fn from_column(column: &str) -> Option<Strand> {
        match column {
            "+" => Some(Strand::Forward),
            "-" => Some(Strand::Reverse),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Strand::Forward => "+",
            Strand::Reverse => "-",
        }
    }
}

/// One sub-interval (exon) of a segment, with `start` relative to the
/// segment start.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Block {
    pub size: Position,
    pub start: Position,
}

impl Block {
    pub fn new(size: Position, start: Position) -> Self {
        Self { size, start }
    }
}

/// One annotated interval on a chromosome within a track.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Segment {
    pub track_id: TrackId,
    pub chrom: String,
    pub start: Position,
    pub end: Position,
    pub name: Option<String>,
    pub score: Option<String>,
    pub strand: Option<Strand>,
    pub thick_start: Option<Position>,
    pub thick_end: Option<Position>,
    pub item_rgb: Option<String>,
    pub blocks: Option<Vec<Block>>,
}

impl Segment {
    /// Create a new segment without optional columns, validating `start < end`.
    pub fn new(
        track_id: TrackId,
        chrom: impl Into<String>,
        start: Position,
        end: Position,
    ) -> Result<Self, GbError> {
        if start >= end {
            return Err(GbError::InvalidRange(start, end));
        }
        Ok(Self {
            track_id,
            chrom: chrom.into(),
            start,
            end,
            ..Default::default()
        })
    }

    pub fn block_count(&self) -> Option<usize> {
        self.blocks.as_ref().map(|blocks| blocks.len())
    }

    pub fn block_sizes(&self) -> Option<Vec<Position>> {
        self.blocks
            .as_ref()
            .map(|blocks| blocks.iter().map(|b| b.size).collect())
    }

    pub fn block_starts(&self) -> Option<Vec<Position>> {
        self.blocks
            .as_ref()
            .map(|blocks| blocks.iter().map(|b| b.start).collect())
    }

    /// Append one block, creating the block list on the first call.
    pub fn push_block(&mut self, block: Block) {
        self.blocks.get_or_insert_with(Vec::new).push(block);
    }

    /// Sort blocks by their relative start.
    pub fn sort_blocks(&mut self) {
        if let Some(blocks) = self.blocks.as_mut() {
            blocks.sort_by_key(|b| b.start);
        }
    }

    /// Render this segment as a BED12-like TSV row, without the track id.
    pub fn to_tsv(&self) -> String {
        fn opt<T: ToString>(value: &Option<T>) -> String {
            value.as_ref().map_or(".".to_string(), |v| v.to_string())
        }
        fn join(values: Option<Vec<Position>>) -> String {
            values.map_or(".".to_string(), |v| {
                v.iter()
                    .map(|x| x.to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            })
        }
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.chrom,
            self.start,
            self.end,
            opt(&self.name),
            opt(&self.score),
            self.strand.map_or(".", |s| s.as_str()),
            opt(&self.thick_start),
            opt(&self.thick_end),
            opt(&self.item_rgb),
            opt(&self.block_count()),
            join(self.block_sizes()),
            join(self.block_starts()),
        )
    }
}

/// One row of the derived genes view.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GeneViewRow {
    pub chrom: String,
    pub start: Position,
    pub end: Position,
    pub name: Option<String>,
    pub score: Option<String>,
}
