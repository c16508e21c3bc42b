//! The [`SegmentSink`] and [`SequenceSink`] capabilities that parsers write into.
//!
//! Storage is not this crate's business: a database-backed genome browser
//! implements [`SegmentSink`] over its tables. [`MemorySink`] is the in-memory
//! reference implementation used by the command line tool and the tests.
//!
//! Parsers borrow a sink mutably for the length of one file, so writes from
//! several files are serialized by construction.

use indexmap::IndexMap;
use log::debug;
use serde_json::Value;
use std::io::Write;
use std::path::PathBuf;

use crate::error::GbError;
use crate::io::OutputFile;
use crate::track::{GeneViewRow, Segment, Track, TrackKind};
use crate::TrackId;

/// Where tracks and segments go.
pub trait SegmentSink {
    /// Create a track and return its id. Ids are assigned monotonically and never reused.
    fn create_track(
        &mut self,
        name: &str,
        kind: TrackKind,
        color: Option<&str>,
        metadata: Option<Value>,
    ) -> Result<TrackId, GbError>;

    /// Store one segment on an existing track.
    fn append_segment(&mut self, segment: Segment) -> Result<(), GbError>;

    /// Apply the `gene|domain → exons` transition to a track. Returns `true`
    /// if the track kind changed.
    fn promote_to_exons(&mut self, track_id: TrackId) -> Result<bool, GbError>;

    /// Replace the metadata of a track.
    fn set_track_metadata(
        &mut self,
        track_id: TrackId,
        metadata: Option<Value>,
    ) -> Result<(), GbError>;

    /// Drop and recreate the derived genes view.
    fn rebuild_gene_view(&mut self) -> Result<(), GbError>;
}

/// Receives the residues of one chromosome at a time.
pub trait SequenceSink {
    /// Start the sequence of `chrom`, closing any open one.
    fn begin(&mut self, chrom: &str) -> Result<(), GbError>;
    /// Append residues to the open sequence.
    fn write(&mut self, residues: &str) -> Result<(), GbError>;
    /// Close the open sequence, if any.
    fn end(&mut self) -> Result<(), GbError>;
}

/// An in-memory [`SegmentSink`].
#[derive(Clone, Debug, Default)]
pub struct MemorySink {
    tracks: IndexMap<TrackId, Track>,
    segments: Vec<Segment>,
    genes: Vec<GeneViewRow>,
    next_id: TrackId,
}

impl MemorySink {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub fn track(&self, track_id: TrackId) -> Option<&Track> {
        self.tracks.get(&track_id)
    }

    /// All tracks named `name`, in creation order.
    pub fn tracks_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Track> + 'a {
        self.tracks.values().filter(move |t| t.name == name)
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Segments of one track, in insertion order.
    pub fn track_segments(&self, track_id: TrackId) -> impl Iterator<Item = &Segment> {
        self.segments.iter().filter(move |s| s.track_id == track_id)
    }

    pub fn gene_view(&self) -> &[GeneViewRow] {
        &self.genes
    }

    /// Remove every track named `name` with its segments, then rebuild the
    /// genes view. Returns the number of tracks removed.
    pub fn remove_track(&mut self, name: &str) -> Result<usize, GbError> {
        let ids: Vec<TrackId> = self.tracks_named(name).map(|t| t.id).collect();
        for id in &ids {
            self.tracks.shift_remove(id);
        }
        self.segments.retain(|s| !ids.contains(&s.track_id));
        self.rebuild_gene_view()?;
        Ok(ids.len())
    }

    /// Write the tracks as TSV: `id name kind color metadata`.
    pub fn write_tracks(&self, output: &OutputFile) -> Result<(), GbError> {
        let mut writer = output.writer()?;
        for track in self.tracks.values() {
            let metadata = match &track.metadata {
                Some(value) => serde_json::to_string(value)?,
                None => ".".to_string(),
            };
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}",
                track.id,
                track.name,
                track.kind,
                track.color.as_deref().unwrap_or("."),
                metadata
            )?;
        }
        Ok(())
    }

    /// Write the segments as TSV: the track id followed by BED12-like columns.
    pub fn write_segments(&self, output: &OutputFile) -> Result<(), GbError> {
        let mut writer = output.writer()?;
        for segment in &self.segments {
            writeln!(writer, "{}\t{}", segment.track_id, segment.to_tsv())?;
        }
        Ok(())
    }

    /// Write the genes view as TSV: `chrom start end name score`.
    pub fn write_gene_view(&self, output: &OutputFile) -> Result<(), GbError> {
        let mut writer = output.writer()?;
        for row in &self.genes {
            writeln!(
                writer,
                "{}\t{}\t{}\t{}\t{}",
                row.chrom,
                row.start,
                row.end,
                row.name.as_deref().unwrap_or("."),
                row.score.as_deref().unwrap_or(".")
            )?;
        }
        Ok(())
    }

    fn track_mut(&mut self, track_id: TrackId) -> Result<&mut Track, GbError> {
        self.tracks
            .get_mut(&track_id)
            .ok_or(GbError::UnknownTrack(track_id))
    }
}

impl SegmentSink for MemorySink {
    fn create_track(
        &mut self,
        name: &str,
        kind: TrackKind,
        color: Option<&str>,
        metadata: Option<Value>,
    ) -> Result<TrackId, GbError> {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        let track = Track::new(id, name, kind, color.map(String::from), metadata);
        debug!("created track {} '{}' ({})", id, name, kind);
        self.tracks.insert(id, track);
        Ok(id)
    }

    fn append_segment(&mut self, segment: Segment) -> Result<(), GbError> {
        if !self.tracks.contains_key(&segment.track_id) {
            return Err(GbError::UnknownTrack(segment.track_id));
        }
        self.segments.push(segment);
        Ok(())
    }

    fn promote_to_exons(&mut self, track_id: TrackId) -> Result<bool, GbError> {
        let changed = self.track_mut(track_id)?.promote_to_exons()?;
        if changed {
            debug!("track {} promoted to exons", track_id);
        }
        Ok(changed)
    }

    fn set_track_metadata(
        &mut self,
        track_id: TrackId,
        metadata: Option<Value>,
    ) -> Result<(), GbError> {
        self.track_mut(track_id)?.metadata = metadata;
        Ok(())
    }

    fn rebuild_gene_view(&mut self) -> Result<(), GbError> {
        let tracks = &self.tracks;
        self.genes = self
            .segments
            .iter()
            .filter(|s| tracks.get(&s.track_id).map_or(false, |t| t.kind.is_gene_like()))
            .map(|s| GeneViewRow {
                chrom: s.chrom.clone(),
                start: s.start,
                end: s.end,
                name: s.name.clone(),
                score: s.score.clone(),
            })
            .collect();
        Ok(())
    }
}

/// Keeps sequences in memory, keyed by chromosome name.
#[derive(Clone, Debug, Default)]
pub struct MemorySequences {
    pub sequences: IndexMap<String, String>,
    current: Option<String>,
}

impl MemorySequences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, chrom: &str) -> Option<&str> {
        self.sequences.get(chrom).map(String::as_str)
    }
}

impl SequenceSink for MemorySequences {
    fn begin(&mut self, chrom: &str) -> Result<(), GbError> {
        self.sequences.insert(chrom.to_string(), String::new());
        self.current = Some(chrom.to_string());
        Ok(())
    }

    fn write(&mut self, residues: &str) -> Result<(), GbError> {
        if let Some(chrom) = &self.current {
            if let Some(sequence) = self.sequences.get_mut(chrom) {
                sequence.push_str(residues);
            }
        }
        Ok(())
    }

    fn end(&mut self) -> Result<(), GbError> {
        self.current = None;
        Ok(())
    }
}

/// Writes one `<chrom>.fa` FASTA file per sequence into a directory.
pub struct FastaDirectory {
    directory: PathBuf,
    writer: Option<Box<dyn Write>>,
}

impl std::fmt::Debug for FastaDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastaDirectory")
            .field("directory", &self.directory)
            .finish_non_exhaustive()
    }
}

impl FastaDirectory {
    /// Create the directory if needed.
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self, GbError> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory)?;
        Ok(Self {
            directory,
            writer: None,
        })
    }

    /// The `<chrom>.fa` file of a sequence. Names that are empty or could
    /// leave the directory (`/`, `\`, `..`) are [`GbError::InvalidSequenceName`].
    pub fn path_for(&self, chrom: &str) -> Result<PathBuf, GbError> {
        if chrom.is_empty() || chrom.contains(['/', '\\']) || chrom.contains("..") {
            return Err(GbError::InvalidSequenceName(chrom.to_string()));
        }
        Ok(self.directory.join(format!("{}.fa", chrom)))
    }
}

impl SequenceSink for FastaDirectory {
    fn begin(&mut self, chrom: &str) -> Result<(), GbError> {
        self.end()?;
        let mut writer = OutputFile::new(self.path_for(chrom)?, None).writer()?;
        writeln!(writer, ">{}", chrom)?;
        self.writer = Some(writer);
        Ok(())
    }

    fn write(&mut self, residues: &str) -> Result<(), GbError> {
        if let Some(writer) = self.writer.as_mut() {
            writer.write_all(residues.as_bytes())?;
        }
        Ok(())
    }

    fn end(&mut self) -> Result<(), GbError> {
        if let Some(mut writer) = self.writer.take() {
            writeln!(writer)?;
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for FastaDirectory {
    fn drop(&mut self) {
        let _ = self.end();
    }
}
