//! Input/Output file handling with [`InputStream`], [`LineSource`] and [`OutputFile`].
//!
//! These types abstract over reading/writing both plaintext and gzip-compressed
//! input/output.

use flate2::bufread;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::io::Write;
use std::io::{self, BufWriter};
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use crate::error::GbError;

/// The two magic bytes starting every gzip member.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Check if a file is a gzipped by looking for the magic numbers
pub fn is_gzipped_file(file_path: impl AsRef<Path>) -> io::Result<bool> {
    let file = File::open(file_path.as_ref())?;
    let mut buffer = Vec::with_capacity(2);
    // files shorter than two bytes are never gzip
    file.take(2).read_to_end(&mut buffer)?;
    Ok(buffer == GZIP_MAGIC)
}

/// Represents an input file.
///
/// This abstracts how data is read in, allowing for both plaintext and gzip-compressed input
/// to be read through a common interface. Compression is detected from the content, not
/// from the file extension.
#[derive(Clone, Debug)]
pub struct InputStream {
    pub filepath: PathBuf,
}

impl InputStream {
    /// Constructs a new `InputStream`.
    pub fn new(filepath: impl Into<PathBuf>) -> Self {
        Self {
            filepath: filepath.into(),
        }
    }

    /// Opens the file and returns a buffered reader, decompressing gzip input.
    /// Every gzip member is read, so BGZF files come through whole.
    pub fn reader(&self) -> io::Result<BufReader<Box<dyn Read>>> {
        let file = File::open(&self.filepath)?;
        let is_gzipped = is_gzipped_file(&self.filepath)?;
        let reader: Box<dyn Read> = if is_gzipped {
            Box::new(MultiGzDecoder::new(file))
        } else {
            Box::new(file)
        };
        Ok(BufReader::new(reader))
    }

    /// Open the file as a [`LineSource`].
    pub fn lines(&self) -> Result<LineSource<'static>, GbError> {
        Ok(LineSource::new(Box::new(self.reader()?)))
    }

    /// The file name, used as the default track name.
    pub fn file_name(&self) -> String {
        self.filepath
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.filepath.to_string_lossy().to_string())
    }

    /// The first non-blank line of the file, if any.
    pub fn first_line(&self) -> Result<Option<String>, GbError> {
        for line in self.lines()? {
            let line = line?;
            if !line.trim().is_empty() {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }
}

/// A lazy, single-pass sequence of text lines with their terminators removed.
///
/// Every parser consumes its [`LineSource`] exactly once, top to bottom.
pub struct LineSource<'a> {
    reader: Box<dyn BufRead + 'a>,
    buffer: String,
}

impl<'a> std::fmt::Debug for LineSource<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineSource").finish_non_exhaustive()
    }
}

impl<'a> LineSource<'a> {
    pub fn new(reader: Box<dyn BufRead + 'a>) -> Self {
        Self {
            reader,
            buffer: String::new(),
        }
    }

    /// Build a line source over any reader, sniffing the first two bytes
    /// for gzip compression.
    pub fn from_reader<R: Read + 'a>(reader: R) -> Self {
        let mut reader = BufReader::new(reader);
        let is_gzipped = reader
            .fill_buf()
            .map(|buf| buf.starts_with(&GZIP_MAGIC))
            .unwrap_or(false);
        if is_gzipped {
            Self::new(Box::new(BufReader::new(bufread::MultiGzDecoder::new(reader))))
        } else {
            Self::new(Box::new(reader))
        }
    }
}

impl<'a> Iterator for LineSource<'a> {
    type Item = Result<String, GbError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.buffer.clear();
        match self.reader.read_line(&mut self.buffer) {
            Ok(0) => None,
            Ok(_) => {
                let line = self.buffer.trim_end_matches(['\n', '\r']);
                Some(Ok(line.to_string()))
            }
            Err(e) => Some(Err(GbError::IOError(e))),
        }
    }
}

enum OutputDestination {
    File(PathBuf),
    Stdout,
}

/// Represents an output file.
///
/// This struct is used to handle operations on an output file, such as writing to the file.
/// This abstracts writing both plaintext and gzip-compressed files.
pub struct OutputFile {
    destination: OutputDestination,
    pub header: Option<Vec<String>>,
}

impl OutputFile {
    /// Constructs a new `OutputFile`.
    ///
    /// # Arguments
    ///
    /// * `filepath` - A string slice that holds the path to the file. If the file extension is
    /// `.gz`, `OutputFile` will automatically write gzip-compressed output.
    /// * `header` - An optional vector of strings representing commented header lines to be written to the file.
    pub fn new(filepath: impl Into<PathBuf>, header: Option<Vec<String>>) -> Self {
        Self {
            destination: OutputDestination::File(filepath.into()),
            header,
        }
    }

    /// Constructs a new [`OutputFile`] for standard output.
    pub fn new_stdout(header: Option<Vec<String>>) -> Self {
        Self {
            destination: OutputDestination::Stdout,
            header,
        }
    }

    /// Opens the file and returns a writer.
    ///
    /// If the file path ends with ".gz", the file is treated as gzip-compressed, and the
    /// function will handle compression automatically. If a header is set, it will be written
    /// to the file.
    pub fn writer(&self) -> io::Result<Box<dyn Write>> {
        let mut writer: Box<dyn Write> = match &self.destination {
            OutputDestination::File(path) => {
                let is_gzip = path.extension().map_or(false, |ext| ext == "gz");
                if is_gzip {
                    Box::new(BufWriter::new(GzEncoder::new(
                        File::create(path)?,
                        Compression::default(),
                    )))
                } else {
                    Box::new(BufWriter::new(File::create(path)?))
                }
            }
            OutputDestination::Stdout => Box::new(BufWriter::new(io::stdout())),
        };
        // write header if one is set
        if let Some(entries) = &self.header {
            for entry in entries {
                writeln!(writer, "#{}", entry)?;
            }
        }
        Ok(writer)
    }
}
