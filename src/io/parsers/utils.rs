use std::path::Path;

use crate::{error::GbError, Position};

/// Get the *base* extension to help infer filetype, which ignores compression-related
/// extensions (`.gz` and `.bgz`). The extension is lower-cased.
pub fn get_base_extension<P: AsRef<Path>>(filepath: P) -> Option<String> {
    let path = filepath.as_ref();

    // get the filename and split by '.'
    let parts: Vec<&str> = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("")
        .split('.')
        .collect();

    let ignore_extensions = ["gz", "bgz"];

    let has_ignore_extension = parts
        .last()
        .map_or(false, |ext| ignore_extensions.contains(ext));

    if parts.len() > 2 && has_ignore_extension {
        // if it's .gz, we return the second to last token,
        // e.g. path/foo.bed.gz would return bed
        Some(parts[parts.len() - 2].to_lowercase())
    } else if parts.len() > 1 && !has_ignore_extension {
        // there is no .gz - return the last token.
        Some(parts[parts.len() - 1].to_lowercase())
    } else {
        // no extension found
        None
    }
}

/// Parses a single column from a string slice into a specified type.
///
/// # Errors
///
/// Returns `GbError::InvalidColumnType` if the column cannot be parsed into type `T`.
pub fn parse_column<T: std::str::FromStr>(column: &str, line: &str) -> Result<T, GbError>
where
    <T as std::str::FromStr>::Err: std::fmt::Debug,
{
    column
        .parse::<T>()
        .map_err(|_| GbError::InvalidColumnType {
            expected_type: std::any::type_name::<T>().to_string(), // Provides the expected type name
            found_value: column.to_string(),
            line: line.to_string(),
        })
}

/// Convert a 1-based inclusive `start..end` pair into a 0-based right-exclusive range.
pub fn one_based_to_half_open(start: Position, end: Position) -> Option<(Position, Position)> {
    if start == 0 || end < start {
        return None;
    }
    Some((start - 1, end))
}
