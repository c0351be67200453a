// error.rs — decode error taxonomy.
//
// Everything here is fatal to the file being decoded, never to the process:
// the job layer catches these at the job boundary.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BspError {
    /// No known variant matched the magic/version header.
    #[error("unrecognized BSP format")]
    UnrecognizedFormat,

    #[error("lump {name} out of bounds (offset {offset} + length {length} > file size {file_len})")]
    LumpOutOfBounds {
        name: &'static str,
        offset: usize,
        length: usize,
        file_len: usize,
    },

    #[error("unexpected end of data while decoding {what} at offset {offset}")]
    Truncated { what: &'static str, offset: usize },

    /// Entity lump brace nesting never closed (or closed too often).
    #[error("mismatched braces in entity lump at byte {offset}")]
    BraceMismatch { offset: usize },

    /// A cross-lump reference pointed past the end of the referenced lump.
    /// Reported with the referencing record's context.
    #[error("{referrer}: {lump} index {index} out of range ({count} elements)")]
    IndexOutOfRange {
        referrer: &'static str,
        lump: &'static str,
        index: i64,
        count: usize,
    },
}

pub type Result<T> = std::result::Result<T, BspError>;

/// Resolve an (index, count) range reference into a slice of `items`.
///
/// A negative or missing index means "no reference" and yields an empty
/// slice; a nonnegative index that runs past the lump is an error carrying
/// the referencing record's context.
pub fn checked_range<'a, T>(
    items: &'a [T],
    first: i64,
    count: i64,
    lump: &'static str,
    referrer: &'static str,
) -> Result<&'a [T]> {
    if first < 0 || count <= 0 {
        return Ok(&[]);
    }
    let (first, count) = (first as usize, count as usize);
    match items.get(first..first + count) {
        Some(slice) => Ok(slice),
        None => Err(BspError::IndexOutOfRange {
            referrer,
            lump,
            index: (first + count) as i64 - 1,
            count: items.len(),
        }),
    }
}

/// Single-element variant of [`checked_range`]. Negative index yields None.
pub fn checked_get<'a, T>(
    items: &'a [T],
    index: i64,
    lump: &'static str,
    referrer: &'static str,
) -> Result<Option<&'a T>> {
    if index < 0 {
        return Ok(None);
    }
    match items.get(index as usize) {
        Some(item) => Ok(Some(item)),
        None => Err(BspError::IndexOutOfRange {
            referrer,
            lump,
            index,
            count: items.len(),
        }),
    }
}
