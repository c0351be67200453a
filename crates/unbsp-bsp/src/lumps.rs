// lumps.rs — the lump directory and the width-transparent index list.

use crate::error::{BspError, Result};
use crate::format::{IntWidth, VariantParams};
use crate::reader::Reader;

/// One directory entry: a byte range inside the file.
#[derive(Debug, Clone, Copy, Default)]
pub struct LumpEntry {
    pub offset: usize,
    pub length: usize,
}

/// The per-file lump directory, read once at open time.
#[derive(Debug, Clone)]
pub struct LumpDirectory {
    entries: Vec<LumpEntry>,
}

impl LumpDirectory {
    pub fn parse(bytes: &[u8], params: &VariantParams) -> Result<LumpDirectory> {
        let mut reader = Reader::new(bytes, "lump directory");
        reader.seek(params.dir_offset);
        let mut entries = Vec::with_capacity(params.lump_count);
        for _ in 0..params.lump_count {
            let offset = reader.i32()?.max(0) as usize;
            let length = reader.i32()?.max(0) as usize;
            // Source entries carry version + fourCC after the range.
            reader.skip(params.dir_entry_size - 8)?;
            entries.push(LumpEntry { offset, length });
        }
        Ok(LumpDirectory { entries })
    }

    /// The byte range of a logical lump, or an empty slice when the variant
    /// has no such lump. A range pointing outside the file is a decode
    /// error: silently clamping would hide corruption.
    pub fn slice<'a>(
        &self,
        bytes: &'a [u8],
        slot: Option<usize>,
        name: &'static str,
    ) -> Result<&'a [u8]> {
        let Some(slot) = slot else {
            return Ok(&[]);
        };
        let entry = self.entries.get(slot).copied().unwrap_or_default();
        if entry.length == 0 {
            return Ok(&[]);
        }
        bytes
            .get(entry.offset..entry.offset + entry.length)
            .ok_or(BspError::LumpOutOfBounds {
                name,
                offset: entry.offset,
                length: entry.length,
                file_len: bytes.len(),
            })
    }
}

/// A lump of bare integers whose backing width (8/16/32/64-bit, signed or
/// unsigned) varies per variant. Reads and writes are transparent: callers
/// only ever see i64, with unsigned widths zero-extended and signed widths
/// sign-extended.
#[derive(Debug, Clone)]
pub struct IndexList {
    width: IntWidth,
    data: Vec<u8>,
}

impl IndexList {
    pub fn from_bytes(bytes: &[u8], width: IntWidth) -> IndexList {
        let size = width.size();
        let whole = bytes.len() / size * size;
        IndexList {
            width,
            data: bytes[..whole].to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.width.size()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<i64> {
        let size = self.width.size();
        let bytes = self.data.get(index * size..index * size + size)?;
        Some(match self.width {
            IntWidth::U8 => bytes[0] as i64,
            IntWidth::I8 => bytes[0] as i8 as i64,
            IntWidth::U16 => u16::from_le_bytes([bytes[0], bytes[1]]) as i64,
            IntWidth::I16 => i16::from_le_bytes([bytes[0], bytes[1]]) as i64,
            IntWidth::U32 => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i64,
            IntWidth::I32 => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i64,
            IntWidth::I64 => i64::from_le_bytes(bytes.try_into().unwrap()),
        })
    }

    /// Store `value` truncated to the backing width.
    pub fn set(&mut self, index: usize, value: i64) {
        let size = self.width.size();
        let range = index * size..index * size + size;
        if range.end > self.data.len() {
            return;
        }
        let bytes = value.to_le_bytes();
        self.data[range].copy_from_slice(&bytes[..size]);
    }

    pub fn iter(&self) -> impl Iterator<Item = i64> + '_ {
        (0..self.len()).map(|i| self.get(i).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_list_widths_are_transparent() {
        // Same logical values through three different backing widths.
        let values: [i64; 3] = [0, 513, 70000];

        let u32_bytes: Vec<u8> = values.iter().flat_map(|v| (*v as u32).to_le_bytes()).collect();
        let list = IndexList::from_bytes(&u32_bytes, IntWidth::U32);
        assert_eq!(list.iter().collect::<Vec<_>>(), values);

        let small: [i64; 2] = [0, 513];
        let u16_bytes: Vec<u8> = small.iter().flat_map(|v| (*v as u16).to_le_bytes()).collect();
        let list = IndexList::from_bytes(&u16_bytes, IntWidth::U16);
        assert_eq!(list.iter().collect::<Vec<_>>(), small);
    }

    #[test]
    fn test_index_list_sign_extension() {
        let bytes = (-2i32).to_le_bytes();
        let list = IndexList::from_bytes(&bytes, IntWidth::I32);
        assert_eq!(list.get(0), Some(-2));

        // Unsigned width never produces the negative sentinel.
        let bytes = 0xFFFFu16.to_le_bytes();
        let list = IndexList::from_bytes(&bytes, IntWidth::U16);
        assert_eq!(list.get(0), Some(65535));
    }

    #[test]
    fn test_index_list_write() {
        let mut list = IndexList::from_bytes(&[0; 8], IntWidth::U16);
        list.set(2, 300);
        assert_eq!(list.get(2), Some(300));
        assert_eq!(list.get(3), Some(0));
        assert_eq!(list.get(4), None);
    }

    #[test]
    fn test_partial_trailing_element_dropped() {
        let list = IndexList::from_bytes(&[1, 0, 0, 0, 9], IntWidth::U32);
        assert_eq!(list.len(), 1);
    }
}
