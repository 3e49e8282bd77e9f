/// Container reader: decodes files produced by the container writer.
///
/// Only what this crate writes is understood: an uncompressed container
/// with Action 14, Action 8 and Action F pseudo-sprites.

use thiserror::Error;

use crate::core::container::{ACTION_GRF_ID, HEADER_LEN, MAGIC, NO_COMPRESSION};
use crate::core::emit::{decode_string, ACTION_TOWN_NAMES, HIGH_BIT, PSEUDO_SPRITE};
use crate::schema::language::Language;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReadError {
    #[error("not a GRF container (bad magic)")]
    BadMagic,
    #[error("unsupported compression flag {0}")]
    Compressed(u8),
    #[error("unexpected end of data at offset {0}")]
    Truncated(usize),
    #[error("invalid string at offset {0}")]
    BadString(usize),
    #[error("malformed {what} at offset {offset}")]
    Malformed { what: &'static str, offset: usize },
}

/// One framed block of the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Block<'a> {
    /// Offset of the block's content within the file.
    pub offset: usize,
    pub kind: u8,
    pub data: &'a [u8],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Text { weight: u8, text: String },
    Ref { weight: u8, handle: u8 },
}

impl Entry {
    pub fn weight(&self) -> u8 {
        match self {
            Entry::Text { weight, .. } | Entry::Ref { weight, .. } => *weight,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartRecord {
    pub entropy_start: u8,
    pub width: u8,
    pub entries: Vec<Entry>,
}

impl PartRecord {
    pub fn total_weight(&self) -> u32 {
        self.entries.iter().map(|e| u32::from(e.weight())).sum()
    }
}

/// A decoded Action F record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TownNameRecord {
    pub handle: u8,
    pub names: Vec<(Language, String)>,
    pub parts: Vec<PartRecord>,
}

impl TownNameRecord {
    /// Whether this record is offered as a town-name style in the game.
    pub fn is_style(&self) -> bool {
        !self.names.is_empty()
    }
}

/// Decoded contents of a town-name NewGRF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrfFile {
    pub grf_id: [u8; 4],
    pub name: String,
    pub description: String,
    pub records: Vec<TownNameRecord>,
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8], base: usize) -> Self {
        Self { data, pos: 0, base }
    }

    fn offset(&self) -> usize {
        self.base + self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], ReadError> {
        let end = self.pos + len;
        let slice = self
            .data
            .get(self.pos..end)
            .ok_or(ReadError::Truncated(self.offset()))?;
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self) -> Result<u8, ReadError> {
        Ok(self.take(1)?[0])
    }

    fn u32(&mut self) -> Result<u32, ReadError> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn string(&mut self) -> Result<String, ReadError> {
        let offset = self.offset();
        let (text, used) =
            decode_string(&self.data[self.pos..]).ok_or(ReadError::BadString(offset))?;
        self.pos += used;
        Ok(text)
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }
}

/// Split a container into its framed blocks.
pub fn read_blocks(bytes: &[u8]) -> Result<Vec<Block<'_>>, ReadError> {
    if bytes.len() < HEADER_LEN || bytes[..MAGIC.len()] != MAGIC {
        return Err(ReadError::BadMagic);
    }
    let mut cursor = Cursor::new(bytes, 0);
    cursor.take(MAGIC.len())?;

    let body_size = cursor.u32()? as usize;
    if body_size != bytes.len() - HEADER_LEN + 1 {
        return Err(ReadError::Malformed {
            what: "body size",
            offset: MAGIC.len(),
        });
    }
    let compression = cursor.u8()?;
    if compression != NO_COMPRESSION {
        return Err(ReadError::Compressed(compression));
    }

    let mut blocks = Vec::new();
    while !cursor.is_empty() {
        let len = cursor.u32()? as usize;
        let kind = cursor.u8()?;
        let offset = cursor.offset();
        let data = cursor.take(len)?;
        blocks.push(Block { offset, kind, data });
    }
    Ok(blocks)
}

/// Decode the content of one Action F block.
pub fn parse_town_names(data: &[u8], offset: usize) -> Result<TownNameRecord, ReadError> {
    let mut c = Cursor::new(data, offset);
    if c.u8()? != ACTION_TOWN_NAMES {
        return Err(ReadError::Malformed {
            what: "town-name action",
            offset,
        });
    }

    let id = c.u8()?;
    let mut names = Vec::new();
    if id & HIGH_BIT != 0 {
        // The first language byte is always followed by a name, even if 0.
        let mut lang = c.u8()?;
        loop {
            let text = c.string()?;
            names.push((Language::from_code(lang), text));
            lang = c.u8()?;
            if lang == 0 {
                break;
            }
        }
    }

    let part_count = c.u8()?;
    let mut parts = Vec::with_capacity(usize::from(part_count));
    for _ in 0..part_count {
        let count = c.u8()?;
        let entropy_start = c.u8()?;
        let width = c.u8()?;
        let mut entries = Vec::with_capacity(usize::from(count));
        for _ in 0..count {
            let prob = c.u8()?;
            let weight = prob & !HIGH_BIT;
            if prob & HIGH_BIT != 0 {
                entries.push(Entry::Ref {
                    weight,
                    handle: c.u8()?,
                });
            } else {
                entries.push(Entry::Text {
                    weight,
                    text: c.string()?,
                });
            }
        }
        parts.push(PartRecord {
            entropy_start,
            width,
            entries,
        });
    }

    if !c.is_empty() {
        return Err(ReadError::Malformed {
            what: "town-name record (trailing bytes)",
            offset: c.offset(),
        });
    }

    Ok(TownNameRecord {
        handle: id & !HIGH_BIT,
        names,
        parts,
    })
}

/// Decode a whole file.
pub fn read_grf(bytes: &[u8]) -> Result<GrfFile, ReadError> {
    let blocks = read_blocks(bytes)?;

    let mut file = GrfFile {
        grf_id: [0; 4],
        name: String::new(),
        description: String::new(),
        records: Vec::new(),
    };

    // The first block is the block count, whose bytes can look like any
    // action, so it is skipped.
    for block in blocks.iter().skip(1) {
        if block.kind != PSEUDO_SPRITE || block.data.is_empty() {
            continue;
        }
        match block.data[0] {
            ACTION_GRF_ID => {
                let mut c = Cursor::new(block.data, block.offset);
                c.take(2)?;
                let id = c.take(4)?;
                file.grf_id.copy_from_slice(id);
                file.name = c.string()?;
                file.description = c.string()?;
            }
            ACTION_TOWN_NAMES => {
                file.records
                    .push(parse_town_names(block.data, block.offset)?);
            }
            _ => {}
        }
    }
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_magic() {
        assert_eq!(read_blocks(b"not a grf file at all"), Err(ReadError::BadMagic));
        assert_eq!(read_blocks(&MAGIC[..4]), Err(ReadError::BadMagic));
    }

    #[test]
    fn rejects_compressed() {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&1u32.to_le_bytes());
        bytes.push(1);
        assert_eq!(read_blocks(&bytes), Err(ReadError::Compressed(1)));
    }

    #[test]
    fn truncated_block() {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&8u32.to_le_bytes());
        bytes.push(0);
        bytes.extend_from_slice(&[9, 0, 0, 0, 0xFF, 1, 2]);
        assert!(matches!(read_blocks(&bytes), Err(ReadError::Truncated(_))));
    }

    #[test]
    fn parses_record_with_names() {
        let data = [
            0x0F, 0x81, // handle 1 with names
            0x00, 0xC3, 0x9E, b'A', 0x00, // en
            0x03, 0xC3, 0x9E, b'B', 0x00, // fr
            0x00, // end names
            0x01, // one part
            0x02, 0x04, 0x01, // two entries, bit 4, width 1
            0x01, 0xC3, 0x9E, b'x', 0x00, // literal
            0x81, 0x00, // reference to handle 0
        ];
        let record = parse_town_names(&data, 0).unwrap();
        assert_eq!(record.handle, 1);
        assert_eq!(
            record.names,
            vec![
                (Language::ENGLISH, "A".to_string()),
                (Language::FRENCH, "B".to_string())
            ]
        );
        assert_eq!(record.parts[0].entropy_start, 4);
        assert_eq!(record.parts[0].total_weight(), 2);
        assert_eq!(record.parts[0].entries[1], Entry::Ref { weight: 1, handle: 0 });
    }

    #[test]
    fn trailing_bytes_rejected() {
        let data = [0x0F, 0x00, 0x00, 0xAA];
        assert!(matches!(
            parse_town_names(&data, 0),
            Err(ReadError::Malformed { .. })
        ));
    }
}
