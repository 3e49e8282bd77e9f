/// Binary emission: integers, strings, weighted entries and town-name
/// records in the NewGRF encoding.

use crate::core::compiler::{weight_width, CompileError};
use crate::core::grammar::{Alternative, Node, Part};
use crate::core::registry::Registry;
use crate::schema::language::Language;

/// UTF-8 for "Þ". Tells the engine the string that follows is UTF-8.
pub const STRING_MARKER: [u8; 2] = [0xC3, 0x9E];
/// Type byte of a pseudo-sprite, the framing used for every block.
pub const PSEUDO_SPRITE: u8 = 0xFF;
pub const ACTION_TOWN_NAMES: u8 = 0x0F;
/// Set on a weight byte for references; set on a record id byte when a
/// display-name table follows.
pub const HIGH_BIT: u8 = 0x80;
/// Largest weight a single entry can carry.
pub const MAX_ENTRY_WEIGHT: u32 = 0x7F;

/// Serialized town-name records plus the registry that numbered them.
#[derive(Debug)]
pub struct Payload {
    pub bytes: Vec<u8>,
    pub records: usize,
    pub registry: Registry,
}

pub fn write_u8(out: &mut Vec<u8>, value: u8) {
    out.push(value);
}

pub fn write_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

pub fn write_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

/// Marker, UTF-8 bytes, terminating zero.
pub fn write_string(out: &mut Vec<u8>, text: &str) -> Result<(), CompileError> {
    check_nul(text)?;
    out.extend_from_slice(&STRING_MARKER);
    out.extend_from_slice(text.as_bytes());
    out.push(0);
    Ok(())
}

/// UTF-8 bytes and a terminating zero, without the marker.
pub fn write_raw_string(out: &mut Vec<u8>, text: &str) -> Result<(), CompileError> {
    check_nul(text)?;
    out.extend_from_slice(text.as_bytes());
    out.push(0);
    Ok(())
}

fn check_nul(text: &str) -> Result<(), CompileError> {
    if text.contains('\0') {
        return Err(CompileError::EmbeddedNul(text.to_string()));
    }
    Ok(())
}

pub fn write_lang_string(out: &mut Vec<u8>, lang: Language, text: &str) -> Result<(), CompileError> {
    write_u8(out, lang.code());
    write_string(out, text)
}

/// Inverse of [`write_string`]: decodes a zero-terminated string at the
/// start of `bytes`, dropping one leading marker. Returns the text and the
/// number of bytes consumed, terminator included.
pub fn decode_string(bytes: &[u8]) -> Option<(String, usize)> {
    let end = bytes.iter().position(|&b| b == 0)?;
    let raw = &bytes[..end];
    let body = raw.strip_prefix(&STRING_MARKER[..]).unwrap_or(raw);
    let text = String::from_utf8(body.to_vec()).ok()?;
    Some((text, end + 1))
}

/// Frame `content` as a pseudo-sprite: length, type byte, content.
pub fn write_block(out: &mut Vec<u8>, content: &[u8]) {
    write_u32(out, content.len() as u32);
    write_u8(out, PSEUDO_SPRITE);
    out.extend_from_slice(content);
}

/// Weights above the 7-bit field are written as consecutive copies of the
/// same entry. The engine subtracts weights one entry at a time, so a run
/// of copies is selected exactly as often as one heavy entry would be.
pub fn split_weight(weight: u32) -> impl Iterator<Item = u8> {
    let full = weight / MAX_ENTRY_WEIGHT;
    let rest = weight % MAX_ENTRY_WEIGHT;
    std::iter::repeat(MAX_ENTRY_WEIGHT as u8)
        .take(full as usize)
        .chain((rest > 0).then_some(rest as u8))
}

/// Number of entries `part` occupies once heavy weights are spread.
pub fn entry_count(part: &Part) -> usize {
    part.alternatives
        .iter()
        .map(|alt| alt.weight().div_ceil(MAX_ENTRY_WEIGHT) as usize)
        .sum()
}

/// Write one alternative, resolving references against `registry`.
pub fn write_alternative(
    out: &mut Vec<u8>,
    alt: &Alternative,
    registry: &Registry,
    node: &str,
) -> Result<(), CompileError> {
    match alt {
        Alternative::Literal { text, weight } => {
            for w in split_weight(*weight) {
                write_u8(out, w);
                write_string(out, text)?;
            }
        }
        Alternative::Reference { target, weight } => {
            let handle = registry.resolve(target, node)?;
            for w in split_weight(*weight) {
                write_u8(out, HIGH_BIT | w);
                write_u8(out, handle);
            }
        }
    }
    Ok(())
}

/// Build the Action F record body for `node` under `handle`.
pub fn node_record(node: &Node, handle: u8, registry: &Registry) -> Result<Vec<u8>, CompileError> {
    let mut out = Vec::new();
    write_u8(&mut out, ACTION_TOWN_NAMES);

    if node.has_display_names() {
        write_u8(&mut out, handle | HIGH_BIT);
        for (lang, name) in &node.display_names {
            write_lang_string(&mut out, *lang, name)?;
        }
        write_u8(&mut out, 0);
    } else {
        write_u8(&mut out, handle);
    }

    let part_count = u8::try_from(node.parts.len()).map_err(|_| CompileError::TooManyParts {
        node: node.id.clone(),
        count: node.parts.len(),
    })?;
    write_u8(&mut out, part_count);
    for (index, part) in node.parts.iter().enumerate() {
        let total = part.total_weight();
        if total == 0 {
            return Err(CompileError::DegenerateWeightSum {
                node: node.id.clone(),
                part: index,
            });
        }
        let count = entry_count(part);
        let entries = u8::try_from(count).map_err(|_| CompileError::CapacityViolation {
            node: node.id.clone(),
            part: index,
            count,
        })?;

        write_u8(&mut out, entries);
        write_u8(&mut out, node.entropy_start);
        write_u8(&mut out, weight_width(total));
        for alt in &part.alternatives {
            write_alternative(&mut out, alt, registry, &node.id)?;
        }
    }
    Ok(out)
}

/// Number `nodes` in order and emit each as a framed record.
///
/// References resolve against the registry as it stands when their node is
/// reached, so a node can only refer to nodes emitted before it.
pub fn emit_nodes(nodes: &[Node]) -> Result<Payload, CompileError> {
    let mut registry = Registry::new();
    let mut bytes = Vec::new();

    for node in nodes {
        for target in node.references() {
            registry.resolve(target, &node.id)?;
        }
        let handle = registry.register(&node.id)?;
        let record = node_record(node, handle, &registry)?;
        write_block(&mut bytes, &record);
    }

    Ok(Payload {
        bytes,
        records: nodes.len(),
        registry,
    })
}
