/// Sampler: replays the engine's town-name selection over decoded records.

use rand::rngs::StdRng;
use rand::Rng;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::core::reader::{Entry, PartRecord, TownNameRecord};

/// Reference chains deeper than this are treated as cycles.
pub const MAX_DEPTH: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SampleError {
    #[error("no town-name record with handle {0}")]
    UnknownHandle(u8),
    #[error("references nest deeper than {0} levels")]
    TooDeep(usize),
    #[error("part {part} of record {handle} has no entries")]
    EmptyPart { handle: u8, part: usize },
}

/// Generates names from a set of decoded records, exactly as the engine
/// would for a given 32-bit seed.
pub struct Sampler<'a> {
    records: FxHashMap<u8, &'a TownNameRecord>,
}

impl<'a> Sampler<'a> {
    pub fn new(records: &'a [TownNameRecord]) -> Self {
        Self {
            records: records.iter().map(|r| (r.handle, r)).collect(),
        }
    }

    /// Records offered as styles in the game's menu, by handle.
    pub fn styles(&self) -> Vec<&'a TownNameRecord> {
        let mut styles: Vec<_> = self.records.values().copied().filter(|r| r.is_style()).collect();
        styles.sort_by_key(|r| r.handle);
        styles
    }

    /// The name the engine builds from `handle` for `seed`.
    pub fn generate(&self, handle: u8, seed: u32) -> Result<String, SampleError> {
        let mut out = String::new();
        self.expand(handle, seed, 0, &mut out)?;
        Ok(out)
    }

    /// Draw a seed from `rng` and generate.
    pub fn sample(&self, handle: u8, rng: &mut StdRng) -> Result<String, SampleError> {
        self.generate(handle, rng.gen())
    }

    fn expand(&self, handle: u8, seed: u32, depth: usize, out: &mut String) -> Result<(), SampleError> {
        if depth >= MAX_DEPTH {
            return Err(SampleError::TooDeep(MAX_DEPTH));
        }
        let record = self
            .records
            .get(&handle)
            .ok_or(SampleError::UnknownHandle(handle))?;

        for (index, part) in record.parts.iter().enumerate() {
            match select(part, seed) {
                Some(Entry::Text { text, .. }) => out.push_str(text),
                Some(Entry::Ref { handle: target, .. }) => {
                    self.expand(*target, seed, depth + 1, out)?
                }
                None => return Err(SampleError::EmptyPart { handle, part: index }),
            }
        }
        Ok(())
    }
}

/// Bits `start..start + count` of `seed`.
pub fn window(seed: u32, start: u8, count: u8) -> u64 {
    if start >= 32 {
        return 0;
    }
    let mask = if count >= 64 { u64::MAX } else { (1u64 << count) - 1 };
    (u64::from(seed) >> start) & mask
}

/// Pick an entry the way the engine does: scale the window by the total
/// weight, then walk the entries subtracting weights until the remainder
/// no longer exceeds the scaled value.
pub fn select(part: &PartRecord, seed: u32) -> Option<&Entry> {
    let mut remaining = part.total_weight();
    let bits = window(seed, part.entropy_start, part.width);
    let r = (bits * u64::from(remaining))
        .checked_shr(u32::from(part.width))
        .unwrap_or(0);

    for entry in &part.entries {
        remaining -= u32::from(entry.weight());
        if u64::from(remaining) > r {
            continue;
        }
        return Some(entry);
    }
    None
}
