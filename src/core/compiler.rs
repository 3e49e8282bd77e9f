/// Grammar compiler: validation, ordering checks and part splitting.
///
/// The engine stores the alternative count of a part in one byte. Parts
/// larger than that are cut into blocks, each block moved into a
/// synthesized node, and the original part replaced by references to
/// those nodes.

use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::core::emit::{self, entry_count, split_weight, Payload};
use crate::core::grammar::{Alternative, Node, Part};

/// Most alternatives a single part can hold.
pub const MAX_ALTERNATIVES: usize = 255;
/// Width of the engine's random draw.
pub const ENTROPY_BITS: u8 = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("duplicate node id '{0}'")]
    DuplicateIdentifier(String),
    #[error("node '{node}' references '{target}', which is not defined before it")]
    UnresolvedReference { node: String, target: String },
    #[error("part {part} of node '{node}' has a total weight of zero")]
    DegenerateWeightSum { node: String, part: usize },
    #[error("part {part} of node '{node}' has {count} entries (limit is 255)")]
    CapacityViolation {
        node: String,
        part: usize,
        count: usize,
    },
    #[error("node '{node}' starts at entropy bit {start}, outside 0..=31")]
    EntropyOutOfRange { node: String, start: u32 },
    #[error("part {part} of node '{node}' needs {width} bits from bit {start}, past the 32-bit draw")]
    WindowOverflow {
        node: String,
        part: usize,
        start: u32,
        width: u8,
    },
    #[error("node '{node}' exceeds the limit of {limit} town-name records")]
    RegistryFull { node: String, limit: usize },
    #[error("alternative {index} in part {part} of node '{node}' has weight zero")]
    ZeroWeight {
        node: String,
        part: usize,
        index: usize,
    },
    #[error("string {0:?} contains a NUL byte")]
    EmbeddedNul(String),
    #[error("node '{node}' has {count} parts (limit is 255)")]
    TooManyParts { node: String, count: usize },
    #[error("splitting node '{node}' synthesizes id '{id}', which is already taken")]
    SynthesizedIdCollision { node: String, id: String },
}

/// A flat, capacity-respecting node sequence in emission order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledGrammar {
    nodes: Vec<Node>,
}

impl CompiledGrammar {
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Serialize every node as a framed town-name record.
    pub fn emit(&self) -> Result<Payload, CompileError> {
        emit::emit_nodes(&self.nodes)
    }
}

/// Compile a caller-ordered node sequence.
///
/// `nodes` must be topologically sorted: every reference names a node that
/// appears earlier. The input is never modified.
pub fn compile(nodes: &[Node]) -> Result<CompiledGrammar, CompileError> {
    verify_order(nodes)?;

    let mut taken: FxHashSet<String> = nodes.iter().map(|n| n.id.clone()).collect();
    let mut compiled = Vec::with_capacity(nodes.len());
    for node in nodes {
        validate_node(node)?;
        let mut split = split_node(node)?;
        // the last node is the caller's own
        let parent = split.pop();
        for helper in &split {
            if !taken.insert(helper.id.clone()) {
                return Err(CompileError::SynthesizedIdCollision {
                    node: node.id.clone(),
                    id: helper.id.clone(),
                });
            }
        }
        compiled.extend(split);
        compiled.extend(parent);
    }

    for node in &compiled {
        check_parts(node)?;
    }

    log::debug!(
        "compiled {} nodes into {} records",
        nodes.len(),
        compiled.len()
    );
    Ok(CompiledGrammar { nodes: compiled })
}

/// Single forward pass: ids are unique and every reference points back.
pub fn verify_order(nodes: &[Node]) -> Result<(), CompileError> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for node in nodes {
        for target in node.references() {
            if !seen.contains(target) {
                return Err(CompileError::UnresolvedReference {
                    node: node.id.clone(),
                    target: target.to_string(),
                });
            }
        }
        if !seen.insert(node.id.as_str()) {
            return Err(CompileError::DuplicateIdentifier(node.id.clone()));
        }
    }
    Ok(())
}

/// Rewrite every over-capacity part of `node`.
///
/// Capacity is counted in emitted entries, so a part of few but heavy
/// alternatives is split too. Heavy alternatives are first spread into
/// copies of at most 127, then cut into blocks of 255. When the references
/// to those blocks need more than 255 entries themselves, they are cut
/// again one level up.
///
/// Returns the synthesized helper nodes followed by the rewritten node, so
/// helpers always precede their only consumer.
pub fn split_node(node: &Node) -> Result<Vec<Node>, CompileError> {
    let mut out = Vec::new();
    let mut parts = Vec::with_capacity(node.parts.len());

    for (index, part) in node.parts.iter().enumerate() {
        let mut current = part.clone();
        let mut level = 0;
        while entry_count(&current) > MAX_ALTERNATIVES {
            let spread = spread_alternatives(&current);

            // The parent picks a block with the high bits of the window
            // that would index the whole part; each block reuses the low
            // 8 bits.
            let start =
                u32::from(node.entropy_start) + u32::from(index_bits(spread.len())) - 8;
            let start = entropy_start(&node.id, start)?;

            let mut references = Vec::new();
            for (block, chunk) in spread.chunks(MAX_ALTERNATIVES).enumerate() {
                let offset = block * MAX_ALTERNATIVES;
                let id = if level == 0 {
                    format!("{}__{}_{}", node.id, index, offset)
                } else {
                    format!("{}__{}_{}_{}", node.id, index, level, offset)
                };
                out.push(Node::new(id.clone(), start, vec![Part::new(chunk.to_vec())]));
                references.push(Alternative::reference(id).with_weight(chunk.len() as u32));
            }

            log::debug!(
                "split part {} of '{}' ({} entries) into {} blocks at bit {}",
                index,
                node.id,
                spread.len(),
                references.len(),
                start
            );
            current = Part::new(references);
            level += 1;
        }
        parts.push(current);
    }

    out.push(Node {
        id: node.id.clone(),
        entropy_start: node.entropy_start,
        display_names: node.display_names.clone(),
        parts,
    });
    Ok(out)
}

/// One alternative per emitted entry: weights above 127 become runs of
/// copies, as they would on emission.
fn spread_alternatives(part: &Part) -> Vec<Alternative> {
    part.alternatives
        .iter()
        .flat_map(|alt| {
            split_weight(alt.weight()).map(move |w| alt.clone().with_weight(u32::from(w)))
        })
        .collect()
}

/// Bits needed to pick among `total` equally likely outcomes:
/// `ceil(log2(total))`, and 0 for a single outcome.
pub fn weight_width(total: u64) -> u8 {
    if total <= 1 {
        0
    } else {
        (64 - (total - 1).leading_zeros()) as u8
    }
}

fn index_bits(len: usize) -> u8 {
    weight_width(len as u64)
}

fn entropy_start(node: &str, start: u32) -> Result<u8, CompileError> {
    if start >= u32::from(ENTROPY_BITS) {
        return Err(CompileError::EntropyOutOfRange {
            node: node.to_string(),
            start,
        });
    }
    Ok(start as u8)
}

fn validate_node(node: &Node) -> Result<(), CompileError> {
    entropy_start(&node.id, u32::from(node.entropy_start))?;
    for (part_index, part) in node.parts.iter().enumerate() {
        for (index, alt) in part.alternatives.iter().enumerate() {
            if alt.weight() == 0 {
                return Err(CompileError::ZeroWeight {
                    node: node.id.clone(),
                    part: part_index,
                    index,
                });
            }
            if let Alternative::Literal { text, .. } = alt {
                if text.contains('\0') {
                    return Err(CompileError::EmbeddedNul(text.clone()));
                }
            }
        }
    }
    Ok(())
}

fn check_parts(node: &Node) -> Result<(), CompileError> {
    if node.parts.len() > MAX_ALTERNATIVES {
        return Err(CompileError::TooManyParts {
            node: node.id.clone(),
            count: node.parts.len(),
        });
    }
    for (index, part) in node.parts.iter().enumerate() {
        let count = entry_count(part);
        if count > MAX_ALTERNATIVES {
            return Err(CompileError::CapacityViolation {
                node: node.id.clone(),
                part: index,
                count,
            });
        }
        let total = part.total_weight();
        if total == 0 {
            return Err(CompileError::DegenerateWeightSum {
                node: node.id.clone(),
                part: index,
            });
        }
        let width = weight_width(total);
        let start = u32::from(node.entropy_start);
        if start + u32::from(width) > u32::from(ENTROPY_BITS) {
            return Err(CompileError::WindowOverflow {
                node: node.id.clone(),
                part: index,
                start,
                width,
            });
        }
    }
    Ok(())
}
