/// Identifier registry: sequential handles for town-name records.

use rustc_hash::FxHashMap;

use crate::core::compiler::CompileError;

/// Bit 7 of a record's id byte flags a display-name table, so handles only
/// have seven bits.
pub const MAX_HANDLES: usize = 0x80;

/// Maps node ids to the handles the engine uses for references.
///
/// Handles are assigned in emission order starting at 0. A registry lives
/// for exactly one compilation.
#[derive(Debug, Default)]
pub struct Registry {
    handles: FxHashMap<String, u8>,
    order: Vec<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the next handle to `id`.
    pub fn register(&mut self, id: &str) -> Result<u8, CompileError> {
        if self.handles.contains_key(id) {
            return Err(CompileError::DuplicateIdentifier(id.to_string()));
        }
        if self.order.len() >= MAX_HANDLES {
            return Err(CompileError::RegistryFull {
                node: id.to_string(),
                limit: MAX_HANDLES,
            });
        }
        let handle = self.order.len() as u8;
        self.handles.insert(id.to_string(), handle);
        self.order.push(id.to_string());
        log::trace!("registered '{}' as handle {}", id, handle);
        Ok(handle)
    }

    /// Look up `target` as the registry stands now, on behalf of `node`.
    pub fn resolve(&self, target: &str, node: &str) -> Result<u8, CompileError> {
        self.handles
            .get(target)
            .copied()
            .ok_or_else(|| CompileError::UnresolvedReference {
                node: node.to_string(),
                target: target.to_string(),
            })
    }

    pub fn get(&self, id: &str) -> Option<u8> {
        self.handles.get(id).copied()
    }

    /// The id registered under `handle`.
    pub fn id_of(&self, handle: u8) -> Option<&str> {
        self.order.get(usize::from(handle)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
