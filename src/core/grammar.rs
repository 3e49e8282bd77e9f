/// Town-name grammar model: alternatives, parts and nodes.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::schema::language::Language;

#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid filter pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("node '{node}' clones unknown node '{source_id}'")]
    UnknownCloneSource { node: String, source_id: String },
    #[error("node '{0}' is a clone and cannot declare its own parts")]
    CloneWithParts(String),
}

/// One option within a part: either literal text or a reference to an
/// earlier node, with a selection weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alternative {
    Literal { text: String, weight: u32 },
    Reference { target: String, weight: u32 },
}

impl Alternative {
    pub fn literal(text: impl Into<String>) -> Self {
        Self::Literal {
            text: text.into(),
            weight: 1,
        }
    }

    pub fn reference(target: impl Into<String>) -> Self {
        Self::Reference {
            target: target.into(),
            weight: 1,
        }
    }

    pub fn with_weight(mut self, new_weight: u32) -> Self {
        match &mut self {
            Self::Literal { weight, .. } | Self::Reference { weight, .. } => *weight = new_weight,
        }
        self
    }

    pub fn weight(&self) -> u32 {
        match self {
            Self::Literal { weight, .. } | Self::Reference { weight, .. } => *weight,
        }
    }

    /// The referenced node id, if this is a reference.
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::Reference { target, .. } => Some(target),
            Self::Literal { .. } => None,
        }
    }
}

/// One weighted draw. The engine picks exactly one alternative per part.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Part {
    pub alternatives: Vec<Alternative>,
}

impl Part {
    pub fn new(alternatives: Vec<Alternative>) -> Self {
        Self { alternatives }
    }

    /// A part of unit-weight literals.
    pub fn literals<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(Alternative::literal).collect())
    }

    pub fn len(&self) -> usize {
        self.alternatives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    pub fn total_weight(&self) -> u64 {
        self.alternatives.iter().map(|a| u64::from(a.weight())).sum()
    }

    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.alternatives.iter().filter_map(Alternative::target)
    }
}

/// A named grammar unit. Its parts are concatenated in order to build one
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    /// First bit of the 32-bit draw used by every part of this node.
    pub entropy_start: u8,
    /// Names shown in the game's town-name menu. Non-empty only for
    /// top-level styles.
    #[serde(default)]
    pub display_names: BTreeMap<Language, String>,
    pub parts: Vec<Part>,
}

impl Node {
    pub fn new(id: impl Into<String>, entropy_start: u8, parts: Vec<Part>) -> Self {
        Self {
            id: id.into(),
            entropy_start,
            display_names: BTreeMap::new(),
            parts,
        }
    }

    pub fn with_display_name(mut self, lang: Language, name: impl Into<String>) -> Self {
        self.display_names.insert(lang, name.into());
        self
    }

    /// Deep copy under another id and entropy offset, so the same
    /// sub-grammar can be drawn from a different bit range. Display names
    /// stay with the original.
    pub fn clone_as(&self, id: impl Into<String>, entropy_start: u8) -> Node {
        Node {
            id: id.into(),
            entropy_start,
            display_names: BTreeMap::new(),
            parts: self.parts.clone(),
        }
    }

    pub fn references(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().flat_map(Part::references)
    }

    pub fn has_display_names(&self) -> bool {
        !self.display_names.is_empty()
    }
}
