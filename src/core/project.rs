/// RON project files: metadata, filter rules and the ordered node list.

use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::core::filter::{product, Orthography, PatternFilter, PatternRule};
use crate::core::fragment::{combine, Fragment, Gender, Number};
use crate::core::grammar::{Alternative, GrammarError, Node, Part};
use crate::schema::language::Language;
use crate::schema::metadata::GrfMetadata;

/// Everything needed to build one NewGRF.
#[derive(Debug, Clone)]
pub struct Project {
    pub metadata: GrfMetadata,
    /// Nodes in the order they were declared, clones and products expanded.
    pub nodes: Vec<Node>,
}

// The file format is friendlier than the model types, so it goes through
// intermediate structs.

#[derive(Debug, Deserialize)]
struct RonProject {
    metadata: GrfMetadata,
    #[serde(default)]
    filters: Vec<PatternRule>,
    nodes: Vec<RonNode>,
}

#[derive(Debug, Deserialize)]
struct RonNode {
    id: String,
    entropy_start: u8,
    #[serde(default)]
    names: BTreeMap<Language, String>,
    #[serde(default)]
    parts: Vec<RonPart>,
    #[serde(default)]
    clone_of: Option<String>,
}

#[derive(Debug, Deserialize)]
enum RonPart {
    /// Explicit alternatives.
    Choice(Vec<RonAlternative>),
    /// Every concatenation of one fragment per list, filtered.
    Product(Vec<Vec<String>>),
    /// Like `Product`, but fragments carry agreement tags and combinations
    /// that disagree are dropped.
    Agree(Vec<Vec<RonFragment>>),
}

#[derive(Debug, Deserialize)]
enum RonFragment {
    Text(String),
    Word {
        text: String,
        #[serde(default)]
        gender: Option<Gender>,
        #[serde(default)]
        number: Option<Number>,
        #[serde(default)]
        origin: Option<String>,
    },
    Forms {
        ms: String,
        mp: String,
        fs: String,
        fp: String,
        #[serde(default)]
        origin: Option<String>,
    },
}

impl From<RonFragment> for Fragment {
    fn from(fragment: RonFragment) -> Self {
        match fragment {
            RonFragment::Text(text) => Fragment::plain(text),
            RonFragment::Word {
                text,
                gender,
                number,
                origin,
            } => {
                let mut fragment = Fragment::plain(text);
                fragment.agreement.gender = gender;
                fragment.agreement.number = number;
                fragment.agreement.origin = origin;
                fragment
            }
            RonFragment::Forms {
                ms,
                mp,
                fs,
                fp,
                origin,
            } => {
                let mut fragment = Fragment::inflected(ms, mp, fs, fp);
                fragment.agreement.origin = origin;
                fragment
            }
        }
    }
}

#[derive(Debug, Deserialize)]
enum RonAlternative {
    Lit(String),
    LitW(String, u32),
    Ref(String),
    RefW(String, u32),
}

impl From<RonAlternative> for Alternative {
    fn from(alt: RonAlternative) -> Self {
        match alt {
            RonAlternative::Lit(text) => Alternative::literal(text),
            RonAlternative::LitW(text, weight) => Alternative::literal(text).with_weight(weight),
            RonAlternative::Ref(target) => Alternative::reference(target),
            RonAlternative::RefW(target, weight) => Alternative::reference(target).with_weight(weight),
        }
    }
}

impl Project {
    /// Load a project from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<Project, GrammarError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a project from a RON string.
    pub fn parse_ron(input: &str) -> Result<Project, GrammarError> {
        let raw: RonProject = ron::from_str(input)?;
        let filter = PatternFilter::from_rules(&raw.filters)?;

        let mut nodes: Vec<Node> = Vec::with_capacity(raw.nodes.len());
        let mut index: FxHashMap<String, usize> = FxHashMap::default();

        for ron_node in raw.nodes {
            let node = match ron_node.clone_of {
                Some(source_id) => {
                    if !ron_node.parts.is_empty() {
                        return Err(GrammarError::CloneWithParts(ron_node.id));
                    }
                    let source = index.get(&source_id).map(|&i| &nodes[i]).ok_or_else(|| {
                        GrammarError::UnknownCloneSource {
                            node: ron_node.id.clone(),
                            source_id: source_id.clone(),
                        }
                    })?;
                    let mut clone = source.clone_as(ron_node.id, ron_node.entropy_start);
                    clone.display_names = ron_node.names;
                    clone
                }
                None => {
                    let parts = ron_node
                        .parts
                        .into_iter()
                        .map(|part| build_part(part, &filter))
                        .collect();
                    let mut node = Node::new(ron_node.id, ron_node.entropy_start, parts);
                    node.display_names = ron_node.names;
                    node
                }
            };
            index.insert(node.id.clone(), nodes.len());
            nodes.push(node);
        }

        Ok(Project {
            metadata: raw.metadata,
            nodes,
        })
    }
}

fn build_part(part: RonPart, filter: &dyn Orthography) -> Part {
    match part {
        RonPart::Choice(alternatives) => {
            Part::new(alternatives.into_iter().map(Alternative::from).collect())
        }
        RonPart::Product(lists) => Part::literals(product(&lists, filter)),
        RonPart::Agree(lists) => {
            let lists: Vec<Vec<Fragment>> = lists
                .into_iter()
                .map(|list| list.into_iter().map(Fragment::from).collect())
                .collect();
            Part::literals(combine(&lists, filter))
        }
    }
}
