/// The build pipeline: project → compiled grammar → NewGRF bytes → file.
///
/// Wires together project loading, splitting, emission and the container
/// writer.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::compiler::{self, CompileError, CompiledGrammar};
use crate::core::container;
use crate::core::grammar::{GrammarError, Node};
use crate::core::project::Project;
use crate::schema::metadata::GrfMetadata;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("grammar error: {0}")]
    Grammar(#[from] GrammarError),
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no metadata: provide a project file or metadata")]
    MissingMetadata,
}

/// A compiled town-name NewGRF, ready to be written. Built via
/// `TownNameGrf::builder()`.
#[derive(Debug)]
pub struct TownNameGrf {
    metadata: GrfMetadata,
    compiled: CompiledGrammar,
    bytes: Vec<u8>,
}

/// Builder for constructing a `TownNameGrf`.
#[derive(Debug, Default)]
pub struct TownNameGrfBuilder {
    project_path: Option<PathBuf>,
    /// Directly provided metadata (overrides the project's).
    metadata: Option<GrfMetadata>,
    /// Directly provided nodes (appended after the project's).
    nodes: Vec<Node>,
}

impl TownNameGrf {
    pub fn builder() -> TownNameGrfBuilder {
        TownNameGrfBuilder::default()
    }

    pub fn metadata(&self) -> &GrfMetadata {
        &self.metadata
    }

    pub fn compiled(&self) -> &CompiledGrammar {
        &self.compiled
    }

    /// The complete file contents.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Write the file atomically; an existing file is replaced only once
    /// the new one is complete.
    pub fn write_to(&self, path: &Path) -> Result<(), PipelineError> {
        container::write_file(path, &self.bytes)?;
        Ok(())
    }
}

impl TownNameGrfBuilder {
    pub fn project(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_path = Some(path.into());
        self
    }

    /// Provide metadata directly (for building without files).
    pub fn with_metadata(mut self, metadata: GrfMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Provide nodes directly (for building without files).
    pub fn with_nodes(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.nodes.extend(nodes);
        self
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Compile everything into file bytes. Nothing is written.
    pub fn build(self) -> Result<TownNameGrf, PipelineError> {
        let mut nodes = Vec::new();
        let mut metadata = None;

        if let Some(path) = &self.project_path {
            log::debug!("loading project {}", path.display());
            let project = Project::load_from_ron(path)?;
            metadata = Some(project.metadata);
            nodes = project.nodes;
        }
        if let Some(direct) = self.metadata {
            metadata = Some(direct);
        }
        nodes.extend(self.nodes);
        let metadata = metadata.ok_or(PipelineError::MissingMetadata)?;

        let compiled = compiler::compile(&nodes)?;
        let payload = compiled.emit()?;
        let bytes = container::write_container(&metadata, &payload)?;

        log::info!(
            "compiled '{}': {} nodes, {} records, {} bytes",
            metadata.default_name(),
            nodes.len(),
            payload.records,
            bytes.len()
        );

        Ok(TownNameGrf {
            metadata,
            compiled,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grammar::Part;

    fn meta() -> GrfMetadata {
        GrfMetadata::new(*b"Tst\x01", "Test", "Test names")
    }

    #[test]
    fn missing_metadata() {
        let err = TownNameGrf::builder()
            .with_node(Node::new("a", 0, vec![Part::literals(["x"])]))
            .build()
            .unwrap_err();
        assert!(matches!(err, PipelineError::MissingMetadata));
    }

    #[test]
    fn compile_errors_surface() {
        let err = TownNameGrf::builder()
            .with_metadata(meta())
            .with_node(Node::new("a", 40, vec![Part::literals(["x"])]))
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Compile(CompileError::EntropyOutOfRange { .. })
        ));
    }

    #[test]
    fn missing_project_file_is_io_error() {
        let err = TownNameGrf::builder()
            .project("does/not/exist.ron")
            .build()
            .unwrap_err();
        assert!(matches!(err, PipelineError::Grammar(GrammarError::Io(_))));
    }

    #[test]
    fn build_then_write() {
        let grf = TownNameGrf::builder()
            .with_metadata(meta())
            .with_node(Node::new("a", 0, vec![Part::literals(["x", "y"])]))
            .build()
            .unwrap();
        assert_eq!(grf.compiled().len(), 1);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.grf");
        grf.write_to(&path).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), grf.bytes());
    }
}
