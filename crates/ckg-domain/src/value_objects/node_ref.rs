//! Node references and deterministic node-id derivation.

use serde::{Deserialize, Serialize};

use crate::entities::NodeKind;

/// A reference to a graph node by kind and identifying attributes.
///
/// Used as the start of traversals, the target of dependency analysis, and
/// the seeds of context expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    /// Kind of the referenced node
    pub kind: NodeKind,
    /// Identifying name: repository name, file path, or entity name
    pub identifier: String,
    /// Owning repository, required for repository-scoped kinds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
}

impl NodeRef {
    /// Reference a repository node.
    #[must_use]
    pub fn repository(name: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Repository,
            identifier: name.into(),
            repository: None,
        }
    }

    /// Reference a file node.
    #[must_use]
    pub fn file(repository: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::File,
            identifier: path.into(),
            repository: Some(repository.into()),
        }
    }
}

/// Deterministic node-id derivation.
///
/// Equal identifying attributes always map to equal ids, which keeps MERGE
/// writes idempotent across re-ingestion.
pub mod node_id {
    /// Id of a Repository node.
    #[must_use]
    pub fn repository(name: &str) -> String {
        format!("Repository:{name}")
    }

    /// Id of a File node.
    #[must_use]
    pub fn file(repository: &str, path: &str) -> String {
        format!("File:{repository}:{path}")
    }

    /// Id of a Function node.
    #[must_use]
    pub fn function(repository: &str, file_path: &str, name: &str, line_start: u32) -> String {
        format!("Function:{repository}:{file_path}:{name}:{line_start}")
    }

    /// Id of a Class/Interface/TypeAlias/Enum node.
    #[must_use]
    pub fn typed_entity(label: &str, repository: &str, file_path: &str, name: &str) -> String {
        format!("{label}:{repository}:{file_path}:{name}")
    }

    /// Id of a Module node.
    #[must_use]
    pub fn module(name: &str) -> String {
        format!("Module:{name}")
    }

    /// Id of a Chunk node (mirror of a vector-store document).
    #[must_use]
    pub fn chunk(chroma_id: &str) -> String {
        format!("Chunk:{chroma_id}")
    }
}

#[cfg(test)]
mod tests {
    use super::node_id;

    #[test]
    fn ids_are_deterministic() {
        assert_eq!(node_id::repository("demo"), "Repository:demo");
        assert_eq!(node_id::file("demo", "src/a.ts"), "File:demo:src/a.ts");
        assert_eq!(
            node_id::function("demo", "src/a.ts", "f", 1),
            "Function:demo:src/a.ts:f:1"
        );
        assert_eq!(
            node_id::typed_entity("Class", "demo", "src/a.ts", "Widget"),
            "Class:demo:src/a.ts:Widget"
        );
        assert_eq!(node_id::module("react"), "Module:react");
    }
}
