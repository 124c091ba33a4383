//! In-memory graph store used by tests and local development.
//!
//! Mirrors the bolt client's clamping, deduplication, and matching
//! semantics over plain hash maps.

use std::collections::{HashMap, HashSet, VecDeque};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use ckg_domain::constants::DOCUMENTATION_EXTENSIONS;
use ckg_domain::entities::{GraphNode, GraphRelationship, NodeKind, Subgraph};
use ckg_domain::error::{Error, Result};
use ckg_domain::ports::{
    ContextItem, ContextKind, ContextRequest, DependencyDirection, DependencyEntry,
    DependencyReport, DependencyRequest, FileSubgraph, GraphStoreProvider, TraversalRequest,
    CONTEXT_RELEVANCE,
};
use ckg_domain::value_objects::{node_id, validate_label, validate_relationship_type, NodeRef};

use super::{clamp_context_limit, clamp_dependency_depth, clamp_traversal, validate_node_ref};

const DEPENDENCY_TYPES: &[&str] = &["IMPORTS", "CALLS", "REFERENCES"];

#[derive(Debug, Default)]
struct GraphData {
    nodes: HashMap<String, GraphNode>,
    relationships: Vec<GraphRelationship>,
}

impl GraphData {
    fn upsert_node(&mut self, node: GraphNode) {
        match self.nodes.get_mut(&node.id) {
            Some(existing) => existing.properties.extend(node.properties),
            None => {
                self.nodes.insert(node.id.clone(), node);
            }
        }
    }

    fn upsert_relationship(&mut self, rel: GraphRelationship) {
        let existing = self.relationships.iter_mut().find(|r| {
            r.from_id == rel.from_id && r.to_id == rel.to_id && r.rel_type == rel.rel_type
        });
        match existing {
            Some(found) => found.properties.extend(rel.properties),
            None => self.relationships.push(rel),
        }
    }

    fn remove_nodes(&mut self, ids: &HashSet<String>) {
        self.nodes.retain(|id, _| !ids.contains(id));
        self.relationships
            .retain(|r| !ids.contains(&r.from_id) && !ids.contains(&r.to_id));
    }

    /// Resolve a node reference the same way the bolt client's match
    /// clauses do.
    fn resolve_ref(&self, node_ref: &NodeRef) -> Option<&GraphNode> {
        match node_ref.kind {
            NodeKind::Repository => self.nodes.get(&node_id::repository(&node_ref.identifier)),
            NodeKind::File => self.nodes.get(&node_id::file(
                node_ref.repository.as_deref().unwrap_or_default(),
                &node_ref.identifier,
            )),
            NodeKind::Module => self.nodes.get(&node_id::module(&node_ref.identifier)),
            _ => self.nodes.values().find(|n| {
                n.label == node_ref.kind.label()
                    && n.properties.get("name").and_then(Value::as_str)
                        == Some(node_ref.identifier.as_str())
                    && node_ref.repository.as_deref().is_none_or(|repo| {
                        n.properties.get("repository").and_then(Value::as_str) == Some(repo)
                    })
            }),
        }
    }

    /// All seeds resolved to concrete node ids, skipping unresolved refs.
    fn resolve_seeds(&self, seeds: &[NodeRef]) -> Vec<String> {
        seeds
            .iter()
            .filter_map(|seed| self.resolve_ref(seed).map(|n| n.id.clone()))
            .collect()
    }

    fn display_name(node: &GraphNode) -> String {
        node.properties
            .get("name")
            .or_else(|| node.properties.get("path"))
            .and_then(Value::as_str)
            .map_or_else(|| node.id.clone(), ToOwned::to_owned)
    }
}

/// In-memory graph store provider.
#[derive(Debug, Default)]
pub struct InMemoryGraphStore {
    data: RwLock<GraphData>,
}

impl InMemoryGraphStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all node ids (test helper).
    pub async fn node_ids(&self) -> Vec<String> {
        let data = self.data.read().await;
        let mut ids: Vec<String> = data.nodes.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Snapshot of all relationships as `(from, to, type)` (test helper).
    pub async fn relationship_tuples(&self) -> Vec<(String, String, String)> {
        let data = self.data.read().await;
        let mut tuples: Vec<(String, String, String)> = data
            .relationships
            .iter()
            .map(|r| (r.from_id.clone(), r.to_id.clone(), r.rel_type.clone()))
            .collect();
        tuples.sort();
        tuples
    }

    fn dependency_neighbors(
        data: &GraphData,
        of: &str,
        reversed: bool,
    ) -> Vec<(String, String)> {
        data.relationships
            .iter()
            .filter(|r| DEPENDENCY_TYPES.contains(&r.rel_type.as_str()))
            .filter_map(|r| {
                if reversed {
                    (r.to_id == of).then(|| (r.from_id.clone(), r.rel_type.clone()))
                } else {
                    (r.from_id == of).then(|| (r.to_id.clone(), r.rel_type.clone()))
                }
            })
            .collect()
    }

    fn entry_for(data: &GraphData, id: &str, relationship: String) -> Option<DependencyEntry> {
        let node = data.nodes.get(id)?;
        Some(DependencyEntry {
            id: node.id.clone(),
            label: node.label.clone(),
            name: GraphData::display_name(node),
            relationship,
        })
    }

    fn direct_dependencies(
        data: &GraphData,
        target_id: &str,
        direction: DependencyDirection,
    ) -> Vec<DependencyEntry> {
        let mut entries: Vec<DependencyEntry> = Vec::new();
        let orientations: &[bool] = match direction {
            DependencyDirection::DependsOn => &[false],
            DependencyDirection::DependedOnBy => &[true],
            DependencyDirection::Both => &[false, true],
        };
        for reversed in orientations {
            for (id, rel_type) in Self::dependency_neighbors(data, target_id, *reversed) {
                if entries.iter().any(|e| e.id == id) {
                    continue;
                }
                if let Some(entry) = Self::entry_for(data, &id, rel_type) {
                    entries.push(entry);
                }
            }
        }
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }

    fn transitive_dependencies(
        data: &GraphData,
        target_id: &str,
        direction: DependencyDirection,
        max_depth: u32,
        direct: &[DependencyEntry],
    ) -> Vec<DependencyEntry> {
        let orientations: &[bool] = match direction {
            DependencyDirection::DependsOn => &[false],
            DependencyDirection::DependedOnBy => &[true],
            DependencyDirection::Both => &[false, true],
        };
        let mut reached: Vec<DependencyEntry> = Vec::new();
        for reversed in orientations {
            let mut visited: HashSet<String> = HashSet::from([target_id.to_owned()]);
            let mut frontier: VecDeque<(String, u32)> = VecDeque::new();
            frontier.push_back((target_id.to_owned(), 0));
            while let Some((current, depth)) = frontier.pop_front() {
                if depth >= max_depth {
                    continue;
                }
                for (next, _) in Self::dependency_neighbors(data, &current, *reversed) {
                    if !visited.insert(next.clone()) {
                        continue;
                    }
                    frontier.push_back((next.clone(), depth + 1));
                    if depth + 1 >= 2
                        && next != target_id
                        && !direct.iter().any(|e| e.id == next)
                        && !reached.iter().any(|e| e.id == next)
                        && let Some(entry) =
                            Self::entry_for(data, &next, "REFERENCES".to_owned())
                    {
                        reached.push(entry);
                    }
                }
            }
        }
        reached.sort_by(|a, b| a.id.cmp(&b.id));
        reached
    }

    fn context_items_for_kind(
        data: &GraphData,
        kind: ContextKind,
        seed_ids: &[String],
    ) -> Vec<ContextItem> {
        let mut ids: Vec<String> = Vec::new();
        match kind {
            ContextKind::Imports => {
                for rel in &data.relationships {
                    if rel.rel_type == "IMPORTS" && seed_ids.contains(&rel.from_id) {
                        ids.push(rel.to_id.clone());
                    }
                }
            }
            ContextKind::Callers => {
                for rel in &data.relationships {
                    if rel.rel_type == "CALLS" && seed_ids.contains(&rel.to_id) {
                        ids.push(rel.from_id.clone());
                    }
                }
            }
            ContextKind::Callees => {
                for rel in &data.relationships {
                    if rel.rel_type == "CALLS" && seed_ids.contains(&rel.from_id) {
                        ids.push(rel.to_id.clone());
                    }
                }
            }
            ContextKind::Siblings => {
                for rel in &data.relationships {
                    if (rel.rel_type == "CONTAINS" || rel.rel_type == "DEFINES")
                        && seed_ids.contains(&rel.to_id)
                    {
                        for sibling in &data.relationships {
                            if sibling.from_id == rel.from_id
                                && (sibling.rel_type == "CONTAINS"
                                    || sibling.rel_type == "DEFINES")
                                && !seed_ids.contains(&sibling.to_id)
                            {
                                ids.push(sibling.to_id.clone());
                            }
                        }
                    }
                }
            }
            ContextKind::Documentation => {
                for rel in &data.relationships {
                    if rel.rel_type == "REFERENCES" && seed_ids.contains(&rel.from_id) {
                        let is_doc = data.nodes.get(&rel.to_id).is_some_and(|n| {
                            n.label == "File"
                                && n.properties
                                    .get("extension")
                                    .and_then(Value::as_str)
                                    .is_some_and(|ext| DOCUMENTATION_EXTENSIONS.contains(&ext))
                        });
                        if is_doc {
                            ids.push(rel.to_id.clone());
                        }
                    }
                }
            }
        }
        let mut items = Vec::new();
        for id in ids {
            if items.iter().any(|item: &ContextItem| item.id == id) {
                continue;
            }
            if let Some(node) = data.nodes.get(&id) {
                items.push(ContextItem {
                    id: node.id.clone(),
                    label: node.label.clone(),
                    name: GraphData::display_name(node),
                    kind,
                    relevance: CONTEXT_RELEVANCE,
                    reason: kind.reason().to_owned(),
                });
            }
        }
        items
    }
}

#[async_trait]
impl GraphStoreProvider for InMemoryGraphStore {
    async fn connect(&self) -> Result<()> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }

    async fn run_query(
        &self,
        _query: &str,
        _params: HashMap<String, Value>,
        _columns: &[&str],
    ) -> Result<Vec<HashMap<String, Value>>> {
        Err(Error::graph(
            "raw queries are not supported by the in-memory graph store",
        ))
    }

    async fn upsert_node(&self, node: &GraphNode) -> Result<()> {
        validate_label(&node.label)?;
        self.data.write().await.upsert_node(node.clone());
        Ok(())
    }

    async fn delete_node(&self, id: &str, label: &str) -> Result<()> {
        validate_label(label)?;
        let mut data = self.data.write().await;
        data.remove_nodes(&HashSet::from([id.to_owned()]));
        Ok(())
    }

    async fn create_relationship(&self, rel: &GraphRelationship) -> Result<()> {
        validate_relationship_type(&rel.rel_type)?;
        self.data.write().await.upsert_relationship(rel.clone());
        Ok(())
    }

    async fn delete_relationship(&self, from_id: &str, to_id: &str, rel_type: &str) -> Result<()> {
        validate_relationship_type(rel_type)?;
        let mut data = self.data.write().await;
        data.relationships
            .retain(|r| !(r.from_id == from_id && r.to_id == to_id && r.rel_type == rel_type));
        Ok(())
    }

    async fn upsert_nodes(&self, label: &str, nodes: &[GraphNode]) -> Result<()> {
        validate_label(label)?;
        let mut data = self.data.write().await;
        for node in nodes {
            validate_label(&node.label)?;
            data.upsert_node(node.clone());
        }
        Ok(())
    }

    async fn create_relationships(&self, rel_type: &str, rels: &[GraphRelationship]) -> Result<()> {
        validate_relationship_type(rel_type)?;
        let mut data = self.data.write().await;
        for rel in rels {
            validate_relationship_type(&rel.rel_type)?;
            data.upsert_relationship(rel.clone());
        }
        Ok(())
    }

    async fn delete_repository_subgraph(&self, repository: &str) -> Result<()> {
        let mut data = self.data.write().await;
        let repo_id = node_id::repository(repository);
        let mut doomed: HashSet<String> = HashSet::from([repo_id.clone()]);
        // Files owned through CONTAINS, then their DEFINES/HAS_CHUNK targets.
        let file_ids: Vec<String> = data
            .relationships
            .iter()
            .filter(|r| r.rel_type == "CONTAINS" && r.from_id == repo_id)
            .map(|r| r.to_id.clone())
            .collect();
        for file_id in &file_ids {
            doomed.insert(file_id.clone());
            for rel in &data.relationships {
                if rel.from_id == *file_id
                    && (rel.rel_type == "DEFINES" || rel.rel_type == "HAS_CHUNK")
                {
                    doomed.insert(rel.to_id.clone());
                }
            }
        }
        data.remove_nodes(&doomed);
        Ok(())
    }

    async fn delete_file_subgraph(&self, repository: &str, file_path: &str) -> Result<()> {
        let mut data = self.data.write().await;
        let file_id = node_id::file(repository, file_path);
        let mut doomed: HashSet<String> = HashSet::from([file_id.clone()]);
        for rel in &data.relationships {
            if rel.from_id == file_id
                && (rel.rel_type == "DEFINES" || rel.rel_type == "HAS_CHUNK")
            {
                doomed.insert(rel.to_id.clone());
            }
        }
        data.remove_nodes(&doomed);
        Ok(())
    }

    async fn replace_file_subgraph(
        &self,
        repository: &str,
        file_path: &str,
        subgraph: &FileSubgraph,
    ) -> Result<()> {
        for node in &subgraph.nodes {
            validate_label(&node.label)?;
        }
        for rel in &subgraph.relationships {
            validate_relationship_type(&rel.rel_type)?;
        }
        let mut data = self.data.write().await;
        let file_id = node_id::file(repository, file_path);
        let doomed: HashSet<String> = data
            .relationships
            .iter()
            .filter(|r| r.from_id == file_id && r.rel_type == "DEFINES")
            .map(|r| r.to_id.clone())
            .collect();
        data.remove_nodes(&doomed);
        for node in &subgraph.nodes {
            data.upsert_node(node.clone());
        }
        for rel in &subgraph.relationships {
            data.upsert_relationship(rel.clone());
        }
        Ok(())
    }

    async fn repository_exists(&self, repository: &str) -> Result<bool> {
        let data = self.data.read().await;
        Ok(data.nodes.contains_key(&node_id::repository(repository)))
    }

    async fn traverse(&self, request: &TraversalRequest) -> Result<Subgraph> {
        let (depth, limit) = clamp_traversal(request);
        validate_node_ref(&request.start)?;
        let allowed: HashSet<&str> = request
            .relationships
            .iter()
            .map(|k| k.type_name())
            .collect();
        let data = self.data.read().await;
        let Some(start) = data.resolve_ref(&request.start) else {
            return Err(Error::node_not_found(format!(
                "{}:{}",
                request.start.kind.label(),
                request.start.identifier
            )));
        };

        let mut subgraph = Subgraph::default();
        subgraph.add_node(start.clone());
        let mut visited: HashSet<String> = HashSet::from([start.id.clone()]);
        let mut frontier: VecDeque<(String, u32)> = VecDeque::from([(start.id.clone(), 0)]);
        while let Some((current, level)) = frontier.pop_front() {
            if level >= depth {
                continue;
            }
            for rel in &data.relationships {
                if !allowed.is_empty() && !allowed.contains(rel.rel_type.as_str()) {
                    continue;
                }
                let neighbor = if rel.from_id == current {
                    &rel.to_id
                } else if rel.to_id == current {
                    &rel.from_id
                } else {
                    continue;
                };
                if subgraph.nodes.len() >= limit {
                    break;
                }
                if let Some(node) = data.nodes.get(neighbor) {
                    subgraph.add_node(node.clone());
                    subgraph.add_relationship(rel.clone());
                    if visited.insert(neighbor.clone()) {
                        frontier.push_back((neighbor.clone(), level + 1));
                    }
                }
            }
        }
        Ok(subgraph)
    }

    async fn analyze_dependencies(&self, request: &DependencyRequest) -> Result<DependencyReport> {
        let max_depth = clamp_dependency_depth(request);
        validate_node_ref(&request.target)?;
        let data = self.data.read().await;
        let Some(target) = data.resolve_ref(&request.target) else {
            return Err(Error::node_not_found(format!(
                "{}:{}",
                request.target.kind.label(),
                request.target.identifier
            )));
        };
        let target_id = target.id.clone();

        let direct = Self::direct_dependencies(&data, &target_id, request.direction);
        let transitive = (request.transitive && max_depth >= 2).then(|| {
            Self::transitive_dependencies(&data, &target_id, request.direction, max_depth, &direct)
        });

        let transitive_count = transitive.as_ref().map_or(0, Vec::len);
        let impact_score = ((direct.len() + transitive_count) as f64 / 100.0).min(1.0);
        let mut metadata = HashMap::new();
        metadata.insert(
            "direction".to_owned(),
            serde_json::to_value(request.direction).unwrap_or(Value::Null),
        );
        metadata.insert("maxDepth".to_owned(), Value::from(max_depth));
        Ok(DependencyReport {
            direct,
            transitive,
            impact_score,
            metadata,
        })
    }

    async fn get_context(&self, request: &ContextRequest) -> Result<Vec<ContextItem>> {
        if request.seeds.is_empty() {
            return Err(Error::invalid_parameters("context seeds must not be empty"));
        }
        for seed in &request.seeds {
            validate_node_ref(seed)?;
        }
        let limit = clamp_context_limit(request);
        let data = self.data.read().await;
        let seed_ids = data.resolve_seeds(&request.seeds);
        let mut items: Vec<ContextItem> = Vec::new();
        for kind in &request.include {
            for item in Self::context_items_for_kind(&data, *kind, &seed_ids) {
                if items.len() >= limit {
                    break;
                }
                if !items.iter().any(|existing| existing.id == item.id) {
                    items.push(item);
                }
            }
        }
        Ok(items)
    }
}
