//! Graph ingestion pipeline.
//!
//! Transforms parsed files into batched graph mutations. All nodes of a kind
//! are written before any relationship that references them, so concurrent
//! readers only ever observe referentially consistent snapshots. Edges stay
//! `(from, to, type, props)` tuples throughout.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};

use ckg_domain::constants::{DEFAULT_NODE_BATCH_SIZE, DEFAULT_RELATIONSHIP_BATCH_SIZE};
use ckg_domain::entities::{
    GraphNode, GraphRelationship, IngestError, IngestPhase, IngestReport, IngestStats,
    IngestStatus, ParseResult, ProgressEvent, SourceFile,
};
use ckg_domain::error::{Error, Result};
use ckg_domain::ports::{
    CancellationFlag, CodeParser, FileSubgraph, GraphStoreProvider, ProgressSink,
};
use ckg_domain::value_objects::node_id;

/// Batch sizing for graph writes.
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Nodes per UNWIND batch
    pub node_batch_size: usize,
    /// Relationships per UNWIND batch
    pub relationship_batch_size: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            node_batch_size: DEFAULT_NODE_BATCH_SIZE,
            relationship_batch_size: DEFAULT_RELATIONSHIP_BATCH_SIZE,
        }
    }
}

/// Per-run ingestion options.
#[derive(Clone)]
pub struct IngestOptions {
    /// Repository name (globally unique)
    pub repository: String,
    /// Remote URL recorded on the Repository node
    pub repository_url: String,
    /// Indexed branch
    pub branch: String,
    /// Cascade-delete the prior subgraph before writing
    pub force: bool,
    /// Best-effort progress sink
    pub progress: Option<ProgressSink>,
    /// Cooperative cancellation
    pub cancellation: CancellationFlag,
}

impl IngestOptions {
    /// Options with everything defaulted except the repository name.
    #[must_use]
    pub fn for_repository(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            repository_url: String::new(),
            branch: "main".to_owned(),
            force: false,
            progress: None,
            cancellation: CancellationFlag::new(),
        }
    }
}

/// Accumulated graph mutations, nodes grouped by label.
#[derive(Debug, Default)]
struct MutationSet {
    nodes_by_label: HashMap<String, Vec<GraphNode>>,
    relationships_by_type: HashMap<String, Vec<GraphRelationship>>,
}

impl MutationSet {
    fn add_node(&mut self, node: GraphNode) {
        let bucket = self.nodes_by_label.entry(node.label.clone()).or_default();
        if !bucket.iter().any(|n| n.id == node.id) {
            bucket.push(node);
        }
    }

    fn add_relationship(&mut self, rel: GraphRelationship) {
        let bucket = self
            .relationships_by_type
            .entry(rel.rel_type.clone())
            .or_default();
        let duplicate = bucket.iter().any(|r| {
            r.from_id == rel.from_id && r.to_id == rel.to_id && r.rel_type == rel.rel_type
        });
        if !duplicate {
            bucket.push(rel);
        }
    }

    fn node_count(&self) -> usize {
        self.nodes_by_label.values().map(Vec::len).sum()
    }

    fn relationship_count(&self) -> usize {
        self.relationships_by_type.values().map(Vec::len).sum()
    }
}

/// Graph ingestion pipeline (repository-scoped, batched writes).
pub struct GraphIngestService {
    graph: Arc<dyn GraphStoreProvider>,
    parser: Arc<dyn CodeParser>,
    config: IngestConfig,
}

impl GraphIngestService {
    /// Create the pipeline with injected dependencies.
    #[must_use]
    pub fn new(
        graph: Arc<dyn GraphStoreProvider>,
        parser: Arc<dyn CodeParser>,
        config: IngestConfig,
    ) -> Self {
        Self {
            graph,
            parser,
            config,
        }
    }

    fn emit(options: &IngestOptions, phase: IngestPhase, percentage: u8) {
        if let Some(sink) = &options.progress {
            sink(ProgressEvent {
                phase,
                percentage,
                repository: options.repository.clone(),
            });
        }
    }

    /// Ingest a set of files into the graph for one repository.
    ///
    /// # Errors
    ///
    /// `REPOSITORY_EXISTS` when the repository is already present and
    /// `force` is not set. Store-level failures during the write phases
    /// surface in the report (status `Failed`), not as an `Err`.
    pub async fn ingest_files(
        &self,
        files: &[SourceFile],
        options: &IngestOptions,
    ) -> Result<IngestReport> {
        let started = Instant::now();
        Self::emit(options, IngestPhase::Initializing, 0);

        if self.graph.repository_exists(&options.repository).await? {
            if !options.force {
                return Err(Error::repository_exists(&options.repository));
            }
            self.graph
                .delete_repository_subgraph(&options.repository)
                .await?;
        }

        let mut errors: Vec<IngestError> = Vec::new();
        let mut files_failed = 0usize;
        let mut parsed: Vec<(usize, ParseResult)> = Vec::new();

        let total = files.len().max(1);
        for (index, file) in files.iter().enumerate() {
            if options.cancellation.is_cancelled() {
                return Ok(Self::cancelled_report(started, errors));
            }
            let percentage = 5 + ((index * 25) / total) as u8;
            Self::emit(options, IngestPhase::ExtractingEntities, percentage);

            if self.parser.supported_language(&file.path).is_none() {
                continue;
            }
            match self.parser.parse(&file.content, &file.path).await {
                Ok(result) => parsed.push((index, result)),
                Err(err) => {
                    warn!(file = %file.path, code = err.code(), "Parse failed during ingestion");
                    files_failed += 1;
                    errors.push(IngestError {
                        file_path: Some(file.path.clone()),
                        message: format!("{}: {err}", err.code()),
                    });
                }
            }
        }

        Self::emit(options, IngestPhase::ExtractingRelationships, 35);
        let parsed_by_index: HashMap<usize, &ParseResult> =
            parsed.iter().map(|(i, r)| (*i, r)).collect();
        let known_paths: HashSet<String> = files.iter().map(|f| f.path.clone()).collect();
        let function_ids = global_function_ids(&options.repository, files, &parsed_by_index);

        let mut mutations = MutationSet::default();
        let repo_node = repository_graph_node(options);
        for (index, file) in files.iter().enumerate() {
            let subgraph = file_subgraph(
                &options.repository,
                file,
                parsed_by_index.get(&index).copied(),
                &known_paths,
                &function_ids,
            );
            for node in subgraph.nodes {
                mutations.add_node(node);
            }
            for rel in subgraph.relationships {
                mutations.add_relationship(rel);
            }
        }

        let stats_skeleton = |mutations: &MutationSet| IngestStats {
            files_processed: files.len() - files_failed,
            files_failed,
            nodes_created: mutations.node_count() + 1,
            relationships_created: mutations.relationship_count(),
            nodes_by_type: {
                let mut by_type: HashMap<String, usize> = mutations
                    .nodes_by_label
                    .iter()
                    .map(|(label, nodes)| (label.clone(), nodes.len()))
                    .collect();
                *by_type.entry("Repository".to_owned()).or_insert(0) += 1;
                by_type
            },
            relationships_by_type: mutations
                .relationships_by_type
                .iter()
                .map(|(rel_type, rels)| (rel_type.clone(), rels.len()))
                .collect(),
            duration_ms: 0,
        };

        // Write phases. A store failure here aborts the run: the repository
        // may be left empty after a force delete, reported as Failed with
        // zeroed counts.
        let write_result = self
            .write_mutations(options, repo_node, &mutations)
            .await;
        if let Err(err) = write_result {
            errors.push(IngestError {
                file_path: None,
                message: format!("{}: {err}", err.code()),
            });
            let mut stats = IngestStats {
                duration_ms: started.elapsed().as_millis() as u64,
                ..IngestStats::default()
            };
            stats.files_failed = files.len();
            return Ok(IngestReport {
                status: IngestStatus::Failed,
                stats,
                errors,
            });
        }

        Self::emit(options, IngestPhase::Verifying, 95);
        if !self.graph.repository_exists(&options.repository).await? {
            errors.push(IngestError {
                file_path: None,
                message: "repository node missing after write".to_owned(),
            });
        }

        let mut stats = stats_skeleton(&mutations);
        stats.duration_ms = started.elapsed().as_millis() as u64;
        let status = if files_failed > 0 && stats.files_processed > 0 {
            IngestStatus::Partial
        } else if stats.files_processed == 0 && !errors.is_empty() {
            IngestStatus::Failed
        } else {
            IngestStatus::Success
        };

        Self::emit(options, IngestPhase::Completed, 100);
        info!(
            repository = %options.repository,
            files_processed = stats.files_processed,
            nodes_created = stats.nodes_created,
            relationships_created = stats.relationships_created,
            duration_ms = stats.duration_ms,
            "Ingestion finished"
        );
        Ok(IngestReport {
            status,
            stats,
            errors,
        })
    }

    fn cancelled_report(started: Instant, mut errors: Vec<IngestError>) -> IngestReport {
        errors.push(IngestError {
            file_path: None,
            message: "operation cancelled".to_owned(),
        });
        IngestReport {
            status: IngestStatus::Failed,
            stats: IngestStats {
                duration_ms: started.elapsed().as_millis() as u64,
                ..IngestStats::default()
            },
            errors,
        }
    }

    async fn write_mutations(
        &self,
        options: &IngestOptions,
        repo_node: GraphNode,
        mutations: &MutationSet,
    ) -> Result<()> {
        Self::emit(options, IngestPhase::CreatingRepositoryNode, 40);
        self.graph.upsert_node(&repo_node).await?;

        Self::emit(options, IngestPhase::CreatingFileNodes, 50);
        self.write_label(options, mutations, "File").await?;

        Self::emit(options, IngestPhase::CreatingEntityNodes, 60);
        for label in ["Function", "Class", "Interface", "TypeAlias", "Enum"] {
            self.write_label(options, mutations, label).await?;
        }

        Self::emit(options, IngestPhase::CreatingModuleNodes, 70);
        self.write_label(options, mutations, "Module").await?;

        Self::emit(options, IngestPhase::CreatingRelationships, 85);
        let mut rel_types: Vec<&String> = mutations.relationships_by_type.keys().collect();
        rel_types.sort();
        for rel_type in rel_types {
            let rels = &mutations.relationships_by_type[rel_type];
            for batch in rels.chunks(self.config.relationship_batch_size) {
                if options.cancellation.is_cancelled() {
                    return Err(Error::graph("operation cancelled during relationship writes"));
                }
                self.graph.create_relationships(rel_type, batch).await?;
            }
        }
        Ok(())
    }

    async fn write_label(
        &self,
        options: &IngestOptions,
        mutations: &MutationSet,
        label: &str,
    ) -> Result<()> {
        let Some(nodes) = mutations.nodes_by_label.get(label) else {
            return Ok(());
        };
        for batch in nodes.chunks(self.config.node_batch_size) {
            if options.cancellation.is_cancelled() {
                return Err(Error::graph("operation cancelled during node writes"));
            }
            self.graph.upsert_nodes(label, batch).await?;
        }
        Ok(())
    }
}

/// Build the Repository node for an ingestion run.
#[must_use]
pub fn repository_graph_node(options: &IngestOptions) -> GraphNode {
    GraphNode::new(node_id::repository(&options.repository), "Repository")
        .with_property("name", options.repository.clone())
        .with_property("url", options.repository_url.clone())
        .with_property("branch", options.branch.clone())
        .with_property("indexedAt", Utc::now().to_rfc3339())
}

/// Build the File node for one source file.
#[must_use]
pub fn file_graph_node(repository: &str, file: &SourceFile) -> GraphNode {
    let extension = file.path.rsplit('.').next().unwrap_or_default();
    GraphNode::new(node_id::file(repository, &file.path), "File")
        .with_property("path", file.path.clone())
        .with_property("repository", repository.to_owned())
        .with_property("extension", extension)
        .with_property("sizeBytes", file.size_bytes)
        .with_property("modifiedAt", file.modified_at.clone())
}

/// Map every extracted function name (plain and `Class.method` qualified) to
/// its deterministic node id across all parsed files. First definition wins.
#[must_use]
pub fn global_function_ids(
    repository: &str,
    files: &[SourceFile],
    parsed: &HashMap<usize, &ParseResult>,
) -> HashMap<String, String> {
    let mut ids = HashMap::new();
    for (index, file) in files.iter().enumerate() {
        let Some(result) = parsed.get(&index) else {
            continue;
        };
        for entity in &result.entities {
            if entity.kind.node_label() != "Function" {
                continue;
            }
            let id = node_id::function(repository, &file.path, &entity.name, entity.line_start);
            ids.entry(entity.name.clone()).or_insert(id);
        }
    }
    ids
}

/// Build the full node/edge set for one file: the File node, its CONTAINS
/// edge, entity nodes with DEFINES, Module nodes with IMPORTS, REFERENCES
/// for resolvable relative imports, and CALLS edges.
#[must_use]
pub fn file_subgraph(
    repository: &str,
    file: &SourceFile,
    parse: Option<&ParseResult>,
    known_paths: &HashSet<String>,
    function_ids: &HashMap<String, String>,
) -> FileSubgraph {
    let mut subgraph = FileSubgraph::default();
    let file_id = node_id::file(repository, &file.path);
    subgraph.nodes.push(file_graph_node(repository, file));
    subgraph.relationships.push(GraphRelationship::new(
        node_id::repository(repository),
        &file_id,
        "CONTAINS",
    ));
    let Some(result) = parse else {
        return subgraph;
    };

    // Entity nodes and DEFINES edges.
    let mut local_function_ids: HashMap<String, String> = HashMap::new();
    for entity in &result.entities {
        let label = entity.kind.node_label();
        let entity_id = if label == "Function" {
            node_id::function(repository, &file.path, &entity.name, entity.line_start)
        } else {
            node_id::typed_entity(label, repository, &file.path, &entity.name)
        };
        if label == "Function" {
            local_function_ids
                .entry(entity.name.clone())
                .or_insert_with(|| entity_id.clone());
        }
        let mut node = GraphNode::new(&entity_id, label)
            .with_property("name", entity.name.clone())
            .with_property("repository", repository.to_owned())
            .with_property("filePath", file.path.clone())
            .with_property("lineStart", entity.line_start)
            .with_property("lineEnd", entity.line_end)
            .with_property("isExported", entity.is_exported);
        match label {
            "Function" => {
                node = node
                    .with_property("isAsync", entity.is_async)
                    .with_property("isGenerator", entity.is_generator)
                    .with_property("isStatic", entity.is_static)
                    .with_property(
                        "parameters",
                        Value::from(
                            entity
                                .parameters
                                .iter()
                                .map(|p| p.name.clone())
                                .collect::<Vec<_>>(),
                        ),
                    );
                if let Some(return_type) = &entity.return_type {
                    node = node.with_property("returnType", return_type.clone());
                }
            }
            "Class" => {
                node = node.with_property("isAbstract", entity.is_abstract);
                if let Some(extends) = &entity.extends {
                    node = node.with_property("extends", extends.clone());
                }
                if !entity.implements.is_empty() {
                    node = node.with_property(
                        "implements",
                        Value::from(entity.implements.clone()),
                    );
                }
                if !entity.type_parameters.is_empty() {
                    node = node.with_property(
                        "typeParameters",
                        Value::from(entity.type_parameters.clone()),
                    );
                }
            }
            _ => {}
        }
        if let Some(documentation) = &entity.documentation {
            node = node.with_property("documentation", documentation.clone());
        }
        subgraph.nodes.push(node);
        subgraph
            .relationships
            .push(GraphRelationship::new(&file_id, entity_id, "DEFINES"));
    }

    // Imports: external sources become Module nodes, relative sources
    // resolve to REFERENCES edges between files when the target is indexed.
    for import in &result.imports {
        if import.is_relative {
            if let Some(target) = resolve_relative_import(&file.path, &import.source, known_paths) {
                subgraph.relationships.push(GraphRelationship::new(
                    &file_id,
                    node_id::file(repository, &target),
                    "REFERENCES",
                ));
            }
            continue;
        }
        let module_id = node_id::module(&import.source);
        subgraph.nodes.push(
            GraphNode::new(&module_id, "Module").with_property("name", import.source.clone()),
        );
        let mut rel = GraphRelationship::new(&file_id, &module_id, "IMPORTS")
            .with_property("isRelative", import.is_relative)
            .with_property("isTypeOnly", import.is_type_only)
            .with_property(
                "importedNames",
                Value::from(import.imported_names.clone()),
            );
        if let Some(default_import) = &import.default_import {
            rel = rel.with_property("defaultImport", default_import.clone());
        }
        if !import.aliases.is_empty() {
            rel = rel.with_property(
                "aliases",
                serde_json::to_string(&import.aliases).unwrap_or_default(),
            );
        }
        subgraph.relationships.push(rel);
    }

    // Calls between known functions; callee resolution prefers this file's
    // definitions, then the repository-wide map.
    for call in &result.calls {
        let Some(caller_id) = local_function_ids.get(&call.caller_name) else {
            continue;
        };
        let callee_id = local_function_ids
            .get(&call.called_name)
            .or_else(|| function_ids.get(&call.called_name));
        let Some(callee_id) = callee_id else {
            continue;
        };
        subgraph.relationships.push(
            GraphRelationship::new(caller_id, callee_id, "CALLS")
                .with_property("isAsync", call.is_async)
                .with_property("callerName", call.caller_name.clone()),
        );
    }
    subgraph
}

/// Resolve a relative import specifier against the importing file's
/// directory, trying the indexable extension candidates.
#[must_use]
pub fn resolve_relative_import(
    from_path: &str,
    specifier: &str,
    known_paths: &HashSet<String>,
) -> Option<String> {
    let mut components: Vec<&str> = from_path.split('/').collect();
    components.pop();
    for part in specifier.split('/') {
        match part {
            "." | "" => {}
            ".." => {
                components.pop();
            }
            other => components.push(other),
        }
    }
    let base = components.join("/");
    if known_paths.contains(&base) {
        return Some(base);
    }
    const CANDIDATE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs", "mts", "cts"];
    for ext in CANDIDATE_EXTENSIONS {
        let candidate = format!("{base}.{ext}");
        if known_paths.contains(&candidate) {
            return Some(candidate);
        }
        let index_candidate = format!("{base}/index.{ext}");
        if known_paths.contains(&index_candidate) {
            return Some(index_candidate);
        }
    }
    None
}
