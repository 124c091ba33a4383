//! Neo4j graph store client over bolt.
//!
//! Every label and relationship type is validated against
//! `[A-Za-z][A-Za-z0-9_]*` before query composition; all other values are
//! bound parameters. Driver integers stay `i64` end-to-end and convert to
//! JSON only in [`GraphStoreProvider::run_query`] rows.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use neo4rs::{
    query, BoltBoolean, BoltFloat, BoltInteger, BoltList, BoltMap, BoltNull, BoltString, BoltType,
    ConfigBuilder, Graph, Query,
};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use ckg_domain::constants::{DEFAULT_GRAPH_POOL_SIZE, DOCUMENTATION_EXTENSIONS};
use ckg_domain::entities::{
    GraphNode, GraphRelationship, NodeKind, Subgraph,
};
use ckg_domain::error::{Error, Result};
use ckg_domain::ports::{
    ContextItem, ContextKind, ContextRequest, DependencyDirection, DependencyEntry,
    DependencyReport, DependencyRequest, FileSubgraph, GraphStoreProvider, TraversalRequest,
    CONTEXT_RELEVANCE,
};
use ckg_domain::value_objects::{node_id, validate_label, validate_relationship_type, NodeRef};

use super::{clamp_context_limit, clamp_dependency_depth, clamp_traversal, validate_node_ref};
use crate::constants::{DEFAULT_NEO4J_URI, GRAPH_QUERY_TIMEOUT_SECS};

/// Neo4j connection configuration.
#[derive(Debug, Clone)]
pub struct Neo4jConfig {
    /// Bolt URI
    pub uri: String,
    /// Username
    pub user: String,
    /// Password
    pub password: String,
    /// Database name; the server default when `None`
    pub database: Option<String>,
    /// Connection pool size
    pub max_connections: usize,
    /// Per-query deadline
    pub query_timeout: Duration,
    /// Prefer the APOC path-expansion procedure for traversals
    pub use_apoc: bool,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_NEO4J_URI.to_owned(),
            user: "neo4j".to_owned(),
            password: String::new(),
            database: None,
            max_connections: DEFAULT_GRAPH_POOL_SIZE,
            query_timeout: Duration::from_secs(GRAPH_QUERY_TIMEOUT_SECS),
            use_apoc: false,
        }
    }
}

/// Graph store provider backed by a Neo4j server.
pub struct Neo4jGraphStore {
    config: Neo4jConfig,
    graph: RwLock<Option<Graph>>,
}

impl Neo4jGraphStore {
    /// Create a disconnected client; call [`GraphStoreProvider::connect`]
    /// before issuing queries.
    #[must_use]
    pub fn new(config: Neo4jConfig) -> Self {
        Self {
            config,
            graph: RwLock::new(None),
        }
    }

    async fn graph_handle(&self) -> Result<Graph> {
        self.graph
            .read()
            .await
            .clone()
            .ok_or_else(|| Error::connection("graph store is not connected"))
    }

    /// Run a write query, applying the configured deadline.
    async fn run_write(&self, q: Query) -> Result<()> {
        let graph = self.graph_handle().await?;
        tokio::time::timeout(self.config.query_timeout, graph.run(q))
            .await
            .map_err(|_| Error::timeout("graph query exceeded its deadline"))?
            .map_err(|e| Error::graph_with_source("graph write failed", e))
    }

    /// Run a read query and convert the named columns of each row to JSON.
    async fn run_read(&self, q: Query, columns: &[&str]) -> Result<Vec<HashMap<String, Value>>> {
        let graph = self.graph_handle().await?;
        let deadline = self.config.query_timeout;
        let fetch = async move {
            let mut stream = graph
                .execute(q)
                .await
                .map_err(|e| Error::graph_with_source("graph query failed", e))?;
            let mut rows = Vec::new();
            while let Some(row) = stream
                .next()
                .await
                .map_err(|e| Error::graph_with_source("graph row fetch failed", e))?
            {
                let mut converted = HashMap::with_capacity(columns.len());
                for column in columns {
                    let value: Value = row.get(column).unwrap_or(Value::Null);
                    converted.insert((*column).to_owned(), value);
                }
                rows.push(converted);
            }
            Ok(rows)
        };
        tokio::time::timeout(deadline, fetch)
            .await
            .map_err(|_| Error::timeout("graph query exceeded its deadline"))?
    }

    /// Resolve seed references into `{label, identifier, repository}` rows
    /// for unrolled `$seeds` parameters.
    fn seed_rows(seeds: &[NodeRef]) -> Result<BoltType> {
        let mut list = BoltList::new();
        for seed in seeds {
            validate_node_ref(seed)?;
            validate_label(seed.kind.label())?;
            let mut map = BoltMap::new();
            map.put(
                BoltString::new("label"),
                BoltType::String(BoltString::new(seed.kind.label())),
            );
            map.put(
                BoltString::new("identifier"),
                BoltType::String(BoltString::new(&seed.identifier)),
            );
            let repository = match &seed.repository {
                Some(repo) => BoltType::String(BoltString::new(repo)),
                None => BoltType::Null(BoltNull::default()),
            };
            map.put(BoltString::new("repository"), repository);
            list.push(BoltType::Map(map));
        }
        Ok(BoltType::List(list))
    }

    /// Derive the deterministic id of a referenced start/target node when
    /// the reference carries enough identifying attributes.
    fn ref_match_clause(node_ref: &NodeRef) -> Result<(String, Vec<(String, BoltType)>)> {
        validate_node_ref(node_ref)?;
        let label = node_ref.kind.label();
        validate_label(label)?;
        let mut params: Vec<(String, BoltType)> = Vec::new();
        let clause = match node_ref.kind {
            NodeKind::Repository => {
                params.push((
                    "ref_id".to_owned(),
                    BoltType::String(BoltString::new(&node_id::repository(&node_ref.identifier))),
                ));
                format!("MATCH (t:{label} {{id: $ref_id}})")
            }
            NodeKind::File => {
                let repository = node_ref.repository.as_deref().unwrap_or_default();
                params.push((
                    "ref_id".to_owned(),
                    BoltType::String(BoltString::new(&node_id::file(
                        repository,
                        &node_ref.identifier,
                    ))),
                ));
                format!("MATCH (t:{label} {{id: $ref_id}})")
            }
            NodeKind::Module => {
                params.push((
                    "ref_id".to_owned(),
                    BoltType::String(BoltString::new(&node_id::module(&node_ref.identifier))),
                ));
                format!("MATCH (t:{label} {{id: $ref_id}})")
            }
            // Entity kinds are matched by name within their repository; the
            // full id embeds file path and line which callers rarely know.
            _ => {
                params.push((
                    "ref_name".to_owned(),
                    BoltType::String(BoltString::new(&node_ref.identifier)),
                ));
                params.push((
                    "ref_repo".to_owned(),
                    BoltType::String(BoltString::new(
                        node_ref.repository.as_deref().unwrap_or_default(),
                    )),
                ));
                format!("MATCH (t:{label} {{name: $ref_name, repository: $ref_repo}})")
            }
        };
        Ok((clause, params))
    }

    async fn traverse_with_apoc(
        &self,
        request: &TraversalRequest,
        depth: u32,
        limit: usize,
    ) -> Result<Subgraph> {
        let (match_clause, ref_params) = Self::ref_match_clause(&request.start)?;
        let rel_filter = request
            .relationships
            .iter()
            .map(|k| k.type_name())
            .collect::<Vec<_>>()
            .join("|");
        let cypher = format!(
            "{match_clause} \
             CALL apoc.path.subgraphAll(t, {{maxLevel: $depth, relationshipFilter: $rel_filter, limit: $limit}}) \
             YIELD nodes, relationships \
             RETURN [n IN nodes | {{id: n.id, labels: labels(n), props: properties(n)}}] AS nodes, \
                    [r IN relationships | {{from: startNode(r).id, to: endNode(r).id, type: type(r), props: properties(r)}}] AS rels"
        );
        let mut q = query(&cypher)
            .param("depth", depth as i64)
            .param("rel_filter", rel_filter)
            .param("limit", limit as i64);
        for (key, value) in ref_params {
            q = q.param(&key, value);
        }
        let rows = self.run_read(q, &["nodes", "rels"]).await?;
        Ok(collect_subgraph(rows, limit))
    }

    async fn traverse_with_patterns(
        &self,
        request: &TraversalRequest,
        depth: u32,
        limit: usize,
    ) -> Result<Subgraph> {
        let (match_clause, ref_params) = Self::ref_match_clause(&request.start)?;
        // The variable-length upper bound cannot be a parameter; depth is
        // already clamped to a small constant.
        let cypher = format!(
            "{match_clause} \
             MATCH path = (t)-[*1..{depth}]-(m) \
             WHERE size($rel_types) = 0 OR ALL(rel IN relationships(path) WHERE type(rel) IN $rel_types) \
             WITH t, path LIMIT $path_limit \
             RETURN [n IN nodes(path) | {{id: n.id, labels: labels(n), props: properties(n)}}] AS nodes, \
                    [r IN relationships(path) | {{from: startNode(r).id, to: endNode(r).id, type: type(r), props: properties(r)}}] AS rels"
        );
        let mut rel_types = BoltList::new();
        for kind in &request.relationships {
            rel_types.push(BoltType::String(BoltString::new(kind.type_name())));
        }
        let mut q = query(&cypher)
            .param("rel_types", BoltType::List(rel_types))
            .param("path_limit", limit as i64);
        for (key, value) in ref_params {
            q = q.param(&key, value);
        }
        let rows = self.run_read(q, &["nodes", "rels"]).await?;
        Ok(collect_subgraph(rows, limit))
    }

    async fn dependency_edges(
        &self,
        target: &NodeRef,
        reversed: bool,
    ) -> Result<Vec<DependencyEntry>> {
        let (match_clause, ref_params) = Self::ref_match_clause(target)?;
        let pattern = if reversed {
            "(d)-[r:IMPORTS|CALLS|REFERENCES]->(t)"
        } else {
            "(t)-[r:IMPORTS|CALLS|REFERENCES]->(d)"
        };
        let cypher = format!(
            "{match_clause} MATCH {pattern} \
             RETURN DISTINCT d.id AS id, labels(d) AS labels, \
                    coalesce(d.name, d.path, d.id) AS name, type(r) AS relationship"
        );
        let mut q = query(&cypher);
        for (key, value) in ref_params {
            q = q.param(&key, value);
        }
        let rows = self
            .run_read(q, &["id", "labels", "name", "relationship"])
            .await?;
        Ok(rows.into_iter().filter_map(row_to_dependency).collect())
    }

    async fn transitive_edges(
        &self,
        target: &NodeRef,
        reversed: bool,
        max_depth: u32,
    ) -> Result<Vec<DependencyEntry>> {
        let (match_clause, ref_params) = Self::ref_match_clause(target)?;
        let pattern = if reversed {
            format!("(d)-[:IMPORTS|CALLS|REFERENCES*2..{max_depth}]->(t)")
        } else {
            format!("(t)-[:IMPORTS|CALLS|REFERENCES*2..{max_depth}]->(d)")
        };
        let cypher = format!(
            "{match_clause} MATCH {pattern} \
             WHERE d <> t \
             RETURN DISTINCT d.id AS id, labels(d) AS labels, \
                    coalesce(d.name, d.path, d.id) AS name, 'REFERENCES' AS relationship"
        );
        let mut q = query(&cypher);
        for (key, value) in ref_params {
            q = q.param(&key, value);
        }
        let rows = self
            .run_read(q, &["id", "labels", "name", "relationship"])
            .await?;
        Ok(rows.into_iter().filter_map(row_to_dependency).collect())
    }

    /// One batched context query for one kind over the unrolled seed list.
    async fn context_for_kind(
        &self,
        kind: ContextKind,
        seeds: &[NodeRef],
        limit: usize,
    ) -> Result<Vec<ContextItem>> {
        let seed_match = "UNWIND $seeds AS seed \
             MATCH (s) \
             WHERE seed.label IN labels(s) \
               AND (s.name = seed.identifier OR s.path = seed.identifier) \
               AND (seed.repository IS NULL OR s.repository = seed.repository)";
        let (pattern, result_var) = match kind {
            ContextKind::Imports => ("MATCH (s)-[:IMPORTS]->(x)", "x"),
            ContextKind::Callers => ("MATCH (x)-[:CALLS]->(s)", "x"),
            ContextKind::Callees => ("MATCH (s)-[:CALLS]->(x)", "x"),
            ContextKind::Siblings => (
                "MATCH (p)-[:CONTAINS|DEFINES]->(s) \
                 MATCH (p)-[:CONTAINS|DEFINES]->(x) \
                 WHERE x <> s",
                "x",
            ),
            ContextKind::Documentation => (
                "MATCH (s)-[:REFERENCES]->(x:File) \
                 WHERE x.extension IN $doc_exts",
                "x",
            ),
        };
        let cypher = format!(
            "{seed_match} {pattern} \
             RETURN DISTINCT {result_var}.id AS id, labels({result_var}) AS labels, \
                    coalesce({result_var}.name, {result_var}.path, {result_var}.id) AS name \
             LIMIT $limit"
        );
        let mut q = query(&cypher)
            .param("seeds", Self::seed_rows(seeds)?)
            .param("limit", limit as i64);
        if kind == ContextKind::Documentation {
            let mut exts = BoltList::new();
            for ext in DOCUMENTATION_EXTENSIONS {
                exts.push(BoltType::String(BoltString::new(ext)));
            }
            q = q.param("doc_exts", BoltType::List(exts));
        }
        let rows = self.run_read(q, &["id", "labels", "name"]).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let id = row.get("id")?.as_str()?.to_owned();
                Some(ContextItem {
                    id,
                    label: first_label(row.get("labels")),
                    name: row
                        .get("name")
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_owned(),
                    kind,
                    relevance: CONTEXT_RELEVANCE,
                    reason: kind.reason().to_owned(),
                })
            })
            .collect())
    }
}

/// JSON-to-bolt parameter conversion. Integers stay 64-bit; compound values
/// become bolt lists/maps recursively.
fn bolt_value(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull::default()),
        Value::Bool(b) => BoltType::Boolean(BoltBoolean::new(*b)),
        Value::Number(n) => n.as_i64().map_or_else(
            || BoltType::Float(BoltFloat::new(n.as_f64().unwrap_or(0.0))),
            |i| BoltType::Integer(BoltInteger::new(i)),
        ),
        Value::String(s) => BoltType::String(BoltString::new(s)),
        Value::Array(items) => {
            let mut list = BoltList::new();
            for item in items {
                list.push(bolt_value(item));
            }
            BoltType::List(list)
        }
        Value::Object(map) => {
            let mut bolt_map = BoltMap::new();
            for (key, item) in map {
                bolt_map.put(BoltString::new(key), bolt_value(item));
            }
            BoltType::Map(bolt_map)
        }
    }
}

fn props_param(properties: &HashMap<String, Value>) -> BoltType {
    let mut map = BoltMap::new();
    for (key, value) in properties {
        map.put(BoltString::new(key), bolt_value(value));
    }
    BoltType::Map(map)
}

fn first_label(labels: Option<&Value>) -> String {
    labels
        .and_then(Value::as_array)
        .and_then(|l| l.first())
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_owned()
}

fn row_to_dependency(row: HashMap<String, Value>) -> Option<DependencyEntry> {
    Some(DependencyEntry {
        id: row.get("id")?.as_str()?.to_owned(),
        label: first_label(row.get("labels")),
        name: row
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        relationship: row
            .get("relationship")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
    })
}

/// Fold projected path rows into a deduplicated subgraph bounded by `limit`.
fn collect_subgraph(rows: Vec<HashMap<String, Value>>, limit: usize) -> Subgraph {
    let mut subgraph = Subgraph::default();
    for row in rows {
        if let Some(nodes) = row.get("nodes").and_then(Value::as_array) {
            for node in nodes {
                if subgraph.nodes.len() >= limit {
                    break;
                }
                let Some(id) = node.get("id").and_then(Value::as_str) else {
                    continue;
                };
                let label = node
                    .get("labels")
                    .and_then(Value::as_array)
                    .and_then(|l| l.first())
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                let properties = node
                    .get("props")
                    .and_then(Value::as_object)
                    .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                    .unwrap_or_default();
                subgraph.add_node(GraphNode {
                    id: id.to_owned(),
                    label: label.to_owned(),
                    properties,
                });
            }
        }
        if let Some(rels) = row.get("rels").and_then(Value::as_array) {
            for rel in rels {
                let (Some(from), Some(to), Some(rel_type)) = (
                    rel.get("from").and_then(Value::as_str),
                    rel.get("to").and_then(Value::as_str),
                    rel.get("type").and_then(Value::as_str),
                ) else {
                    continue;
                };
                let properties = rel
                    .get("props")
                    .and_then(Value::as_object)
                    .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
                    .unwrap_or_default();
                subgraph.add_relationship(GraphRelationship {
                    from_id: from.to_owned(),
                    to_id: to.to_owned(),
                    rel_type: rel_type.to_owned(),
                    properties,
                });
            }
        }
    }
    subgraph
}

#[async_trait]
impl GraphStoreProvider for Neo4jGraphStore {
    async fn connect(&self) -> Result<()> {
        let mut builder = ConfigBuilder::default()
            .uri(&self.config.uri)
            .user(&self.config.user)
            .password(&self.config.password)
            .max_connections(self.config.max_connections);
        if let Some(database) = &self.config.database {
            builder = builder.db(database.as_str());
        }
        let config = builder
            .build()
            .map_err(|e| Error::connection_with_source("invalid graph store configuration", e))?;
        let graph = Graph::connect(config)
            .await
            .map_err(|e| Error::connection_with_source("failed to connect to graph store", e))?;
        *self.graph.write().await = Some(graph);
        debug!(uri = %self.config.uri, "Graph store connected");
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        *self.graph.write().await = None;
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        let rows = self.run_read(query("RETURN 1 AS ok"), &["ok"]).await?;
        if rows.first().and_then(|r| r.get("ok")).and_then(Value::as_i64) == Some(1) {
            Ok(())
        } else {
            Err(Error::health_check("graph store probe returned no rows"))
        }
    }

    async fn run_query(
        &self,
        cypher: &str,
        params: HashMap<String, Value>,
        columns: &[&str],
    ) -> Result<Vec<HashMap<String, Value>>> {
        let mut q = query(cypher);
        for (key, value) in &params {
            q = q.param(key, bolt_value(value));
        }
        self.run_read(q, columns).await
    }

    #[instrument(skip_all, fields(node_id = %node.id))]
    async fn upsert_node(&self, node: &GraphNode) -> Result<()> {
        validate_label(&node.label)?;
        let cypher = format!("MERGE (n:{} {{id: $id}}) SET n += $props", node.label);
        let q = query(&cypher)
            .param("id", node.id.as_str())
            .param("props", props_param(&node.properties));
        self.run_write(q).await
    }

    async fn delete_node(&self, id: &str, label: &str) -> Result<()> {
        validate_label(label)?;
        let cypher = format!("MATCH (n:{label} {{id: $id}}) DETACH DELETE n");
        self.run_write(query(&cypher).param("id", id)).await
    }

    async fn create_relationship(&self, rel: &GraphRelationship) -> Result<()> {
        validate_relationship_type(&rel.rel_type)?;
        let cypher = format!(
            "MATCH (a {{id: $from}}) MATCH (b {{id: $to}}) \
             MERGE (a)-[r:{}]->(b) SET r += $props",
            rel.rel_type
        );
        let q = query(&cypher)
            .param("from", rel.from_id.as_str())
            .param("to", rel.to_id.as_str())
            .param("props", props_param(&rel.properties));
        self.run_write(q).await
    }

    async fn delete_relationship(&self, from_id: &str, to_id: &str, rel_type: &str) -> Result<()> {
        validate_relationship_type(rel_type)?;
        let cypher =
            format!("MATCH (a {{id: $from}})-[r:{rel_type}]->(b {{id: $to}}) DELETE r");
        let q = query(&cypher)
            .param("from", from_id)
            .param("to", to_id);
        self.run_write(q).await
    }

    async fn upsert_nodes(&self, label: &str, nodes: &[GraphNode]) -> Result<()> {
        if nodes.is_empty() {
            return Ok(());
        }
        validate_label(label)?;
        let mut rows = BoltList::new();
        for node in nodes {
            let mut row = BoltMap::new();
            row.put(
                BoltString::new("id"),
                BoltType::String(BoltString::new(&node.id)),
            );
            row.put(BoltString::new("props"), props_param(&node.properties));
            rows.push(BoltType::Map(row));
        }
        let cypher =
            format!("UNWIND $rows AS row MERGE (n:{label} {{id: row.id}}) SET n += row.props");
        self.run_write(query(&cypher).param("rows", BoltType::List(rows)))
            .await
    }

    async fn create_relationships(&self, rel_type: &str, rels: &[GraphRelationship]) -> Result<()> {
        if rels.is_empty() {
            return Ok(());
        }
        validate_relationship_type(rel_type)?;
        let mut rows = BoltList::new();
        for rel in rels {
            let mut row = BoltMap::new();
            row.put(
                BoltString::new("from"),
                BoltType::String(BoltString::new(&rel.from_id)),
            );
            row.put(
                BoltString::new("to"),
                BoltType::String(BoltString::new(&rel.to_id)),
            );
            row.put(BoltString::new("props"), props_param(&rel.properties));
            rows.push(BoltType::Map(row));
        }
        let cypher = format!(
            "UNWIND $rows AS row \
             MATCH (a {{id: row.from}}) MATCH (b {{id: row.to}}) \
             MERGE (a)-[r:{rel_type}]->(b) SET r += row.props"
        );
        self.run_write(query(&cypher).param("rows", BoltType::List(rows)))
            .await
    }

    async fn delete_repository_subgraph(&self, repository: &str) -> Result<()> {
        let cypher = "MATCH (r:Repository {name: $repository}) \
             OPTIONAL MATCH (r)-[:CONTAINS]->(f:File) \
             OPTIONAL MATCH (f)-[:DEFINES]->(e) \
             OPTIONAL MATCH (f)-[:HAS_CHUNK]->(c:Chunk) \
             DETACH DELETE r, f, e, c";
        self.run_write(query(cypher).param("repository", repository))
            .await
    }

    async fn delete_file_subgraph(&self, repository: &str, file_path: &str) -> Result<()> {
        let cypher = "MATCH (f:File {id: $file_id}) \
             OPTIONAL MATCH (f)-[:DEFINES]->(e) \
             OPTIONAL MATCH (f)-[:HAS_CHUNK]->(c:Chunk) \
             DETACH DELETE f, e, c";
        self.run_write(query(cypher).param("file_id", node_id::file(repository, file_path)))
            .await
    }

    async fn replace_file_subgraph(
        &self,
        repository: &str,
        file_path: &str,
        subgraph: &FileSubgraph,
    ) -> Result<()> {
        // Delete-then-upsert keeps the file observable in either its prior
        // or post state; batches are applied consecutively.
        let cypher = "MATCH (f:File {id: $file_id})-[:DEFINES]->(e) DETACH DELETE e";
        self.run_write(query(cypher).param("file_id", node_id::file(repository, file_path)))
            .await?;

        let mut by_label: HashMap<&str, Vec<GraphNode>> = HashMap::new();
        for node in &subgraph.nodes {
            by_label.entry(node.label.as_str()).or_default().push(node.clone());
        }
        for (label, nodes) in by_label {
            self.upsert_nodes(label, &nodes).await?;
        }
        let mut by_type: HashMap<&str, Vec<GraphRelationship>> = HashMap::new();
        for rel in &subgraph.relationships {
            by_type.entry(rel.rel_type.as_str()).or_default().push(rel.clone());
        }
        for (rel_type, rels) in by_type {
            self.create_relationships(rel_type, &rels).await?;
        }
        Ok(())
    }

    async fn repository_exists(&self, repository: &str) -> Result<bool> {
        let rows = self
            .run_read(
                query("MATCH (r:Repository {name: $repository}) RETURN count(r) AS c")
                    .param("repository", repository),
                &["c"],
            )
            .await?;
        Ok(rows
            .first()
            .and_then(|r| r.get("c"))
            .and_then(Value::as_i64)
            .unwrap_or(0)
            > 0)
    }

    async fn traverse(&self, request: &TraversalRequest) -> Result<Subgraph> {
        let (depth, limit) = clamp_traversal(request);
        for kind in &request.relationships {
            validate_relationship_type(kind.type_name())?;
        }
        if self.config.use_apoc {
            match self.traverse_with_apoc(request, depth, limit).await {
                Ok(subgraph) => return Ok(subgraph),
                Err(err) => {
                    warn!(error = %err, "APOC traversal failed, falling back to path patterns");
                }
            }
        }
        self.traverse_with_patterns(request, depth, limit).await
    }

    async fn analyze_dependencies(&self, request: &DependencyRequest) -> Result<DependencyReport> {
        let max_depth = clamp_dependency_depth(request);
        let mut direct = match request.direction {
            DependencyDirection::DependsOn => self.dependency_edges(&request.target, false).await?,
            DependencyDirection::DependedOnBy => {
                self.dependency_edges(&request.target, true).await?
            }
            DependencyDirection::Both => {
                let mut forward = self.dependency_edges(&request.target, false).await?;
                let backward = self.dependency_edges(&request.target, true).await?;
                for entry in backward {
                    if !forward.iter().any(|e| e.id == entry.id) {
                        forward.push(entry);
                    }
                }
                forward
            }
        };
        direct.sort_by(|a, b| a.id.cmp(&b.id));

        let transitive = if request.transitive && max_depth >= 2 {
            let mut reached = match request.direction {
                DependencyDirection::DependsOn => {
                    self.transitive_edges(&request.target, false, max_depth).await?
                }
                DependencyDirection::DependedOnBy => {
                    self.transitive_edges(&request.target, true, max_depth).await?
                }
                DependencyDirection::Both => {
                    let mut forward =
                        self.transitive_edges(&request.target, false, max_depth).await?;
                    let backward =
                        self.transitive_edges(&request.target, true, max_depth).await?;
                    for entry in backward {
                        if !forward.iter().any(|e| e.id == entry.id) {
                            forward.push(entry);
                        }
                    }
                    forward
                }
            };
            reached.retain(|entry| !direct.iter().any(|d| d.id == entry.id));
            reached.sort_by(|a, b| a.id.cmp(&b.id));
            Some(reached)
        } else {
            None
        };

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
        let limit = clamp_context_limit(request);
        let mut items: Vec<ContextItem> = Vec::new();
        for kind in &request.include {
            let batch = self.context_for_kind(*kind, &request.seeds, limit).await?;
            for item in batch {
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
