//! Mind-map graph schema shared by the generator, the router, the gateway and the renderer.
//!
//! A [`Graph`] can only be obtained through validation: [`Graph::new`], deserialization
//! (which routes through the same checks) or [`parse_graph_value`] for raw model output.
//! Once built it is never mutated; a refinement produces a brand-new graph.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub label: String,
    /// Hierarchy hint for layout; names another node of the same graph.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl Node {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Edge {
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphValidationError {
    #[error("expected a JSON object at the top level")]
    NotAnObject,

    #[error("field '{0}' is missing or not an array")]
    NotAnArray(&'static str),

    #[error("{kind}[{index}] is not an object")]
    EntryNotAnObject { kind: &'static str, index: usize },

    #[error("{kind}[{index}] has a missing or empty '{field}'")]
    MissingField {
        kind: &'static str,
        index: usize,
        field: &'static str,
    },

    #[error("{kind}[{index}] field '{field}' must be a string")]
    NotAString {
        kind: &'static str,
        index: usize,
        field: &'static str,
    },

    #[error("graph has no nodes")]
    Empty,

    #[error("duplicate node id '{0}'")]
    DuplicateNodeId(String),

    #[error("duplicate edge id '{0}'")]
    DuplicateEdgeId(String),

    #[error("edge '{edge}' references unknown node '{node}'")]
    DanglingEdge { edge: String, node: String },

    #[error("node '{node}' names unknown parent '{parent}'")]
    DanglingParent { node: String, parent: String },
}

/// Validated, immutable node/edge structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GraphParts")]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

#[derive(Deserialize)]
struct GraphParts {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

impl TryFrom<GraphParts> for Graph {
    type Error = GraphValidationError;

    fn try_from(parts: GraphParts) -> Result<Self, Self::Error> {
        Graph::new(parts.nodes, parts.edges)
    }
}

impl Graph {
    /// Builds a graph, rejecting empty ids/labels, duplicate ids and dangling references.
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Result<Self, GraphValidationError> {
        if nodes.is_empty() {
            return Err(GraphValidationError::Empty);
        }

        let mut node_ids = HashSet::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            require_non_empty(&node.id, "nodes", index, "id")?;
            require_non_empty(&node.label, "nodes", index, "label")?;
            if !node_ids.insert(node.id.as_str()) {
                return Err(GraphValidationError::DuplicateNodeId(node.id.clone()));
            }
        }

        for node in &nodes {
            if let Some(parent) = &node.parent {
                if parent == &node.id || !node_ids.contains(parent.as_str()) {
                    return Err(GraphValidationError::DanglingParent {
                        node: node.id.clone(),
                        parent: parent.clone(),
                    });
                }
            }
        }

        let mut edge_ids = HashSet::with_capacity(edges.len());
        for (index, edge) in edges.iter().enumerate() {
            require_non_empty(&edge.id, "edges", index, "id")?;
            require_non_empty(&edge.source, "edges", index, "source")?;
            require_non_empty(&edge.target, "edges", index, "target")?;
            if !edge_ids.insert(edge.id.as_str()) {
                return Err(GraphValidationError::DuplicateEdgeId(edge.id.clone()));
            }
            for endpoint in [&edge.source, &edge.target] {
                if !node_ids.contains(endpoint.as_str()) {
                    return Err(GraphValidationError::DanglingEdge {
                        edge: edge.id.clone(),
                        node: endpoint.clone(),
                    });
                }
            }
        }

        Ok(Self { nodes, edges })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_index(&self) -> HashMap<&str, usize> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.as_str(), i))
            .collect()
    }

    /// Edges leaving `id`, in edge order.
    pub fn outgoing<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source == id)
    }

    /// Edge targets of `id` followed by nodes hinting `id` as parent, without repeats.
    pub fn children(&self, id: &str) -> Vec<&Node> {
        let mut out: Vec<&Node> = Vec::new();
        let hinted = self.nodes.iter().filter(|n| n.parent.as_deref() == Some(id));
        for node in self
            .outgoing(id)
            .filter_map(|e| self.node(&e.target))
            .chain(hinted)
        {
            if !out.iter().any(|seen| seen.id == node.id) {
                out.push(node);
            }
        }
        out
    }

    /// Nodes with no incoming edge and no parent hint, in node order.
    pub fn roots(&self) -> Vec<&Node> {
        let targets: HashSet<&str> = self.edges.iter().map(|e| e.target.as_str()).collect();
        self.nodes
            .iter()
            .filter(|n| n.parent.is_none() && !targets.contains(n.id.as_str()))
            .collect()
    }

    pub fn from_json_str(raw: &str) -> Result<Self, GraphParseError> {
        let value: Value = serde_json::from_str(raw)?;
        Ok(parse_graph_value(&value)?)
    }
}

#[derive(Error, Debug)]
pub enum GraphParseError {
    #[error("not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] GraphValidationError),
}

fn require_non_empty(
    value: &str,
    kind: &'static str,
    index: usize,
    field: &'static str,
) -> Result<(), GraphValidationError> {
    if value.trim().is_empty() {
        return Err(GraphValidationError::MissingField { kind, index, field });
    }
    Ok(())
}

/// Structurally checks an untrusted JSON value and builds a [`Graph`] from it.
///
/// Unknown fields are ignored. Nothing is dropped silently: the first invalid
/// entry fails the whole graph.
pub fn parse_graph_value(value: &Value) -> Result<Graph, GraphValidationError> {
    let root = value.as_object().ok_or(GraphValidationError::NotAnObject)?;

    let raw_nodes = root
        .get("nodes")
        .and_then(Value::as_array)
        .ok_or(GraphValidationError::NotAnArray("nodes"))?;
    let raw_edges = root
        .get("edges")
        .and_then(Value::as_array)
        .ok_or(GraphValidationError::NotAnArray("edges"))?;

    let mut nodes = Vec::with_capacity(raw_nodes.len());
    for (index, raw) in raw_nodes.iter().enumerate() {
        let entry = Entry::new(raw, "nodes", index)?;
        nodes.push(Node {
            id: entry.required("id")?,
            label: entry.required("label")?,
            parent: entry.optional("parent")?,
        });
    }

    let mut edges = Vec::with_capacity(raw_edges.len());
    for (index, raw) in raw_edges.iter().enumerate() {
        let entry = Entry::new(raw, "edges", index)?;
        edges.push(Edge {
            id: entry.required("id")?,
            source: entry.required("source")?,
            target: entry.required("target")?,
            label: entry.optional("label")?,
        });
    }

    Graph::new(nodes, edges)
}

struct Entry<'a> {
    object: &'a serde_json::Map<String, Value>,
    kind: &'static str,
    index: usize,
}

impl<'a> Entry<'a> {
    fn new(raw: &'a Value, kind: &'static str, index: usize) -> Result<Self, GraphValidationError> {
        let object = raw
            .as_object()
            .ok_or(GraphValidationError::EntryNotAnObject { kind, index })?;
        Ok(Self {
            object,
            kind,
            index,
        })
    }

    fn required(&self, field: &'static str) -> Result<String, GraphValidationError> {
        match self.optional(field)? {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(GraphValidationError::MissingField {
                kind: self.kind,
                index: self.index,
                field,
            }),
        }
    }

    fn optional(&self, field: &'static str) -> Result<Option<String>, GraphValidationError> {
        match self.object.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(GraphValidationError::NotAString {
                kind: self.kind,
                index: self.index,
                field,
            }),
        }
    }
}
