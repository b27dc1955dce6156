//! The Graph Store: canonical node and edge sets.
//!
//! Every mutation keeps the endpoint invariant (each edge's `source` and
//! `target` exist in the node set) before it returns, so no reader ever
//! observes a dangling edge. Iteration follows insertion order.

use crate::id::{EdgeId, NodeId};
use crate::model::{Diagram, Edge, EdgeUpdate, Node, NodeUpdate, Position};
use indexmap::{IndexMap, IndexSet};
use smallvec::SmallVec;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("node `{0}` already exists")]
    DuplicateNode(NodeId),

    #[error("edge `{0}` already exists")]
    DuplicateEdge(EdgeId),

    #[error("edge `{edge}` references missing node `{node}`")]
    MissingEndpoint { edge: EdgeId, node: NodeId },

    #[error("self-loop on node `{0}` is not allowed")]
    SelfLoop(NodeId),
}

/// Inline-capacity id list for selection queries.
pub type IdList<T> = SmallVec<[T; 4]>;

/// What [`GraphStore::replace`] had to discard to keep the store valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaceReport {
    pub duplicate_nodes: Vec<NodeId>,
    pub duplicate_edges: Vec<EdgeId>,
    pub dangling_edges: Vec<EdgeId>,
}

impl ReplaceReport {
    pub fn is_clean(&self) -> bool {
        self.duplicate_nodes.is_empty()
            && self.duplicate_edges.is_empty()
            && self.dangling_edges.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct GraphStore {
    nodes: IndexMap<NodeId, Node>,
    edges: IndexMap<EdgeId, Edge>,
    allow_self_loops: bool,
    /// Bumped on every content change. Selection changes do not count.
    revision: u64,
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            allow_self_loops: true,
            revision: 0,
        }
    }

    /// A store that rejects edges whose source equals their target.
    #[must_use]
    pub fn without_self_loops() -> Self {
        Self {
            allow_self_loops: false,
            ..Self::new()
        }
    }

    pub fn allows_self_loops(&self) -> bool {
        self.allow_self_loops
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn nodes(&self) -> impl ExactSizeIterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn edges(&self) -> impl ExactSizeIterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(&id)
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edges.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ─── Node mutations ──────────────────────────────────────────────────

    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if self.nodes.contains_key(&node.id) {
            return Err(StoreError::DuplicateNode(node.id));
        }
        self.nodes.insert(node.id, node);
        self.bump();
        Ok(())
    }

    /// Remove a node together with every edge touching it.
    /// Returns the node and the cascaded edges, or `None` if it was absent.
    pub fn remove_node(&mut self, id: NodeId) -> Option<(Node, Vec<Edge>)> {
        let node = self.nodes.shift_remove(&id)?;
        let mut removed = Vec::new();
        self.edges.retain(|_, edge| {
            if edge.touches(id) {
                removed.push(edge.clone());
                false
            } else {
                true
            }
        });
        self.bump();
        Some((node, removed))
    }

    /// Apply a partial update. Returns `false` (no-op) if the node is missing.
    pub fn update_node(&mut self, id: NodeId, update: NodeUpdate) -> bool {
        let Some(node) = self.nodes.get_mut(&id) else {
            return false;
        };
        update.apply(node);
        self.bump();
        true
    }

    /// Returns `true` only if the node exists and actually moved.
    pub fn set_node_position(&mut self, id: NodeId, position: Position) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) if node.position != position => {
                node.position = position;
                self.bump();
                true
            }
            _ => false,
        }
    }

    // ─── Edge mutations ──────────────────────────────────────────────────

    fn validate_edge(&self, edge: &Edge, extra_nodes: &IndexSet<NodeId>) -> Result<()> {
        for endpoint in [edge.source, edge.target] {
            if !self.nodes.contains_key(&endpoint) && !extra_nodes.contains(&endpoint) {
                return Err(StoreError::MissingEndpoint {
                    edge: edge.id,
                    node: endpoint,
                });
            }
        }
        if !self.allow_self_loops && edge.source == edge.target {
            return Err(StoreError::SelfLoop(edge.source));
        }
        Ok(())
    }

    pub fn add_edge(&mut self, edge: Edge) -> Result<()> {
        if self.edges.contains_key(&edge.id) {
            return Err(StoreError::DuplicateEdge(edge.id));
        }
        self.validate_edge(&edge, &IndexSet::new())?;
        self.edges.insert(edge.id, edge);
        self.bump();
        Ok(())
    }

    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let edge = self.edges.shift_remove(&id)?;
        self.bump();
        Some(edge)
    }

    /// Apply a partial update. `Ok(false)` if the edge is missing; an error
    /// (and no change) if the update would leave a dangling endpoint.
    pub fn update_edge(&mut self, id: EdgeId, update: EdgeUpdate) -> Result<bool> {
        let Some(current) = self.edges.get(&id) else {
            return Ok(false);
        };
        let mut updated = current.clone();
        update.apply(&mut updated);
        self.validate_edge(&updated, &IndexSet::new())?;
        self.edges.insert(id, updated);
        self.bump();
        Ok(true)
    }

    // ─── Bulk mutations ──────────────────────────────────────────────────

    /// Append a subgraph atomically: either every node and edge is inserted
    /// or, on the first conflict, nothing is.
    pub fn insert_subgraph(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) -> Result<()> {
        let mut incoming = IndexSet::with_capacity(nodes.len());
        for node in &nodes {
            if self.nodes.contains_key(&node.id) || !incoming.insert(node.id) {
                return Err(StoreError::DuplicateNode(node.id));
            }
        }
        let mut incoming_edges = IndexSet::with_capacity(edges.len());
        for edge in &edges {
            if self.edges.contains_key(&edge.id) || !incoming_edges.insert(edge.id) {
                return Err(StoreError::DuplicateEdge(edge.id));
            }
            self.validate_edge(edge, &incoming)?;
        }
        self.nodes.extend(nodes.into_iter().map(|n| (n.id, n)));
        self.edges.extend(edges.into_iter().map(|e| (e.id, e)));
        self.bump();
        Ok(())
    }

    /// Replace both sets wholesale. Duplicate ids keep their first occurrence;
    /// edges with a missing endpoint (or a forbidden self-loop) are dropped.
    pub fn replace(&mut self, nodes: Vec<Node>, edges: Vec<Edge>) -> ReplaceReport {
        let mut report = ReplaceReport::default();

        let mut next_nodes = IndexMap::with_capacity(nodes.len());
        for node in nodes {
            if next_nodes.contains_key(&node.id) {
                report.duplicate_nodes.push(node.id);
                continue;
            }
            next_nodes.insert(node.id, node);
        }

        let mut next_edges = IndexMap::with_capacity(edges.len());
        for edge in edges {
            if next_edges.contains_key(&edge.id) {
                report.duplicate_edges.push(edge.id);
                continue;
            }
            let endpoints_ok =
                next_nodes.contains_key(&edge.source) && next_nodes.contains_key(&edge.target);
            let loop_ok = self.allow_self_loops || edge.source != edge.target;
            if !endpoints_ok || !loop_ok {
                log::warn!("dropping edge {} ({} -> {})", edge.id, edge.source, edge.target);
                report.dangling_edges.push(edge.id);
                continue;
            }
            next_edges.insert(edge.id, edge);
        }

        self.nodes = next_nodes;
        self.edges = next_edges;
        self.bump();
        report
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.bump();
    }

    // ─── Selection flags ─────────────────────────────────────────────────

    /// Returns `true` if the flag changed.
    pub fn set_node_selected(&mut self, id: NodeId, selected: bool) -> bool {
        match self.nodes.get_mut(&id) {
            Some(node) if node.selected != selected => {
                node.selected = selected;
                true
            }
            _ => false,
        }
    }

    /// Returns `true` if the flag changed.
    pub fn set_edge_selected(&mut self, id: EdgeId, selected: bool) -> bool {
        match self.edges.get_mut(&id) {
            Some(edge) if edge.selected != selected => {
                edge.selected = selected;
                true
            }
            _ => false,
        }
    }

    pub fn deselect_all(&mut self) {
        self.nodes.values_mut().for_each(|n| n.selected = false);
        self.edges.values_mut().for_each(|e| e.selected = false);
    }

    pub fn select_all_nodes(&mut self) {
        self.nodes.values_mut().for_each(|n| n.selected = true);
    }

    pub fn selected_node_ids(&self) -> IdList<NodeId> {
        self.nodes.values().filter(|n| n.selected).map(|n| n.id).collect()
    }

    pub fn selected_edge_ids(&self) -> IdList<EdgeId> {
        self.edges.values().filter(|e| e.selected).map(|e| e.id).collect()
    }

    // ─── Snapshots ───────────────────────────────────────────────────────

    /// Clone the current contents into a [`Diagram`].
    pub fn snapshot(&self, title: &str) -> Diagram {
        Diagram {
            title: title.to_string(),
            nodes: self.nodes.values().cloned().collect(),
            edges: self.edges.values().cloned().collect(),
        }
    }

    /// Edges violating the endpoint invariant. Always empty for a store that
    /// was only mutated through this API.
    pub fn dangling_edges(&self) -> Vec<EdgeId> {
        self.edges
            .values()
            .filter(|e| !self.nodes.contains_key(&e.source) || !self.nodes.contains_key(&e.target))
            .map(|e| e.id)
            .collect()
    }
}
