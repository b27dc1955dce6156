//! Subgraph copy and paste.
//!
//! The buffer holds deep clones, so later edits to the originals never leak
//! into a paste. Each paste mints fresh ids, which keeps repeated pastes of
//! the same buffer from colliding with each other or with the originals.

use crate::config::ClipboardConfig;
use flow_core::{Edge, EdgeId, GraphStore, Node, NodeId};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClipboardBuffer {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl ClipboardBuffer {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Ids of the entities one paste inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pasted {
    pub nodes: Vec<NodeId>,
    pub edges: Vec<EdgeId>,
}

#[derive(Debug, Clone, Default)]
pub struct ClipboardEngine {
    buffer: ClipboardBuffer,
    config: ClipboardConfig,
}

impl ClipboardEngine {
    pub fn new(config: ClipboardConfig) -> Self {
        Self {
            buffer: ClipboardBuffer::default(),
            config,
        }
    }

    pub fn buffer(&self) -> &ClipboardBuffer {
        &self.buffer
    }

    pub fn has_content(&self) -> bool {
        !self.buffer.is_empty()
    }

    /// Capture the selected nodes, the edges between them, and any edge that
    /// is itself selected. Returns `false` (buffer untouched) with no
    /// selected nodes.
    pub fn copy(&mut self, store: &GraphStore) -> bool {
        let selected = store.selected_node_ids();
        if selected.is_empty() {
            log::debug!("copy ignored: no nodes selected");
            return false;
        }
        let nodes: Vec<Node> = store.nodes().filter(|n| n.selected).cloned().collect();
        let edges: Vec<Edge> = store
            .edges()
            .filter(|e| e.selected || (selected.contains(&e.source) && selected.contains(&e.target)))
            .cloned()
            .collect();
        log::debug!("copied {} nodes, {} edges", nodes.len(), edges.len());
        self.buffer = ClipboardBuffer { nodes, edges };
        true
    }

    /// Copy, then remove the selected nodes and their edges.
    pub fn cut(&mut self, store: &mut GraphStore) -> bool {
        if !self.copy(store) {
            return false;
        }
        for id in store.selected_node_ids() {
            store.remove_node(id);
        }
        for id in store.selected_edge_ids() {
            store.remove_edge(id);
        }
        true
    }

    /// Insert a remapped, offset copy of the buffer and select exactly it.
    /// `None` when the buffer is empty; the store is then left untouched.
    pub fn paste(&self, store: &mut GraphStore) -> Option<Pasted> {
        if self.buffer.is_empty() {
            log::debug!("paste ignored: clipboard empty");
            return None;
        }

        let mut remap: HashMap<NodeId, NodeId> = HashMap::with_capacity(self.buffer.nodes.len());
        let mut nodes = Vec::with_capacity(self.buffer.nodes.len());
        for original in &self.buffer.nodes {
            let id = NodeId::unique(original.id.as_str(), |candidate| {
                store.contains_node(candidate) || remap.values().any(|&v| v == candidate)
            });
            remap.insert(original.id, id);
            let mut node = original.clone();
            node.id = id;
            node.position = node
                .position
                .offset(self.config.paste_offset_x, self.config.paste_offset_y);
            nodes.push(node);
        }

        let mut edges: Vec<Edge> = Vec::with_capacity(self.buffer.edges.len());
        for original in &self.buffer.edges {
            let (Some(&source), Some(&target)) =
                (remap.get(&original.source), remap.get(&original.target))
            else {
                log::warn!("paste: dropping edge {} with an endpoint outside the copy", original.id);
                continue;
            };
            let id = EdgeId::unique(original.id.as_str(), |candidate| {
                store.contains_edge(candidate) || edges.iter().any(|e| e.id == candidate)
            });
            let mut edge = original.clone();
            edge.id = id;
            edge.source = source;
            edge.target = target;
            edges.push(edge);
        }

        let pasted = Pasted {
            nodes: nodes.iter().map(|n| n.id).collect(),
            edges: edges.iter().map(|e| e.id).collect(),
        };
        if let Err(err) = store.insert_subgraph(nodes, edges) {
            log::warn!("paste rejected: {err}");
            return None;
        }
        store.deselect_all();
        for &id in &pasted.nodes {
            store.set_node_selected(id, true);
        }
        for &id in &pasted.edges {
            store.set_edge_selected(id, true);
        }
        Some(pasted)
    }
}
