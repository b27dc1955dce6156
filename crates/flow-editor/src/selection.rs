//! Selection coordination: edge auto-selection and single-entity focus.
//!
//! The coordinator owns no graph state. It reads and writes the `selected`
//! flags in a [`GraphStore`] and derives which entity, if any, the property
//! panel should edit. [`SelectionCoordinator::recompute`] must run after every
//! change to selection flags; the editor does this for every mutation.

use flow_core::store::IdList;
use flow_core::{EdgeId, GraphStore, NodeId};

/// The entity the property panel is editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    None,
    Node(NodeId),
    Edge(EdgeId),
}

/// Pointer mode of the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Select,
    /// Dragging pans the view; node clicks do not select.
    PanOnly,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionCoordinator {
    focus: Focus,
    mode: InteractionMode,
    /// Selected sets seen by the previous recompute, in store order.
    last_nodes: IdList<NodeId>,
    last_edges: IdList<EdgeId>,
    /// Focus set by a node click; survives recomputes until the selection changes.
    pinned: Option<Focus>,
}

impl SelectionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: InteractionMode) {
        self.mode = mode;
    }

    // ─── Gestures ────────────────────────────────────────────────────────

    /// Make `id` the only selected node and focus it. Returns `false` without
    /// touching anything in pan-only mode or when the node is unknown.
    pub fn click_node(&mut self, store: &mut GraphStore, id: NodeId) -> bool {
        if self.mode == InteractionMode::PanOnly || !store.contains_node(id) {
            return false;
        }
        store.deselect_all();
        store.set_node_selected(id, true);
        self.recompute(store);
        // A self-loop on the clicked node is auto-selected too; the click
        // still focuses the node.
        self.focus = Focus::Node(id);
        self.pinned = Some(self.focus);
        true
    }

    /// Make `id` the only selected entity and focus it.
    pub fn click_edge(&mut self, store: &mut GraphStore, id: EdgeId) -> bool {
        if !store.contains_edge(id) {
            return false;
        }
        store.deselect_all();
        store.set_edge_selected(id, true);
        self.recompute(store);
        true
    }

    /// Click on empty canvas: clear everything.
    pub fn click_background(&mut self, store: &mut GraphStore) {
        store.deselect_all();
        self.recompute(store);
    }

    /// Replace the selected-node set (marquee or programmatic selection).
    /// Unknown ids are ignored.
    pub fn select_nodes(&mut self, store: &mut GraphStore, ids: &[NodeId]) {
        let current = store.selected_node_ids();
        for id in current {
            store.set_node_selected(id, false);
        }
        for &id in ids {
            store.set_node_selected(id, true);
        }
        self.recompute(store);
    }

    pub fn select_all(&mut self, store: &mut GraphStore) {
        store.select_all_nodes();
        self.recompute(store);
    }

    pub fn clear(&mut self, store: &mut GraphStore) {
        self.click_background(store);
    }

    // ─── Derivation ──────────────────────────────────────────────────────

    /// Re-derive edge auto-selection and focus from the store's flags.
    ///
    /// When the selected-node set differs from the previous call and is not
    /// empty, every edge is selected exactly when both its endpoints are in
    /// the set. An empty set leaves edge flags alone.
    pub fn recompute(&mut self, store: &mut GraphStore) {
        let nodes = store.selected_node_ids();
        if nodes != self.last_nodes && !nodes.is_empty() {
            let flags: Vec<(EdgeId, bool)> = store
                .edges()
                .map(|e| (e.id, nodes.contains(&e.source) && nodes.contains(&e.target)))
                .collect();
            for (id, selected) in flags {
                store.set_edge_selected(id, selected);
            }
        }

        let edges = store.selected_edge_ids();
        let unchanged = nodes == self.last_nodes && edges == self.last_edges;
        self.focus = match (self.pinned, nodes.as_slice(), edges.as_slice()) {
            (Some(pinned), _, _) if unchanged => pinned,
            (_, [node], []) => Focus::Node(*node),
            (_, [], [edge]) => Focus::Edge(*edge),
            _ => Focus::None,
        };
        if !unchanged {
            self.pinned = None;
        }
        log::trace!("selection: {} nodes, {} edges, focus {:?}", nodes.len(), edges.len(), self.focus);
        self.last_nodes = nodes;
        self.last_edges = edges;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_core::{Edge, Node, NodeKind, Position};

    fn id(s: &str) -> NodeId {
        NodeId::intern(s)
    }

    fn eid(s: &str) -> EdgeId {
        EdgeId::intern(s)
    }

    fn store() -> GraphStore {
        let mut store = GraphStore::new();
        for n in ["sa", "sb", "sc"] {
            store
                .add_node(Node::new(id(n), NodeKind::Activity, Position::default()))
                .unwrap();
        }
        store.add_edge(Edge::new(eid("sab"), id("sa"), id("sb"))).unwrap();
        store.add_edge(Edge::new(eid("sbc"), id("sb"), id("sc"))).unwrap();
        store
    }

    #[test]
    fn selecting_both_endpoints_selects_edge() {
        let mut store = store();
        let mut sel = SelectionCoordinator::new();
        sel.select_nodes(&mut store, &[id("sa"), id("sb")]);
        assert_eq!(store.selected_edge_ids().as_slice(), &[eid("sab")]);
        assert_eq!(sel.focus(), Focus::None);
    }

    #[test]
    fn node_click_focuses_node_and_clears_edge() {
        let mut store = store();
        let mut sel = SelectionCoordinator::new();
        sel.click_edge(&mut store, eid("sbc"));
        assert_eq!(sel.focus(), Focus::Edge(eid("sbc")));

        assert!(sel.click_node(&mut store, id("sa")));
        assert_eq!(sel.focus(), Focus::Node(id("sa")));
        assert!(store.selected_edge_ids().is_empty());
    }

    #[test]
    fn edge_click_is_sole_selection() {
        let mut store = store();
        let mut sel = SelectionCoordinator::new();
        sel.select_nodes(&mut store, &[id("sa"), id("sb")]);
        sel.click_edge(&mut store, eid("sbc"));
        assert!(store.selected_node_ids().is_empty());
        assert_eq!(store.selected_edge_ids().as_slice(), &[eid("sbc")]);
        assert_eq!(sel.focus(), Focus::Edge(eid("sbc")));
    }

    #[test]
    fn pan_only_ignores_node_clicks() {
        let mut store = store();
        let mut sel = SelectionCoordinator::new();
        sel.set_mode(InteractionMode::PanOnly);
        assert!(!sel.click_node(&mut store, id("sa")));
        assert!(store.selected_node_ids().is_empty());
        assert_eq!(sel.focus(), Focus::None);
    }

    #[test]
    fn self_loop_click_keeps_node_focus() {
        let mut store = store();
        store.add_edge(Edge::new(eid("saa"), id("sa"), id("sa"))).unwrap();
        let mut sel = SelectionCoordinator::new();
        sel.click_node(&mut store, id("sa"));
        assert_eq!(store.selected_edge_ids().as_slice(), &[eid("saa")]);
        assert_eq!(sel.focus(), Focus::Node(id("sa")));
    }

    #[test]
    fn removed_focus_collapses() {
        let mut store = store();
        let mut sel = SelectionCoordinator::new();
        sel.click_node(&mut store, id("sc"));
        store.remove_node(id("sc"));
        sel.recompute(&mut store);
        assert_eq!(sel.focus(), Focus::None);
    }
}
