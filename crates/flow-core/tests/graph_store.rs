//! Integration tests: wire decoding feeding the graph store.
//!
//! Exercises the path a parse result takes: JSON response → lenient decode →
//! wholesale replace, checking the endpoint invariant at every step.

use flow_core::wire::ParseResponse;
use flow_core::*;
use pretty_assertions::assert_eq;

fn parsed() -> Diagram {
    let resp: ParseResponse =
        serde_json::from_str(include_str!("fixtures/parse_response.json")).unwrap();
    assert!(resp.success);
    resp.into_diagram("Updated Diagram")
}

fn node(id: &str) -> Node {
    Node::new(NodeId::intern(id), NodeKind::Activity, Position::default())
}

fn edge(id: &str, from: &str, to: &str) -> Edge {
    Edge::new(EdgeId::intern(id), NodeId::intern(from), NodeId::intern(to))
}

// ─── Parse result → store ───────────────────────────────────────────────

#[test]
fn parse_response_decodes_every_node() {
    let diagram = parsed();
    assert_eq!(diagram.title, "Order Fulfilment");
    assert_eq!(diagram.nodes.len(), 4);

    let ship = diagram.node(NodeId::intern("node-ship-2")).unwrap();
    assert_eq!(ship.shape, NodeShape::Rounded);
    assert_eq!(ship.style.font.weight, 700);
    assert_eq!(ship.kind, NodeKind::Activity);
}

#[test]
fn replace_drops_edge_to_unknown_node() {
    let diagram = parsed();
    let mut store = GraphStore::new();
    let report = store.replace(diagram.nodes, diagram.edges);

    assert_eq!(store.node_count(), 4);
    assert_eq!(store.edge_count(), 2);
    assert_eq!(
        report.dangling_edges,
        vec![EdgeId::intern("node-check_stock-1-refund")]
    );
    assert!(store.dangling_edges().is_empty());
}

#[test]
fn snapshot_roundtrips_through_document() {
    let diagram = parsed();
    let mut store = GraphStore::new();
    store.replace(diagram.nodes, diagram.edges);

    let snapshot = store.snapshot("Order Fulfilment");
    let json = serde_json::to_string(&DiagramDocument::from(&snapshot)).unwrap();
    let back: DiagramDocument = serde_json::from_str(&json).unwrap();
    assert_eq!(back.into_diagram(), snapshot);
}

// ─── Mutation sequences ─────────────────────────────────────────────────

#[test]
fn no_dangling_edges_after_mixed_mutations() {
    let mut store = GraphStore::new();
    for id in ["a", "b", "c", "d"] {
        store.add_node(node(id)).unwrap();
    }
    store.add_edge(edge("ab", "a", "b")).unwrap();
    store.add_edge(edge("bc", "b", "c")).unwrap();
    store.add_edge(edge("cd", "c", "d")).unwrap();
    store.add_edge(edge("da", "d", "a")).unwrap();
    assert!(store.dangling_edges().is_empty());

    store.remove_node(NodeId::intern("b"));
    assert!(store.dangling_edges().is_empty());
    assert!(store.add_edge(edge("xb", "a", "b")).is_err());

    store.update_node(NodeId::intern("c"), NodeUpdate::position(5.0, 5.0));
    store.remove_edge(EdgeId::intern("cd"));
    store.add_node(node("b")).unwrap();
    store.add_edge(edge("ab2", "a", "b")).unwrap();
    assert!(store.dangling_edges().is_empty());

    let ids: Vec<_> = store.edges().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["da", "ab2"]);
}

#[test]
fn clear_empties_both_sets() {
    let diagram = parsed();
    let mut store = GraphStore::new();
    store.replace(diagram.nodes, diagram.edges);
    store.clear();
    assert!(store.is_empty());
    assert_eq!(store.edge_count(), 0);
}
