//! Property tests: no edge ever dangles, whatever the mutation sequence.
//!
//! Ids come from small pools so that generated operations collide, target
//! missing nodes and rewire existing edges often.

use flow_core::{Edge, EdgeId, EdgeUpdate, GraphStore, Node, NodeId, NodeKind, NodeUpdate, Position};
use flow_editor::ClipboardEngine;
use proptest::prelude::*;

const POOL: u8 = 6;

#[derive(Debug, Clone)]
enum Op {
    AddNode(u8),
    RemoveNode(u8),
    UpdateNode(u8),
    MoveNode(u8, i16),
    AddEdge(u8, u8, u8),
    RemoveEdge(u8),
    Retarget(u8, u8),
    Replace(Vec<u8>, Vec<(u8, u8, u8)>),
    InsertSubgraph(Vec<u8>, Vec<(u8, u8, u8)>),
    Select(u8),
    DeselectAll,
    Copy,
    Cut,
    Paste,
    Clear,
}

fn node_id(n: u8) -> NodeId {
    NodeId::intern(&format!("prop-n{n}"))
}

fn edge_id(n: u8) -> EdgeId {
    EdgeId::intern(&format!("prop-e{n}"))
}

fn node(n: u8) -> Node {
    Node::new(node_id(n), NodeKind::Activity, Position::default())
}

fn edge((id, source, target): (u8, u8, u8)) -> Edge {
    Edge::new(edge_id(id), node_id(source), node_id(target))
}

// ===================
// Strategies
// ===================

fn small() -> impl Strategy<Value = u8> {
    0..POOL
}

fn edge_triple() -> impl Strategy<Value = (u8, u8, u8)> {
    (small(), small(), small())
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => small().prop_map(Op::AddNode),
        2 => small().prop_map(Op::RemoveNode),
        1 => small().prop_map(Op::UpdateNode),
        1 => (small(), any::<i16>()).prop_map(|(n, x)| Op::MoveNode(n, x)),
        3 => edge_triple().prop_map(|(e, s, t)| Op::AddEdge(e, s, t)),
        1 => small().prop_map(Op::RemoveEdge),
        2 => (small(), small()).prop_map(|(e, n)| Op::Retarget(e, n)),
        1 => (
            prop::collection::vec(small(), 0..5),
            prop::collection::vec(edge_triple(), 0..6)
        )
            .prop_map(|(n, e)| Op::Replace(n, e)),
        1 => (
            prop::collection::vec(small(), 0..4),
            prop::collection::vec(edge_triple(), 0..4)
        )
            .prop_map(|(n, e)| Op::InsertSubgraph(n, e)),
        2 => small().prop_map(Op::Select),
        1 => Just(Op::DeselectAll),
        1 => Just(Op::Copy),
        1 => Just(Op::Cut),
        2 => Just(Op::Paste),
        1 => Just(Op::Clear),
    ]
}

// ===================
// Property Test Functions
// ===================

fn apply(store: &mut GraphStore, clipboard: &mut ClipboardEngine, op: Op) {
    // Rejected operations are expected; only the invariant matters here.
    match op {
        Op::AddNode(n) => {
            let _ = store.add_node(node(n));
        }
        Op::RemoveNode(n) => {
            store.remove_node(node_id(n));
        }
        Op::UpdateNode(n) => {
            store.update_node(node_id(n), NodeUpdate::label(format!("label {n}")));
        }
        Op::MoveNode(n, x) => {
            store.set_node_position(node_id(n), Position::new(f32::from(x), 0.0));
        }
        Op::AddEdge(e, s, t) => {
            let _ = store.add_edge(edge((e, s, t)));
        }
        Op::RemoveEdge(e) => {
            store.remove_edge(edge_id(e));
        }
        Op::Retarget(e, n) => {
            let update = EdgeUpdate {
                target: Some(node_id(n)),
                ..Default::default()
            };
            let _ = store.update_edge(edge_id(e), update);
        }
        Op::Replace(nodes, edges) => {
            store.replace(
                nodes.into_iter().map(node).collect(),
                edges.into_iter().map(edge).collect(),
            );
        }
        Op::InsertSubgraph(nodes, edges) => {
            let _ = store.insert_subgraph(
                nodes.into_iter().map(node).collect(),
                edges.into_iter().map(edge).collect(),
            );
        }
        Op::Select(n) => {
            store.set_node_selected(node_id(n), true);
        }
        Op::DeselectAll => store.deselect_all(),
        Op::Copy => {
            clipboard.copy(store);
        }
        Op::Cut => {
            clipboard.cut(store);
        }
        Op::Paste => {
            clipboard.paste(store);
        }
        Op::Clear => store.clear(),
    }
}

fn check_no_dangling_edges(ops: Vec<Op>, self_loops: bool) -> Result<(), TestCaseError> {
    let mut store = if self_loops {
        GraphStore::new()
    } else {
        GraphStore::without_self_loops()
    };
    let mut clipboard = ClipboardEngine::default();
    for (step, op) in ops.into_iter().enumerate() {
        let label = format!("{op:?}");
        apply(&mut store, &mut clipboard, op);
        let dangling = store.dangling_edges();
        prop_assert!(
            dangling.is_empty(),
            "step {step} ({label}) left dangling edges: {dangling:?}"
        );
        if !self_loops {
            prop_assert!(store.edges().all(|e| e.source != e.target));
        }
    }
    Ok(())
}

// ===================
// Proptest Wrappers
// ===================

proptest! {
    #[test]
    fn no_mutation_sequence_leaves_a_dangling_edge(ops in prop::collection::vec(op_strategy(), 1..40)) {
        check_no_dangling_edges(ops, true)?;
    }

    #[test]
    fn self_loop_policy_survives_every_sequence(ops in prop::collection::vec(op_strategy(), 1..40)) {
        check_no_dangling_edges(ops, false)?;
    }
}
