//! Grid auto-alignment.

use crate::config::AlignConfig;
use flow_core::layout::grid_positions;
use flow_core::{GraphStore, NodeId};

/// Lay the selected nodes (or every node, when none is selected) out on a
/// `ceil(sqrt(n))`-column grid in store order. Returns the moved ids; empty
/// when there was nothing to align.
pub fn auto_align(store: &mut GraphStore, config: &AlignConfig) -> Vec<NodeId> {
    let mut subset: Vec<NodeId> = store.selected_node_ids().into_vec();
    if subset.is_empty() {
        subset = store.nodes().map(|n| n.id).collect();
    }
    if subset.is_empty() {
        log::debug!("auto-align ignored: no nodes");
        return subset;
    }

    let positions = grid_positions(subset.len(), config.grid());
    for (&id, position) in subset.iter().zip(positions) {
        log::trace!("align {id} -> ({}, {})", position.x, position.y);
        store.set_node_position(id, position);
    }
    log::info!("auto-aligned {} nodes", subset.len());
    subset
}
