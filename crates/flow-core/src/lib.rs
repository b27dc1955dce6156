pub mod id;
pub mod layout;
pub mod model;
pub mod store;
pub mod wire;

pub use id::{EdgeId, NodeId};
pub use layout::{CanvasSize, GridSpec, Viewport, ZoomRange, content_bounds, fit_bounds, grid_positions};
pub use model::*;
pub use store::{GraphStore, ReplaceReport, StoreError};
pub use wire::{DiagramDocument, WireEdge, WireNode};

// Re-export kurbo geometry so downstream crates don't need a direct dependency
pub use kurbo::{Point, Rect, Size};
