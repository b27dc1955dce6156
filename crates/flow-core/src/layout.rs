//! Viewport and layout math.
//!
//! Canvas coordinates map to screen pixels through a [`Viewport`]:
//! `screen = canvas * zoom + (x, y)`. The grid placement used by auto-align
//! and the fit-to-content framing used by export both live here so they can
//! be tested without a surface.

use crate::model::{Node, Position};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};

/// Pan offset and zoom of a rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: f64,
    pub y: f64,
    pub zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Viewport {
    pub fn to_screen(&self, p: Point) -> Point {
        Point::new(p.x * self.zoom + self.x, p.y * self.zoom + self.y)
    }

    pub fn to_canvas(&self, p: Point) -> Point {
        Point::new((p.x - self.x) / self.zoom, (p.y - self.y) / self.zoom)
    }
}

/// Pixel dimensions of a rendering surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl CanvasSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn as_size(self) -> Size {
        Size::new(f64::from(self.width), f64::from(self.height))
    }
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self::new(1024, 768)
    }
}

/// Inclusive zoom range for fit operations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ZoomRange {
    fn default() -> Self {
        Self { min: 0.1, max: 2.0 }
    }
}

impl ZoomRange {
    pub fn clamp(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min, self.max)
    }
}

// ─── Bounds ──────────────────────────────────────────────────────────────

/// Union of every node's footprint rectangle anchored at its position.
/// `None` when there are no nodes.
pub fn content_bounds<'a>(nodes: impl IntoIterator<Item = &'a Node>, footprint: Size) -> Option<Rect> {
    nodes
        .into_iter()
        .map(|n| {
            let origin = Point::new(f64::from(n.position.x), f64::from(n.position.y));
            Rect::from_origin_size(origin, footprint)
        })
        .reduce(|acc, r| acc.union(r))
}

/// Viewport that centres `bounds` (inflated by `padding` on every side)
/// inside `canvas`, with the zoom clamped to `zoom`.
pub fn fit_bounds(bounds: Rect, canvas: CanvasSize, padding: f64, zoom: ZoomRange) -> Viewport {
    let framed = bounds.inflate(padding, padding);
    let view = canvas.as_size();

    let raw = if framed.width() > 0.0 && framed.height() > 0.0 {
        (view.width / framed.width()).min(view.height / framed.height())
    } else {
        1.0
    };
    let scale = zoom.clamp(raw);
    let center = framed.center();

    Viewport {
        x: view.width / 2.0 - center.x * scale,
        y: view.height / 2.0 - center.y * scale,
        zoom: scale,
    }
}

// ─── Grid placement ──────────────────────────────────────────────────────

/// Origin and spacing for [`grid_positions`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSpec {
    pub origin: Position,
    pub column_spacing: f32,
    pub row_spacing: f32,
}

/// Number of columns for a square-ish grid of `count` cells.
pub fn grid_columns(count: usize) -> usize {
    if count == 0 {
        return 0;
    }
    let mut cols = (count as f64).sqrt().ceil() as usize;
    // Guard against float rounding at perfect squares.
    while cols * cols < count {
        cols += 1;
    }
    while cols > 1 && (cols - 1) * (cols - 1) >= count {
        cols -= 1;
    }
    cols
}

/// Positions for `count` cells laid out row-major.
pub fn grid_positions(count: usize, spec: GridSpec) -> Vec<Position> {
    let cols = grid_columns(count);
    (0..count)
        .map(|i| {
            let row = i / cols;
            let col = i % cols;
            spec.origin.offset(
                col as f32 * spec.column_spacing,
                row as f32 * spec.row_spacing,
            )
        })
        .collect()
}
