//! SVG generation for diagrams.
//!
//! Two entry points share the node and edge painters:
//!
//! - [`render_diagram_svg`] draws the whole diagram at canvas scale on a white
//!   page, independent of any viewport. This is the vector export.
//! - [`render_scene_svg`] draws what a live surface shows: the diagram under a
//!   viewport transform, plus whatever chrome is switched on.

use crate::surface::ChromeState;
use flow_core::layout::{CanvasSize, Viewport, content_bounds};
use flow_core::{Color, CurveKind, Diagram, Edge, Node, NodeShape, Point, Size};
use kurbo::BezPath;
use std::collections::BTreeSet;
use std::fmt::Write;

/// Per-node footprint in canvas units.
pub const NODE_SIZE: Size = Size::new(200.0, 80.0);

const SELECTION_COLOR: &str = "#2563EB";
const LABEL_COLOR: &str = "#374151";
const DOT_COLOR: &str = "#91919A";
const DOT_GAP: f64 = 12.0;
const STEP_RADIUS: f64 = 8.0;

pub fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// SVG paint for a color: `#RRGGBB`, with alpha as a separate opacity.
fn paint(color: Color) -> String {
    if color.a == 0xFF {
        color.to_hex()
    } else {
        format!(
            "#{:02X}{:02X}{:02X}\" fill-opacity=\"{:.3}",
            color.r,
            color.g,
            color.b,
            f64::from(color.a) / 255.0
        )
    }
}

fn marker_id(color: Color) -> String {
    format!("arrow-{}", color.to_hex().trim_start_matches('#'))
}

// ─── Edge geometry ───────────────────────────────────────────────────────

fn node_origin(node: &Node) -> Point {
    Point::new(f64::from(node.position.x), f64::from(node.position.y))
}

/// Bottom-centre of the source to top-centre of the target.
pub fn edge_endpoints(source: &Node, target: &Node) -> (Point, Point) {
    let s = node_origin(source);
    let t = node_origin(target);
    (
        Point::new(s.x + NODE_SIZE.width / 2.0, s.y + NODE_SIZE.height),
        Point::new(t.x + NODE_SIZE.width / 2.0, t.y),
    )
}

fn step_path(a: Point, b: Point, radius: f64) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(a);
    let mid_y = (a.y + b.y) / 2.0;
    let dx = b.x - a.x;
    let r = radius.min(dx.abs() / 2.0).min((mid_y - a.y).abs());
    if r <= f64::EPSILON {
        path.line_to((a.x, mid_y));
        path.line_to((b.x, mid_y));
        path.line_to(b);
        return path;
    }
    let sx = dx.signum();
    let sy = if b.y >= a.y { 1.0 } else { -1.0 };
    path.line_to((a.x, mid_y - sy * r));
    path.quad_to((a.x, mid_y), (a.x + sx * r, mid_y));
    path.line_to((b.x - sx * r, mid_y));
    path.quad_to((b.x, mid_y), (b.x, mid_y + sy * r));
    path.line_to(b);
    path
}

pub fn edge_path(a: Point, b: Point, curve: CurveKind) -> BezPath {
    match curve {
        CurveKind::Straight => {
            let mut path = BezPath::new();
            path.move_to(a);
            path.line_to(b);
            path
        }
        CurveKind::Step => step_path(a, b, 0.0),
        CurveKind::SmoothStep => step_path(a, b, STEP_RADIUS),
        CurveKind::Bezier => {
            let k = ((b.y - a.y).abs() / 2.0).max(40.0);
            let mut path = BezPath::new();
            path.move_to(a);
            path.curve_to(Point::new(a.x, a.y + k), Point::new(b.x, b.y - k), b);
            path
        }
    }
}

// ─── Painters ────────────────────────────────────────────────────────────

fn write_markers(out: &mut String, edges: &[Edge]) {
    let colors: BTreeSet<String> = edges
        .iter()
        .filter_map(|e| e.arrow.map(|a| a.color.to_hex()))
        .collect();
    if colors.is_empty() {
        return;
    }
    out.push_str("<defs>");
    for hex in colors {
        let id = format!("arrow-{}", hex.trim_start_matches('#'));
        let _ = write!(
            out,
            r#"<marker id="{id}" markerWidth="10" markerHeight="7" refX="9" refY="3.5" orient="auto" markerUnits="strokeWidth"><polygon points="0 0, 10 3.5, 0 7" fill="{hex}"/></marker>"#
        );
    }
    out.push_str("</defs>");
}

fn write_edge(out: &mut String, edge: &Edge, diagram: &Diagram, highlight: bool) {
    let (Some(source), Some(target)) = (diagram.node(edge.source), diagram.node(edge.target)) else {
        return;
    };
    let (a, b) = edge_endpoints(source, target);
    let path = edge_path(a, b, edge.curve);
    let selected = highlight && edge.selected;
    let stroke = if selected {
        SELECTION_COLOR.to_string()
    } else {
        edge.stroke.color.to_hex()
    };
    let width = edge.stroke.width + if selected { 1.0 } else { 0.0 };
    let _ = write!(
        out,
        r#"<path d="{}" fill="none" stroke="{stroke}" stroke-width="{width}""#,
        path.to_svg()
    );
    if edge.animated {
        out.push_str(r#" stroke-dasharray="5 5""#);
    }
    if let Some(arrow) = edge.arrow {
        let _ = write!(out, r#" marker-end="url(#{})""#, marker_id(arrow.color));
    }
    out.push_str("/>");

    if let Some(label) = edge.label.as_deref() {
        let mid = a.midpoint(b);
        let _ = write!(
            out,
            r#"<text x="{}" y="{}" text-anchor="middle" font-family="Arial" font-size="12" fill="{LABEL_COLOR}" dominant-baseline="middle">{}</text>"#,
            mid.x,
            mid.y,
            escape_xml(label)
        );
    }
}

fn write_node(out: &mut String, node: &Node, highlight: bool) {
    let Point { x, y } = node_origin(node);
    let (w, h) = (NODE_SIZE.width, NODE_SIZE.height);
    let (cx, cy) = (x + w / 2.0, y + h / 2.0);
    let style = &node.style;
    let fill = paint(style.fill);
    let (stroke, stroke_width) = if highlight && node.selected {
        (SELECTION_COLOR.to_string(), 3)
    } else {
        (style.effective_border().to_hex(), 2)
    };

    let outline = match node.shape {
        NodeShape::Circle => format!(r#"<circle cx="{cx}" cy="{cy}" r="{}""#, w.min(h) / 2.0),
        NodeShape::Diamond => format!(
            r#"<polygon points="{cx},{y} {},{cy} {cx},{} {x},{cy}""#,
            x + w,
            y + h
        ),
        NodeShape::Hexagon => format!(
            r#"<polygon points="{},{y} {},{y} {},{cy} {},{} {},{} {x},{cy}""#,
            x + w * 0.25,
            x + w * 0.75,
            x + w,
            x + w * 0.75,
            y + h,
            x + w * 0.25,
            y + h
        ),
        NodeShape::Triangle => format!(
            r#"<polygon points="{cx},{y} {},{} {x},{}""#,
            x + w,
            y + h,
            y + h
        ),
        NodeShape::Rectangle | NodeShape::Rounded => format!(
            r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" rx="{}""#,
            node.shape.corner_radius()
        ),
    };
    let _ = write!(
        out,
        r#"{outline} fill="{fill}" stroke="{stroke}" stroke-width="{stroke_width}"/>"#
    );

    let font = &style.font;
    let has_icon = !style.icon.is_empty();
    if has_icon {
        let _ = write!(
            out,
            r#"<text x="{cx}" y="{}" text-anchor="middle" font-family="Arial" font-size="{}" fill="{}" dominant-baseline="middle">{}</text>"#,
            cy - 8.0,
            (font.size * 1.2).max(16.0),
            style.icon_color.to_hex(),
            escape_xml(&style.icon)
        );
    }
    let label_y = if has_icon { cy + 12.0 } else { cy };
    let label = if node.label.is_empty() {
        node.id.as_str()
    } else {
        &node.label
    };
    let _ = write!(
        out,
        r#"<text x="{cx}" y="{label_y}" text-anchor="middle" font-family="{}" font-size="{}" font-weight="{}" fill="{}" dominant-baseline="middle">{}</text>"#,
        escape_xml(&font.family),
        font.size,
        font.weight,
        style.text_color.to_hex(),
        escape_xml(label)
    );
}

/// Edges first so nodes paint over their endpoints.
fn write_content(out: &mut String, diagram: &Diagram, highlight: bool) {
    for edge in &diagram.edges {
        write_edge(out, edge, diagram, highlight);
    }
    for node in &diagram.nodes {
        write_node(out, node, highlight);
    }
}

// ─── Standalone export ───────────────────────────────────────────────────

/// The whole diagram on a white page with `padding` canvas units around it.
/// `None` for a diagram without nodes.
pub fn render_diagram_svg(diagram: &Diagram, padding: f64) -> Option<String> {
    let bounds = content_bounds(&diagram.nodes, NODE_SIZE)?.inflate(padding, padding);
    let (x, y, w, h) = (bounds.x0, bounds.y0, bounds.width(), bounds.height());

    let mut out = String::with_capacity(512 + diagram.nodes.len() * 512);
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{x} {y} {w} {h}" width="{w}" height="{h}">"#
    );
    let _ = write!(out, r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" fill="white"/>"#);
    write_markers(&mut out, &diagram.edges);
    write_content(&mut out, diagram, false);
    out.push_str("</svg>");
    Some(out)
}

// ─── Live scene ──────────────────────────────────────────────────────────

fn write_controls(out: &mut String, size: CanvasSize) {
    let x = 15.0;
    let bottom = f64::from(size.height) - 15.0;
    let _ = write!(out, r#"<g class="controls">"#);
    for (i, glyph) in ["+", "−", "⤢"].iter().enumerate() {
        let top = bottom - 27.0 * (3 - i) as f64;
        let _ = write!(
            out,
            r##"<rect x="{x}" y="{top}" width="26" height="26" fill="#FEFEFE" stroke="#EEEEEE"/><text x="{}" y="{}" text-anchor="middle" dominant-baseline="middle" font-size="14" fill="#333333">{glyph}</text>"##,
            x + 13.0,
            top + 13.0
        );
    }
    out.push_str("</g>");
}

fn write_minimap(out: &mut String, diagram: &Diagram, size: CanvasSize) {
    let (mw, mh) = (200.0, 150.0);
    let mx = f64::from(size.width) - mw - 15.0;
    let my = f64::from(size.height) - mh - 15.0;
    let _ = write!(
        out,
        r##"<g class="minimap"><rect x="{mx}" y="{my}" width="{mw}" height="{mh}" fill="#FFFFFF" stroke="#E5E7EB"/>"##
    );
    if let Some(bounds) = content_bounds(&diagram.nodes, NODE_SIZE) {
        let scale = (mw / bounds.width()).min(mh / bounds.height()) * 0.9;
        let ox = mx + (mw - bounds.width() * scale) / 2.0;
        let oy = my + (mh - bounds.height() * scale) / 2.0;
        for node in &diagram.nodes {
            let p = node_origin(node);
            let _ = write!(
                out,
                r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
                ox + (p.x - bounds.x0) * scale,
                oy + (p.y - bounds.y0) * scale,
                NODE_SIZE.width * scale,
                NODE_SIZE.height * scale,
                node.style.icon_color.to_hex()
            );
        }
    }
    out.push_str("</g>");
}

fn write_panels(out: &mut String, diagram: &Diagram, size: CanvasSize) {
    let width = f64::from(size.width);
    let title = if diagram.title.trim().is_empty() {
        "Untitled Diagram"
    } else {
        diagram.title.as_str()
    };
    let _ = write!(
        out,
        r##"<g class="panels"><rect x="15" y="15" width="180" height="44" rx="8" fill="#FFFFFF" stroke="#E5E7EB"/><rect x="{}" y="15" width="240" height="40" rx="8" fill="#FFFFFF" stroke="#E5E7EB"/><text x="{}" y="35" text-anchor="middle" dominant-baseline="middle" font-family="Arial" font-size="16" font-weight="600" fill="#1F2937">{}</text><rect x="{}" y="15" width="96" height="36" rx="8" fill="#FFFFFF" stroke="#E5E7EB"/></g>"##,
        width / 2.0 - 120.0,
        width / 2.0,
        escape_xml(title),
        width - 111.0
    );
}

/// What a surface of `size` pixels shows under `viewport` with `chrome`.
pub fn render_scene_svg(
    diagram: &Diagram,
    viewport: Viewport,
    size: CanvasSize,
    chrome: &ChromeState,
) -> String {
    let (w, h) = (size.width, size.height);
    let mut out = String::with_capacity(1024 + diagram.nodes.len() * 512);
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {w} {h}" width="{w}" height="{h}">"#
    );
    let _ = write!(
        out,
        r#"<rect x="0" y="0" width="{w}" height="{h}" fill="{}"/>"#,
        paint(chrome.background)
    );
    write_markers(&mut out, &diagram.edges);

    if chrome.background_pattern {
        let gap = DOT_GAP * viewport.zoom;
        let _ = write!(
            out,
            r#"<defs><pattern id="dots" patternUnits="userSpaceOnUse" x="{}" y="{}" width="{gap}" height="{gap}"><circle cx="{}" cy="{}" r="{}" fill="{DOT_COLOR}"/></pattern></defs><rect x="0" y="0" width="{w}" height="{h}" fill="url(#dots)"/>"#,
            viewport.x.rem_euclid(gap),
            viewport.y.rem_euclid(gap),
            gap / 2.0,
            gap / 2.0,
            viewport.zoom.max(0.5)
        );
    }

    let _ = write!(
        out,
        r#"<g transform="translate({} {}) scale({})">"#,
        viewport.x, viewport.y, viewport.zoom
    );
    write_content(&mut out, diagram, true);
    out.push_str("</g>");

    if chrome.controls {
        write_controls(&mut out, size);
    }
    if chrome.minimap {
        write_minimap(&mut out, diagram, size);
    }
    if chrome.panels {
        write_panels(&mut out, diagram, size);
    }
    out.push_str("</svg>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_core::{EdgeId, NodeId, NodeKind, Position};

    fn diagram() -> Diagram {
        let a = Node::new(NodeId::intern("sv-a"), NodeKind::Event, Position::new(0.0, 0.0))
            .with_label("Start & <go>");
        let mut b = Node::new(NodeId::intern("sv-b"), NodeKind::Decision, Position::new(300.0, 200.0));
        b.shape = NodeShape::Diamond;
        let mut e = Edge::new(EdgeId::intern("sv-ab"), a.id, b.id);
        e.label = Some("yes".into());
        Diagram {
            title: "Demo".into(),
            nodes: vec![a, b],
            edges: vec![e],
        }
    }

    #[test]
    fn standalone_viewbox_covers_footprints_plus_padding() {
        let svg = render_diagram_svg(&diagram(), 50.0).unwrap();
        assert!(svg.starts_with(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="-50 -50 600 380" width="600" height="380">"#
        ));
        assert!(svg.contains(r#"fill="white""#));
        assert!(svg.contains(r#"marker-end="url(#arrow-6B7280)""#));
        assert!(svg.ends_with("</svg>"));
    }

    #[test]
    fn labels_are_escaped() {
        let svg = render_diagram_svg(&diagram(), 50.0).unwrap();
        assert!(svg.contains("Start &amp; &lt;go&gt;"));
        assert!(!svg.contains("<go>"));
    }

    #[test]
    fn edge_label_sits_at_midpoint() {
        let svg = render_diagram_svg(&diagram(), 50.0).unwrap();
        // (100, 80) -> (400, 200)
        assert!(svg.contains(r#"<text x="250" y="140""#));
    }

    #[test]
    fn diamond_outline() {
        let svg = render_diagram_svg(&diagram(), 50.0).unwrap();
        assert!(svg.contains(r#"<polygon points="400,200 500,240 400,280 300,240""#));
    }

    #[test]
    fn empty_diagram_has_no_standalone_svg() {
        assert!(render_diagram_svg(&Diagram::default(), 50.0).is_none());
    }

    #[test]
    fn scene_chrome_toggles() {
        let d = diagram();
        let size = CanvasSize::new(800, 600);
        let live = render_scene_svg(&d, Viewport::default(), size, &ChromeState::live());
        assert!(live.contains(r#"class="controls""#));
        assert!(live.contains(r#"class="minimap""#));
        assert!(live.contains("url(#dots)"));

        let bare = render_scene_svg(&d, Viewport::default(), size, &ChromeState::export());
        assert!(!bare.contains(r#"class="controls""#));
        assert!(!bare.contains(r#"class="panels""#));
        assert!(!bare.contains("url(#dots)"));
        assert!(bare.contains(r##"fill="#FFFFFF""##));
    }

    #[test]
    fn step_paths_are_orthogonal() {
        let path = edge_path(Point::new(0.0, 0.0), Point::new(100.0, 100.0), CurveKind::Step);
        assert_eq!(path.to_svg(), "M0,0 L0,50 L100,50 L100,100");
    }

    #[test]
    fn bezier_paths_leave_and_enter_vertically() {
        let path = edge_path(Point::new(0.0, 0.0), Point::new(100.0, 100.0), CurveKind::Bezier);
        assert_eq!(path.to_svg(), "M0,0 C0,50 100,50 100,100");
    }
}
