//! JSON shapes exchanged with the FlowLang service and stored in diagram files.
//!
//! Nodes and edges use the canvas library's layout (`data`, `style`,
//! `markerEnd`, camelCase keys). Decoding is lenient: unknown tags fall back
//! to defaults and bad colors fall back to the kind palette, so a response
//! from the service never fails to decode because of styling.

use crate::id::{EdgeId, NodeId};
use crate::model::{
    ArrowHead, ArrowKind, Color, CurveKind, Diagram, Edge, EdgeStroke, FontSpec, Node, NodeKind,
    NodeShape, NodeStyle, NodeUpdate, Position,
};
use serde::{Deserialize, Serialize};

/// The only node renderer type the canvas registers.
pub const NODE_TYPE: &str = "custom";

fn is_false(b: &bool) -> bool {
    !*b
}

fn default_node_type() -> String {
    NODE_TYPE.to_string()
}

/// A JSON value that may arrive as a number or as a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(f64),
    Text(String),
}

impl Scalar {
    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Scalar::Number(n) => Some(*n as f32),
            Scalar::Text(s) => s.trim().trim_end_matches("px").parse().ok(),
        }
    }
}

fn color_or(raw: Option<&str>, fallback: Color) -> Color {
    raw.and_then(Color::from_hex).unwrap_or(fallback)
}

// ─── Nodes ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireNodeData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_color: Option<String>,
    /// Older payloads carry the icon color as `color`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<String>,
}

impl WireNodeData {
    /// Read as a property-panel patch: present keys change, absent keys stay.
    /// Unparseable colors are ignored.
    pub fn into_update(self) -> NodeUpdate {
        let color = |raw: Option<String>| raw.as_deref().and_then(Color::from_hex);
        NodeUpdate {
            kind: self.kind.as_deref().map(NodeKind::parse_lenient),
            position: None,
            label: self.label,
            shape: self.shape.as_deref().map(NodeShape::parse_lenient),
            fill: color(self.background_color),
            text_color: color(self.text_color),
            icon: self.icon,
            icon_color: color(self.icon_color.or(self.color)),
            border_color: color(self.border_color),
            font_family: self.font_family,
            font_size: self.font_size.as_ref().and_then(Scalar::as_f32),
            font_weight: self.font_weight.map(|w| match w {
                Scalar::Number(n) => FontSpec::parse_weight(&n.to_string()),
                Scalar::Text(t) => FontSpec::parse_weight(&t),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireNode {
    pub id: String,
    #[serde(rename = "type", default = "default_node_type")]
    pub node_type: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub data: WireNodeData,
    #[serde(default, skip_serializing_if = "is_false")]
    pub selected: bool,
}

impl From<&Node> for WireNode {
    fn from(node: &Node) -> Self {
        let style = &node.style;
        let font = &style.font;
        let defaults = FontSpec::default();
        WireNode {
            id: node.id.as_str().to_string(),
            node_type: default_node_type(),
            position: node.position,
            data: WireNodeData {
                label: Some(node.label.clone()),
                kind: Some(node.kind.as_str().to_string()),
                icon: Some(style.icon.clone()),
                background_color: Some(style.fill.to_hex()),
                text_color: Some(style.text_color.to_hex()),
                icon_color: Some(style.icon_color.to_hex()),
                color: None,
                border_color: style.border_color.map(|c| c.to_hex()),
                font_size: (font.size != defaults.size).then(|| Scalar::Number(f64::from(font.size))),
                font_family: (font.family != defaults.family).then(|| font.family.clone()),
                font_weight: (font.weight != defaults.weight).then(|| Scalar::Text(font.weight_name())),
                shape: (node.shape != NodeShape::default()).then(|| node.shape.as_str().to_string()),
            },
            selected: node.selected,
        }
    }
}

impl WireNode {
    /// Decode leniently. A missing kind is an activity; an unknown one is generic.
    pub fn into_node(self) -> Node {
        let data = self.data;
        let kind = data
            .kind
            .as_deref()
            .map(NodeKind::parse_lenient)
            .unwrap_or(NodeKind::Activity);
        let defaults = NodeStyle::for_kind(kind);

        let icon_color = color_or(
            data.icon_color.as_deref().or(data.color.as_deref()),
            defaults.icon_color,
        );
        let mut font = FontSpec::default();
        if let Some(size) = data.font_size.as_ref().and_then(Scalar::as_f32) {
            font.size = size;
        }
        if let Some(family) = data.font_family.filter(|f| !f.trim().is_empty()) {
            font.family = family;
        }
        if let Some(weight) = &data.font_weight {
            font.weight = match weight {
                Scalar::Number(n) => FontSpec::parse_weight(&n.to_string()),
                Scalar::Text(s) => FontSpec::parse_weight(s),
            };
        }

        let style = NodeStyle {
            fill: color_or(data.background_color.as_deref(), defaults.fill),
            text_color: color_or(data.text_color.as_deref(), defaults.text_color),
            icon: data.icon.unwrap_or(defaults.icon),
            icon_color,
            border_color: data.border_color.as_deref().and_then(Color::from_hex),
            font,
        };

        let id = NodeId::intern(&self.id);
        Node {
            id,
            kind,
            position: self.position,
            label: data.label.unwrap_or_else(|| self.id.clone()),
            shape: data
                .shape
                .as_deref()
                .map(NodeShape::parse_lenient)
                .unwrap_or_default(),
            style,
            selected: self.selected,
        }
    }
}

// ─── Edges ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEdgeStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<Scalar>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireMarker {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<Scalar>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireEdge {
    /// Missing ids are derived as `<source>-<target>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub curve: Option<String>,
    #[serde(default)]
    pub animated: bool,
    #[serde(default)]
    pub style: WireEdgeStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker_end: Option<WireMarker>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub selected: bool,
}

impl From<&Edge> for WireEdge {
    fn from(edge: &Edge) -> Self {
        WireEdge {
            id: Some(edge.id.as_str().to_string()),
            source: edge.source.as_str().to_string(),
            target: edge.target.as_str().to_string(),
            label: edge.label.clone(),
            curve: Some(edge.curve.as_str().to_string()),
            animated: edge.animated,
            style: WireEdgeStyle {
                stroke: Some(edge.stroke.color.to_hex()),
                stroke_width: Some(Scalar::Number(f64::from(edge.stroke.width))),
            },
            marker_end: edge.arrow.map(|a| WireMarker {
                kind: a.kind.as_str().to_string(),
                width: Some(Scalar::Number(f64::from(a.width))),
                height: Some(Scalar::Number(f64::from(a.height))),
                color: Some(a.color.to_hex()),
            }),
            selected: edge.selected,
        }
    }
}

impl WireEdge {
    pub fn into_edge(self) -> Edge {
        let defaults = EdgeStroke::default();
        let stroke = EdgeStroke {
            color: color_or(self.style.stroke.as_deref(), defaults.color),
            width: self
                .style
                .stroke_width
                .as_ref()
                .and_then(Scalar::as_f32)
                .unwrap_or(defaults.width),
        };
        let arrow = self.marker_end.and_then(|m| {
            let kind = ArrowKind::parse(&m.kind)?;
            let mut head = ArrowHead::closed(color_or(m.color.as_deref(), stroke.color));
            head.kind = kind;
            if let Some(w) = m.width.as_ref().and_then(Scalar::as_f32) {
                head.width = w;
            }
            if let Some(h) = m.height.as_ref().and_then(Scalar::as_f32) {
                head.height = h;
            }
            Some(head)
        });
        let id = match self.id.filter(|id| !id.is_empty()) {
            Some(id) => EdgeId::intern(&id),
            None => EdgeId::intern(&format!("{}-{}", self.source, self.target)),
        };
        Edge {
            id,
            source: NodeId::intern(&self.source),
            target: NodeId::intern(&self.target),
            label: self.label.filter(|l| !l.trim().is_empty()),
            curve: self
                .curve
                .as_deref()
                .map(CurveKind::parse_lenient)
                .unwrap_or_default(),
            stroke,
            animated: self.animated,
            arrow,
            selected: self.selected,
        }
    }
}

// ─── Diagram documents ───────────────────────────────────────────────────

/// A whole diagram as stored on disk or handed across the wasm bridge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagramDocument {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub nodes: Vec<WireNode>,
    #[serde(default)]
    pub edges: Vec<WireEdge>,
}

impl From<&Diagram> for DiagramDocument {
    fn from(d: &Diagram) -> Self {
        Self {
            title: d.title.clone(),
            nodes: d.nodes.iter().map(WireNode::from).collect(),
            edges: d.edges.iter().map(WireEdge::from).collect(),
        }
    }
}

impl DiagramDocument {
    pub fn into_diagram(self) -> Diagram {
        Diagram {
            title: self.title,
            nodes: decode_nodes(self.nodes),
            edges: self.edges.into_iter().map(WireEdge::into_edge).collect(),
        }
    }
}

/// Nodes without an id cannot be referenced and are skipped.
fn decode_nodes(nodes: Vec<WireNode>) -> Vec<Node> {
    nodes
        .into_iter()
        .filter(|n| {
            let keep = !n.id.trim().is_empty();
            if !keep {
                log::warn!("skipping node without id");
            }
            keep
        })
        .map(WireNode::into_node)
        .collect()
}

// ─── Service requests ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRequest {
    pub nodes: Vec<WireNode>,
    pub edges: Vec<WireEdge>,
    pub diagram_title: String,
}

impl SyncRequest {
    /// Encode a diagram, substituting `default_title` for a blank title.
    pub fn from_diagram(diagram: &Diagram, default_title: &str) -> Self {
        let title = diagram.title.trim();
        Self {
            nodes: diagram.nodes.iter().map(WireNode::from).collect(),
            edges: diagram.edges.iter().map(WireEdge::from).collect(),
            diagram_title: if title.is_empty() { default_title } else { title }.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub prompt: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseRequest {
    pub flowlang_code: String,
}

// ─── Service responses ───────────────────────────────────────────────────

/// Response of the sync and generate endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub flowlang_code: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagramInfo {
    #[serde(default)]
    pub title: Option<String>,
}

/// Response of the parse endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub nodes: Vec<WireNode>,
    #[serde(default)]
    pub edges: Vec<WireEdge>,
    #[serde(default)]
    pub diagram_info: Option<DiagramInfo>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ParseResponse {
    /// Decode the parsed graph. Dangling edges are left for the store to drop.
    pub fn into_diagram(self, default_title: &str) -> Diagram {
        let title = self
            .diagram_info
            .and_then(|info| info.title)
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| default_title.to_string());
        Diagram {
            title,
            nodes: decode_nodes(self.nodes),
            edges: self.edges.into_iter().map(WireEdge::into_edge).collect(),
        }
    }
}
