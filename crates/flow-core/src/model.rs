//! Core diagram data model.
//!
//! A diagram is a flat set of typed, styled nodes plus directed edges between
//! them. Styling never affects topology; the only structural rule is that an
//! edge's endpoints exist, which [`crate::store::GraphStore`] enforces.

use crate::id::{EdgeId, NodeId};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

// ─── Colors ──────────────────────────────────────────────────────────────

/// 8-bit RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const WHITE: Color = Color::hex(0xFFFFFF);
    pub const BLACK: Color = Color::hex(0x000000);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from a `0xRRGGBB` literal.
    pub const fn hex(rgb: u32) -> Self {
        Self::rgba((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8, 0xFF)
    }

    /// Parse `#RGB`, `#RGBA`, `#RRGGBB` or `#RRGGBBAA` (the `#` is optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim();
        let bytes = hex.strip_prefix('#').unwrap_or(hex).as_bytes();
        let nibble = |i: usize| hex_val(bytes[i]);
        let byte = |i: usize| Some(hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?);
        match bytes.len() {
            3 => Some(Self::rgba(nibble(0)? * 17, nibble(1)? * 17, nibble(2)? * 17, 0xFF)),
            4 => Some(Self::rgba(
                nibble(0)? * 17,
                nibble(1)? * 17,
                nibble(2)? * 17,
                nibble(3)? * 17,
            )),
            6 => Some(Self::rgba(byte(0)?, byte(2)?, byte(4)?, 0xFF)),
            8 => Some(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => None,
        }
    }

    /// `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        if self.a == 0xFF {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid color `{s}`")))
    }
}

// ─── Geometry ────────────────────────────────────────────────────────────

/// Canvas-space position of a node's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }
}

// ─── Node kinds & shapes ─────────────────────────────────────────────────

/// Semantic kind of a diagram element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeKind {
    Event,
    #[default]
    Activity,
    Note,
    Decision,
    Generic,
}

/// Default look of a node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindPalette {
    pub icon: &'static str,
    pub background: Color,
    pub text: Color,
    pub icon_color: Color,
}

impl NodeKind {
    pub const ALL: [NodeKind; 5] = [
        NodeKind::Event,
        NodeKind::Activity,
        NodeKind::Note,
        NodeKind::Decision,
        NodeKind::Generic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Event => "event",
            NodeKind::Activity => "activity",
            NodeKind::Note => "note",
            NodeKind::Decision => "decision",
            NodeKind::Generic => "generic",
        }
    }

    /// Unknown kinds decode as [`NodeKind::Generic`].
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "event" => NodeKind::Event,
            "activity" => NodeKind::Activity,
            "note" => NodeKind::Note,
            "decision" => NodeKind::Decision,
            _ => NodeKind::Generic,
        }
    }

    pub const fn palette(self) -> KindPalette {
        match self {
            NodeKind::Event => KindPalette {
                icon: "🚩",
                background: Color::hex(0xF0FDF4),
                text: Color::hex(0x166534),
                icon_color: Color::hex(0x16A34A),
            },
            NodeKind::Activity => KindPalette {
                icon: "⚙️",
                background: Color::hex(0xFFF7ED),
                text: Color::hex(0xEA580C),
                icon_color: Color::hex(0xF97316),
            },
            NodeKind::Note => KindPalette {
                icon: "📝",
                background: Color::hex(0xFAF5FF),
                text: Color::hex(0x7C3AED),
                icon_color: Color::hex(0x8B5CF6),
            },
            NodeKind::Decision => KindPalette {
                icon: "💎",
                background: Color::hex(0xEFF6FF),
                text: Color::hex(0x2563EB),
                icon_color: Color::hex(0x3B82F6),
            },
            NodeKind::Generic => KindPalette {
                icon: "⚪",
                background: Color::hex(0xF9FAFB),
                text: Color::hex(0x374151),
                icon_color: Color::hex(0x6B7280),
            },
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outline drawn for a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NodeShape {
    #[default]
    Rectangle,
    Rounded,
    Circle,
    Diamond,
    Hexagon,
    Triangle,
}

impl NodeShape {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeShape::Rectangle => "rectangle",
            NodeShape::Rounded => "rounded",
            NodeShape::Circle => "circle",
            NodeShape::Diamond => "diamond",
            NodeShape::Hexagon => "hexagon",
            NodeShape::Triangle => "triangle",
        }
    }

    /// Unknown shapes decode as [`NodeShape::Rectangle`].
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "rounded" => NodeShape::Rounded,
            "circle" => NodeShape::Circle,
            "diamond" => NodeShape::Diamond,
            "hexagon" => NodeShape::Hexagon,
            "triangle" => NodeShape::Triangle,
            _ => NodeShape::Rectangle,
        }
    }

    /// Corner radius for the rectangular shapes, in canvas units.
    pub fn corner_radius(self) -> f32 {
        match self {
            NodeShape::Rectangle => 6.0,
            NodeShape::Rounded => 12.0,
            _ => 0.0,
        }
    }
}

// ─── Node styling ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    pub size: f32,
    /// CSS-style weight, 100..=900.
    pub weight: u16,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "Arial".into(),
            size: 14.0,
            weight: 400,
        }
    }
}

impl FontSpec {
    /// `"normal"` → 400, `"bold"` → 700, numeric strings as-is, anything else 400.
    pub fn parse_weight(s: &str) -> u16 {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => 400,
            "bold" => 700,
            "lighter" => 300,
            "bolder" => 800,
            other => other
                .parse::<u16>()
                .ok()
                .filter(|w| (100..=900).contains(w))
                .unwrap_or(400),
        }
    }

    pub fn weight_name(&self) -> String {
        match self.weight {
            400 => "normal".into(),
            700 => "bold".into(),
            w => w.to_string(),
        }
    }
}

/// Visual attributes of a node. None of these affect topology.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeStyle {
    pub fill: Color,
    pub text_color: Color,
    pub icon: String,
    pub icon_color: Color,
    /// Falls back to `icon_color` when unset.
    pub border_color: Option<Color>,
    pub font: FontSpec,
}

impl NodeStyle {
    /// Defaults for a node kind, from its palette.
    pub fn for_kind(kind: NodeKind) -> Self {
        let p = kind.palette();
        Self {
            fill: p.background,
            text_color: p.text,
            icon: p.icon.to_string(),
            icon_color: p.icon_color,
            border_color: None,
            font: FontSpec::default(),
        }
    }

    pub fn effective_border(&self) -> Color {
        self.border_color.unwrap_or(self.icon_color)
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// A positioned, styled diagram vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub position: Position,
    pub label: String,
    pub shape: NodeShape,
    pub style: NodeStyle,
    /// Transient selection flag; not part of the diagram's identity.
    pub selected: bool,
}

impl Node {
    /// A fresh node with the kind's default label and palette.
    pub fn new(id: NodeId, kind: NodeKind, position: Position) -> Self {
        Self {
            id,
            kind,
            position,
            label: format!("New {kind}"),
            shape: NodeShape::default(),
            style: NodeStyle::for_kind(kind),
            selected: false,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Partial node update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeUpdate {
    pub kind: Option<NodeKind>,
    pub position: Option<Position>,
    pub label: Option<String>,
    pub shape: Option<NodeShape>,
    pub fill: Option<Color>,
    pub text_color: Option<Color>,
    pub icon: Option<String>,
    pub icon_color: Option<Color>,
    pub border_color: Option<Color>,
    pub font_family: Option<String>,
    pub font_size: Option<f32>,
    pub font_weight: Option<u16>,
}

impl NodeUpdate {
    pub fn position(x: f32, y: f32) -> Self {
        Self {
            position: Some(Position::new(x, y)),
            ..Default::default()
        }
    }

    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Default::default()
        }
    }

    pub fn apply(self, node: &mut Node) {
        if let Some(kind) = self.kind {
            node.kind = kind;
        }
        if let Some(position) = self.position {
            node.position = position;
        }
        if let Some(label) = self.label {
            node.label = label;
        }
        if let Some(shape) = self.shape {
            node.shape = shape;
        }
        let style = &mut node.style;
        if let Some(fill) = self.fill {
            style.fill = fill;
        }
        if let Some(text_color) = self.text_color {
            style.text_color = text_color;
        }
        if let Some(icon) = self.icon {
            style.icon = icon;
        }
        if let Some(icon_color) = self.icon_color {
            style.icon_color = icon_color;
        }
        if let Some(border_color) = self.border_color {
            style.border_color = Some(border_color);
        }
        if let Some(family) = self.font_family {
            style.font.family = family;
        }
        if let Some(size) = self.font_size {
            style.font.size = size;
        }
        if let Some(weight) = self.font_weight {
            style.font.weight = weight;
        }
    }
}

// ─── Edges ───────────────────────────────────────────────────────────────

/// How the edge path is drawn between its endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CurveKind {
    Straight,
    Step,
    #[default]
    SmoothStep,
    Bezier,
}

impl CurveKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CurveKind::Straight => "straight",
            CurveKind::Step => "step",
            CurveKind::SmoothStep => "smoothstep",
            CurveKind::Bezier => "bezier",
        }
    }

    /// `"default"` is the canvas library's bezier; unknown names are smooth-step.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "straight" => CurveKind::Straight,
            "step" => CurveKind::Step,
            "bezier" | "default" => CurveKind::Bezier,
            _ => CurveKind::SmoothStep,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArrowKind {
    Closed,
    Open,
}

impl ArrowKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ArrowKind::Closed => "arrowclosed",
            ArrowKind::Open => "arrow",
        }
    }

    /// Empty or unknown marker names mean "no arrow".
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arrowclosed" => Some(ArrowKind::Closed),
            "arrow" => Some(ArrowKind::Open),
            _ => None,
        }
    }
}

/// Arrowhead drawn at the target end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowHead {
    pub kind: ArrowKind,
    pub width: f32,
    pub height: f32,
    pub color: Color,
}

impl ArrowHead {
    pub fn closed(color: Color) -> Self {
        Self {
            kind: ArrowKind::Closed,
            width: 20.0,
            height: 20.0,
            color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeStroke {
    pub color: Color,
    pub width: f32,
}

impl Default for EdgeStroke {
    fn default() -> Self {
        Self {
            color: Color::hex(0x6B7280),
            width: 2.0,
        }
    }
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub label: Option<String>,
    pub curve: CurveKind,
    pub stroke: EdgeStroke,
    pub animated: bool,
    pub arrow: Option<ArrowHead>,
    /// Transient selection flag.
    pub selected: bool,
}

impl Edge {
    /// An edge with the connect-gesture defaults: smooth-step, gray, closed arrow.
    pub fn new(id: EdgeId, source: NodeId, target: NodeId) -> Self {
        let stroke = EdgeStroke::default();
        Self {
            id,
            source,
            target,
            label: None,
            curve: CurveKind::default(),
            stroke,
            animated: false,
            arrow: Some(ArrowHead::closed(stroke.color)),
            selected: false,
        }
    }

    pub fn touches(&self, node: NodeId) -> bool {
        self.source == node || self.target == node
    }
}

/// Partial edge update. Endpoint changes are re-validated by the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeUpdate {
    pub source: Option<NodeId>,
    pub target: Option<NodeId>,
    /// `Some(None)` clears the label.
    pub label: Option<Option<String>>,
    pub curve: Option<CurveKind>,
    pub stroke_color: Option<Color>,
    pub stroke_width: Option<f32>,
    pub animated: Option<bool>,
    /// `Some(None)` removes the arrowhead.
    pub arrow: Option<Option<ArrowHead>>,
}

impl EdgeUpdate {
    pub fn apply(self, edge: &mut Edge) {
        if let Some(source) = self.source {
            edge.source = source;
        }
        if let Some(target) = self.target {
            edge.target = target;
        }
        if let Some(label) = self.label {
            edge.label = label;
        }
        if let Some(curve) = self.curve {
            edge.curve = curve;
        }
        if let Some(color) = self.stroke_color {
            edge.stroke.color = color;
        }
        if let Some(width) = self.stroke_width {
            edge.stroke.width = width;
        }
        if let Some(animated) = self.animated {
            edge.animated = animated;
        }
        if let Some(arrow) = self.arrow {
            edge.arrow = arrow;
        }
    }
}

// ─── Diagram ─────────────────────────────────────────────────────────────

/// Nodes, edges and title: the unit exchanged with the FlowLang service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagram {
    pub title: String,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Diagram {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }
}
