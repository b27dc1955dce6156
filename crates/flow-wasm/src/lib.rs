//! WASM bridge for FlowLang Canvas. Exposes the editor engine to the web app.
//!
//! Compiled via `wasm-pack build --target web`. Everything crosses the
//! boundary as strings and numbers; structured values are JSON in the same
//! shapes the FlowLang service speaks. The page owns networking: the bridge
//! hands out ready-to-POST requests with a ticket, and the page reports each
//! response body back against that ticket.

mod export;
mod logger;

use flow_core::layout::{CanvasSize, Viewport};
use flow_core::wire::{Scalar, WireNode, WireNodeData};
use flow_core::{
    ArrowHead, CurveKind, DiagramDocument, EdgeId, EdgeUpdate, NodeId, NodeKind, Position,
};
use flow_editor::service::{GENERATE_PATH, PARSE_PATH, SYNC_PATH};
use flow_editor::sync::{InboundTicket, PushTicket};
use flow_editor::{
    ChangeOrigin, Editor, EditorAction, EditorConfig, Focus, GraphMutation, Instant,
    InteractionMode, PendingPush, PushOutcome, ServiceError, decode_generate_response,
    decode_parse_response, decode_sync_response, endpoint_url,
};
use flow_render::{ChromeState, ExportConfig, export_file_name, render_diagram_svg, render_scene_svg};
use serde::Deserialize;
use serde_json::{Value, json};
use std::collections::HashMap;
use wasm_bindgen::prelude::*;

/// The main WASM-facing canvas controller.
///
/// Holds the editor, the surface state the page mirrors, and the tickets of
/// requests the page is currently performing.
#[wasm_bindgen]
pub struct FlowCanvas {
    editor: Editor,
    size: CanvasSize,
    chrome: ChromeState,
    export: ExportConfig,
    /// Font files for rasters; the browser exposes no system fonts.
    fonts: Vec<Vec<u8>>,
    clipboard_images: bool,
    pushes: HashMap<u64, PushTicket>,
    inbound: HashMap<u64, InboundTicket>,
}

/// Partial edge properties from the property panel.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct EdgeProps {
    /// An empty label clears it.
    label: Option<String>,
    #[serde(rename = "type")]
    curve: Option<String>,
    animated: Option<bool>,
    stroke: Option<String>,
    stroke_width: Option<Scalar>,
    /// Closed arrowhead on or off.
    arrow: Option<bool>,
}

#[wasm_bindgen]
impl FlowCanvas {
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32) -> Self {
        console_error_panic_hook_setup();
        Self::with_editor(Editor::default(), width, height)
    }

    /// A canvas with a JSON editor config. `undefined` if the config is invalid.
    pub fn with_config(width: u32, height: u32, config_json: &str) -> Option<FlowCanvas> {
        console_error_panic_hook_setup();
        match EditorConfig::from_json_str(config_json) {
            Ok(config) => Some(Self::with_editor(Editor::new(config), width, height)),
            Err(e) => {
                log::error!("rejected editor config: {e}");
                None
            }
        }
    }

    // ─── Document ────────────────────────────────────────────────────────

    /// The whole diagram as JSON.
    pub fn document_json(&self) -> String {
        let doc = DiagramDocument::from(&self.editor.snapshot());
        serde_json::to_string(&doc).unwrap_or_else(|_| "{}".to_string())
    }

    /// Load a saved diagram. Loading does not push to the service.
    pub fn load_document(&mut self, json: &str) -> String {
        let doc: DiagramDocument = match serde_json::from_str(json) {
            Ok(doc) => doc,
            Err(e) => return error_json(&e.to_string()),
        };
        match self.editor.apply_mutation(
            GraphMutation::ReplaceAll {
                diagram: Box::new(doc.into_diagram()),
            },
            ChangeOrigin::ExternalParse,
            Instant::now(),
        ) {
            Ok(outcome) => json!({ "ok": true, "report": outcome.report.map(|r| report_json(&r)) })
                .to_string(),
            Err(e) => error_json(&e.to_string()),
        }
    }

    pub fn get_title(&self) -> String {
        self.editor.title().to_string()
    }

    pub fn set_title(&mut self, title: &str) {
        self.editor.set_title(title, Instant::now());
    }

    pub fn get_code(&self) -> String {
        self.editor.code().to_string()
    }

    /// Last service error, or `""`.
    pub fn last_error(&self) -> String {
        self.editor.sync().last_error().unwrap_or_default().to_string()
    }

    pub fn clear_canvas(&mut self) {
        self.editor.clear_canvas(Instant::now());
        self.pushes.clear();
        self.inbound.clear();
    }

    // ─── Editing ─────────────────────────────────────────────────────────

    /// Add a node from the palette. Returns the new id, or `""`.
    pub fn add_node(&mut self, kind: &str) -> String {
        self.add_node_inner(kind, None)
    }

    /// Add a node where it was dropped, in canvas coordinates.
    pub fn add_node_at(&mut self, kind: &str, x: f32, y: f32) -> String {
        self.add_node_inner(kind, Some(Position::new(x, y)))
    }

    pub fn move_node(&mut self, id: &str, x: f32, y: f32) -> bool {
        self.editor
            .move_node(NodeId::intern(id), Position::new(x, y), Instant::now())
    }

    /// Patch a node from property-panel JSON (node `data` keys).
    pub fn update_node(&mut self, id: &str, props_json: &str) -> bool {
        match serde_json::from_str::<WireNodeData>(props_json) {
            Ok(data) => self
                .editor
                .update_node(NodeId::intern(id), data.into_update(), Instant::now()),
            Err(e) => {
                log::warn!("bad node props: {e}");
                false
            }
        }
    }

    pub fn delete_node(&mut self, id: &str) -> bool {
        self.editor.delete_node(NodeId::intern(id), Instant::now())
    }

    /// Connect two nodes. Returns the edge id, or `""` if rejected.
    pub fn connect(&mut self, source: &str, target: &str) -> String {
        match self
            .editor
            .connect(NodeId::intern(source), NodeId::intern(target), Instant::now())
        {
            Ok(id) => id.as_str().to_string(),
            Err(e) => {
                log::warn!("connect failed: {e}");
                String::new()
            }
        }
    }

    pub fn update_edge(&mut self, id: &str, props_json: &str) -> bool {
        let props: EdgeProps = match serde_json::from_str(props_json) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("bad edge props: {e}");
                return false;
            }
        };
        let id = EdgeId::intern(id);
        let Some(edge) = self.editor.store().edge(id) else {
            return false;
        };
        let stroke_color = props.stroke.as_deref().and_then(flow_core::Color::from_hex);
        let arrow_color = stroke_color.unwrap_or(edge.stroke.color);
        let update = EdgeUpdate {
            label: props.label.map(|l| (!l.trim().is_empty()).then_some(l)),
            curve: props.curve.as_deref().map(CurveKind::parse_lenient),
            stroke_color,
            stroke_width: props.stroke_width.as_ref().and_then(Scalar::as_f32),
            animated: props.animated,
            arrow: props
                .arrow
                .map(|on| on.then(|| ArrowHead::closed(arrow_color))),
            ..EdgeUpdate::default()
        };
        self.editor
            .update_edge(id, update, Instant::now())
            .unwrap_or(false)
    }

    pub fn delete_edge(&mut self, id: &str) -> bool {
        self.editor.delete_edge(EdgeId::intern(id), Instant::now())
    }

    pub fn delete_selection(&mut self) -> bool {
        self.editor.delete_selection(Instant::now())
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn click_node(&mut self, id: &str) -> bool {
        self.editor.click_node(NodeId::intern(id))
    }

    pub fn click_edge(&mut self, id: &str) -> bool {
        self.editor.click_edge(EdgeId::intern(id))
    }

    pub fn click_background(&mut self) {
        self.editor.click_background();
    }

    /// Replace the node selection, e.g. after a marquee. `ids_json` is an array.
    pub fn select_nodes(&mut self, ids_json: &str) -> bool {
        match serde_json::from_str::<Vec<String>>(ids_json) {
            Ok(ids) => {
                let ids: Vec<NodeId> = ids.iter().map(|s| NodeId::intern(s)).collect();
                self.editor.select_nodes(&ids);
                true
            }
            Err(_) => false,
        }
    }

    pub fn select_all(&mut self) {
        self.editor.select_all();
    }

    pub fn set_pan_only(&mut self, pan_only: bool) {
        self.editor.set_mode(if pan_only {
            InteractionMode::PanOnly
        } else {
            InteractionMode::Select
        });
    }

    /// `{"kind":"node","id":..}`, `{"kind":"edge","id":..}` or `{"kind":"none"}`.
    pub fn focus_json(&self) -> String {
        match self.editor.focus() {
            Focus::None => json!({ "kind": "none" }),
            Focus::Node(id) => json!({ "kind": "node", "id": id.as_str() }),
            Focus::Edge(id) => json!({ "kind": "edge", "id": id.as_str() }),
        }
        .to_string()
    }

    /// The focused node in wire form, or `{}`.
    pub fn focused_node_json(&self) -> String {
        self.editor
            .focused_node()
            .and_then(|node| serde_json::to_string(&WireNode::from(node)).ok())
            .unwrap_or_else(|| "{}".to_string())
    }

    // ─── Clipboard & layout ──────────────────────────────────────────────

    pub fn copy(&mut self) -> bool {
        self.editor.copy()
    }

    pub fn cut(&mut self) -> bool {
        self.editor.cut(Instant::now())
    }

    /// Paste the buffer. Returns the new node ids as a JSON array.
    pub fn paste(&mut self) -> String {
        let ids: Vec<&str> = self
            .editor
            .paste(Instant::now())
            .map(|p| p.nodes.iter().map(|id| id.as_str()).collect())
            .unwrap_or_default();
        json!(ids).to_string()
    }

    pub fn auto_align(&mut self) -> u32 {
        self.editor.auto_align(Instant::now()) as u32
    }

    // ─── Surface ─────────────────────────────────────────────────────────

    pub fn resize(&mut self, width: u32, height: u32) {
        self.size = CanvasSize::new(width, height);
    }

    pub fn set_viewport(&mut self, x: f64, y: f64, zoom: f64) {
        self.editor.set_viewport(Viewport { x, y, zoom });
    }

    pub fn viewport_json(&self) -> String {
        serde_json::to_string(&self.editor.viewport()).unwrap_or_else(|_| "{}".to_string())
    }

    /// Frame all content. `false` for an empty canvas.
    pub fn fit_view(&mut self) -> bool {
        self.editor.fit_view(self.size).is_some()
    }

    pub fn set_chrome(&mut self, controls: bool, minimap: bool, panels: bool, pattern: bool) {
        self.chrome = ChromeState {
            controls,
            minimap,
            panels,
            background_pattern: pattern,
            ..self.chrome
        };
    }

    /// The live scene as SVG.
    pub fn render_svg(&self) -> String {
        render_scene_svg(
            &self.editor.snapshot(),
            self.editor.viewport(),
            self.size,
            &self.chrome,
        )
    }

    /// Standalone SVG export, or `""` for an empty canvas.
    pub fn export_svg(&self) -> String {
        render_diagram_svg(&self.editor.snapshot(), self.export.svg_padding).unwrap_or_default()
    }

    /// Override export settings with `ExportConfig` JSON keys. `false` if invalid.
    pub fn set_export_config(&mut self, json: &str) -> bool {
        match ExportConfig::from_json_str(json) {
            Ok(config) => {
                self.export = config;
                true
            }
            Err(e) => {
                log::warn!("rejected export config: {e}");
                false
            }
        }
    }

    /// Add a TTF/OTF font for raster exports. Without one, rasters carry no text.
    pub fn load_font(&mut self, data: Vec<u8>) {
        self.fonts.push(data);
    }

    /// Whether the page can write images to the clipboard (`ClipboardItem`).
    pub fn set_clipboard_images(&mut self, supported: bool) {
        self.clipboard_images = supported;
    }

    /// Export as `png`, `pdf`, `svg` or `clipboard`. Returns the file bytes;
    /// for `clipboard`, the PNG the page should hand to the clipboard. The
    /// live view is hidden, framed and restored within the call.
    pub fn export_bytes(&mut self, format: &str) -> Result<Vec<u8>, String> {
        let target =
            export::parse_target(format).ok_or_else(|| format!("unknown export format: {format}"))?;
        let mut surface = export::LiveSurface {
            editor: &mut self.editor,
            chrome: &mut self.chrome,
            size: self.size,
            fonts: &self.fonts,
        };
        export::run_export(&mut surface, &self.export, target, self.clipboard_images).map_err(|e| {
            log::warn!("export failed: {e}");
            e.to_string()
        })
    }

    pub fn export_file_name(&self, extension: &str) -> String {
        export_file_name(self.editor.title(), extension)
    }

    // ─── Timers & sync ───────────────────────────────────────────────────

    /// Milliseconds until [`FlowCanvas::poll`] has work, or `-1`.
    pub fn next_deadline_ms(&self) -> f64 {
        match self.editor.next_deadline() {
            Some(at) => at.saturating_duration_since(Instant::now()).as_secs_f64() * 1000.0,
            None => -1.0,
        }
    }

    /// Due work as a JSON array of `{"action":"fitView","viewport":..}` and
    /// `{"action":"push","ticket":..,"url":..,"body":..}`.
    pub fn poll(&mut self) -> String {
        let mut actions = Vec::new();
        for action in self.editor.poll(Instant::now()) {
            match action {
                EditorAction::FitView => {
                    let viewport = self.editor.fit_view(self.size);
                    actions.push(json!({ "action": "fitView", "viewport": viewport }));
                }
                EditorAction::Push(push) => actions.push(self.push_json(push)),
            }
        }
        Value::Array(actions).to_string()
    }

    pub fn set_auto_sync(&mut self, enabled: bool) {
        self.editor.set_auto_sync(enabled, Instant::now());
    }

    pub fn is_auto_sync(&self) -> bool {
        self.editor.sync().auto_sync()
    }

    /// "Sync Now": a push action, or `null` for an empty canvas.
    pub fn sync_now(&mut self) -> String {
        match self.editor.sync_now() {
            Some(push) => self.push_json(push).to_string(),
            None => "null".to_string(),
        }
    }

    /// Report the body returned for a push.
    pub fn complete_push(&mut self, ticket: f64, body: &str) -> String {
        self.finish_push(ticket, decode_sync_response(body))
    }

    /// Report a push that never produced a body.
    pub fn fail_push(&mut self, ticket: f64, message: &str) -> String {
        self.finish_push(ticket, Err(ServiceError::Transport(message.to_string())))
    }

    // ─── Inbound ─────────────────────────────────────────────────────────

    /// Start parsing FlowLang text: `{"ticket":..,"url":..,"body":..}`.
    pub fn begin_parse(&mut self, code: &str) -> String {
        let (ticket, request) = self.editor.begin_parse(code);
        let url = endpoint_url(&self.editor.config().sync.base_url, PARSE_PATH);
        let seq = ticket.seq;
        self.inbound.insert(seq, ticket);
        json!({ "ticket": seq, "url": url, "body": request }).to_string()
    }

    /// Start generating from a prompt: `{"ticket":..,"url":..,"body":..}`.
    pub fn begin_generate(&mut self, prompt: &str, api_key: &str) -> String {
        let (ticket, request) = self.editor.begin_generate(prompt, api_key);
        let url = endpoint_url(&self.editor.config().sync.base_url, GENERATE_PATH);
        let seq = ticket.seq;
        self.inbound.insert(seq, ticket);
        json!({ "ticket": seq, "url": url, "body": request }).to_string()
    }

    /// Read a generation body. On success returns the parse request to
    /// perform next, `{"ok":true,"code":..,"url":..,"body":..}`; on failure
    /// the ticket is finished with the error.
    pub fn generated_code(&mut self, ticket: f64, body: &str) -> String {
        match decode_generate_response(body) {
            Ok(code) => json!({
                "ok": true,
                "code": code,
                "url": endpoint_url(&self.editor.config().sync.base_url, PARSE_PATH),
                "body": { "flowlang_code": code },
            })
            .to_string(),
            Err(err) => self.finish_inbound(ticket, Err(err)),
        }
    }

    /// Report the parse body for `code`. Replaces the canvas on success.
    pub fn complete_parse(&mut self, ticket: f64, code: &str, body: &str) -> String {
        let result = decode_parse_response(body).map(|resp| (code.to_string(), resp));
        self.finish_inbound(ticket, result)
    }

    /// Report an inbound request that never produced a body.
    pub fn fail_inbound(&mut self, ticket: f64, message: &str) -> String {
        self.finish_inbound(ticket, Err(ServiceError::Transport(message.to_string())))
    }
}

impl FlowCanvas {
    fn with_editor(editor: Editor, width: u32, height: u32) -> Self {
        Self {
            editor,
            size: CanvasSize::new(width, height),
            chrome: ChromeState::live(),
            export: ExportConfig::default(),
            fonts: Vec::new(),
            clipboard_images: false,
            pushes: HashMap::new(),
            inbound: HashMap::new(),
        }
    }

    fn add_node_inner(&mut self, kind: &str, at: Option<Position>) -> String {
        let kind = NodeKind::parse_lenient(kind);
        match self.editor.add_node_of_kind(kind, at, Instant::now()) {
            Ok(id) => id.as_str().to_string(),
            Err(e) => {
                log::warn!("add node failed: {e}");
                String::new()
            }
        }
    }

    fn push_json(&mut self, push: PendingPush) -> Value {
        let seq = push.ticket.seq;
        self.pushes.insert(seq, push.ticket);
        json!({
            "action": "push",
            "ticket": seq,
            "url": endpoint_url(&self.editor.config().sync.base_url, SYNC_PATH),
            "body": push.request,
        })
    }

    fn finish_push(&mut self, ticket: f64, result: Result<String, ServiceError>) -> String {
        let Some(ticket) = self.pushes.remove(&(ticket as u64)) else {
            return error_json("unknown push ticket");
        };
        match self.editor.complete_push(ticket, result) {
            PushOutcome::Applied => json!({ "outcome": "applied", "code": self.editor.code() }),
            PushOutcome::Stale => json!({ "outcome": "stale" }),
            PushOutcome::Failed(error) => json!({ "outcome": "failed", "error": error }),
        }
        .to_string()
    }

    fn finish_inbound(
        &mut self,
        ticket: f64,
        result: Result<(String, flow_core::wire::ParseResponse), ServiceError>,
    ) -> String {
        let Some(ticket) = self.inbound.remove(&(ticket as u64)) else {
            return error_json("unknown inbound ticket");
        };
        match self.editor.complete_inbound(ticket, result, Instant::now()) {
            Ok(Some(report)) => json!({ "ok": true, "report": report_json(&report) }).to_string(),
            Ok(None) => json!({ "ok": true, "superseded": true }).to_string(),
            Err(e) => error_json(&e.to_string()),
        }
    }
}

fn error_json(message: &str) -> String {
    json!({ "ok": false, "error": message }).to_string()
}

fn report_json(report: &flow_core::ReplaceReport) -> Value {
    json!({
        "duplicateNodes": report.duplicate_nodes.iter().map(|id| id.as_str()).collect::<Vec<_>>(),
        "duplicateEdges": report.duplicate_edges.iter().map(|id| id.as_str()).collect::<Vec<_>>(),
        "danglingEdges": report.dangling_edges.iter().map(|id| id.as_str()).collect::<Vec<_>>(),
    })
}

// ─── Logging & panics ────────────────────────────────────────────────────

/// Route `log` output to the console at `level` (`error` .. `trace`).
#[wasm_bindgen]
pub fn init_logging(level: &str) {
    logger::init(logger::parse_level(level));
}

fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("FlowLang Canvas panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canvas_with_two_nodes() -> (FlowCanvas, String, String) {
        let mut canvas = FlowCanvas::new(800, 600);
        let a = canvas.add_node_at("event", 0.0, 0.0);
        let b = canvas.add_node_at("activity", 0.0, 200.0);
        (canvas, a, b)
    }

    #[test]
    fn document_roundtrips_through_json() {
        let (mut canvas, a, b) = canvas_with_two_nodes();
        assert!(!canvas.connect(&a, &b).is_empty());
        let json = canvas.document_json();

        let mut other = FlowCanvas::new(800, 600);
        let result: Value = serde_json::from_str(&other.load_document(&json)).unwrap();
        assert_eq!(result["ok"], true);
        assert_eq!(result["report"]["danglingEdges"], json!([]));

        let doc: Value = serde_json::from_str(&other.document_json()).unwrap();
        assert_eq!(doc["nodes"][0]["id"], a.as_str());
        assert_eq!(doc["edges"][0]["target"], b.as_str());
    }

    #[test]
    fn loading_does_not_schedule_a_push() {
        let (canvas, _, _) = canvas_with_two_nodes();
        let json = canvas.document_json();
        let mut other = FlowCanvas::new(800, 600);
        other.load_document(&json);
        assert_eq!(other.next_deadline_ms(), -1.0);
    }

    #[test]
    fn local_edit_arms_the_debounce() {
        let (canvas, _, _) = canvas_with_two_nodes();
        let ms = canvas.next_deadline_ms();
        assert!(ms > 0.0 && ms <= 1000.0, "{ms}");
    }

    #[test]
    fn node_patch_from_props_json() {
        let (mut canvas, a, _) = canvas_with_two_nodes();
        assert!(canvas.update_node(&a, r#"{"label":"Kickoff","shape":"circle"}"#));
        canvas.click_node(&a);
        let node: Value = serde_json::from_str(&canvas.focused_node_json()).unwrap();
        assert_eq!(node["data"]["label"], "Kickoff");
        assert_eq!(node["data"]["shape"], "circle");
    }

    #[test]
    fn edge_patch_clears_label_and_arrow() {
        let (mut canvas, a, b) = canvas_with_two_nodes();
        let e = canvas.connect(&a, &b);
        assert!(canvas.update_edge(&e, r#"{"label":"go"}"#));
        assert!(canvas.update_edge(&e, r#"{"label":"","arrow":false}"#));
        let doc: Value = serde_json::from_str(&canvas.document_json()).unwrap();
        assert!(doc["edges"][0].get("label").is_none());
        assert!(doc["edges"][0].get("markerEnd").is_none());
    }

    #[test]
    fn sync_now_round_trip() {
        let (mut canvas, _, _) = canvas_with_two_nodes();
        let push: Value = serde_json::from_str(&canvas.sync_now()).unwrap();
        assert_eq!(push["url"], "http://localhost:8000/api/sync-diagram/");
        assert_eq!(push["body"]["nodes"].as_array().unwrap().len(), 2);

        let ticket = push["ticket"].as_f64().unwrap();
        let outcome: Value = serde_json::from_str(&canvas.complete_push(
            ticket,
            r#"{"success":true,"flowlang_code":"a > b"}"#,
        ))
        .unwrap();
        assert_eq!(outcome["outcome"], "applied");
        assert_eq!(canvas.get_code(), "a > b");
    }

    #[test]
    fn failed_parse_reports_error() {
        let (mut canvas, _, _) = canvas_with_two_nodes();
        let request: Value = serde_json::from_str(&canvas.begin_parse("???")).unwrap();
        let ticket = request["ticket"].as_f64().unwrap();
        let result: Value = serde_json::from_str(&canvas.complete_parse(
            ticket,
            "???",
            r#"{"success":false,"error":"unexpected token"}"#,
        ))
        .unwrap();
        assert_eq!(result["ok"], false);
        assert!(canvas.last_error().contains("unexpected token"));
        let doc: Value = serde_json::from_str(&canvas.document_json()).unwrap();
        assert_eq!(doc["nodes"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn export_names_and_svg() {
        let (mut canvas, _, _) = canvas_with_two_nodes();
        canvas.set_title("Onboarding");
        assert_eq!(canvas.export_file_name("png"), "Onboarding.png");
        assert!(canvas.export_svg().starts_with("<svg"));
        assert!(canvas.render_svg().contains(r#"class="minimap""#));
        canvas.set_chrome(false, false, false, false);
        assert!(!canvas.render_svg().contains(r#"class="minimap""#));
    }

    #[test]
    fn loading_an_empty_document_clears_code() {
        let (mut canvas, _, _) = canvas_with_two_nodes();
        let push: Value = serde_json::from_str(&canvas.sync_now()).unwrap();
        let ticket = push["ticket"].as_f64().unwrap();
        canvas.complete_push(ticket, r#"{"success":true,"flowlang_code":"a > b"}"#);
        assert_eq!(canvas.get_code(), "a > b");

        canvas.load_document(r#"{"title":"","nodes":[],"edges":[]}"#);
        assert_eq!(canvas.get_code(), "");
    }

    fn small_canvas() -> (FlowCanvas, String, String) {
        let (mut canvas, a, b) = canvas_with_two_nodes();
        canvas.resize(200, 150);
        assert!(canvas.set_export_config(r#"{"pixel_ratio": 1.0}"#));
        (canvas, a, b)
    }

    #[test]
    fn raster_export_restores_the_live_view() {
        let (mut canvas, _, _) = small_canvas();
        canvas.set_viewport(-20.0, 10.0, 1.25);
        let before = canvas.viewport_json();
        let png = canvas.export_bytes("png").unwrap();
        assert!(png.starts_with(b"\x89PNG"));
        assert_eq!(canvas.viewport_json(), before);
        assert!(canvas.render_svg().contains(r#"class="minimap""#));

        let pdf = canvas.export_bytes("pdf").unwrap();
        assert!(pdf.starts_with(b"%PDF"));
    }

    #[test]
    fn clipboard_export_needs_page_support() {
        let (mut canvas, _, _) = small_canvas();
        let err = canvas.export_bytes("clipboard").unwrap_err();
        assert!(err.contains("cannot hold images"), "{err}");

        canvas.set_clipboard_images(true);
        let png = canvas.export_bytes("clipboard").unwrap();
        assert!(png.starts_with(b"\x89PNG"));
    }

    #[test]
    fn unknown_or_empty_exports_fail() {
        let (mut canvas, _, _) = small_canvas();
        assert!(canvas.export_bytes("gif").is_err());
        canvas.clear_canvas();
        assert!(canvas.export_bytes("svg").is_err());
    }
}
