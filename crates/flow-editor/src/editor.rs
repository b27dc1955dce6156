//! The editor aggregate: the single owner of all canvas state.
//!
//! [`Editor`] bundles the graph store, selection, clipboard, sync controller,
//! title and viewport. Every content change goes through
//! [`Editor::apply_mutation`], which re-derives selection and informs the
//! sync controller with the change's origin. Like the controller, the editor
//! never sleeps or performs IO: time comes in as an [`Instant`] and pending
//! work goes out through [`Editor::poll`].

use crate::align::auto_align;
use crate::clipboard::{ClipboardEngine, Pasted};
use crate::config::EditorConfig;
use crate::selection::{Focus, InteractionMode, SelectionCoordinator};
use crate::service::ServiceError;
use crate::sync::{ChangeOrigin, InboundKind, InboundTicket, PushOutcome, PushTicket, SyncController};
use flow_core::id::timestamp_millis;
use flow_core::layout::{CanvasSize, ZoomRange, content_bounds, fit_bounds};
use flow_core::store::ReplaceReport;
use flow_core::wire::{GenerateRequest, ParseRequest, ParseResponse, SyncRequest};
use flow_core::{
    Diagram, Edge, EdgeId, EdgeUpdate, GraphStore, Node, NodeId, NodeKind, NodeUpdate, Point,
    Position, Size, StoreError, Viewport,
};
use crate::clock::Instant;

/// Screen point where toolbar-created nodes land.
const DROP_POINT: Point = Point::new(250.0, 250.0);

/// Per-node footprint used when framing content.
pub const NODE_FOOTPRINT: Size = Size::new(200.0, 80.0);

/// Canvas units left around content by [`Editor::fit_view`].
const FIT_PADDING: f64 = 50.0;

/// A content change to the graph or title.
#[derive(Debug, Clone)]
pub enum GraphMutation {
    AddNode { node: Box<Node> },
    RemoveNode { id: NodeId },
    UpdateNode { id: NodeId, update: Box<NodeUpdate> },
    MoveNode { id: NodeId, position: Position },
    AddEdge { edge: Box<Edge> },
    RemoveEdge { id: EdgeId },
    UpdateEdge { id: EdgeId, update: Box<EdgeUpdate> },
    ReplaceAll { diagram: Box<Diagram> },
    SetTitle { title: String },
    Clear,
}

/// What a mutation did to the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MutationOutcome {
    /// `false` when the target was missing and nothing changed.
    pub changed: bool,
    /// Filled for [`GraphMutation::ReplaceAll`].
    pub report: Option<ReplaceReport>,
}

impl MutationOutcome {
    fn changed(changed: bool) -> Self {
        Self {
            changed,
            report: None,
        }
    }
}

/// A push the host should send, with the request already encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingPush {
    pub ticket: PushTicket,
    pub request: SyncRequest,
}

/// Work that became due at a [`Editor::poll`].
#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    Push(PendingPush),
    /// The host should call [`Editor::fit_view`] with its surface size.
    FitView,
}

pub struct Editor {
    config: EditorConfig,
    store: GraphStore,
    selection: SelectionCoordinator,
    clipboard: ClipboardEngine,
    sync: SyncController,
    title: String,
    viewport: Viewport,
    fit_view_at: Option<Instant>,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        let store = if config.store.allow_self_loops {
            GraphStore::new()
        } else {
            GraphStore::without_self_loops()
        };
        Self {
            clipboard: ClipboardEngine::new(config.clipboard.clone()),
            sync: SyncController::new(&config.sync),
            selection: SelectionCoordinator::new(),
            store,
            title: String::new(),
            viewport: Viewport::default(),
            fit_view_at: None,
            config,
        }
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn code(&self) -> &str {
        self.sync.code()
    }

    pub fn sync(&self) -> &SyncController {
        &self.sync
    }

    pub fn clipboard(&self) -> &ClipboardEngine {
        &self.clipboard
    }

    pub fn focus(&self) -> Focus {
        self.selection.focus()
    }

    pub fn focused_node(&self) -> Option<&Node> {
        match self.focus() {
            Focus::Node(id) => self.store.node(id),
            _ => None,
        }
    }

    pub fn focused_edge(&self) -> Option<&Edge> {
        match self.focus() {
            Focus::Edge(id) => self.store.edge(id),
            _ => None,
        }
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Mirror the live surface's viewport (pan/zoom gestures).
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn snapshot(&self) -> Diagram {
        self.store.snapshot(&self.title)
    }

    // ─── Mutation pipeline ───────────────────────────────────────────────

    /// Apply one content change, then re-derive selection and notify sync.
    pub fn apply_mutation(
        &mut self,
        mutation: GraphMutation,
        origin: ChangeOrigin,
        now: Instant,
    ) -> Result<MutationOutcome, StoreError> {
        let outcome = match mutation {
            GraphMutation::AddNode { node } => {
                self.store.add_node(*node)?;
                MutationOutcome::changed(true)
            }
            GraphMutation::RemoveNode { id } => {
                MutationOutcome::changed(self.store.remove_node(id).is_some())
            }
            GraphMutation::UpdateNode { id, update } => {
                MutationOutcome::changed(self.store.update_node(id, *update))
            }
            GraphMutation::MoveNode { id, position } => {
                MutationOutcome::changed(self.store.set_node_position(id, position))
            }
            GraphMutation::AddEdge { edge } => {
                self.store.add_edge(*edge)?;
                MutationOutcome::changed(true)
            }
            GraphMutation::RemoveEdge { id } => {
                MutationOutcome::changed(self.store.remove_edge(id).is_some())
            }
            GraphMutation::UpdateEdge { id, update } => {
                MutationOutcome::changed(self.store.update_edge(id, *update)?)
            }
            GraphMutation::ReplaceAll { diagram } => {
                let Diagram {
                    title,
                    nodes,
                    edges,
                } = *diagram;
                let report = self.store.replace(nodes, edges);
                self.title = title;
                MutationOutcome {
                    changed: true,
                    report: Some(report),
                }
            }
            GraphMutation::SetTitle { title } => {
                let changed = self.title != title;
                self.title = title;
                MutationOutcome::changed(changed)
            }
            GraphMutation::Clear => {
                self.store.clear();
                self.title.clear();
                self.sync.reset();
                self.fit_view_at = None;
                MutationOutcome::changed(true)
            }
        };

        self.selection.recompute(&mut self.store);
        if outcome.changed {
            self.sync.note_change(origin, self.store.is_empty(), now);
        }
        Ok(outcome)
    }

    fn local(&mut self, mutation: GraphMutation, now: Instant) -> Result<MutationOutcome, StoreError> {
        self.apply_mutation(mutation, ChangeOrigin::LocalEdit, now)
    }

    /// Notify sync after a batch of direct store edits.
    fn after_local_batch(&mut self, changed: bool, now: Instant) {
        self.selection.recompute(&mut self.store);
        if changed {
            self.sync
                .note_change(ChangeOrigin::LocalEdit, self.store.is_empty(), now);
        }
    }

    // ─── Editing operations ──────────────────────────────────────────────

    /// Add a default node of `kind`. Without a position it lands under the
    /// toolbar drop point of the current viewport.
    pub fn add_node_of_kind(
        &mut self,
        kind: NodeKind,
        position: Option<Position>,
        now: Instant,
    ) -> Result<NodeId, StoreError> {
        let position = position.unwrap_or_else(|| {
            let p = self.viewport.to_canvas(DROP_POINT);
            Position::new(p.x as f32, p.y as f32)
        });
        let base = format!("node-{kind}-{}", timestamp_millis());
        let candidate = NodeId::intern(&base);
        let id = if self.store.contains_node(candidate) {
            NodeId::unique(&base, |c| self.store.contains_node(c))
        } else {
            candidate
        };
        let node = Node::new(id, kind, position);
        self.local(GraphMutation::AddNode { node: Box::new(node) }, now)?;
        Ok(id)
    }

    pub fn add_node(&mut self, node: Node, now: Instant) -> Result<NodeId, StoreError> {
        let id = node.id;
        self.local(GraphMutation::AddNode { node: Box::new(node) }, now)?;
        Ok(id)
    }

    /// Connect two nodes with a default-styled edge.
    pub fn connect(&mut self, source: NodeId, target: NodeId, now: Instant) -> Result<EdgeId, StoreError> {
        let base = format!("edge-{source}-{target}");
        let candidate = EdgeId::intern(&base);
        let id = if self.store.contains_edge(candidate) {
            EdgeId::unique(&base, |c| self.store.contains_edge(c))
        } else {
            candidate
        };
        self.add_edge(Edge::new(id, source, target), now)
    }

    pub fn add_edge(&mut self, edge: Edge, now: Instant) -> Result<EdgeId, StoreError> {
        let id = edge.id;
        self.local(GraphMutation::AddEdge { edge: Box::new(edge) }, now)?;
        Ok(id)
    }

    pub fn update_node(&mut self, id: NodeId, update: NodeUpdate, now: Instant) -> bool {
        let mutation = GraphMutation::UpdateNode {
            id,
            update: Box::new(update),
        };
        self.local(mutation, now).is_ok_and(|o| o.changed)
    }

    pub fn move_node(&mut self, id: NodeId, position: Position, now: Instant) -> bool {
        self.local(GraphMutation::MoveNode { id, position }, now)
            .is_ok_and(|o| o.changed)
    }

    pub fn update_edge(&mut self, id: EdgeId, update: EdgeUpdate, now: Instant) -> Result<bool, StoreError> {
        let mutation = GraphMutation::UpdateEdge {
            id,
            update: Box::new(update),
        };
        Ok(self.local(mutation, now)?.changed)
    }

    pub fn delete_node(&mut self, id: NodeId, now: Instant) -> bool {
        self.local(GraphMutation::RemoveNode { id }, now)
            .is_ok_and(|o| o.changed)
    }

    pub fn delete_edge(&mut self, id: EdgeId, now: Instant) -> bool {
        self.local(GraphMutation::RemoveEdge { id }, now)
            .is_ok_and(|o| o.changed)
    }

    /// Delete every selected node (cascading) and every selected edge.
    pub fn delete_selection(&mut self, now: Instant) -> bool {
        let nodes = self.store.selected_node_ids();
        let edges = self.store.selected_edge_ids();
        let mut changed = false;
        for id in nodes {
            changed |= self.store.remove_node(id).is_some();
        }
        for id in edges {
            changed |= self.store.remove_edge(id).is_some();
        }
        self.after_local_batch(changed, now);
        changed
    }

    pub fn set_title(&mut self, title: impl Into<String>, now: Instant) {
        let title = title.into();
        // Title edits never fail.
        let _ = self.local(GraphMutation::SetTitle { title }, now);
    }

    /// Empty the canvas, code and title in one step.
    pub fn clear_canvas(&mut self, now: Instant) {
        // Clear never fails.
        let _ = self.local(GraphMutation::Clear, now);
        log::info!("canvas cleared");
    }

    // ─── Selection ───────────────────────────────────────────────────────

    pub fn set_mode(&mut self, mode: InteractionMode) {
        self.selection.set_mode(mode);
    }

    pub fn click_node(&mut self, id: NodeId) -> bool {
        self.selection.click_node(&mut self.store, id)
    }

    pub fn click_edge(&mut self, id: EdgeId) -> bool {
        self.selection.click_edge(&mut self.store, id)
    }

    pub fn click_background(&mut self) {
        self.selection.click_background(&mut self.store);
    }

    pub fn select_nodes(&mut self, ids: &[NodeId]) {
        self.selection.select_nodes(&mut self.store, ids);
    }

    pub fn select_all(&mut self) {
        self.selection.select_all(&mut self.store);
    }

    // ─── Clipboard ───────────────────────────────────────────────────────

    pub fn copy(&mut self) -> bool {
        self.clipboard.copy(&self.store)
    }

    pub fn cut(&mut self, now: Instant) -> bool {
        let cut = self.clipboard.cut(&mut self.store);
        self.after_local_batch(cut, now);
        cut
    }

    pub fn paste(&mut self, now: Instant) -> Option<Pasted> {
        let pasted = self.clipboard.paste(&mut self.store);
        self.after_local_batch(pasted.is_some(), now);
        pasted
    }

    // ─── Layout ──────────────────────────────────────────────────────────

    /// Grid-align the selection (or everything) and schedule a fit-view.
    pub fn auto_align(&mut self, now: Instant) -> usize {
        let moved = auto_align(&mut self.store, &self.config.align);
        if !moved.is_empty() {
            self.fit_view_at = Some(now + self.config.align.fit_delay());
        }
        self.after_local_batch(!moved.is_empty(), now);
        moved.len()
    }

    /// Frame all content inside a surface of `canvas` pixels.
    pub fn fit_view(&mut self, canvas: CanvasSize) -> Option<Viewport> {
        let bounds = content_bounds(self.store.nodes(), NODE_FOOTPRINT)?;
        self.viewport = fit_bounds(bounds, canvas, FIT_PADDING, ZoomRange::default());
        Some(self.viewport)
    }

    // ─── Time ────────────────────────────────────────────────────────────

    /// Earliest instant at which [`Editor::poll`] has work.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.sync.deadline(), self.fit_view_at) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Collect work that is due at `now`.
    pub fn poll(&mut self, now: Instant) -> Vec<EditorAction> {
        let mut actions = Vec::new();
        if self.fit_view_at.is_some_and(|at| at <= now) {
            self.fit_view_at = None;
            actions.push(EditorAction::FitView);
        }
        if let Some(ticket) = self.sync.poll(now) {
            actions.push(EditorAction::Push(self.pending_push(ticket)));
        }
        actions
    }

    fn pending_push(&self, ticket: PushTicket) -> PendingPush {
        PendingPush {
            ticket,
            request: SyncRequest::from_diagram(&self.snapshot(), &self.config.sync.default_title),
        }
    }

    // ─── Sync ────────────────────────────────────────────────────────────

    pub fn set_auto_sync(&mut self, enabled: bool, now: Instant) {
        self.sync.set_auto_sync(enabled, self.store.is_empty(), now);
    }

    /// "Sync Now": a push regardless of the auto-sync flag, or `None` (and
    /// cleared code) for an empty diagram.
    pub fn sync_now(&mut self) -> Option<PendingPush> {
        let ticket = self.sync.sync_now(self.store.is_empty())?;
        Some(self.pending_push(ticket))
    }

    pub fn complete_push(&mut self, ticket: PushTicket, result: Result<String, ServiceError>) -> PushOutcome {
        self.sync.complete_push(ticket, result)
    }

    /// Start parsing user-submitted code.
    pub fn begin_parse(&mut self, code: impl Into<String>) -> (InboundTicket, ParseRequest) {
        let ticket = self.sync.begin_inbound(InboundKind::Parse);
        (
            ticket,
            ParseRequest {
                flowlang_code: code.into(),
            },
        )
    }

    /// Start an AI generation from a prompt.
    pub fn begin_generate(
        &mut self,
        prompt: impl Into<String>,
        api_key: impl Into<String>,
    ) -> (InboundTicket, GenerateRequest) {
        let ticket = self.sync.begin_inbound(InboundKind::Generate);
        (
            ticket,
            GenerateRequest {
                prompt: prompt.into(),
                api_key: api_key.into(),
                model: self.config.sync.model.clone(),
            },
        )
    }

    /// Finish an inbound request with the code it came from and the parse
    /// result. On success the graph, title and code are replaced; on failure
    /// nothing changes but the recorded error. A superseded ticket is ignored
    /// and reported as `Ok(None)`.
    pub fn complete_inbound(
        &mut self,
        ticket: InboundTicket,
        result: Result<(String, ParseResponse), ServiceError>,
        now: Instant,
    ) -> Result<Option<ReplaceReport>, ServiceError> {
        if !self.sync.finish_inbound(&ticket) {
            return Ok(None);
        }
        let (code, response) = match result {
            Ok(ok) => ok,
            Err(err) => {
                log::warn!("{:?} failed: {err}", ticket.kind);
                self.sync.record_error(err.to_string());
                return Err(err);
            }
        };

        let default_title = match ticket.kind {
            InboundKind::Parse => &self.config.sync.parse_title,
            InboundKind::Generate => &self.config.sync.generate_title,
        };
        let diagram = response.into_diagram(default_title);
        let outcome = self.apply_mutation(
            GraphMutation::ReplaceAll {
                diagram: Box::new(diagram),
            },
            ChangeOrigin::ExternalParse,
            now,
        );
        // ReplaceAll drops invalid entries instead of failing.
        let report = outcome.ok().and_then(|o| o.report).unwrap_or_default();
        if !report.is_clean() {
            log::warn!(
                "inbound graph repaired: {} duplicate nodes, {} duplicate edges, {} dangling edges",
                report.duplicate_nodes.len(),
                report.duplicate_edges.len(),
                report.dangling_edges.len()
            );
        }
        self.sync.accept_inbound_code(code);
        log::info!(
            "loaded {} nodes, {} edges from FlowLang",
            self.store.node_count(),
            self.store.edge_count()
        );
        if !self.store.is_empty() {
            self.fit_view_at = Some(now + self.config.align.fit_delay());
        }
        Ok(Some(report))
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn add_node_of_kind_uses_palette_and_label() {
        let mut editor = Editor::default();
        let t0 = Instant::now();
        let id = editor.add_node_of_kind(NodeKind::Decision, None, t0).unwrap();
        let node = editor.store().node(id).unwrap();
        assert!(id.as_str().starts_with("node-decision-"));
        assert_eq!(node.label, "New decision");
        assert_eq!(node.position, Position::new(250.0, 250.0));
        assert_eq!(node.style.icon, "💎");
    }

    #[test]
    fn toolbar_nodes_land_under_drop_point() {
        let mut editor = Editor::default();
        editor.set_viewport(Viewport {
            x: 50.0,
            y: 50.0,
            zoom: 2.0,
        });
        let id = editor
            .add_node_of_kind(NodeKind::Note, None, Instant::now())
            .unwrap();
        assert_eq!(editor.store().node(id).unwrap().position, Position::new(100.0, 100.0));
    }

    #[test]
    fn same_millisecond_nodes_get_distinct_ids() {
        let mut editor = Editor::default();
        let t0 = Instant::now();
        let a = editor.add_node_of_kind(NodeKind::Event, None, t0).unwrap();
        let b = editor.add_node_of_kind(NodeKind::Event, None, t0).unwrap();
        assert_ne!(a, b);
        assert_eq!(editor.store().node_count(), 2);
    }

    #[test]
    fn local_edit_schedules_push_and_poll_encodes_snapshot() {
        let mut editor = Editor::default();
        let t0 = Instant::now();
        editor.add_node_of_kind(NodeKind::Event, None, t0).unwrap();
        assert_eq!(editor.next_deadline(), Some(t0 + ms(1000)));

        assert!(editor.poll(t0 + ms(999)).is_empty());
        let actions = editor.poll(t0 + ms(1000));
        let [EditorAction::Push(push)] = actions.as_slice() else {
            panic!("expected one push, got {actions:?}");
        };
        assert_eq!(push.request.nodes.len(), 1);
        assert_eq!(push.request.diagram_title, "My Diagram");
    }

    #[test]
    fn selection_changes_do_not_schedule_push() {
        let mut editor = Editor::default();
        let t0 = Instant::now();
        let id = editor.add_node_of_kind(NodeKind::Event, None, t0).unwrap();
        editor.poll(t0 + ms(1000));
        editor.click_node(id);
        assert_eq!(editor.next_deadline(), None);
    }

    #[test]
    fn deleting_last_node_clears_code() {
        let mut editor = Editor::default();
        let t0 = Instant::now();
        let id = editor.add_node_of_kind(NodeKind::Event, None, t0).unwrap();
        let push = editor.sync_now().unwrap();
        editor.complete_push(push.ticket, Ok("Order Placed".into()));
        assert_eq!(editor.code(), "Order Placed");

        editor.delete_node(id, t0 + ms(10));
        assert_eq!(editor.code(), "");
        assert_eq!(editor.next_deadline(), None);
    }

    #[test]
    fn loading_empty_diagram_clears_code() {
        let mut editor = Editor::default();
        let t0 = Instant::now();
        editor.add_node_of_kind(NodeKind::Event, None, t0).unwrap();
        let push = editor.sync_now().unwrap();
        editor.complete_push(push.ticket, Ok("Order Placed".into()));

        editor
            .apply_mutation(
                GraphMutation::ReplaceAll {
                    diagram: Box::new(Diagram::default()),
                },
                ChangeOrigin::ExternalParse,
                t0 + ms(10),
            )
            .unwrap();
        assert!(editor.store().is_empty());
        assert_eq!(editor.code(), "");
    }

    #[test]
    fn moving_in_place_does_not_touch_sync() {
        let mut editor = Editor::default();
        let t0 = Instant::now();
        let id = editor
            .add_node_of_kind(NodeKind::Event, Some(Position::new(10.0, 10.0)), t0)
            .unwrap();
        let push = editor.sync_now().unwrap();
        assert!(!editor.move_node(id, Position::new(10.0, 10.0), t0 + ms(5)));
        assert_eq!(editor.next_deadline(), None);
        assert_eq!(
            editor.complete_push(push.ticket, Ok("flow".into())),
            PushOutcome::Applied
        );
    }

    #[test]
    fn clear_canvas_resets_everything() {
        let mut editor = Editor::default();
        let t0 = Instant::now();
        editor.add_node_of_kind(NodeKind::Event, None, t0).unwrap();
        editor.set_title("Checkout", t0);
        editor.clear_canvas(t0);
        assert!(editor.store().is_empty());
        assert_eq!(editor.title(), "");
        assert_eq!(editor.code(), "");
        assert_eq!(editor.next_deadline(), None);
    }

    #[test]
    fn auto_align_schedules_fit_view() {
        let mut editor = Editor::default();
        let t0 = Instant::now();
        editor.add_node_of_kind(NodeKind::Event, None, t0).unwrap();
        editor.set_auto_sync(false, t0);
        assert_eq!(editor.auto_align(t0), 1);
        assert_eq!(editor.poll(t0 + ms(50)), vec![EditorAction::FitView]);

        let vp = editor.fit_view(CanvasSize::new(800, 600)).unwrap();
        assert!(vp.zoom <= 2.0 && vp.zoom >= 0.1);
    }

    #[test]
    fn connect_rejects_missing_endpoint() {
        let mut editor = Editor::default();
        let t0 = Instant::now();
        let a = editor.add_node_of_kind(NodeKind::Event, None, t0).unwrap();
        let err = editor.connect(a, NodeId::intern("nowhere"), t0).unwrap_err();
        assert!(matches!(err, StoreError::MissingEndpoint { .. }));
    }
}
