//! Async driver that connects an [`Editor`] to a [`FlowLangService`].
//!
//! The session sleeps on tokio's clock until the editor's next deadline, then
//! performs whatever became due. It runs on a current-thread runtime (or a
//! browser executor) and never spawns.

use crate::editor::{Editor, EditorAction};
use crate::service::{FlowLangService, ServiceError};
use crate::sync::PushOutcome;
use flow_core::store::ReplaceReport;
use flow_core::wire::ParseRequest;
use tokio::time::{Instant, sleep_until};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Pushed(PushOutcome),
    /// The host should fit its surface to the content.
    FitView,
}

pub struct EditorSession<S> {
    editor: Editor,
    service: S,
}

impl<S: FlowLangService> EditorSession<S> {
    pub fn new(editor: Editor, service: S) -> Self {
        Self { editor, service }
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    /// Perform everything due right now.
    pub async fn run_due(&mut self) -> Vec<SessionEvent> {
        let actions = self.editor.poll(Instant::now());
        let mut events = Vec::with_capacity(actions.len());
        for action in actions {
            match action {
                EditorAction::FitView => events.push(SessionEvent::FitView),
                EditorAction::Push(push) => {
                    let result = self.service.sync_diagram(push.request).await;
                    events.push(SessionEvent::Pushed(self.editor.complete_push(push.ticket, result)));
                }
            }
        }
        events
    }

    /// Sleep to each pending deadline and run it, until nothing is scheduled.
    pub async fn run_until_idle(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Some(deadline) = self.editor.next_deadline() {
            sleep_until(deadline).await;
            events.extend(self.run_due().await);
        }
        events
    }

    /// "Sync Now". `None` for an empty diagram.
    pub async fn sync_now(&mut self) -> Option<PushOutcome> {
        let push = self.editor.sync_now()?;
        let result = self.service.sync_diagram(push.request).await;
        Some(self.editor.complete_push(push.ticket, result))
    }

    /// Parse user-submitted FlowLang and replace the canvas with the result.
    pub async fn submit_code(&mut self, code: &str) -> Result<Option<ReplaceReport>, ServiceError> {
        let (ticket, request) = self.editor.begin_parse(code);
        let result = self.service.parse(request).await.map(|resp| (code.to_string(), resp));
        self.editor.complete_inbound(ticket, result, Instant::now())
    }

    /// Generate FlowLang from a prompt, then parse it onto the canvas.
    pub async fn generate(
        &mut self,
        prompt: &str,
        api_key: &str,
    ) -> Result<Option<ReplaceReport>, ServiceError> {
        let (ticket, request) = self.editor.begin_generate(prompt, api_key);
        let result = match self.service.generate(request).await {
            Ok(code) => {
                let parse = ParseRequest {
                    flowlang_code: code.clone(),
                };
                self.service.parse(parse).await.map(|resp| (code, resp))
            }
            Err(err) => Err(err),
        };
        self.editor.complete_inbound(ticket, result, Instant::now())
    }
}
