//! Debounced synchronization between the canvas and FlowLang code.
//!
//! The controller is sans-IO: callers pass the current [`Instant`] in and
//! receive tickets out. A ticket names a service call the caller should make
//! and is handed back with the result.
//!
//! - **Outbound**: each local edit (re)arms a single debounce deadline. When
//!   [`SyncController::poll`] observes it has passed, it issues one
//!   [`PushTicket`] stamped with the content revision it was built from.
//! - **Inbound**: [`SyncController::begin_inbound`] cancels any pending push.
//!   The graph replacement that follows is tagged
//!   [`ChangeOrigin::ExternalParse`] and never schedules a push of its own.
//!
//! A response is applied only if its ticket's revision is still current.
//! Any later local edit or inbound replacement makes it stale.

use crate::config::SyncConfig;
use crate::service::ServiceError;
use crate::clock::Instant;

/// Where a graph change came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// User interaction on the canvas.
    LocalEdit,
    /// Replacement with a parse or generation result.
    ExternalParse,
}

/// An outbound push the caller should perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PushTicket {
    pub seq: u64,
    pub revision: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundKind {
    /// User-submitted FlowLang text.
    Parse,
    /// AI prompt; the code arrives with the result.
    Generate,
}

/// An inbound parse or generation the caller should perform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundTicket {
    pub seq: u64,
    pub kind: InboundKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// The returned code is now current.
    Applied,
    /// The diagram changed after the push was built; the response was dropped.
    Stale,
    /// The service failed; the code is unchanged and nothing is retried.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct SyncController {
    auto_sync: bool,
    debounce: std::time::Duration,
    deadline: Option<Instant>,
    revision: u64,
    code: String,
    last_error: Option<String>,
    seq: u64,
    /// Most recent inbound ticket; older ones are stale on arrival.
    inbound: Option<u64>,
}

impl SyncController {
    pub fn new(config: &SyncConfig) -> Self {
        Self {
            auto_sync: config.auto_sync,
            debounce: config.debounce(),
            deadline: None,
            revision: 0,
            code: String::new(),
            last_error: None,
            seq: 0,
            inbound: None,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn auto_sync(&self) -> bool {
        self.auto_sync
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    fn next_seq(&mut self) -> u64 {
        self.seq += 1;
        self.seq
    }

    fn ticket(&mut self) -> PushTicket {
        PushTicket {
            seq: self.next_seq(),
            revision: self.revision,
        }
    }

    // ─── Changes ─────────────────────────────────────────────────────────

    /// Record a content change to nodes, edges or title.
    pub fn note_change(&mut self, origin: ChangeOrigin, diagram_empty: bool, now: Instant) {
        self.revision += 1;
        if diagram_empty {
            self.deadline = None;
            self.code.clear();
            return;
        }
        match origin {
            ChangeOrigin::LocalEdit if self.auto_sync => {
                self.deadline = Some(now + self.debounce);
            }
            ChangeOrigin::LocalEdit => {}
            ChangeOrigin::ExternalParse => {
                self.deadline = None;
            }
        }
    }

    pub fn set_auto_sync(&mut self, enabled: bool, diagram_empty: bool, now: Instant) {
        self.auto_sync = enabled;
        if !enabled {
            self.deadline = None;
        } else if !diagram_empty {
            self.deadline = Some(now + self.debounce);
        }
    }

    /// Forget code, errors and any pending push (clear canvas).
    pub fn reset(&mut self) {
        self.revision += 1;
        self.deadline = None;
        self.code.clear();
        self.last_error = None;
        self.inbound = None;
    }

    // ─── Outbound ────────────────────────────────────────────────────────

    /// Issue a push once the debounce deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<PushTicket> {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                Some(self.ticket())
            }
            _ => None,
        }
    }

    /// Push immediately, regardless of the auto-sync flag. An empty diagram
    /// clears the code instead.
    pub fn sync_now(&mut self, diagram_empty: bool) -> Option<PushTicket> {
        self.deadline = None;
        if diagram_empty {
            self.code.clear();
            return None;
        }
        Some(self.ticket())
    }

    pub fn complete_push(
        &mut self,
        ticket: PushTicket,
        result: Result<String, ServiceError>,
    ) -> PushOutcome {
        if ticket.revision != self.revision {
            log::debug!(
                "push #{} dropped: built at revision {}, now {}",
                ticket.seq,
                ticket.revision,
                self.revision
            );
            return PushOutcome::Stale;
        }
        match result {
            Ok(code) => {
                log::info!("sync #{} applied ({} bytes)", ticket.seq, code.len());
                self.code = code;
                self.last_error = None;
                PushOutcome::Applied
            }
            Err(err) => {
                log::warn!("sync #{} failed: {err}", ticket.seq);
                let message = err.to_string();
                self.last_error = Some(message.clone());
                PushOutcome::Failed(message)
            }
        }
    }

    // ─── Inbound ─────────────────────────────────────────────────────────

    /// Start a parse or generation. Cancels any pending push.
    pub fn begin_inbound(&mut self, kind: InboundKind) -> InboundTicket {
        self.deadline = None;
        let seq = self.next_seq();
        self.inbound = Some(seq);
        InboundTicket { seq, kind }
    }

    /// Whether `ticket` is the latest inbound request. Clears it either way.
    pub fn finish_inbound(&mut self, ticket: &InboundTicket) -> bool {
        if self.inbound != Some(ticket.seq) {
            log::debug!("inbound #{} superseded", ticket.seq);
            return false;
        }
        self.inbound = None;
        true
    }

    /// Store the code an applied inbound result came from.
    pub fn accept_inbound_code(&mut self, code: String) {
        self.code = code;
        self.last_error = None;
    }

    pub fn record_error(&mut self, message: String) {
        self.last_error = Some(message);
    }
}
