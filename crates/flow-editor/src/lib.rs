pub mod align;
pub mod clipboard;
pub mod clock;
pub mod config;
pub mod editor;
pub mod selection;
pub mod service;
#[cfg(not(target_arch = "wasm32"))]
pub mod session;
pub mod sync;

pub use clipboard::{ClipboardEngine, Pasted};
pub use clock::Instant;
pub use config::{ConfigError, EditorConfig};
pub use editor::{Editor, EditorAction, GraphMutation, PendingPush};
pub use selection::{Focus, InteractionMode};
pub use service::{
    FlowLangService, JsonFlowLangService, JsonTransport, ServiceError, decode_generate_response,
    decode_parse_response, decode_sync_response, endpoint_url,
};
#[cfg(not(target_arch = "wasm32"))]
pub use session::{EditorSession, SessionEvent};
pub use sync::{ChangeOrigin, PushOutcome};
