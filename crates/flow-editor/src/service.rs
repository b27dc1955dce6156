//! The FlowLang service seam.
//!
//! [`FlowLangService`] is what the editor session talks to. The provided
//! implementation, [`JsonFlowLangService`], owns request encoding, response
//! decoding and error mapping, and delegates the HTTP POST itself to a
//! host-supplied [`JsonTransport`] (browser `fetch`, a native client, or a
//! test double).

use flow_core::wire::{CodeResponse, GenerateRequest, ParseRequest, ParseResponse, SyncRequest};
use serde::Serialize;
use std::future::Future;
use thiserror::Error;

pub const SYNC_PATH: &str = "api/sync-diagram/";
pub const GENERATE_PATH: &str = "api/generate-flowlang/";
pub const PARSE_PATH: &str = "api/parse-flowlang/";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// The request never produced a response body.
    #[error("transport failed: {0}")]
    Transport(String),

    #[error("malformed service response: {0}")]
    Decode(String),

    /// The service answered with `success: false`.
    #[error("service error: {0}")]
    Remote(String),

    #[error("service response is missing `{0}`")]
    MissingField(&'static str),
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Decode(err.to_string())
    }
}

/// Raw JSON POST. Implementations return the response body whatever the
/// HTTP status; error payloads are JSON too and are mapped by the caller.
pub trait JsonTransport {
    fn post(&self, url: &str, body: String) -> impl Future<Output = Result<String, ServiceError>>;
}

pub trait FlowLangService {
    /// Canvas → code. Returns the generated FlowLang text.
    fn sync_diagram(&self, request: SyncRequest) -> impl Future<Output = Result<String, ServiceError>>;

    /// Prompt → code.
    fn generate(&self, request: GenerateRequest) -> impl Future<Output = Result<String, ServiceError>>;

    /// Code → graph. Only successful responses are returned.
    fn parse(&self, request: ParseRequest) -> impl Future<Output = Result<ParseResponse, ServiceError>>;
}

fn remote(error: Option<String>) -> ServiceError {
    ServiceError::Remote(error.unwrap_or_else(|| "unknown error".into()))
}

/// Join an endpoint path to a base URL with exactly one `/` between them.
pub fn endpoint_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[derive(Debug, Clone)]
pub struct JsonFlowLangService<T> {
    transport: T,
    base_url: String,
}

impl<T: JsonTransport> JsonFlowLangService<T> {
    pub fn new(transport: T, base_url: impl Into<String>) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// POST `request` as JSON and return the raw response body.
    async fn post<Req: Serialize>(&self, path: &str, request: &Req) -> Result<String, ServiceError> {
        let url = endpoint_url(&self.base_url, path);
        let body = serde_json::to_string(request)?;
        log::debug!("POST {url} ({} bytes)", body.len());
        self.transport.post(&url, body).await
    }
}

impl<T: JsonTransport> FlowLangService for JsonFlowLangService<T> {
    async fn sync_diagram(&self, request: SyncRequest) -> Result<String, ServiceError> {
        decode_sync_response(&self.post(SYNC_PATH, &request).await?)
    }

    async fn generate(&self, request: GenerateRequest) -> Result<String, ServiceError> {
        decode_generate_response(&self.post(GENERATE_PATH, &request).await?)
    }

    async fn parse(&self, request: ParseRequest) -> Result<ParseResponse, ServiceError> {
        decode_parse_response(&self.post(PARSE_PATH, &request).await?)
    }
}

// ─── Response decoding ───────────────────────────────────────────────────
//
// Shared with hosts that perform the POST themselves and hand back the body.

pub fn decode_sync_response(raw: &str) -> Result<String, ServiceError> {
    let resp: CodeResponse = serde_json::from_str(raw)?;
    if !resp.success {
        return Err(remote(resp.error));
    }
    // An empty diagram legitimately syncs to empty code.
    Ok(resp.flowlang_code.unwrap_or_default())
}

pub fn decode_generate_response(raw: &str) -> Result<String, ServiceError> {
    let resp: CodeResponse = serde_json::from_str(raw)?;
    if !resp.success {
        return Err(remote(resp.error));
    }
    resp.flowlang_code
        .filter(|code| !code.trim().is_empty())
        .ok_or(ServiceError::MissingField("flowlang_code"))
}

pub fn decode_parse_response(raw: &str) -> Result<ParseResponse, ServiceError> {
    let resp: ParseResponse = serde_json::from_str(raw)?;
    if !resp.success {
        return Err(remote(resp.error));
    }
    Ok(resp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Records every POST and answers with a canned body.
    struct Canned {
        reply: String,
        calls: RefCell<Vec<(String, serde_json::Value)>>,
    }

    impl Canned {
        fn new(reply: &str) -> Self {
            Self {
                reply: reply.into(),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl JsonTransport for Canned {
        async fn post(&self, url: &str, body: String) -> Result<String, ServiceError> {
            let value = serde_json::from_str(&body).map_err(ServiceError::from)?;
            self.calls.borrow_mut().push((url.to_string(), value));
            Ok(self.reply.clone())
        }
    }

    #[test]
    fn sync_without_code_is_empty() {
        assert_eq!(decode_sync_response(r#"{"success": true}"#).unwrap(), "");
    }

    #[test]
    fn generate_without_code_is_missing_field() {
        let err = decode_generate_response(r#"{"success": true, "flowlang_code": "  "}"#).unwrap_err();
        assert_eq!(err, ServiceError::MissingField("flowlang_code"));
    }

    #[test]
    fn endpoint_joining() {
        assert_eq!(
            endpoint_url("http://localhost:8000/", SYNC_PATH),
            "http://localhost:8000/api/sync-diagram/"
        );
        assert_eq!(
            endpoint_url("https://flow.example", "/api/parse-flowlang/"),
            "https://flow.example/api/parse-flowlang/"
        );
    }

    #[tokio::test]
    async fn sync_posts_to_sync_endpoint() {
        let service = JsonFlowLangService::new(
            Canned::new(r#"{"success": true, "flowlang_code": "flowchart"}"#),
            "http://localhost:8000/",
        );
        let request = SyncRequest {
            nodes: vec![],
            edges: vec![],
            diagram_title: "T".into(),
        };
        assert_eq!(service.sync_diagram(request).await.unwrap(), "flowchart");
        let calls = service.transport().calls.borrow();
        assert_eq!(calls[0].0, "http://localhost:8000/api/sync-diagram/");
        assert_eq!(calls[0].1["diagram_title"], "T");
    }

    #[tokio::test]
    async fn unsuccessful_response_maps_to_remote() {
        let service = JsonFlowLangService::new(
            Canned::new(r#"{"success": false, "error": "GROQ API error (500)"}"#),
            "http://localhost:8000",
        );
        let err = service
            .generate(GenerateRequest {
                prompt: "checkout".into(),
                api_key: "k".into(),
                model: "m".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err, ServiceError::Remote("GROQ API error (500)".into()));
    }

    #[tokio::test]
    async fn garbage_body_is_decode_error() {
        let service = JsonFlowLangService::new(Canned::new("<html>"), "http://x");
        let err = service
            .parse(ParseRequest {
                flowlang_code: "a > b".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Decode(_)));
    }
}
