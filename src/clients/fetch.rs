//! Top-level fetch entry point, driven as an explicit state machine:
//! `Idle -> Negotiating -> SessionEstablished -> Invoking -> Completed`, with
//! any error jumping straight to `Failed`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::Instrument;

use crate::clients::mcp_http::{McpHttpClient, Session};
use crate::clients::normalize::normalize;
use crate::core::error::FetchError;
use crate::domain::{DocumentRecord, FetchRequest};
use crate::infra::logging::{count_failure, log_metric};
use crate::infra::runtime::limits::DEFAULT_CONNECT_TIMEOUT;

/// Anything that can turn a [`FetchRequest`] into a [`DocumentRecord`].
/// Never fails: failures are encoded in the record.
#[async_trait]
pub trait DocumentFetcher: Send + Sync + 'static {
    async fn fetch(&self, request: &FetchRequest) -> DocumentRecord;
}

#[derive(Debug)]
pub enum FlowState {
    Idle,
    Negotiating,
    SessionEstablished(Session),
    Invoking(Session),
    Completed(DocumentRecord),
    Failed(FetchError),
}

impl FlowState {
    pub fn name(&self) -> &'static str {
        match self {
            FlowState::Idle => "idle",
            FlowState::Negotiating => "negotiating",
            FlowState::SessionEstablished(_) => "session_established",
            FlowState::Invoking(_) => "invoking",
            FlowState::Completed(_) => "completed",
            FlowState::Failed(_) => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::Completed(_) | FlowState::Failed(_))
    }
}

/// One invocation sequence bound to a single request and HTTP client.
pub struct FetchFlow<'a> {
    request: &'a FetchRequest,
    rpc: McpHttpClient<'a>,
    state: FlowState,
}

impl<'a> FetchFlow<'a> {
    pub fn new(request: &'a FetchRequest, rpc: McpHttpClient<'a>) -> Self {
        Self {
            request,
            rpc,
            state: FlowState::Idle,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    /// Perform exactly one transition. Terminal states stay put.
    pub async fn advance(&mut self) {
        let state = std::mem::replace(&mut self.state, FlowState::Idle);
        self.state = Self::step(self.request, &self.rpc, state).await;
    }

    pub async fn run(mut self) -> DocumentRecord {
        loop {
            match std::mem::replace(&mut self.state, FlowState::Idle) {
                FlowState::Completed(record) => return record,
                FlowState::Failed(err) => return DocumentRecord::failure(&self.request.url, &err),
                state => self.state = Self::step(self.request, &self.rpc, state).await,
            }
        }
    }

    async fn step(request: &FetchRequest, rpc: &McpHttpClient<'_>, state: FlowState) -> FlowState {
        let from = state.name();
        let next = Self::transition(request, rpc, state)
            .await
            .unwrap_or_else(FlowState::Failed);
        if let FlowState::Failed(err) = &next {
            tracing::warn!(from, kind = %err.kind(), error = %err, "fetch flow failed");
        } else {
            tracing::debug!(from, to = next.name(), "fetch flow transition");
        }
        next
    }

    async fn transition(
        request: &FetchRequest,
        rpc: &McpHttpClient<'_>,
        state: FlowState,
    ) -> Result<FlowState, FetchError> {
        match state {
            FlowState::Idle => {
                request.validate()?;
                Ok(FlowState::Negotiating)
            }
            FlowState::Negotiating => rpc.negotiate().await.map(FlowState::SessionEstablished),
            FlowState::SessionEstablished(session) => {
                rpc.notify_initialized(&session).await?;
                Ok(FlowState::Invoking(session))
            }
            FlowState::Invoking(session) => {
                let result = rpc.call_tool(&session).await?;
                Ok(FlowState::Completed(normalize(request, &result)))
            }
            terminal => Ok(terminal),
        }
    }
}

/// Stateless client; every call opens its own session and connection pool.
#[derive(Debug, Clone)]
pub struct FetchClient {
    connect_timeout: Duration,
}

impl Default for FetchClient {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl FetchClient {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }

    pub async fn fetch(&self, request: &FetchRequest) -> DocumentRecord {
        let start = Instant::now();
        let record = match McpHttpClient::new(request, self.connect_timeout) {
            Ok(rpc) => {
                let span = tracing::info_span!("fetch", url = %request.url, request_id = %rpc.request_id());
                FetchFlow::new(request, rpc).run().instrument(span).await
            }
            Err(err) => DocumentRecord::failure(&request.url, &err),
        };
        match record.error_kind {
            Some(kind) => count_failure("fetch.invoke", kind),
            None => {
                log_metric("fetch.invoke", "remote_latency_ms", start.elapsed().as_millis() as f64);
                tracing::info!(
                    document_name = %record.document_name,
                    content_length = record.content_length,
                    "fetch completed"
                );
            }
        }
        record
    }
}

#[async_trait]
impl DocumentFetcher for FetchClient {
    async fn fetch(&self, request: &FetchRequest) -> DocumentRecord {
        FetchClient::fetch(self, request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FailureKind;
    use httpmock::prelude::*;
    use serde_json::json;

    fn mock_handshake(server: &MockServer, session: &'static str) {
        server.mock(|when, then| {
            when.method(POST).path("/mcp").json_body_partial(r#"{"method":"initialize"}"#);
            then.status(200).header("mcp-session-id", session).json_body(json!({
                "jsonrpc": "2.0", "id": 1, "result": {"protocolVersion": "2024-11-05", "capabilities": {}}
            }));
        });
        server.mock(|when, then| {
            when.method(POST)
                .path("/mcp")
                .header("mcp-session-id", session)
                .json_body_partial(r#"{"method":"notifications/initialized"}"#);
            then.status(202);
        });
    }

    fn request_for(server: &MockServer) -> FetchRequest {
        FetchRequest::new("https://example.com/article").with_endpoint(server.url("/mcp"))
    }

    #[tokio::test]
    async fn full_flow_produces_document_record() {
        let server = MockServer::start();
        mock_handshake(&server, "sess-a");
        let call = server.mock(|when, then| {
            when.method(POST)
                .path("/mcp")
                .header("mcp-session-id", "sess-a")
                .json_body_partial(r#"{"method":"tools/call","params":{"name":"fetch"}}"#);
            then.status(200).json_body(json!({
                "jsonrpc": "2.0", "id": 2,
                "result": {"content": [
                    {"type": "text", "text": "# Hello\n"},
                    {"type": "resource", "uri": "x"},
                    {"type": "text", "text": "Body text"}
                ]}
            }));
        });

        let rec = FetchClient::default().fetch(&request_for(&server)).await;
        call.assert();
        assert!(rec.success, "{rec:?}");
        assert_eq!(rec.content, "# Hello\nBody text");
        assert_eq!(rec.document_name, "Hello [example.com]");
        assert_eq!(rec.content_length, 17);
    }

    #[tokio::test]
    async fn flow_walks_every_state_in_order() {
        let server = MockServer::start();
        mock_handshake(&server, "sess-b");
        server.mock(|when, then| {
            when.method(POST).path("/mcp").json_body_partial(r#"{"method":"tools/call"}"#);
            then.status(200).json_body(json!({"jsonrpc": "2.0", "id": 2, "result": {"content": "plain"}}));
        });

        let req = request_for(&server);
        let rpc = McpHttpClient::new(&req, Duration::from_secs(2)).unwrap();
        let mut flow = FetchFlow::new(&req, rpc);
        let mut seen = vec![flow.state().name()];
        while !flow.state().is_terminal() {
            flow.advance().await;
            seen.push(flow.state().name());
        }
        assert_eq!(
            seen,
            vec!["idle", "negotiating", "session_established", "invoking", "completed"]
        );
        flow.advance().await;
        assert_eq!(flow.state().name(), "completed");
    }

    #[tokio::test]
    async fn missing_session_header_fails_without_invoking() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/mcp").json_body_partial(r#"{"method":"initialize"}"#);
            then.status(200).json_body(json!({"jsonrpc": "2.0", "id": 1, "result": {}}));
        });
        let call = server.mock(|when, then| {
            when.method(POST).path("/mcp").json_body_partial(r#"{"method":"tools/call"}"#);
            then.status(200).json_body(json!({"jsonrpc": "2.0", "id": 2, "result": {}}));
        });

        let rec = FetchClient::default().fetch(&request_for(&server)).await;
        assert!(!rec.success);
        assert_eq!(rec.error_kind, Some(FailureKind::SessionMissingError));
        assert_eq!(rec.error.as_deref(), Some("No session-id returned"));
        assert_eq!(call.hits(), 0);
    }

    #[tokio::test]
    async fn notification_transport_failure_aborts_before_tool_call() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/mcp").json_body_partial(r#"{"method":"initialize"}"#);
            then.status(200).header("mcp-session-id", "sess-n").json_body(json!({"jsonrpc": "2.0", "id": 1, "result": {}}));
        });
        server.mock(|when, then| {
            when.method(POST)
                .path("/mcp")
                .json_body_partial(r#"{"method":"notifications/initialized"}"#);
            then.status(202).delay(Duration::from_secs(2));
        });
        let call = server.mock(|when, then| {
            when.method(POST).path("/mcp").json_body_partial(r#"{"method":"tools/call"}"#);
            then.status(200).json_body(json!({"jsonrpc": "2.0", "id": 2, "result": {"content": "x"}}));
        });

        let req = request_for(&server);
        let rpc = McpHttpClient::new(&req, Duration::from_secs(2))
            .unwrap()
            .with_notification_timeout(Duration::from_millis(200));
        let rec = FetchFlow::new(&req, rpc).run().await;
        assert!(!rec.success);
        assert_eq!(rec.error_kind, Some(FailureKind::TransportError));
        assert!(rec.error.unwrap().starts_with("Request error: "));
        assert_eq!(call.hits(), 0);
    }

    #[tokio::test]
    async fn array_reply_is_transport_failure_not_empty_document() {
        let server = MockServer::start();
        mock_handshake(&server, "sess-arr");
        server.mock(|when, then| {
            when.method(POST).path("/mcp").json_body_partial(r#"{"method":"tools/call"}"#);
            then.status(200).header("content-type", "application/json").body("[]");
        });

        let rec = FetchClient::default().fetch(&request_for(&server)).await;
        assert!(!rec.success);
        assert_eq!(rec.error_kind, Some(FailureKind::TransportError));
        assert_eq!(rec.content, "");
    }

    #[tokio::test]
    async fn tool_call_non_200_embeds_status_and_bounded_detail() {
        let server = MockServer::start();
        mock_handshake(&server, "sess-c");
        let body = "e".repeat(450);
        server.mock(|when, then| {
            when.method(POST).path("/mcp").json_body_partial(r#"{"method":"tools/call"}"#);
            then.status(500).body(body.as_str());
        });

        let rec = FetchClient::default().fetch(&request_for(&server)).await;
        assert!(!rec.success);
        assert_eq!(rec.error_kind, Some(FailureKind::InvocationError));
        assert!(rec.error.unwrap().contains("500"));
        assert_eq!(rec.details.unwrap().chars().count(), 200);
        assert_eq!(rec.source_url, "https://example.com/article");
    }

    #[tokio::test]
    async fn remote_error_without_message_is_unknown_error() {
        let server = MockServer::start();
        mock_handshake(&server, "sess-d");
        server.mock(|when, then| {
            when.method(POST).path("/mcp").json_body_partial(r#"{"method":"tools/call"}"#);
            then.status(200).json_body(json!({"jsonrpc": "2.0", "id": 2, "error": {"code": -32000}}));
        });

        let rec = FetchClient::default().fetch(&request_for(&server)).await;
        assert_eq!(rec.error_kind, Some(FailureKind::RemoteToolError));
        assert_eq!(rec.error.as_deref(), Some("Unknown error"));
    }

    #[tokio::test]
    async fn empty_url_fails_before_any_request() {
        let server = MockServer::start();
        let any = server.mock(|when, then| {
            when.method(POST).path("/mcp");
            then.status(200);
        });
        let req = FetchRequest::new("").with_endpoint(server.url("/mcp"));
        let rec = FetchClient::default().fetch(&req).await;
        assert_eq!(rec.error_kind, Some(FailureKind::InvalidRequest));
        assert_eq!(any.hits(), 0);
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error() {
        let req = FetchRequest::new("https://example.com").with_endpoint("http://127.0.0.1:9/mcp");
        let rec = FetchClient::new(Duration::from_millis(500)).fetch(&req).await;
        assert!(!rec.success);
        assert_eq!(rec.error_kind, Some(FailureKind::TransportError));
        assert!(rec.error.unwrap().starts_with("Request error: "));
        assert!(rec.details.unwrap().chars().count() <= 200);
    }

    #[tokio::test]
    async fn repeated_fetches_are_identical() {
        let server = MockServer::start();
        mock_handshake(&server, "sess-e");
        server.mock(|when, then| {
            when.method(POST).path("/mcp").json_body_partial(r#"{"method":"tools/call"}"#);
            then.status(200).json_body(json!({"jsonrpc": "2.0", "id": 2, "result": {"title": "T", "content": {"content": "same"}}}));
        });

        let client = FetchClient::default();
        let req = request_for(&server);
        let first = client.fetch(&req).await;
        let second = client.fetch(&req).await;
        assert_eq!(first, second);
        assert_eq!(first.document_name, "T [example.com]");
        assert_eq!(first.content_length, 4);
    }
}
