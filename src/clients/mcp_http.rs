//! Session negotiation and tool invocation against a Streamable HTTP MCP server.
//!
//! All three requests of one invocation go through a single `reqwest::Client`
//! owned by [`McpHttpClient`], so connections are pooled within the session and
//! never shared with another invocation.

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::{json, Value as J};

use crate::core::error::FetchError;
use crate::core::mcp::{
    InitializeParams, RpcEnvelope, RpcNotification, RpcRequest, ToolCallParams, INITIALIZE_ID,
    METHOD_INITIALIZE, METHOD_INITIALIZED, METHOD_TOOLS_CALL, TOOLS_CALL_ID,
};
use crate::domain::FetchRequest;
use crate::infra::http::headers::{add_standard_headers, generate_request_id};
use crate::infra::runtime::limits::make_http_client;

pub const SESSION_HEADER: &str = "mcp-session-id";
pub const ACCEPT_STREAM_OR_JSON: &str = "text/event-stream,application/json";
/// The initialized notification is fire-and-forget but still bounded.
pub const NOTIFICATION_TIMEOUT: Duration = Duration::from_secs(10);
pub const FETCH_TOOL: &str = "fetch";
pub const IGNORE_ROBOTS_ARG: &str = "--ignore-robots-txt";

/// Opaque identifier issued by the server in the initialize response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session(String);

impl Session {
    pub fn id(&self) -> &str {
        &self.0
    }
}

#[derive(Serialize, Debug)]
struct FetchArguments<'a> {
    url: &'a str,
    max_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    args: Option<[&'static str; 1]>,
}

pub struct McpHttpClient<'a> {
    request: &'a FetchRequest,
    http: Client,
    request_id: String,
    notification_timeout: Duration,
}

impl<'a> McpHttpClient<'a> {
    pub fn new(request: &'a FetchRequest, connect_timeout: Duration) -> Result<Self, FetchError> {
        let http = make_http_client(connect_timeout)?;
        Ok(Self {
            request,
            http,
            request_id: generate_request_id(),
            notification_timeout: NOTIFICATION_TIMEOUT,
        })
    }

    pub fn with_notification_timeout(mut self, timeout: Duration) -> Self {
        self.notification_timeout = timeout;
        self
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    fn post(&self, session: Option<&Session>, timeout: Duration) -> RequestBuilder {
        let mut builder = self
            .http
            .post(&self.request.endpoint)
            .timeout(timeout)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, ACCEPT_STREAM_OR_JSON);
        if let Some(key) = self.request.api_key.as_deref() {
            builder = builder.bearer_auth(key);
        }
        if let Some(session) = session {
            builder = builder.header(SESSION_HEADER, session.id());
        }
        let (builder, _rid) = add_standard_headers(builder, Some(self.request_id.clone()));
        builder
    }

    /// Step 1: `initialize`, returning the session the server assigned.
    pub async fn negotiate(&self) -> Result<Session, FetchError> {
        let payload = RpcRequest::new(
            INITIALIZE_ID,
            METHOD_INITIALIZE,
            InitializeParams {
                protocol_version: &self.request.protocol_version,
                capabilities: json!({}),
                client_info: &self.request.client,
            },
        );
        tracing::debug!(
            endpoint = %self.request.endpoint,
            protocol_version = %self.request.protocol_version,
            "mcp initialize"
        );
        let resp = self
            .post(None, self.request.handshake_timeout)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::handshake(status.as_u16(), &body));
        }

        let session = resp
            .headers()
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Session(s.to_owned()))
            .ok_or(FetchError::SessionMissing)?;
        tracing::debug!(session = %session.id(), "mcp session established");
        Ok(session)
    }

    /// Step 2: `notifications/initialized`. The reply status is not inspected;
    /// only a transport failure is reported.
    pub async fn notify_initialized(&self, session: &Session) -> Result<(), FetchError> {
        let resp = self
            .post(Some(session), self.notification_timeout)
            .json(&RpcNotification::new(METHOD_INITIALIZED))
            .send()
            .await?;
        tracing::trace!(status = resp.status().as_u16(), "initialized notification sent");
        Ok(())
    }

    /// Step 3: `tools/call` on the `fetch` tool; yields the envelope's `result`.
    pub async fn call_tool(&self, session: &Session) -> Result<J, FetchError> {
        let arguments = FetchArguments {
            url: &self.request.url,
            max_length: self.request.max_length,
            args: self.request.ignore_robots.then_some([IGNORE_ROBOTS_ARG]),
        };
        let payload = RpcRequest::new(
            TOOLS_CALL_ID,
            METHOD_TOOLS_CALL,
            ToolCallParams { name: FETCH_TOOL, arguments },
        );
        tracing::debug!(url = %self.request.url, max_length = self.request.max_length, "mcp tools/call fetch");
        let resp = self
            .post(Some(session), self.request.invoke_timeout)
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        if status != StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(FetchError::invocation(status.as_u16(), &body));
        }
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = resp.text().await?;

        let envelope = decode_envelope(content_type.as_deref(), &body)?;
        if let Some(message) = envelope.error_message() {
            return Err(FetchError::RemoteTool { message });
        }
        Ok(envelope.result.unwrap_or_else(|| json!({})))
    }
}

/// Decode a JSON-RPC reply that arrived either as plain JSON or as an SSE stream.
pub fn decode_envelope(content_type: Option<&str>, body: &str) -> Result<RpcEnvelope, FetchError> {
    let trimmed = body.trim_start();
    let is_stream = content_type.is_some_and(|ct| ct.starts_with("text/event-stream"))
        || trimmed.starts_with("data:")
        || trimmed.starts_with("event:");
    if !is_stream {
        let value: J = serde_json::from_str(body)?;
        return RpcEnvelope::from_value(value)
            .ok_or_else(|| FetchError::transport("JSON-RPC reply is not an object"));
    }
    sse_data_events(body)
        .iter()
        .filter_map(|data| serde_json::from_str::<J>(data).ok())
        .filter_map(RpcEnvelope::from_value)
        .find(|env| env.result.is_some() || env.error.is_some())
        .ok_or_else(|| FetchError::transport("no JSON-RPC response in event stream"))
}

fn sse_data_events(body: &str) -> Vec<String> {
    let mut events = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in body.lines() {
        if line.is_empty() {
            if !current.is_empty() {
                events.push(current.join("\n"));
                current.clear();
            }
            continue;
        }
        if let Some(data) = line.strip_prefix("data:") {
            current.push(data.strip_prefix(' ').unwrap_or(data));
        }
    }
    if !current.is_empty() {
        events.push(current.join("\n"));
    }
    events
}
