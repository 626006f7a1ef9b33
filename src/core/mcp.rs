//! JSON-RPC 2.0 envelopes, both for talking to an upstream MCP server and for
//! answering on the deprecated REST shim.

use serde::{Deserialize, Serialize};
use serde_json::Value as J;

use crate::domain::ClientIdentity;

pub const JSONRPC_VERSION: &str = "2.0";

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_INITIALIZED: &str = "notifications/initialized";
pub const METHOD_TOOLS_CALL: &str = "tools/call";

pub const INITIALIZE_ID: u64 = 1;
pub const TOOLS_CALL_ID: u64 = 2;

// --- Client side ---

#[derive(Serialize, Debug, Clone)]
pub struct RpcRequest<P> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'static str,
    pub params: P,
}

impl<P: Serialize> RpcRequest<P> {
    pub fn new(id: u64, method: &'static str, params: P) -> Self {
        Self { jsonrpc: JSONRPC_VERSION, id, method, params }
    }
}

/// A request without `id`; the server does not answer it.
#[derive(Serialize, Debug, Clone)]
pub struct RpcNotification {
    pub jsonrpc: &'static str,
    pub method: &'static str,
}

impl RpcNotification {
    pub fn new(method: &'static str) -> Self {
        Self { jsonrpc: JSONRPC_VERSION, method }
    }
}

#[derive(Serialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams<'a> {
    pub protocol_version: &'a str,
    pub capabilities: J,
    pub client_info: &'a ClientIdentity,
}

#[derive(Serialize, Debug, Clone)]
pub struct ToolCallParams<A> {
    pub name: &'static str,
    pub arguments: A,
}

/// Reply envelope as sent by the upstream server. `error` is kept loose since
/// servers disagree on its shape; a present key counts even when it is `null`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RpcEnvelope {
    pub result: Option<J>,
    pub error: Option<J>,
}

impl RpcEnvelope {
    /// Only a JSON object is an envelope.
    pub fn from_value(v: J) -> Option<Self> {
        let J::Object(mut map) = v else {
            return None;
        };
        Some(Self {
            result: map.remove("result"),
            error: map.remove("error"),
        })
    }

    pub fn error_message(&self) -> Option<String> {
        let err = self.error.as_ref()?;
        Some(
            err.get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown error")
                .to_string(),
        )
    }
}

// --- Server side (REST shim) ---

#[derive(Deserialize, Debug)]
pub struct RpcReq {
    pub jsonrpc: String,
    pub id: J,
    pub method: String,
    #[serde(default)]
    pub params: J,
}

#[derive(Serialize, Debug, Clone)]
pub struct RpcResp {
    pub jsonrpc: &'static str,
    pub id: J,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<J>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErr>,
}

#[derive(Serialize, Debug, Clone)]
pub struct RpcErr {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<J>,
}

pub fn ok(id: J, result: J) -> RpcResp {
    RpcResp { jsonrpc: JSONRPC_VERSION, id, result: Some(result), error: None }
}
pub fn err(id: J, code: i32, msg: impl Into<String>, data: Option<J>) -> RpcResp {
    RpcResp { jsonrpc: JSONRPC_VERSION, id, result: None, error: Some(RpcErr { code, message: msg.into(), data }) }
}
