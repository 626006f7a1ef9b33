use axum::extract::State;
use axum::Json;
use serde_json::{json, Value as J};

use crate::core::error::GatewayError;
use crate::core::mcp::{RpcReq, RpcResp};
use crate::infra::http::json as http_json;
use crate::tools::registry::ToolRegistry;

pub const SERVER_NAME: &str = "mcp-fetch-gateway";

fn tools_list(reg: &ToolRegistry) -> J {
    let tools: Vec<J> = reg
        .list()
        .into_iter()
        .map(|t| json!({ "name": t.name, "description": t.description, "inputSchema": t.input_schema }))
        .collect();
    json!({ "tools": tools })
}

async fn call_tool(reg: &ToolRegistry, params: &J) -> Result<J, GatewayError> {
    let name = params
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| GatewayError::InvalidArguments("missing tool name".into()))?;
    let args = params.get("arguments").unwrap_or(&J::Null);
    reg.call(name, args).await
}

/// Deprecated JSON-RPC shim over the tool registry, mounted at `/v1/tools`.
pub async fn http(State(reg): State<ToolRegistry>, Json(req): Json<RpcReq>) -> Json<RpcResp> {
    tracing::debug!(method = %req.method, id = ?req.id, "HTTP handler invoked");
    let id = req.id.clone();
    let resp = match req.method.as_str() {
        "initialize" => http_json::ok(
            id,
            json!({
                "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") },
                "capabilities": { "tools": {} }
            }),
        ),
        "shutdown" => http_json::ok(id, J::Null),
        "tools.list" | "tools/list" => http_json::ok(id, tools_list(&reg)),
        "tools.call" | "tools/call" => match call_tool(&reg, &req.params).await {
            Ok(out) => http_json::ok(id, out),
            Err(e) => {
                tracing::warn!(error = %e, "tools.call error response");
                http_json::from_gateway_error(id, e)
            }
        },
        _ => http_json::error(
            id,
            http_json::METHOD_NOT_FOUND,
            format!("unknown method: {}", req.method),
        ),
    };
    tracing::trace!(response = ?resp.0, "HTTP handler completed");
    resp
}
