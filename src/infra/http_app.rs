use axum::{
    routing::{any_service, get, post},
    Router,
};
use std::sync::Arc;

use crate::infra::runtime::mcp_transport::{make_streamable_http_service, LocalSessionManager};
use crate::tools::fetch::tool_router::FetchSvc;
use crate::tools::registry::ToolRegistry;

fn mcp_routes(svc: FetchSvc) -> Router {
    let session_mgr = Arc::new(LocalSessionManager::default());
    let factory = move || (svc.clone(), FetchSvc::router());
    let mcp_service = make_streamable_http_service(factory, session_mgr);

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .route_service("/mcp", any_service(mcp_service))
}

/// `/healthz` + streamable MCP at `/mcp`.
pub fn build_app_default(svc: FetchSvc) -> Router {
    mcp_routes(svc)
}

/// Default app **plus** the deprecated JSON-RPC shim at `/v1/tools`.
pub fn build_app_with_deprecated_api(svc: FetchSvc, registry: ToolRegistry) -> Router {
    let rest = Router::new()
        .route("/v1/tools", post(crate::api::mcp::http))
        .with_state(registry);
    mcp_routes(svc).merge(rest)
}
