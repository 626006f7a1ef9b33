use std::sync::Arc;

use axum::{routing::any_service, Router};
use http_body_util::BodyExt; // for .collect
use hyper::{header, Request, StatusCode};
use serde_json::{json, Value};
use tokio::time::{timeout, Duration};
use tower::ServiceExt; // for .oneshot

use mcp_fetch_gateway::clients::fetch::{DocumentFetcher, FetchClient};
use mcp_fetch_gateway::infra::config::FetchSettings;
use mcp_fetch_gateway::infra::runtime::mcp_transport;
use mcp_fetch_gateway::tools::fetch::tool_router::{FetchRouter, FetchSvc};

static MCP_PROTOCOL_VERSION: &str = "2025-03-26";

fn rpc_request(body: &Value, session_id: Option<&str>) -> Request<axum::body::Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/mcp")
        .header(header::ACCEPT, "application/json, text/event-stream")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(id) = session_id {
        builder = builder.header("MCP-Session-Id", id);
    }
    builder.body(axum::body::Body::from(body.to_string())).unwrap()
}

fn first_sse_payload(bytes: &[u8]) -> Value {
    String::from_utf8_lossy(bytes)
        .lines()
        .find_map(|line| line.strip_prefix("data: ").map(|d| d.to_string()))
        .and_then(|d| serde_json::from_str::<Value>(&d).ok())
        .expect("Did not find an rpcResponse in the event stream")
}

#[tokio::test]
async fn initialize_list_and_fetch_through_streamable_http() {
    let upstream = httpmock::MockServer::start();
    upstream.mock(|when, then| {
        when.method(httpmock::Method::POST)
            .path("/mcp")
            .json_body_partial(r#"{"method":"initialize"}"#);
        then.status(200)
            .header("mcp-session-id", "upstream-session")
            .json_body(json!({"jsonrpc": "2.0", "id": 1, "result": {}}));
    });
    upstream.mock(|when, then| {
        when.method(httpmock::Method::POST)
            .path("/mcp")
            .json_body_partial(r#"{"method":"notifications/initialized"}"#);
        then.status(202);
    });
    upstream.mock(|when, then| {
        when.method(httpmock::Method::POST)
            .path("/mcp")
            .header("mcp-session-id", "upstream-session")
            .json_body_partial(r#"{"method":"tools/call","params":{"name":"fetch"}}"#);
        then.status(200).json_body(json!({
            "jsonrpc": "2.0", "id": 2,
            "result": {"content": [{"type": "text", "text": "plain page"}]}
        }));
    });

    let factory = {
        let settings = FetchSettings {
            endpoint: upstream.url("/mcp"),
            ..FetchSettings::default()
        };
        let fetcher: Arc<dyn DocumentFetcher> = Arc::new(FetchClient::default());
        move || {
            let svc = FetchSvc::new(fetcher.clone(), settings.clone());
            let tools: FetchRouter = FetchSvc::router();
            (svc, tools)
        }
    };

    let session_mgr = Arc::new(mcp_transport::LocalSessionManager::default());
    let app = mcp_transport::make_streamable_http_service(factory, session_mgr);
    let app = Router::new().route_service("/mcp", any_service(app));

    // Initialize
    let init = json!({
        "jsonrpc":"2.0","id":1,"method":"initialize",
        "params":{ "protocolVersion":MCP_PROTOCOL_VERSION,"capabilities":{},"clientInfo":{"name":"test","version":"0.1"} }
    });
    let init_res = app.clone().oneshot(rpc_request(&init, None)).await.unwrap();
    assert!(init_res.status().is_success());
    let session_id = init_res
        .headers()
        .get("MCP-Session-Id")
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();

    // notifications/initialized
    let initialized = json!({"jsonrpc":"2.0","method":"notifications/initialized","params":{}});
    let initialized_res = app
        .clone()
        .oneshot(rpc_request(&initialized, Some(&session_id)))
        .await
        .unwrap();
    assert_eq!(initialized_res.status(), StatusCode::ACCEPTED);

    // tools/list
    let list = json!({"jsonrpc":"2.0","id":2,"method":"tools/list","params":{}});
    let list_res = timeout(
        Duration::from_secs(20),
        app.clone().oneshot(rpc_request(&list, Some(&session_id))),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(list_res.status().is_success());
    let bytes = list_res.into_body().collect().await.unwrap().to_bytes();
    let v = first_sse_payload(&bytes);
    let tools = v["result"]["tools"].as_array().unwrap();
    assert!(tools.iter().any(|t| t["name"] == "web.fetch"));

    // tools/call
    let call = json!({
        "jsonrpc":"2.0","id":3,"method":"tools/call",
        "params": {"name":"web.fetch","arguments":{"url":"https://example.com:8443/page"}}
    });
    let call_res = timeout(
        Duration::from_secs(20),
        app.clone().oneshot(rpc_request(&call, Some(&session_id))),
    )
    .await
    .unwrap()
    .unwrap();
    assert!(call_res.status().is_success());
    let bytes = call_res.into_body().collect().await.unwrap().to_bytes();
    let v = first_sse_payload(&bytes);
    let rec = &v["result"]["structuredContent"];
    assert_eq!(rec["success"], true);
    assert_eq!(rec["document_name"], "Web Content [example.com:8443]");
    assert_eq!(rec["content"], "plain page");
    assert_eq!(rec["content_length"], 10);
}
