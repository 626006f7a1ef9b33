use std::sync::Arc;

use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;

use crate::clients::fetch::DocumentFetcher;
use crate::infra::config::FetchSettings;
use crate::infra::runtime::mcp_transport::ServerHandler;
use crate::tools::fetch::FetchArgs;

/// MCP server handler exposing the fetch client as `web.fetch`.
#[derive(Clone)]
pub struct FetchSvc {
    pub fetcher: Arc<dyn DocumentFetcher>,
    pub settings: FetchSettings,
}

impl ServerHandler for FetchSvc {}

#[rmcp::tool_router]
impl FetchSvc {
    #[rmcp::tool(
        name = "web.fetch",
        description = "Fetch a web page through the remote MCP fetch service and return {success, document_name, content, ...} as JSON"
    )]
    async fn web_fetch(
        &self,
        params: Parameters<rmcp::model::JsonObject>,
    ) -> Result<rmcp::Json<serde_json::Value>, rmcp::ErrorData> {
        tracing::debug!(params = ?params.0, "web_fetch invoked");
        let args = FetchArgs::from_json(&serde_json::Value::Object(params.0))
            .map_err(|e| rmcp::ErrorData::invalid_params(e, None))?;
        let record = self.fetcher.fetch(&args.into_request(&self.settings)).await;
        let payload = serde_json::to_value(&record)
            .map_err(|e| rmcp::ErrorData::internal_error(e.to_string(), None))?;
        Ok(rmcp::Json(payload))
    }
}

pub type FetchRouter = ToolRouter<FetchSvc>;

impl FetchSvc {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, settings: FetchSettings) -> Self {
        Self { fetcher, settings }
    }

    pub fn router() -> FetchRouter {
        // Wrapper to expose the macro-generated private tool_router
        Self::tool_router()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::fetch::test_support::StubFetcher;
    use serde_json::json;

    fn svc() -> (FetchSvc, Arc<StubFetcher>) {
        let stub = Arc::new(StubFetcher::default());
        (FetchSvc::new(stub.clone(), FetchSettings::default()), stub)
    }

    #[test]
    fn router_contains_web_fetch() {
        let names: Vec<String> = FetchSvc::router()
            .into_iter()
            .map(|r| r.name().to_string())
            .collect();
        assert!(names.iter().any(|n| n == "web.fetch"), "got: {:?}", names);
    }

    #[tokio::test]
    async fn missing_url_is_invalid_params() {
        let (svc, _) = svc();
        let params = Parameters(json!({}).as_object().unwrap().clone());
        let err = match svc.web_fetch(params).await {
            Err(e) => e,
            Ok(_) => panic!("expected invalid params"),
        };
        assert_eq!(err.code.0, -32602);
        assert!(err.message.contains("missing required field: url"));
    }

    #[tokio::test]
    async fn returns_record_as_structured_json() {
        let (svc, stub) = svc();
        let params = Parameters(
            json!({"url": "https://example.com", "custom_name": "X"})
                .as_object()
                .unwrap()
                .clone(),
        );
        let rmcp::Json(val) = svc.web_fetch(params).await.expect("tool should succeed");
        assert_eq!(val["success"], true);
        assert_eq!(val["source_url"], "https://example.com");
        assert_eq!(stub.seen.lock().unwrap()[0].custom_name.as_deref(), Some("X"));
    }

    #[test]
    fn implements_server_handler() {
        fn assert_server_handler<T: ServerHandler>(_handler: T) {}
        assert_server_handler(svc().0);
    }
}
