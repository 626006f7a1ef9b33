//! `web.fetch`: the fetch client exposed as a gateway tool.

pub mod tool_router;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value as J};

use crate::clients::fetch::DocumentFetcher;
use crate::core::error::GatewayError;
use crate::core::tool::{Tool, ToolSpec};
use crate::domain::FetchRequest;
use crate::infra::config::FetchSettings;

pub const TOOL_NAME: &str = "web.fetch";
pub const TOOL_DESCRIPTION: &str =
    "Fetch a web page through the remote MCP fetch service and return it as a document record";

/// Caller-facing arguments; everything but `url` falls back to [`FetchSettings`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FetchArgs {
    pub url: String,
    #[serde(default)]
    pub custom_name: Option<String>,
    #[serde(default)]
    pub max_length: Option<usize>,
    #[serde(default)]
    pub ignore_robots: Option<bool>,
}

impl FetchArgs {
    pub fn from_json(v: &J) -> Result<Self, String> {
        if v.get("url").and_then(|u| u.as_str()).is_none() {
            return Err("missing required field: url".into());
        }
        serde_json::from_value(v.clone()).map_err(|e| e.to_string())
    }

    pub fn into_request(self, settings: &FetchSettings) -> FetchRequest {
        let mut req = settings.request(self.url);
        if let Some(name) = self.custom_name {
            req = req.with_custom_name(name);
        }
        if let Some(max_length) = self.max_length {
            req = req.with_max_length(max_length);
        }
        if let Some(ignore) = self.ignore_robots {
            req = req.with_ignore_robots(ignore);
        }
        req
    }
}

pub fn input_schema() -> J {
    json!({
        "type": "object",
        "properties": {
            "url": { "type": "string", "description": "Page to fetch" },
            "custom_name": { "type": "string", "description": "Document name override" },
            "max_length": { "type": "integer", "minimum": 1 },
            "ignore_robots": { "type": "boolean" }
        },
        "required": ["url"]
    })
}

#[derive(Clone)]
pub struct FetchTool {
    fetcher: Arc<dyn DocumentFetcher>,
    settings: FetchSettings,
}

impl FetchTool {
    pub fn new(fetcher: Arc<dyn DocumentFetcher>, settings: FetchSettings) -> Self {
        Self { fetcher, settings }
    }
}

impl ToolSpec for FetchTool {
    fn name(&self) -> &'static str {
        TOOL_NAME
    }
    fn description(&self) -> &'static str {
        TOOL_DESCRIPTION
    }
    fn input_schema(&self) -> J {
        input_schema()
    }
}

#[async_trait]
impl Tool for FetchTool {
    async fn call(&self, arguments: &J) -> Result<J, GatewayError> {
        let args = FetchArgs::from_json(arguments).map_err(GatewayError::InvalidArguments)?;
        let record = self.fetcher.fetch(&args.into_request(&self.settings)).await;
        serde_json::to_value(record).map_err(|e| GatewayError::Message(e.to_string()))
    }
}
