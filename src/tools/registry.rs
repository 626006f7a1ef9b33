use std::collections::HashMap;
use std::sync::Arc;

use crate::clients::fetch::DocumentFetcher;
use crate::core::error::GatewayError;
use crate::core::tool::Tool;
use crate::infra::config::FetchSettings;
use crate::tools::fetch::FetchTool;

#[derive(Clone, Default)]
pub struct ToolRegistry {
    by_name: Arc<HashMap<&'static str, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tools<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Tool>>,
    {
        let mut reg = Self::new();
        for t in iter {
            reg.register(t);
        }
        reg
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        Arc::make_mut(&mut self.by_name).insert(tool.name(), tool);
    }

    pub fn list(&self) -> Vec<ToolMeta> {
        let mut metas: Vec<ToolMeta> = self
            .by_name
            .values()
            .map(|t| ToolMeta {
                name: t.name(),
                description: t.description(),
                input_schema: t.input_schema(),
            })
            .collect();
        metas.sort_by_key(|m| m.name);
        metas
    }

    pub async fn call(&self, name: &str, args: &serde_json::Value) -> Result<serde_json::Value, GatewayError> {
        let t = self
            .by_name
            .get(name)
            .ok_or_else(|| GatewayError::UnknownTool(name.to_string()))?;
        t.call(args).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolMeta {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: serde_json::Value,
}

/// Registry with the fetch tool wired to `fetcher`.
pub fn build_registry(fetcher: Arc<dyn DocumentFetcher>, settings: FetchSettings) -> ToolRegistry {
    ToolRegistry::with_tools([Arc::new(FetchTool::new(fetcher, settings)) as Arc<dyn Tool>])
}
