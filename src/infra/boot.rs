use std::net::SocketAddr;
use std::sync::Arc;

use crate::clients::fetch::{DocumentFetcher, FetchClient};
use crate::infra::config::{AppConfig, Config};
use crate::infra::http_app::{build_app_default, build_app_with_deprecated_api};
use crate::infra::runtime::mcp_transport::serve_stdio;
use crate::tools::fetch::tool_router::FetchSvc;
use crate::tools::registry::build_registry;

pub async fn run_server() -> anyhow::Result<()> {
    let cfg = Config::from_env();
    let settings = AppConfig::from_env_and_toml().fetch;
    tracing::info!(
        mode = %cfg.mode,
        port = cfg.port,
        deprecate_rest = cfg.deprecate_rest,
        endpoint = %settings.endpoint,
        "BOOT mcp-fetch-gateway"
    );

    let fetcher: Arc<dyn DocumentFetcher> = Arc::new(FetchClient::new(settings.connect_timeout()));
    let svc = FetchSvc::new(fetcher.clone(), settings.clone());

    if cfg.mode == "stdio" {
        serve_stdio(move || (svc, FetchSvc::router()))
            .await
            .map_err(|e| anyhow::anyhow!(e))?;
        return Ok(());
    }

    let app = if cfg.deprecate_rest {
        build_app_default(svc)
    } else {
        build_app_with_deprecated_api(svc, build_registry(fetcher, settings))
    };

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
