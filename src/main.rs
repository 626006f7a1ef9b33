use mcp_fetch_gateway::infra::{boot, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();
    boot::run_server().await
}
