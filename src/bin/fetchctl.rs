use std::process::ExitCode;

use mcp_fetch_gateway::{cli, infra::logging};

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    cli::run().await
}
