use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::clients::fetch::FetchClient;
use crate::domain::DocumentRecord;
use crate::infra::config::{AppConfig, Config};
use crate::infra::runtime::limits::PROBE_TIMEOUT;

#[derive(Parser)]
#[command(name = "fetchctl")]
#[command(about = "MCP Fetch Gateway - Admin CLI")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch a page through the remote MCP fetch service and print the record
    Fetch {
        /// Page to fetch
        url: String,
        /// Document name override
        #[arg(short, long)]
        name: Option<String>,
        /// Maximum content length requested from the remote tool
        #[arg(long)]
        max_length: Option<usize>,
        /// Ask the remote tool to honour robots.txt
        #[arg(long)]
        respect_robots: bool,
        /// Remote MCP endpoint (defaults to config)
        #[arg(long)]
        endpoint: Option<String>,
        /// Bearer token for the remote endpoint
        #[arg(long)]
        api_key: Option<String>,
    },
    /// Health check the service
    Health {
        /// Service URL to check
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
    /// Validate configuration
    Config {
        /// Validate config without starting service
        #[arg(long)]
        validate: bool,
    },
    /// Show service status and fetch settings
    Status {
        /// Service URL to check
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,
    },
}

pub async fn run() -> ExitCode {
    let cli = Cli::parse();

    run_commands(cli.command).await
}

pub async fn run_commands(command: Commands) -> ExitCode {
    match command {
        Commands::Fetch {
            url,
            name,
            max_length,
            respect_robots,
            endpoint,
            api_key,
        } => {
            let settings = AppConfig::from_env_and_toml().fetch;
            let mut req = settings.request(url);
            if let Some(name) = name {
                req = req.with_custom_name(name);
            }
            if let Some(max_length) = max_length {
                req = req.with_max_length(max_length);
            }
            if respect_robots {
                req = req.with_ignore_robots(false);
            }
            if let Some(endpoint) = endpoint {
                req = req.with_endpoint(endpoint);
            }
            if let Some(key) = api_key {
                req = req.with_api_key(key);
            }
            let record = FetchClient::new(settings.connect_timeout()).fetch(&req).await;
            print_record(&record)
        }
        Commands::Health { url } => match health_check(&url).await {
            Ok(_) => {
                println!("✅ Service is healthy");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Health check failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Config { validate: _ } => match validate_config() {
            Ok(_) => {
                println!("✅ Configuration is valid");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("❌ Configuration validation failed: {}", e);
                ExitCode::FAILURE
            }
        },
        Commands::Status { url } => match show_status(&url).await {
            Ok(_) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("❌ Status check failed: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

fn print_record(record: &DocumentRecord) -> ExitCode {
    match serde_json::to_string_pretty(record) {
        Ok(s) => println!("{s}"),
        Err(e) => {
            eprintln!("❌ Could not render record: {}", e);
            return ExitCode::FAILURE;
        }
    }
    if record.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn health_check(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{}/healthz", url))
        .timeout(std::time::Duration::from_millis(500))
        .send()
        .await?;

    if response.status().is_success() {
        Ok(())
    } else {
        Err(format!("HTTP {}", response.status()).into())
    }
}

fn validate_config() -> Result<(), Box<dyn std::error::Error>> {
    let _config = Config::from_env();

    let mode = std::env::var("MODE").unwrap_or_else(|_| "server".into());
    if !matches!(mode.as_str(), "server" | "stdio") {
        return Err(format!("Invalid MODE: {}. Must be 'server' or 'stdio'", mode).into());
    }

    if mode == "server" {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(8080);

        if port == 0 {
            return Err("PORT cannot be 0".into());
        }
    }

    let app = AppConfig::try_from_env_and_toml()?;
    if reqwest::Url::parse(&app.fetch.endpoint).is_err() {
        return Err(format!("Invalid fetch endpoint: {}", app.fetch.endpoint).into());
    }
    if app.fetch.max_length == 0 {
        return Err("max_length must be positive".into());
    }

    Ok(())
}

async fn show_status(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let client = reqwest::Client::new();

    let health_response = client
        .get(format!("{}/healthz", url))
        .timeout(PROBE_TIMEOUT)
        .send()
        .await?;

    println!(
        "🏥 Health Status: {}",
        if health_response.status().is_success() {
            "✅ Healthy"
        } else {
            "❌ Unhealthy"
        }
    );

    let tools_response = client
        .post(format!("{}/v1/tools", url))
        .header("content-type", "application/json")
        .json(&serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/list",
            "params": {}
        }))
        .timeout(std::time::Duration::from_millis(500))
        .send()
        .await;

    match tools_response {
        Ok(resp) if resp.status().is_success() => {
            println!("🔧 Tools: ✅ Available");
        }
        Ok(resp) => {
            println!("🔧 Tools: ❌ HTTP {}", resp.status());
        }
        Err(_) => {
            println!("🔧 Tools: ❌ Unavailable");
        }
    }

    let cfg = Config::from_env();
    let fetch = AppConfig::from_env_and_toml().fetch;
    println!("\n📋 Configuration:");
    println!("  Mode: {}", cfg.mode);
    println!("  Port: {}", cfg.port);
    println!(
        "  Log Level: {}",
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into())
    );
    println!("  Fetch Endpoint: {}", fetch.endpoint);
    println!(
        "  API Key: {}",
        if fetch.api_key.is_some() { "configured" } else { "not configured" }
    );
    println!("  Max Length: {}", fetch.max_length);

    Ok(())
}
