use crate::domain::FailureKind;

pub fn init() {
    // Initialize tracing subscriber once, honoring RUST_LOG if set.
    // Default to info level; allow override via RUST_LOG (e.g., "debug").
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Log a metric line and feed the `metrics` facade (no-op without a recorder).
pub fn log_metric(tool: &str, metric: &str, value: f64) {
    tracing::info!(tool = tool, metric = metric, value = value, "metric");
    metrics::histogram!(metric.to_owned(), "tool" => tool.to_owned()).record(value);
}

pub fn count_failure(tool: &str, kind: FailureKind) {
    tracing::info!(tool = tool, metric = "remote_error_total", kind = %kind, "metric");
    metrics::counter!("remote_error_total", "tool" => tool.to_owned(), "kind" => kind.as_str())
        .increment(1);
}
