use std::time::Duration;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
/// Budget for admin probes (health/status) issued by the CLI.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Build a reqwest client bounded by a connect timeout. Per-request timeouts
/// are set by the caller, so there is no client-wide total timeout here.
pub fn make_http_client(connect_timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .build()
}
