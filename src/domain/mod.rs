use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::error::FetchError;

pub const DEFAULT_ENDPOINT: &str = "https://mcp.api-inference.modelscope.net/b13c348780054e/mcp";
pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";
pub const DEFAULT_MAX_LENGTH: usize = 10_000;
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_INVOKE_TIMEOUT: Duration = Duration::from_secs(60);

/// Name/version pair sent as `clientInfo` during the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIdentity {
    pub name: String,
    pub version: String,
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Everything one fetch invocation needs. Only `url` is mandatory.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    pub url: String,
    pub custom_name: Option<String>,
    pub max_length: usize,
    pub ignore_robots: bool,
    pub endpoint: String,
    pub api_key: Option<String>,
    pub protocol_version: String,
    pub client: ClientIdentity,
    pub handshake_timeout: Duration,
    pub invoke_timeout: Duration,
}

impl FetchRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            custom_name: None,
            max_length: DEFAULT_MAX_LENGTH,
            ignore_robots: true,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            api_key: None,
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
            client: ClientIdentity::default(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            invoke_timeout: DEFAULT_INVOKE_TIMEOUT,
        }
    }

    /// Empty names count as "not supplied".
    pub fn with_custom_name(mut self, name: impl Into<String>) -> Self {
        self.custom_name = non_empty(name.into());
        self
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn with_ignore_robots(mut self, ignore_robots: bool) -> Self {
        self.ignore_robots = ignore_robots;
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Empty keys count as "no credential".
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = non_empty(api_key.into());
        self
    }

    pub fn with_protocol_version(mut self, version: impl Into<String>) -> Self {
        self.protocol_version = version.into();
        self
    }

    pub fn with_client(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        self.client = ClientIdentity {
            name: name.into(),
            version: version.into(),
        };
        self
    }

    pub fn with_timeouts(mut self, handshake: Duration, invoke: Duration) -> Self {
        self.handshake_timeout = handshake;
        self.invoke_timeout = invoke;
        self
    }

    pub fn validate(&self) -> Result<(), FetchError> {
        if self.url.trim().is_empty() {
            return Err(FetchError::InvalidRequest("url must not be empty".into()));
        }
        Ok(())
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Classification attached to a failed [`DocumentRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    HandshakeError,
    SessionMissingError,
    InvocationError,
    RemoteToolError,
    TransportError,
    InvalidRequest,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::HandshakeError => "HandshakeError",
            FailureKind::SessionMissingError => "SessionMissingError",
            FailureKind::InvocationError => "InvocationError",
            FailureKind::RemoteToolError => "RemoteToolError",
            FailureKind::TransportError => "TransportError",
            FailureKind::InvalidRequest => "InvalidRequest",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flat output of one fetch invocation, successful or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub success: bool,
    pub document_name: String,
    pub content: String,
    /// Characters, not bytes.
    pub content_length: usize,
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FailureKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl DocumentRecord {
    pub fn success(
        document_name: impl Into<String>,
        content: impl Into<String>,
        source_url: impl Into<String>,
    ) -> Self {
        let content = content.into();
        Self {
            success: true,
            document_name: document_name.into(),
            content_length: content.chars().count(),
            content,
            source_url: source_url.into(),
            error: None,
            error_kind: None,
            details: None,
        }
    }

    pub fn failure(source_url: impl Into<String>, err: &FetchError) -> Self {
        Self {
            success: false,
            document_name: String::new(),
            content: String::new(),
            content_length: 0,
            source_url: source_url.into(),
            error: Some(err.to_string()),
            error_kind: Some(err.kind()),
            details: err.detail(),
        }
    }
}
