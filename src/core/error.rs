use thiserror::Error;

use crate::domain::FailureKind;

/// Diagnostic details attached to failures never exceed this many characters.
pub const DETAIL_LIMIT: usize = 200;

pub fn truncate_detail(s: &str) -> String {
    s.chars().take(DETAIL_LIMIT).collect()
}

/// Failure of one stage of a fetch invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("Initialize failed: {status}")]
    Handshake { status: u16, detail: String },
    #[error("No session-id returned")]
    SessionMissing,
    #[error("Tool call failed: {status}")]
    Invocation { status: u16, detail: String },
    #[error("{message}")]
    RemoteTool { message: String },
    #[error("Request error: {message}")]
    Transport { message: String },
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    pub fn handshake(status: u16, body: &str) -> Self {
        FetchError::Handshake {
            status,
            detail: truncate_detail(body),
        }
    }

    pub fn invocation(status: u16, body: &str) -> Self {
        FetchError::Invocation {
            status,
            detail: truncate_detail(body),
        }
    }

    pub fn transport(message: impl std::fmt::Display) -> Self {
        FetchError::Transport {
            message: message.to_string(),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Handshake { .. } => FailureKind::HandshakeError,
            FetchError::SessionMissing => FailureKind::SessionMissingError,
            FetchError::Invocation { .. } => FailureKind::InvocationError,
            FetchError::RemoteTool { .. } => FailureKind::RemoteToolError,
            FetchError::Transport { .. } => FailureKind::TransportError,
            FetchError::InvalidRequest(_) => FailureKind::InvalidRequest,
        }
    }

    /// Bounded diagnostic text, when the failure has any.
    pub fn detail(&self) -> Option<String> {
        match self {
            FetchError::Handshake { detail, .. } | FetchError::Invocation { detail, .. } => {
                Some(detail.clone())
            }
            FetchError::Transport { message } => Some(truncate_detail(message)),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::transport(e)
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::transport(e)
    }
}

/// Gateway-wide error model for uniform JSON-RPC mapping of tool failures.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{0}")]
    Message(String),
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("unknown tool: {0}")]
    UnknownTool(String),
}

impl From<anyhow::Error> for GatewayError {
    fn from(e: anyhow::Error) -> Self {
        GatewayError::Message(e.to_string())
    }
}
