//! Boundary of the cloud-resource dispatcher: a flat request is validated
//! against a fixed service/action table, then handed one-to-one to a
//! [`CloudBackend`]. Every outcome is wrapped in a uniform [`CloudEnvelope`].

pub mod plan;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as J;
use thiserror::Error;

pub use plan::{plan, CloudOperation, Service};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CloudCredentials {
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

/// Superset of per-action parameters; each action reads only its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CloudParams {
    pub bucket_name: Option<String>,
    pub object_key: Option<String>,
    pub file_content: Option<String>,
    pub function_name: Option<String>,
    pub db_instance_identifier: Option<String>,
    pub table_name: Option<String>,
    pub item: Option<String>,
    pub key: Option<String>,
    pub log_group_name: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub filter_pattern: Option<String>,
    pub limit: Option<u32>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CloudRequest {
    #[serde(flatten)]
    pub credentials: CloudCredentials,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(flatten)]
    pub params: CloudParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloudEnvelope {
    pub success: bool,
    pub service: Option<String>,
    pub action: Option<String>,
    pub data: J,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloudError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Missing required parameters: {}", .0.join(", "))]
    MissingParameters(Vec<&'static str>),
    #[error("Unsupported service: {0}")]
    UnsupportedService(String),
    #[error("Unsupported {service} action: {action}")]
    UnsupportedAction { service: &'static str, action: String },
    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("{0}")]
    Backend(String),
}

/// The cloud SDK side of the boundary. Implementations perform exactly the
/// operation they are given and return its action-specific data mapping.
#[async_trait]
pub trait CloudBackend: Send + Sync {
    async fn execute(&self, credentials: &CloudCredentials, op: &CloudOperation) -> Result<J, String>;
}

pub async fn dispatch(backend: &dyn CloudBackend, req: &CloudRequest) -> CloudEnvelope {
    let op = match plan(req) {
        Ok(op) => op,
        Err(err) => {
            tracing::debug!(error = %err, "cloud request rejected");
            return failure(req, err);
        }
    };
    tracing::info!(service = op.service().as_str(), action = op.action(), "cloud dispatch");
    match backend.execute(&req.credentials, &op).await {
        Ok(data) => CloudEnvelope {
            success: true,
            service: Some(op.service().as_str().to_string()),
            action: Some(op.action().to_string()),
            data,
            error: None,
        },
        Err(e) => failure(req, CloudError::Backend(e)),
    }
}

fn failure(req: &CloudRequest, err: CloudError) -> CloudEnvelope {
    let service = req.service.as_deref().filter(|s| !s.is_empty()).map(|s| {
        Service::parse(s)
            .map(|svc| svc.as_str().to_string())
            .unwrap_or_else(|| s.to_string())
    });
    CloudEnvelope {
        success: false,
        service,
        action: req.action.clone().filter(|a| !a.is_empty()),
        data: J::Object(Default::default()),
        error: Some(err.to_string()),
    }
}
