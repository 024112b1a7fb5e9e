//! Error types for the AppStudio API crate

use thiserror::Error;

use crate::crd::ConditionField;
use crate::validation::ValidationError;

/// Result alias used across the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors raised while encoding, validating, or exchanging resources
#[derive(Error, Debug)]
pub enum Error {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationError),

    /// A writer tried to touch a condition type it does not claim
    #[error("condition type {condition_type:?} is not owned by writer {owner:?}")]
    ConditionNotOwned {
        owner: String,
        condition_type: String,
    },

    /// A condition list was addressed on a kind whose status has no such list
    #[error("status has no condition list {field}")]
    ConditionFieldMissing { field: ConditionField },

    #[error("unknown resource kind: {0}")]
    UnknownKind(String),

    #[error("unsupported apiVersion {api_version:?} for kind {kind}")]
    UnsupportedApiVersion { kind: String, api_version: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Error {
    /// Whether retrying the same request could succeed
    pub fn is_retriable(&self) -> bool {
        match self {
            Error::KubeError(kube::Error::Api(resp)) => resp.code == 429 || resp.code >= 500,
            Error::KubeError(kube::Error::HyperError(_)) | Error::KubeError(kube::Error::Service(_)) => {
                true
            }
            Error::IoError(_) => true,
            _ => false,
        }
    }
}
