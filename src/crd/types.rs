//! Shared types for Application and binding specifications
//!
//! These types are used across the CRD definitions and validation logic.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::ResourceRequirements as K8sResources;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Git repository backing an Application (either the app model or the GitOps repository)
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GitRepositoryRef {
    /// Repository URL (e.g., "https://github.com/devfile-test/myrepo")
    pub url: String,
    /// Branch to use (e.g., "devel")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
    /// Directory within the repository (e.g., "folderA/folderB/gitops")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl GitRepositoryRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Kubernetes-style compute resource requirements
///
/// Keys are resource names ("cpu", "memory", ...), values are quantities
/// ("500m", "1Gi").
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequirements {
    /// Minimum resources requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests: Option<BTreeMap<String, String>>,
    /// Maximum resources allowed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<BTreeMap<String, String>>,
}

impl ResourceRequirements {
    pub fn request(mut self, resource: &str, quantity: &str) -> Self {
        self.requests
            .get_or_insert_with(BTreeMap::new)
            .insert(resource.to_string(), quantity.to_string());
        self
    }

    pub fn limit(mut self, resource: &str, quantity: &str) -> Self {
        self.limits
            .get_or_insert_with(BTreeMap::new)
            .insert(resource.to_string(), quantity.to_string());
        self
    }
}

fn quantities(list: &BTreeMap<String, String>) -> BTreeMap<String, Quantity> {
    list.iter()
        .map(|(name, quantity)| (name.clone(), Quantity(quantity.clone())))
        .collect()
}

impl From<&ResourceRequirements> for K8sResources {
    fn from(resources: &ResourceRequirements) -> Self {
        K8sResources {
            requests: resources.requests.as_ref().map(quantities),
            limits: resources.limits.as_ref().map(quantities),
            ..Default::default()
        }
    }
}

/// Environment variable for a component
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub struct EnvVarPair {
    /// Environment variable name
    pub name: String,
    /// Environment variable value
    pub value: String,
}

impl EnvVarPair {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}
