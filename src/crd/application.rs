//! Application Custom Resource Definition
//!
//! An Application groups source components that share a deployment model.
//! The spec is written by users; only the status is written by controllers.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::conditions::{Condition, ConditionField, ConditionSet, StatusConditions};
use super::types::GitRepositoryRef;
use crate::validation::ValidationError;

/// Desired state of an Application
///
/// Example:
/// ```yaml
/// apiVersion: appstudio.redhat.com/v1alpha1
/// kind: Application
/// metadata:
///   name: pet-clinic
/// spec:
///   displayName: pet-clinic
///   description: demo app
///   gitOpsRepository:
///     url: https://github.com/org/pet-clinic-gitops
///     branch: main
/// ```
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "appstudio.redhat.com",
    version = "v1alpha1",
    kind = "Application",
    plural = "applications",
    namespaced,
    status = "ApplicationStatus",
    shortname = "hasapp",
    shortname = "ha",
    shortname = "app",
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#,
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.conditions[-1].status"}"#,
    printcolumn = r#"{"name":"Reason","type":"string","jsonPath":".status.conditions[-1].reason"}"#,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSpec {
    /// Name the application is shown and deployed with
    pub display_name: String,

    /// Repository storing the application model (a devfile).
    /// May be the same as the GitOps repository; generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_model_repository: Option<GitRepositoryRef>,

    /// Repository storing the GitOps resources.
    /// May be the same as the app model repository; generated when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git_ops_repository: Option<GitRepositoryRef>,

    /// Brief description of the application
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ApplicationSpec {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_app_model_repository(mut self, repo: GitRepositoryRef) -> Self {
        self.app_model_repository = Some(repo);
        self
    }

    pub fn with_git_ops_repository(mut self, repo: GitRepositoryRef) -> Self {
        self.git_ops_repository = Some(repo);
        self
    }

    /// Validate the spec
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.display_name.trim().is_empty() {
            return Err(ValidationError::EmptyField("spec.displayName".to_string()));
        }

        let repositories = [
            ("spec.appModelRepository.url", &self.app_model_repository),
            ("spec.gitOpsRepository.url", &self.git_ops_repository),
        ];
        for (field, repo) in repositories {
            if repo.as_ref().is_some_and(|r| r.url.trim().is_empty()) {
                return Err(ValidationError::EmptyField(field.to_string()));
            }
        }

        Ok(())
    }
}

/// Observed state of an Application
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatus {
    /// Status conditions of the Application
    #[serde(default)]
    pub conditions: ConditionSet,

    /// Devfile representation of the Application
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devfile: Option<String>,
}

impl Application {
    /// Condition shown in the Status/Reason printer columns
    pub fn latest_condition(&self) -> Option<&Condition> {
        self.status.as_ref().and_then(|s| s.conditions.last())
    }
}

impl StatusConditions for ApplicationStatus {
    fn conditions(&self, field: ConditionField) -> Option<&ConditionSet> {
        match field {
            ConditionField::Conditions => Some(&self.conditions),
            _ => None,
        }
    }

    fn conditions_mut(&mut self, field: ConditionField) -> Option<&mut ConditionSet> {
        match field {
            ConditionField::Conditions => Some(&mut self.conditions),
            _ => None,
        }
    }
}

impl StatusConditions for Application {
    fn conditions(&self, field: ConditionField) -> Option<&ConditionSet> {
        self.status.as_ref()?.conditions(field)
    }

    fn conditions_mut(&mut self, field: ConditionField) -> Option<&mut ConditionSet> {
        self.status.get_or_insert_with(Default::default).conditions_mut(field)
    }
}
