//! SnapshotEnvironmentBinding Custom Resource Definition
//!
//! A binding ties an Application and a Snapshot of its images to an
//! Environment, with per-component overrides. Its status is written by two
//! controllers: the application service (GitOps repository data) and the
//! GitOps service (deployment state).

use std::collections::HashSet;

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::conditions::{Condition, ConditionField, ConditionSet, StatusConditions};
use super::names::{ApplicationName, ComponentName, EnvironmentName, SnapshotName};
use super::types::{EnvVarPair, ResourceRequirements};
use crate::validation::ValidationError;

/// Desired state of a SnapshotEnvironmentBinding
#[derive(CustomResource, Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[kube(
    group = "appstudio.redhat.com",
    version = "v1alpha1",
    kind = "SnapshotEnvironmentBinding",
    plural = "snapshotenvironmentbindings",
    namespaced,
    status = "SnapshotEnvironmentBindingStatus",
    shortname = "aseb",
    shortname = "binding",
    printcolumn = r#"{"name":"Application","type":"string","jsonPath":".spec.application"}"#,
    printcolumn = r#"{"name":"Environment","type":"string","jsonPath":".spec.environment"}"#,
    printcolumn = r#"{"name":"Snapshot","type":"string","jsonPath":".spec.snapshot"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#,
    derive = "PartialEq"
)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEnvironmentBindingSpec {
    /// Application (in the same namespace) involved in the binding
    pub application: ApplicationName,

    /// Environment (in the same namespace) the binding deploys to
    pub environment: EnvironmentName,

    /// Snapshot (in the same namespace) holding the image versions of the
    /// Application's components
    pub snapshot: SnapshotName,

    /// Per-component data, one entry per component of the Application
    pub components: Vec<BindingComponent>,
}

impl SnapshotEnvironmentBindingSpec {
    pub fn new(
        application: impl Into<ApplicationName>,
        environment: impl Into<EnvironmentName>,
        snapshot: impl Into<SnapshotName>,
    ) -> Self {
        Self {
            application: application.into(),
            environment: environment.into(),
            snapshot: snapshot.into(),
            components: Vec::new(),
        }
    }

    pub fn with_component(mut self, component: BindingComponent) -> Self {
        self.components.push(component);
        self
    }

    pub fn component(&self, name: &str) -> Option<&BindingComponent> {
        self.components.iter().find(|c| c.name == *name)
    }

    pub fn component_names(&self) -> impl Iterator<Item = &ComponentName> {
        self.components.iter().map(|c| &c.name)
    }

    /// Validate the spec
    ///
    /// Component names must be unique within the binding, and environment
    /// variable names unique within a component.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.application.is_empty() {
            return Err(ValidationError::EmptyField("spec.application".to_string()));
        }
        if self.environment.is_empty() {
            return Err(ValidationError::EmptyField("spec.environment".to_string()));
        }
        if self.snapshot.is_empty() {
            return Err(ValidationError::EmptyField("spec.snapshot".to_string()));
        }

        let mut seen = HashSet::new();
        for (idx, component) in self.components.iter().enumerate() {
            if component.name.is_empty() {
                return Err(ValidationError::EmptyField(format!(
                    "spec.components[{idx}].name"
                )));
            }
            if !seen.insert(&component.name) {
                return Err(ValidationError::DuplicateComponent(component.name.clone()));
            }
            if let Some(config) = &component.configuration {
                config.validate(&component.name)?;
            }
        }

        Ok(())
    }
}

/// Data for a single component of the bound Application
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BindingComponent {
    /// Name of the component
    pub name: ComponentName,

    /// Overrides specific to this component-application-environment
    /// combination; they take precedence over Application, Environment
    /// and Component values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration: Option<BindingComponentConfiguration>,
}

impl BindingComponent {
    pub fn new(name: impl Into<ComponentName>) -> Self {
        Self {
            name: name.into(),
            configuration: None,
        }
    }

    pub fn with_configuration(mut self, configuration: BindingComponentConfiguration) -> Self {
        self.configuration = Some(configuration);
        self
    }
}

/// GitOps repository customizations for a component in an environment
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BindingComponentConfiguration {
    /// Number of replicas to run
    #[serde(default)]
    pub replicas: i32,

    /// Compute resources required by the component
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<ResourceRequirements>,

    /// Environment variables for the component
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvVarPair>,
}

impl BindingComponentConfiguration {
    pub fn with_replicas(replicas: i32) -> Self {
        Self {
            replicas,
            ..Default::default()
        }
    }

    pub fn resources(mut self, resources: ResourceRequirements) -> Self {
        self.resources = Some(resources);
        self
    }

    pub fn env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push(EnvVarPair::new(name, value));
        self
    }

    fn validate(&self, component: &ComponentName) -> Result<(), ValidationError> {
        if self.replicas < 0 {
            return Err(ValidationError::NegativeReplicas {
                component: component.clone(),
                replicas: self.replicas,
            });
        }

        let mut seen = HashSet::new();
        for var in &self.env {
            if var.name.trim().is_empty() {
                return Err(ValidationError::EmptyField(format!(
                    "spec.components[{component}].configuration.env.name"
                )));
            }
            if !seen.insert(var.name.as_str()) {
                return Err(ValidationError::DuplicateEnvVar {
                    component: component.clone(),
                    name: var.name.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Location of a component's generated resources in the GitOps repository,
/// usually a kustomize overlay
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BindingComponentGitOpsRepository {
    /// Git repository URL holding the component's Kubernetes resources
    pub url: String,

    /// Branch to use when accessing the repository
    pub branch: String,

    /// Folder containing a kustomization.yaml; unique per component and environment
    pub path: String,

    /// Files generated by the application service in `overlays/<environment>`
    /// (e.g., "deployment-patch.yaml"), as opposed to files added by users
    #[serde(default)]
    pub generated_resources: Vec<String>,

    /// Most recent commit that modified the component's resources
    #[serde(rename = "commitID")]
    pub commit_id: String,
}

/// GitOps repository status of a single component
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BindingComponentStatus {
    pub name: ComponentName,

    #[serde(rename = "gitopsRepository")]
    pub gitops_repository: BindingComponentGitOpsRepository,
}

/// Reference to the GitOpsDeployment used to deploy one component of the binding.
/// Health and sync status are read from the referenced resource.
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BindingStatusGitOpsDeployment {
    pub component_name: ComponentName,

    #[serde(
        rename = "gitopsDeployment",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub gitops_deployment: Option<String>,
}

/// Observed state of a SnapshotEnvironmentBinding
#[derive(Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEnvironmentBindingStatus {
    /// GitOpsDeployments created for the binding
    #[serde(
        rename = "gitopsDeployments",
        default,
        skip_serializing_if = "Vec::is_empty"
    )]
    pub gitops_deployments: Vec<BindingStatusGitOpsDeployment>,

    /// GitOps repository information per component (application service)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<BindingComponentStatus>,

    /// Issues generating or processing the GitOps repository (application service)
    #[serde(
        rename = "gitopsRepoConditions",
        default,
        skip_serializing_if = "ConditionSet::is_empty"
    )]
    pub gitops_repo_conditions: ConditionSet,

    /// State of the binding itself (application service)
    #[serde(default, skip_serializing_if = "ConditionSet::is_empty")]
    pub binding_conditions: ConditionSet,

    /// Deployment state of all components (GitOps service)
    #[serde(default, skip_serializing_if = "ConditionSet::is_empty")]
    pub component_deployment_conditions: ConditionSet,
}

impl SnapshotEnvironmentBindingStatus {
    pub fn component_status(&self, name: &str) -> Option<&BindingComponentStatus> {
        self.components.iter().find(|c| c.name == *name)
    }

    /// Replace the status entry with the same component name, or append it
    pub fn upsert_component_status(&mut self, status: BindingComponentStatus) {
        match self.components.iter_mut().find(|c| c.name == status.name) {
            Some(existing) => *existing = status,
            None => self.components.push(status),
        }
    }

    pub fn gitops_deployment_for(&self, component: &str) -> Option<&str> {
        self.gitops_deployments
            .iter()
            .find(|d| d.component_name == *component)
            .and_then(|d| d.gitops_deployment.as_deref())
    }

    /// Record the GitOpsDeployment tracking a component
    pub fn upsert_gitops_deployment(
        &mut self,
        component: impl Into<ComponentName>,
        deployment: Option<String>,
    ) {
        let component = component.into();
        match self
            .gitops_deployments
            .iter_mut()
            .find(|d| d.component_name == component)
        {
            Some(existing) => existing.gitops_deployment = deployment,
            None => self.gitops_deployments.push(BindingStatusGitOpsDeployment {
                component_name: component,
                gitops_deployment: deployment,
            }),
        }
    }
}

impl StatusConditions for SnapshotEnvironmentBindingStatus {
    fn conditions(&self, field: ConditionField) -> Option<&ConditionSet> {
        match field {
            ConditionField::GitOpsRepo => Some(&self.gitops_repo_conditions),
            ConditionField::Binding => Some(&self.binding_conditions),
            ConditionField::ComponentDeployment => Some(&self.component_deployment_conditions),
            ConditionField::Conditions => None,
        }
    }

    fn conditions_mut(&mut self, field: ConditionField) -> Option<&mut ConditionSet> {
        match field {
            ConditionField::GitOpsRepo => Some(&mut self.gitops_repo_conditions),
            ConditionField::Binding => Some(&mut self.binding_conditions),
            ConditionField::ComponentDeployment => Some(&mut self.component_deployment_conditions),
            ConditionField::Conditions => None,
        }
    }
}

impl StatusConditions for SnapshotEnvironmentBinding {
    fn conditions(&self, field: ConditionField) -> Option<&ConditionSet> {
        self.status.as_ref()?.conditions(field)
    }

    fn conditions_mut(&mut self, field: ConditionField) -> Option<&mut ConditionSet> {
        self.status.get_or_insert_with(Default::default).conditions_mut(field)
    }
}

impl SnapshotEnvironmentBinding {
    /// Most recently transitioned condition across all three condition lists
    ///
    /// Ties go to the later list in the order gitopsRepo, binding, componentDeployment.
    pub fn latest_condition(&self) -> Option<(ConditionField, &Condition)> {
        let status = self.status.as_ref()?;
        [
            ConditionField::GitOpsRepo,
            ConditionField::Binding,
            ConditionField::ComponentDeployment,
        ]
        .into_iter()
        .filter_map(|field| Some((field, status.conditions(field)?)))
        .flat_map(|(field, set)| set.iter().map(move |c| (field, c)))
        .max_by_key(|(_, c)| c.last_transition())
    }
}
