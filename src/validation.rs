//! Validation of resource specs and cross-resource references
//!
//! Structural checks live on the spec types themselves (`validate()`).
//! Reference checks go through a [`ReferenceResolver`], which answers
//! whether the names a binding points at exist.

use std::collections::{BTreeMap, BTreeSet};

use thiserror::Error;
use tracing::debug;

use crate::crd::{
    ApplicationName, ComponentName, EnvironmentName, SnapshotEnvironmentBindingSpec, SnapshotName,
};

/// Validation error types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Field is empty but required
    #[error("field '{0}' cannot be empty")]
    EmptyField(String),

    #[error("component '{0}' is listed more than once")]
    DuplicateComponent(ComponentName),

    #[error("environment variable '{name}' is set more than once for component '{component}'")]
    DuplicateEnvVar { component: ComponentName, name: String },

    #[error("component '{component}' has negative replicas ({replicas})")]
    NegativeReplicas { component: ComponentName, replicas: i32 },

    #[error("application '{0}' not found")]
    ApplicationNotFound(ApplicationName),

    #[error("environment '{0}' not found")]
    EnvironmentNotFound(EnvironmentName),

    #[error("snapshot '{0}' not found")]
    SnapshotNotFound(SnapshotName),

    #[error("component '{component}' is not part of application '{application}'")]
    UnknownComponent {
        application: ApplicationName,
        component: ComponentName,
    },
}

/// Lookup of the resources a binding refers to, within one namespace
pub trait ReferenceResolver {
    fn has_application(&self, name: &ApplicationName) -> bool;

    fn has_environment(&self, name: &EnvironmentName) -> bool;

    fn has_snapshot(&self, name: &SnapshotName) -> bool;

    /// Components of an Application, or `None` when they are not known
    fn application_components(&self, _name: &ApplicationName) -> Option<Vec<ComponentName>> {
        None
    }
}

/// Resolver backed by in-memory name sets
#[derive(Clone, Debug, Default)]
pub struct InMemoryResolver {
    applications: BTreeMap<ApplicationName, Option<BTreeSet<ComponentName>>>,
    environments: BTreeSet<EnvironmentName>,
    snapshots: BTreeSet<SnapshotName>,
}

impl InMemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_application(mut self, name: impl Into<ApplicationName>) -> Self {
        self.applications.entry(name.into()).or_insert(None);
        self
    }

    /// Register an Application together with its component list
    pub fn with_application_components<I, C>(
        mut self,
        name: impl Into<ApplicationName>,
        components: I,
    ) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<ComponentName>,
    {
        self.applications.insert(
            name.into(),
            Some(components.into_iter().map(Into::into).collect()),
        );
        self
    }

    pub fn with_environment(mut self, name: impl Into<EnvironmentName>) -> Self {
        self.environments.insert(name.into());
        self
    }

    pub fn with_snapshot(mut self, name: impl Into<SnapshotName>) -> Self {
        self.snapshots.insert(name.into());
        self
    }
}

impl ReferenceResolver for InMemoryResolver {
    fn has_application(&self, name: &ApplicationName) -> bool {
        self.applications.contains_key(name)
    }

    fn has_environment(&self, name: &EnvironmentName) -> bool {
        self.environments.contains(name)
    }

    fn has_snapshot(&self, name: &SnapshotName) -> bool {
        self.snapshots.contains(name)
    }

    fn application_components(&self, name: &ApplicationName) -> Option<Vec<ComponentName>> {
        self.applications
            .get(name)?
            .as_ref()
            .map(|components| components.iter().cloned().collect())
    }
}

/// Check that every name a binding refers to resolves
///
/// When the resolver knows the Application's components, each bound
/// component must be one of them. How components are matched beyond
/// membership is left to the reconciler.
pub fn validate_binding_references<R>(
    spec: &SnapshotEnvironmentBindingSpec,
    resolver: &R,
) -> Result<(), ValidationError>
where
    R: ReferenceResolver + ?Sized,
{
    if !resolver.has_application(&spec.application) {
        return Err(ValidationError::ApplicationNotFound(spec.application.clone()));
    }
    if !resolver.has_environment(&spec.environment) {
        return Err(ValidationError::EnvironmentNotFound(spec.environment.clone()));
    }
    if !resolver.has_snapshot(&spec.snapshot) {
        return Err(ValidationError::SnapshotNotFound(spec.snapshot.clone()));
    }

    match resolver.application_components(&spec.application) {
        Some(known) => {
            if let Some(unknown) = spec.component_names().find(|c| !known.contains(c)) {
                return Err(ValidationError::UnknownComponent {
                    application: spec.application.clone(),
                    component: unknown.clone(),
                });
            }
        }
        None => debug!(
            "Components of application {} unknown, skipping membership check",
            spec.application
        ),
    }

    Ok(())
}
