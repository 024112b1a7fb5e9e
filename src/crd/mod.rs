//! Custom Resource Definitions for AppStudio
//!
//! This module defines the Application and SnapshotEnvironmentBinding CRDs.

mod application;
mod binding;
pub mod conditions;
mod names;
mod types;

pub use application::{Application, ApplicationSpec, ApplicationStatus};
pub use binding::{
    BindingComponent, BindingComponentConfiguration, BindingComponentGitOpsRepository,
    BindingComponentStatus, BindingStatusGitOpsDeployment, SnapshotEnvironmentBinding,
    SnapshotEnvironmentBindingSpec, SnapshotEnvironmentBindingStatus,
};
pub use conditions::{
    Condition, ConditionField, ConditionSet, ConditionStatus, ConditionWriter, StatusConditions,
};
pub use names::{ApplicationName, ComponentName, EnvironmentName, SnapshotName};
pub use types::*;

/// API group shared by every resource in this crate
pub const GROUP: &str = "appstudio.redhat.com";
/// API version shared by every resource in this crate
pub const VERSION: &str = "v1alpha1";

/// List of Applications as returned by the API server
pub type ApplicationList = kube::core::ObjectList<Application>;
/// List of SnapshotEnvironmentBindings as returned by the API server
pub type SnapshotEnvironmentBindingList = kube::core::ObjectList<SnapshotEnvironmentBinding>;
