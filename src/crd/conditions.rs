//! Status conditions and the writers allowed to change them
//!
//! A [`ConditionSet`] holds at most one [`Condition`] per type and goes over
//! the wire as a plain list. Several controllers report into the same
//! resource, so sets are only mutated through a [`ConditionWriter`], which
//! claims the condition types it is responsible for and the one status list
//! it writes into.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Field manager used by the application service controller
pub const APPLICATION_SERVICE_MANAGER: &str = "application-service";
/// Field manager used by the GitOps service controller
pub const GITOPS_SERVICE_MANAGER: &str = "gitops-service";

pub const CONDITION_CREATED: &str = "Created";
pub const CONDITION_UPDATED: &str = "Updated";
pub const CONDITION_DELETED: &str = "Deleted";
pub const CONDITION_GITOPS_RESOURCES_GENERATED: &str = "GitOpsResourcesGenerated";
pub const CONDITION_ERROR_OCCURRED: &str = "ErrorOccurred";
pub const CONDITION_ALL_COMPONENTS_DEPLOYED: &str = "AllComponentsDeployed";

/// Status of a condition: "True", "False", or "Unknown"
#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
pub enum ConditionStatus {
    True,
    False,
    #[default]
    Unknown,
}

impl From<bool> for ConditionStatus {
    fn from(value: bool) -> Self {
        if value {
            ConditionStatus::True
        } else {
            ConditionStatus::False
        }
    }
}

impl fmt::Display for ConditionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionStatus::True => write!(f, "True"),
            ConditionStatus::False => write!(f, "False"),
            ConditionStatus::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Condition for status reporting (Kubernetes convention)
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition in CamelCase (e.g., "Created", "ErrorOccurred")
    #[serde(rename = "type")]
    pub type_: String,
    pub status: ConditionStatus,
    /// Last time the condition transitioned (RFC 3339)
    pub last_transition_time: String,
    /// Machine-readable reason for the condition
    #[serde(default)]
    pub reason: String,
    /// Human-readable message
    #[serde(default)]
    pub message: String,
    /// Generation of the resource the condition was computed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,
}

impl Condition {
    pub fn is_true(&self) -> bool {
        self.status == ConditionStatus::True
    }

    pub fn last_transition(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.last_transition_time)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Ordered set of conditions keyed by type
#[derive(Clone, Debug, Default, Serialize, JsonSchema, PartialEq, Eq)]
#[serde(transparent)]
pub struct ConditionSet(Vec<Condition>);

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, type_: &str) -> Option<&Condition> {
        self.0.iter().find(|c| c.type_ == type_)
    }

    pub fn is_true(&self, type_: &str) -> bool {
        self.get(type_).is_some_and(Condition::is_true)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Condition> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn types(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|c| c.type_.as_str())
    }

    /// The most recently appended condition
    pub fn last(&self) -> Option<&Condition> {
        self.0.last()
    }

    fn upsert(&mut self, condition: Condition) {
        match self.0.iter_mut().find(|c| c.type_ == condition.type_) {
            Some(existing) => *existing = condition,
            None => self.0.push(condition),
        }
    }

    fn remove(&mut self, type_: &str) -> Option<Condition> {
        let idx = self.0.iter().position(|c| c.type_ == type_)?;
        Some(self.0.remove(idx))
    }
}

impl FromIterator<Condition> for ConditionSet {
    /// Repeated types keep the last entry at the position of the first one
    fn from_iter<I: IntoIterator<Item = Condition>>(iter: I) -> Self {
        let mut set = ConditionSet::default();
        for condition in iter {
            set.upsert(condition);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ConditionSet {
    type Item = &'a Condition;
    type IntoIter = std::slice::Iter<'a, Condition>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<'de> Deserialize<'de> for ConditionSet {
    /// `null` reads as an empty set, as written for a nil list
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let conditions = Option::<Vec<Condition>>::deserialize(deserializer)?;
        Ok(conditions.unwrap_or_default().into_iter().collect())
    }
}

/// A condition list inside a resource status
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConditionField {
    /// `status.conditions` of an Application
    Conditions,
    /// `status.gitopsRepoConditions` of a binding
    GitOpsRepo,
    /// `status.bindingConditions` of a binding
    Binding,
    /// `status.componentDeploymentConditions` of a binding
    ComponentDeployment,
}

impl ConditionField {
    /// Key of the field inside `status`
    pub fn json_name(&self) -> &'static str {
        match self {
            ConditionField::Conditions => "conditions",
            ConditionField::GitOpsRepo => "gitopsRepoConditions",
            ConditionField::Binding => "bindingConditions",
            ConditionField::ComponentDeployment => "componentDeploymentConditions",
        }
    }
}

impl fmt::Display for ConditionField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.json_name())
    }
}

/// Statuses (or resources) carrying one or more condition lists
pub trait StatusConditions {
    /// The list stored under `field`, or `None` if there is none
    fn conditions(&self, field: ConditionField) -> Option<&ConditionSet>;

    /// Mutable access to the list under `field`, or `None` if this kind has no such list
    fn conditions_mut(&mut self, field: ConditionField) -> Option<&mut ConditionSet>;
}

/// Capability to write a fixed group of condition types into one status list
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConditionWriter {
    manager: String,
    field: ConditionField,
    owned: BTreeSet<String>,
}

impl ConditionWriter {
    pub fn new<I, S>(manager: impl Into<String>, field: ConditionField, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            manager: manager.into(),
            field,
            owned: types.into_iter().map(Into::into).collect(),
        }
    }

    /// Writer for `Application` status conditions
    pub fn application() -> Self {
        Self::new(
            APPLICATION_SERVICE_MANAGER,
            ConditionField::Conditions,
            [CONDITION_CREATED, CONDITION_UPDATED, CONDITION_DELETED],
        )
    }

    /// Writer for `gitopsRepoConditions` on a binding
    pub fn gitops_repository() -> Self {
        Self::new(
            APPLICATION_SERVICE_MANAGER,
            ConditionField::GitOpsRepo,
            [CONDITION_GITOPS_RESOURCES_GENERATED],
        )
    }

    /// Writer for `bindingConditions` on a binding
    pub fn binding() -> Self {
        Self::new(
            APPLICATION_SERVICE_MANAGER,
            ConditionField::Binding,
            [CONDITION_ERROR_OCCURRED],
        )
    }

    /// Writer for `componentDeploymentConditions` on a binding
    pub fn component_deployment() -> Self {
        Self::new(
            GITOPS_SERVICE_MANAGER,
            ConditionField::ComponentDeployment,
            [CONDITION_ALL_COMPONENTS_DEPLOYED],
        )
    }

    /// Field manager name used when patching
    pub fn manager(&self) -> &str {
        &self.manager
    }

    /// The status list this writer owns
    pub fn field(&self) -> ConditionField {
        self.field
    }

    pub fn owns(&self, type_: &str) -> bool {
        self.owned.contains(type_)
    }

    /// Set a condition in the writer's own list, returning whether it changed
    ///
    /// The transition time moves only when the status changes.
    pub fn set<T: StatusConditions + ?Sized>(
        &self,
        target: &mut T,
        type_: &str,
        status: ConditionStatus,
        reason: &str,
        message: &str,
    ) -> Result<bool> {
        self.set_at(target, type_, status, reason, message, None, Utc::now())
    }

    /// Same as [`ConditionWriter::set`], also recording the observed generation
    pub fn set_with_generation<T: StatusConditions + ?Sized>(
        &self,
        target: &mut T,
        type_: &str,
        status: ConditionStatus,
        reason: &str,
        message: &str,
        generation: i64,
    ) -> Result<bool> {
        self.set_at(target, type_, status, reason, message, Some(generation), Utc::now())
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn set_at<T: StatusConditions + ?Sized>(
        &self,
        target: &mut T,
        type_: &str,
        status: ConditionStatus,
        reason: &str,
        message: &str,
        observed_generation: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let set = self.owned_set(target, type_)?;

        let last_transition_time = match set.get(type_) {
            Some(existing)
                if existing.status == status
                    && existing.reason == reason
                    && existing.message == message
                    && existing.observed_generation == observed_generation =>
            {
                return Ok(false);
            }
            Some(existing) if existing.status == status => existing.last_transition_time.clone(),
            _ => now.to_rfc3339_opts(SecondsFormat::Secs, true),
        };

        set.upsert(Condition {
            type_: type_.to_string(),
            status,
            last_transition_time,
            reason: reason.to_string(),
            message: message.to_string(),
            observed_generation,
        });
        Ok(true)
    }

    /// Drop a condition from the writer's own list, returning it if it was present
    pub fn remove<T: StatusConditions + ?Sized>(
        &self,
        target: &mut T,
        type_: &str,
    ) -> Result<Option<Condition>> {
        Ok(self.owned_set(target, type_)?.remove(type_))
    }

    fn owned_set<'a, T: StatusConditions + ?Sized>(
        &self,
        target: &'a mut T,
        type_: &str,
    ) -> Result<&'a mut ConditionSet> {
        if !self.owns(type_) {
            return Err(Error::ConditionNotOwned {
                owner: self.manager.clone(),
                condition_type: type_.to_string(),
            });
        }
        target
            .conditions_mut(self.field)
            .ok_or(Error::ConditionFieldMissing { field: self.field })
    }
}
