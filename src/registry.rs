//! Schema registry
//!
//! An immutable table mapping resource kinds to their metadata, CRD manifest
//! and decoder. It is built once with [`SchemaRegistry::builtin`] and handed
//! by reference to whatever needs to decode or describe resources.

use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::core::ApiResource;
use kube::{CustomResourceExt, Resource as KubeResource, ResourceExt};
use serde::Deserialize;
use serde_json::Value;

use crate::crd::{
    Application, ApplicationList, SnapshotEnvironmentBinding, SnapshotEnvironmentBindingList,
};
use crate::error::{Error, Result};
use crate::validation::ValidationError;

type DecodeFn = fn(Value) -> Result<Resource>;

/// Whether a kind lives in a namespace or at cluster scope
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    Namespaced,
    Cluster,
}

/// Registration of a single resource kind
#[derive(Clone, Debug)]
pub struct SchemaEntry {
    pub kind: String,
    pub list_kind: String,
    pub plural: String,
    pub singular: String,
    pub short_names: Vec<String>,
    pub api_version: String,
    pub scope: Scope,
    pub api_resource: ApiResource,
    crd: CustomResourceDefinition,
    decode_object: DecodeFn,
    decode_list: DecodeFn,
}

impl SchemaEntry {
    fn of<K>(decode_object: DecodeFn, decode_list: DecodeFn) -> Self
    where
        K: CustomResourceExt + KubeResource<DynamicType = ()>,
    {
        let crd = K::crd();
        let names = &crd.spec.names;
        let kind = names.kind.clone();

        Self {
            list_kind: names
                .list_kind
                .clone()
                .unwrap_or_else(|| format!("{kind}List")),
            plural: names.plural.clone(),
            singular: names
                .singular
                .clone()
                .unwrap_or_else(|| kind.to_lowercase()),
            short_names: names.short_names.clone().unwrap_or_default(),
            api_version: K::api_version(&()).to_string(),
            scope: if crd.spec.scope == "Namespaced" {
                Scope::Namespaced
            } else {
                Scope::Cluster
            },
            api_resource: ApiResource::erase::<K>(&()),
            kind,
            crd,
            decode_object,
            decode_list,
        }
    }

    /// The CustomResourceDefinition manifest for this kind
    pub fn crd(&self) -> &CustomResourceDefinition {
        &self.crd
    }

    fn matches(&self, name: &str) -> bool {
        self.kind.eq_ignore_ascii_case(name)
            || self.plural.eq_ignore_ascii_case(name)
            || self.singular.eq_ignore_ascii_case(name)
            || self.short_names.iter().any(|s| s.eq_ignore_ascii_case(name))
    }
}

/// A decoded resource or resource list
#[derive(Clone, Debug)]
pub enum Resource {
    Application(Box<Application>),
    ApplicationList(ApplicationList),
    Binding(Box<SnapshotEnvironmentBinding>),
    BindingList(SnapshotEnvironmentBindingList),
}

impl Resource {
    pub fn kind(&self) -> &'static str {
        match self {
            Resource::Application(_) => "Application",
            Resource::ApplicationList(_) => "ApplicationList",
            Resource::Binding(_) => "SnapshotEnvironmentBinding",
            Resource::BindingList(_) => "SnapshotEnvironmentBindingList",
        }
    }

    /// Every binding contained in this resource
    pub fn bindings(&self) -> Vec<&SnapshotEnvironmentBinding> {
        match self {
            Resource::Binding(binding) => vec![binding.as_ref()],
            Resource::BindingList(list) => list.items.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Structural validation of every contained object, keyed by object name
    pub fn validate(&self) -> Vec<(String, ValidationError)> {
        match self {
            Resource::Application(app) => application_errors(app).into_iter().collect(),
            Resource::ApplicationList(list) => {
                list.items.iter().filter_map(application_errors).collect()
            }
            Resource::Binding(binding) => binding_errors(binding).into_iter().collect(),
            Resource::BindingList(list) => list.items.iter().filter_map(binding_errors).collect(),
        }
    }
}

fn application_errors(app: &Application) -> Option<(String, ValidationError)> {
    app.spec.validate().err().map(|e| (app.name_any(), e))
}

fn binding_errors(binding: &SnapshotEnvironmentBinding) -> Option<(String, ValidationError)> {
    binding.spec.validate().err().map(|e| (binding.name_any(), e))
}

/// Immutable table of registered kinds
#[derive(Clone, Debug)]
pub struct SchemaRegistry {
    entries: Vec<SchemaEntry>,
}

impl SchemaRegistry {
    /// Registry holding Application and SnapshotEnvironmentBinding
    pub fn builtin() -> Self {
        Self {
            entries: vec![
                SchemaEntry::of::<Application>(
                    |v| Ok(Resource::Application(Box::new(serde_json::from_value(v)?))),
                    |v| Ok(Resource::ApplicationList(serde_json::from_value(v)?)),
                ),
                SchemaEntry::of::<SnapshotEnvironmentBinding>(
                    |v| Ok(Resource::Binding(Box::new(serde_json::from_value(v)?))),
                    |v| Ok(Resource::BindingList(serde_json::from_value(v)?)),
                ),
            ],
        }
    }

    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }

    /// Look up an entry by its exact kind
    pub fn get(&self, kind: &str) -> Option<&SchemaEntry> {
        self.entries.iter().find(|e| e.kind == kind)
    }

    /// Look up an entry by kind, plural, singular or short name, ignoring case
    pub fn resolve(&self, name: &str) -> Result<&SchemaEntry> {
        self.entries
            .iter()
            .find(|e| e.matches(name))
            .ok_or_else(|| Error::UnknownKind(name.to_string()))
    }

    pub fn crds(&self) -> impl Iterator<Item = &CustomResourceDefinition> {
        self.entries.iter().map(SchemaEntry::crd)
    }

    /// Decode a JSON object into the typed resource named by its `kind`
    pub fn decode(&self, value: Value) -> Result<Resource> {
        let kind = value
            .get("kind")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let api_version = value
            .get("apiVersion")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        let (entry, is_list) = self
            .entries
            .iter()
            .find_map(|e| {
                if e.kind == kind {
                    Some((e, false))
                } else if e.list_kind == kind {
                    Some((e, true))
                } else {
                    None
                }
            })
            .ok_or_else(|| Error::UnknownKind(kind.clone()))?;

        if api_version != entry.api_version {
            return Err(Error::UnsupportedApiVersion { kind, api_version });
        }

        if is_list {
            (entry.decode_list)(value)
        } else {
            (entry.decode_object)(value)
        }
    }

    /// Decode every document of a (possibly multi-document) YAML stream
    pub fn decode_yaml(&self, input: &str) -> Result<Vec<Resource>> {
        let mut resources = Vec::new();
        for document in serde_yaml::Deserializer::from_str(input) {
            let value = Value::deserialize(document)?;
            if value.is_null() {
                continue;
            }
            resources.push(self.decode(value)?);
        }
        Ok(resources)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn builtin_registers_both_kinds() {
        let registry = SchemaRegistry::builtin();
        let app = registry.get("Application").unwrap();
        assert_eq!(app.plural, "applications");
        assert_eq!(app.list_kind, "ApplicationList");
        assert_eq!(app.api_version, "appstudio.redhat.com/v1alpha1");
        assert_eq!(app.scope, Scope::Namespaced);
        assert_eq!(app.short_names, vec!["hasapp", "ha", "app"]);

        let binding = registry.get("SnapshotEnvironmentBinding").unwrap();
        assert_eq!(binding.plural, "snapshotenvironmentbindings");
        assert_eq!(binding.short_names, vec!["aseb", "binding"]);
    }

    #[test]
    fn resolve_accepts_short_names_and_plurals() {
        let registry = SchemaRegistry::builtin();
        assert_eq!(registry.resolve("hasapp").unwrap().kind, "Application");
        assert_eq!(
            registry.resolve("SnapshotEnvironmentBindings").unwrap().kind,
            "SnapshotEnvironmentBinding"
        );
        assert!(matches!(registry.resolve("widget"), Err(Error::UnknownKind(_))));
    }

    #[test]
    fn crds_are_named_plural_dot_group() {
        let registry = SchemaRegistry::builtin();
        let names: Vec<_> = registry
            .crds()
            .filter_map(|crd| crd.metadata.name.clone())
            .collect();
        assert_eq!(
            names,
            vec![
                "applications.appstudio.redhat.com",
                "snapshotenvironmentbindings.appstudio.redhat.com"
            ]
        );
    }

    #[test]
    fn decode_dispatches_on_kind() {
        let registry = SchemaRegistry::builtin();
        let resource = registry
            .decode(json!({
                "apiVersion": "appstudio.redhat.com/v1alpha1",
                "kind": "Application",
                "metadata": {"name": "pet-clinic"},
                "spec": {"displayName": "pet-clinic"}
            }))
            .unwrap();
        assert_eq!(resource.kind(), "Application");
        assert!(resource.validate().is_empty());
    }

    #[test]
    fn decode_handles_lists() {
        let registry = SchemaRegistry::builtin();
        let resource = registry
            .decode(json!({
                "apiVersion": "appstudio.redhat.com/v1alpha1",
                "kind": "SnapshotEnvironmentBindingList",
                "metadata": {},
                "items": [{
                    "apiVersion": "appstudio.redhat.com/v1alpha1",
                    "kind": "SnapshotEnvironmentBinding",
                    "metadata": {"name": "b1"},
                    "spec": {
                        "application": "pet-clinic",
                        "environment": "staging",
                        "snapshot": "snap",
                        "components": [{"name": "web"}, {"name": "web"}]
                    }
                }]
            }))
            .unwrap();

        assert_eq!(resource.bindings().len(), 1);
        let errors = resource.validate();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].0, "b1");
        assert_eq!(errors[0].1, ValidationError::DuplicateComponent("web".into()));
    }

    #[test]
    fn decode_rejects_unknown_kind_and_version() {
        let registry = SchemaRegistry::builtin();
        assert!(matches!(
            registry.decode(json!({"apiVersion": "v1", "kind": "Pod"})),
            Err(Error::UnknownKind(kind)) if kind == "Pod"
        ));
        assert!(matches!(
            registry.decode(json!({
                "apiVersion": "appstudio.redhat.com/v1beta1",
                "kind": "Application",
                "metadata": {},
                "spec": {"displayName": "x"}
            })),
            Err(Error::UnsupportedApiVersion { .. })
        ));
    }

    #[test]
    fn decode_yaml_reads_every_document() {
        let registry = SchemaRegistry::builtin();
        let input = r#"
apiVersion: appstudio.redhat.com/v1alpha1
kind: Application
metadata:
  name: pet-clinic
spec:
  displayName: pet-clinic
---
apiVersion: appstudio.redhat.com/v1alpha1
kind: SnapshotEnvironmentBinding
metadata:
  name: pet-clinic-staging
spec:
  application: pet-clinic
  environment: staging
  snapshot: snapshot-1
  components:
    - name: frontend
      configuration:
        replicas: 2
"#;
        let resources = registry.decode_yaml(input).unwrap();
        let kinds: Vec<_> = resources.iter().map(Resource::kind).collect();
        assert_eq!(kinds, vec!["Application", "SnapshotEnvironmentBinding"]);
    }
}
