//! Typed access to the API server
//!
//! [`ResourceClient`] wraps `kube::Api` for the create/read/update/delete/list
//! operations on our resources. [`ConditionPatcher`] updates a single
//! condition list in a status without touching the others, and
//! [`ClusterResolver`] loads the names a binding may refer to.

use std::fmt::Debug;

use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::core::{ApiResource, DynamicObject, GroupVersionKind, ObjectList};
use kube::{Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::crd::{
    Application, ConditionField, ConditionWriter, StatusConditions, GROUP, VERSION,
};
use crate::error::{Error, Result};
use crate::validation::InMemoryResolver;

/// Namespaced client for one resource kind
#[derive(Clone)]
pub struct ResourceClient<K> {
    api: Api<K>,
    namespace: String,
}

impl<K> ResourceClient<K>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + Clone
        + Debug
        + DeserializeOwned
        + Serialize,
{
    pub fn new(client: Client, namespace: &str) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
            namespace: namespace.to_string(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub async fn list(&self) -> Result<ObjectList<K>> {
        let list = self.api.list(&ListParams::default()).await?;
        debug!(
            "Listed {} {} in {}",
            list.items.len(),
            K::plural(&()),
            self.namespace
        );
        Ok(list)
    }

    pub async fn get(&self, name: &str) -> Result<K> {
        Ok(self.api.get(name).await?)
    }

    /// Like [`ResourceClient::get`], mapping "not found" to `None`
    pub async fn get_opt(&self, name: &str) -> Result<Option<K>> {
        Ok(self.api.get_opt(name).await?)
    }

    #[instrument(skip(self, obj), fields(name = %obj.name_any(), namespace = %self.namespace))]
    pub async fn create(&self, obj: &K) -> Result<K> {
        let created = self.api.create(&PostParams::default(), obj).await?;
        info!("Created {} {}/{}", K::kind(&()), self.namespace, created.name_any());
        Ok(created)
    }

    /// Replace the whole object; the status subresource is ignored by the server
    #[instrument(skip(self, obj), fields(name = %obj.name_any(), namespace = %self.namespace))]
    pub async fn replace(&self, obj: &K) -> Result<K> {
        Ok(self
            .api
            .replace(&obj.name_any(), &PostParams::default(), obj)
            .await?)
    }

    /// Replace only the status subresource
    #[instrument(skip(self, obj), fields(name = %obj.name_any(), namespace = %self.namespace))]
    pub async fn replace_status(&self, obj: &K) -> Result<K> {
        let data = serde_json::to_vec(obj)?;
        Ok(self
            .api
            .replace_status(&obj.name_any(), &PostParams::default(), data)
            .await?)
    }

    /// Delete an object; deleting something already gone is not an error
    #[instrument(skip(self), fields(namespace = %self.namespace))]
    pub async fn delete(&self, name: &str) -> Result<()> {
        match self.api.delete(name, &DeleteParams::default()).await {
            Ok(_) => info!("Deleted {} {}/{}", K::kind(&()), self.namespace, name),
            Err(kube::Error::Api(e)) if e.code == 404 => {
                warn!("{} {}/{} not found, already deleted", K::kind(&()), self.namespace, name);
            }
            Err(e) => return Err(Error::KubeError(e)),
        }
        Ok(())
    }
}

/// Writes one condition list of a status on behalf of a [`ConditionWriter`]
///
/// The patch is a JSON merge patch containing only the target list and the
/// resourceVersion it was computed from, sent under the writer's field
/// manager. Lists owned by other writers are left as they are on the server,
/// and a concurrent write to the same list surfaces as a 409 conflict.
pub struct ConditionPatcher<K> {
    api: Api<K>,
    writer: ConditionWriter,
}

impl<K> ConditionPatcher<K>
where
    K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
        + StatusConditions
        + Clone
        + Debug
        + DeserializeOwned,
{
    pub fn new(client: Client, namespace: &str, writer: ConditionWriter) -> Self {
        Self {
            api: Api::namespaced(client, namespace),
            writer,
        }
    }

    /// Read `name`, let `update` change the writer's condition list, and patch it back
    ///
    /// Returns whether a patch was sent.
    #[instrument(skip(self, update), fields(manager = %self.writer.manager(), field = %self.writer.field()))]
    pub async fn apply<F>(&self, name: &str, update: F) -> Result<bool>
    where
        F: FnOnce(&ConditionWriter, &mut K) -> Result<bool>,
    {
        let mut current = self.api.get(name).await?;

        if !update(&self.writer, &mut current)? {
            debug!("Conditions of {} unchanged, skipping patch", name);
            return Ok(false);
        }

        let field = self.writer.field();
        let patch = condition_patch(&mut current, field)?;
        let mut params = PatchParams::default();
        params.field_manager = Some(self.writer.manager().to_string());

        self.api
            .patch_status(name, &params, &Patch::Merge(&patch))
            .await?;
        info!("Patched status.{} of {} {}", field, K::kind(&()), name);
        Ok(true)
    }
}

/// Merge patch carrying only `field` of the resource's status
fn condition_patch<K>(resource: &mut K, field: ConditionField) -> Result<serde_json::Value>
where
    K: Resource + StatusConditions,
{
    let set = match resource.conditions_mut(field) {
        Some(set) => serde_json::to_value(&*set)?,
        None => return Err(Error::ConditionFieldMissing { field }),
    };

    let mut status = serde_json::Map::new();
    status.insert(field.json_name().to_string(), set);

    let mut patch = serde_json::json!({ "status": status });
    if let Some(rv) = resource.resource_version() {
        patch["metadata"] = serde_json::json!({ "resourceVersion": rv });
    }
    Ok(patch)
}

/// Loads the names a binding may refer to from the cluster
pub struct ClusterResolver {
    client: Client,
}

impl ClusterResolver {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Snapshot Applications, Environments and Snapshots of `namespace`
    ///
    /// Component lists of Applications are not loaded, so component
    /// membership is not checked against the result.
    #[instrument(skip(self))]
    pub async fn snapshot(&self, namespace: &str) -> Result<InMemoryResolver> {
        let applications: Api<Application> = Api::namespaced(self.client.clone(), namespace);
        let environments = self.dynamic_api(namespace, "Environment");
        let snapshots = self.dynamic_api(namespace, "Snapshot");

        let params = ListParams::default();
        let (applications, environments, snapshots) = futures::try_join!(
            applications.list(&params),
            environments.list(&params),
            snapshots.list(&params),
        )?;

        info!(
            "Loaded {} applications, {} environments, {} snapshots from {}",
            applications.items.len(),
            environments.items.len(),
            snapshots.items.len(),
            namespace
        );

        let resolver = applications
            .iter()
            .fold(InMemoryResolver::new(), |r, app| r.with_application(app.name_any()));
        let resolver = environments
            .iter()
            .fold(resolver, |r, env| r.with_environment(env.name_any()));
        Ok(snapshots
            .iter()
            .fold(resolver, |r, snap| r.with_snapshot(snap.name_any())))
    }

    fn dynamic_api(&self, namespace: &str, kind: &str) -> Api<DynamicObject> {
        let resource = ApiResource::from_gvk(&GroupVersionKind::gvk(GROUP, VERSION, kind));
        Api::namespaced_with(self.client.clone(), namespace, &resource)
    }
}
