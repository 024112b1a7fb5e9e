use appstudio_api::crd::conditions::{
    CONDITION_ALL_COMPONENTS_DEPLOYED, CONDITION_CREATED, CONDITION_ERROR_OCCURRED,
    CONDITION_GITOPS_RESOURCES_GENERATED,
};
use appstudio_api::crd::*;
use kube::CustomResourceExt;
use serde_json::json;

fn full_application() -> Application {
    let spec = ApplicationSpec::new("pet-clinic")
        .with_description("demo app")
        .with_app_model_repository(
            GitRepositoryRef::new("https://github.com/org/pet-clinic-model")
                .with_branch("main")
                .with_context("model"),
        )
        .with_git_ops_repository(
            GitRepositoryRef::new("https://github.com/org/pet-clinic-gitops")
                .with_branch("devel")
                .with_context("folderA/folderB/gitops"),
        );

    let mut status = ApplicationStatus {
        conditions: ConditionSet::new(),
        devfile: Some("schemaVersion: 2.2.0\nmetadata:\n  name: pet-clinic\n".to_string()),
    };
    ConditionWriter::application()
        .set_with_generation(
            &mut status,
            CONDITION_CREATED,
            ConditionStatus::True,
            "OK",
            "Application has been successfully created",
            1,
        )
        .unwrap();

    let mut app = Application::new("pet-clinic", spec);
    app.metadata.namespace = Some("team-a".to_string());
    app.status = Some(status);
    app
}

fn full_binding() -> SnapshotEnvironmentBinding {
    let spec = SnapshotEnvironmentBindingSpec::new("pet-clinic", "staging", "pet-clinic-snapshot-1")
        .with_component(
            BindingComponent::new("frontend").with_configuration(
                BindingComponentConfiguration::with_replicas(3)
                    .resources(
                        ResourceRequirements::default()
                            .request("cpu", "500m")
                            .limit("memory", "1Gi"),
                    )
                    .env("PORT", "8080")
                    .env("LOG_LEVEL", "debug"),
            ),
        )
        .with_component(BindingComponent::new("backend"));

    let mut status = SnapshotEnvironmentBindingStatus::default();
    status.upsert_gitops_deployment("frontend", Some("pet-clinic-staging-frontend".to_string()));
    status.upsert_component_status(BindingComponentStatus {
        name: "frontend".into(),
        gitops_repository: BindingComponentGitOpsRepository {
            url: "https://github.com/org/pet-clinic-gitops".to_string(),
            branch: "main".to_string(),
            path: "components/frontend/overlays/staging".to_string(),
            generated_resources: vec!["deployment-patch.yaml".to_string()],
            commit_id: "ca82a6dff817ec66f44342007202690a93763949".to_string(),
        },
    });
    ConditionWriter::gitops_repository()
        .set(
            &mut status,
            CONDITION_GITOPS_RESOURCES_GENERATED,
            ConditionStatus::True,
            "GenerateSuccess",
            "",
        )
        .unwrap();
    ConditionWriter::binding()
        .set(
            &mut status,
            CONDITION_ERROR_OCCURRED,
            ConditionStatus::False,
            "OK",
            "",
        )
        .unwrap();
    ConditionWriter::component_deployment()
        .set(
            &mut status,
            CONDITION_ALL_COMPONENTS_DEPLOYED,
            ConditionStatus::True,
            "CommitsSynced",
            "1 of 1 components deployed",
        )
        .unwrap();

    let mut binding = SnapshotEnvironmentBinding::new("pet-clinic-staging", spec);
    binding.status = Some(status);
    binding
}

#[test]
fn application_roundtrip() {
    let original = full_application();
    let encoded = serde_json::to_string(&original).unwrap();
    let decoded: Application = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, original);
}

#[test]
fn binding_roundtrip() {
    let original = full_binding();
    let encoded = serde_json::to_string(&original).unwrap();
    let decoded: SnapshotEnvironmentBinding = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, original);
}

#[test]
fn application_without_repositories_omits_them() {
    let app = Application::new(
        "pet-clinic",
        ApplicationSpec::new("pet-clinic").with_description("demo app"),
    );
    let value = serde_json::to_value(&app).unwrap();

    assert_eq!(value["apiVersion"], json!("appstudio.redhat.com/v1alpha1"));
    assert_eq!(value["kind"], json!("Application"));
    assert_eq!(
        value["spec"],
        json!({"displayName": "pet-clinic", "description": "demo app"})
    );
}

#[test]
fn minimal_binding_keeps_required_fields_only() {
    let binding = SnapshotEnvironmentBinding::new(
        "b",
        SnapshotEnvironmentBindingSpec::new("app", "env", "snap")
            .with_component(BindingComponent::new("web")),
    );
    let value = serde_json::to_value(&binding).unwrap();

    assert_eq!(
        value["spec"],
        json!({
            "application": "app",
            "environment": "env",
            "snapshot": "snap",
            "components": [{"name": "web"}]
        })
    );
}

#[test]
fn binding_status_uses_wire_names() {
    let value = serde_json::to_value(full_binding()).unwrap();
    let status = &value["status"];

    assert_eq!(
        status["gitopsDeployments"],
        json!([{"componentName": "frontend", "gitopsDeployment": "pet-clinic-staging-frontend"}])
    );
    let repo = &status["components"][0]["gitopsRepository"];
    assert_eq!(repo["commitID"], json!("ca82a6dff817ec66f44342007202690a93763949"));
    assert_eq!(repo["generatedResources"], json!(["deployment-patch.yaml"]));
    assert_eq!(status["gitopsRepoConditions"][0]["type"], json!("GitOpsResourcesGenerated"));
    assert_eq!(status["bindingConditions"][0]["status"], json!("False"));
    assert_eq!(
        status["componentDeploymentConditions"][0]["reason"],
        json!("CommitsSynced")
    );

    let config = &value["spec"]["components"][0]["configuration"];
    assert_eq!(config["replicas"], json!(3));
    assert_eq!(config["resources"]["requests"]["cpu"], json!("500m"));
    assert_eq!(config["env"][1], json!({"name": "LOG_LEVEL", "value": "debug"}));
}

#[test]
fn decodes_manifest_written_by_controllers() {
    let binding: SnapshotEnvironmentBinding = serde_json::from_value(json!({
        "apiVersion": "appstudio.redhat.com/v1alpha1",
        "kind": "SnapshotEnvironmentBinding",
        "metadata": {"name": "pet-clinic-staging", "namespace": "team-a"},
        "spec": {
            "application": "pet-clinic",
            "environment": "staging",
            "snapshot": "snap-1",
            "components": [{"name": "frontend", "configuration": {"replicas": 2}}]
        },
        "status": {
            "componentDeploymentConditions": [{
                "type": "AllComponentsDeployed",
                "status": "True",
                "lastTransitionTime": "2022-09-01T10:00:00Z",
                "reason": "CommitsSynced",
                "message": "1 of 1 components deployed"
            }]
        }
    }))
    .unwrap();

    let status = binding.status.unwrap();
    assert!(status
        .component_deployment_conditions
        .is_true(CONDITION_ALL_COMPONENTS_DEPLOYED));
    assert!(status.gitops_repo_conditions.is_empty());
    assert_eq!(
        binding.spec.component("frontend").unwrap().configuration.as_ref().unwrap().replicas,
        2
    );
}

#[test]
fn application_crd_metadata() {
    let crd = serde_json::to_value(Application::crd()).unwrap();

    assert_eq!(crd["metadata"]["name"], json!("applications.appstudio.redhat.com"));
    assert_eq!(crd["spec"]["scope"], json!("Namespaced"));
    assert_eq!(crd["spec"]["names"]["shortNames"], json!(["hasapp", "ha", "app"]));

    let version = &crd["spec"]["versions"][0];
    assert_eq!(version["name"], json!("v1alpha1"));
    assert!(version["subresources"]["status"].is_object());
    let columns: Vec<_> = version["additionalPrinterColumns"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(columns, vec!["Age", "Status", "Reason"]);

    let spec_schema = &version["schema"]["openAPIV3Schema"]["properties"]["spec"];
    assert_eq!(spec_schema["required"], json!(["displayName"]));
}

#[test]
fn binding_crd_metadata() {
    let crd = serde_json::to_value(SnapshotEnvironmentBinding::crd()).unwrap();

    assert_eq!(
        crd["metadata"]["name"],
        json!("snapshotenvironmentbindings.appstudio.redhat.com")
    );
    assert_eq!(crd["spec"]["names"]["shortNames"], json!(["aseb", "binding"]));

    let spec_schema = &crd["spec"]["versions"][0]["schema"]["openAPIV3Schema"]["properties"]["spec"];
    let required = spec_schema["required"].as_array().unwrap();
    for field in ["application", "environment", "snapshot", "components"] {
        assert!(required.contains(&json!(field)), "{field} should be required");
    }
}

#[test]
fn application_status_with_null_conditions_decodes() {
    let app: Application = serde_json::from_value(json!({
        "apiVersion": "appstudio.redhat.com/v1alpha1",
        "kind": "Application",
        "metadata": {"name": "pet-clinic"},
        "spec": {"displayName": "pet-clinic"},
        "status": {"conditions": null}
    }))
    .unwrap();

    assert!(app.status.unwrap().conditions.is_empty());
}

#[test]
fn component_deployment_writer_leaves_other_lists_alone() {
    let mut binding = full_binding();
    let before = binding.status.clone().unwrap();

    ConditionWriter::component_deployment()
        .set(
            &mut binding,
            CONDITION_ALL_COMPONENTS_DEPLOYED,
            ConditionStatus::False,
            "CommitsUnsynced",
            "0 of 1 components deployed",
        )
        .unwrap();

    let after = binding.status.unwrap();
    assert_eq!(after.gitops_repo_conditions, before.gitops_repo_conditions);
    assert_eq!(after.binding_conditions, before.binding_conditions);
    assert!(!after
        .component_deployment_conditions
        .is_true(CONDITION_ALL_COMPONENTS_DEPLOYED));
}
