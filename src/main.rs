//! AppStudio API command-line tool
//!
//! Prints CRD manifests, validates resource manifests, and lists resources
//! in a cluster.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, Context};
use appstudio_api::client::{ClusterResolver, ResourceClient};
use appstudio_api::config::Config;
use appstudio_api::crd::{Application, SnapshotEnvironmentBinding};
use appstudio_api::registry::{Resource, SchemaRegistry};
use appstudio_api::validation::{validate_binding_references, InMemoryResolver};
use clap::{Parser, Subcommand};
use kube::ResourceExt;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "appstudio-api", version, about)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print CustomResourceDefinition manifests as YAML
    Crds {
        /// Only print the CRD for this kind (kind, plural or short name)
        #[arg(long)]
        kind: Option<String>,
    },
    /// Validate resource manifests
    Validate {
        /// YAML files, possibly holding several documents each
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Also check that binding references exist in the cluster
        #[arg(long)]
        resolve: bool,
    },
    /// List resources of a kind with their latest status
    List {
        /// Kind, plural or short name (e.g. "app", "binding")
        kind: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    cli.config.init_tracing();

    let registry = SchemaRegistry::builtin();

    match cli.command {
        Command::Crds { kind } => print_crds(&registry, kind.as_deref()),
        Command::Validate { files, resolve } => {
            validate_files(&registry, &cli.config, &files, resolve).await
        }
        Command::List { kind } => list(&registry, &cli.config, &kind).await,
    }
}

fn print_crds(registry: &SchemaRegistry, kind: Option<&str>) -> anyhow::Result<()> {
    let entries = match kind {
        Some(kind) => vec![registry.resolve(kind)?],
        None => registry.entries().iter().collect(),
    };

    let mut documents = Vec::with_capacity(entries.len());
    for entry in entries {
        documents.push(serde_yaml::to_string(entry.crd())?);
    }
    print!("{}", documents.join("---\n"));
    Ok(())
}

async fn validate_files(
    registry: &SchemaRegistry,
    config: &Config,
    files: &[PathBuf],
    resolve: bool,
) -> anyhow::Result<()> {
    let mut resources = Vec::new();
    for path in files {
        let input = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let decoded = registry
            .decode_yaml(&input)
            .with_context(|| format!("decoding {}", path.display()))?;
        info!("Decoded {} resources from {}", decoded.len(), path.display());
        resources.extend(decoded);
    }

    let mut failures = 0;
    for resource in &resources {
        for (name, error) in resource.validate() {
            println!("{} {}: {}", resource.kind(), name, error);
            failures += 1;
        }
    }

    if resolve {
        failures += check_references(config, &resources).await?;
    }

    if failures > 0 {
        bail!("{failures} validation error(s)");
    }
    println!("{} resources valid", resources.len());
    Ok(())
}

async fn check_references(config: &Config, resources: &[Resource]) -> anyhow::Result<usize> {
    let client = kube::Client::try_default()
        .await
        .context("connecting to Kubernetes cluster")?;
    let resolver = ClusterResolver::new(client.clone());

    let mut by_namespace: BTreeMap<String, InMemoryResolver> = BTreeMap::new();
    let mut failures = 0;
    for binding in resources.iter().flat_map(Resource::bindings) {
        let namespace = binding
            .namespace()
            .unwrap_or_else(|| config.namespace_or(client.default_namespace()).to_string());

        if !by_namespace.contains_key(&namespace) {
            let snapshot = resolver.snapshot(&namespace).await?;
            by_namespace.insert(namespace.clone(), snapshot);
        }

        if let Some(names) = by_namespace.get(&namespace) {
            if let Err(e) = validate_binding_references(&binding.spec, names) {
                println!("SnapshotEnvironmentBinding {}/{}: {}", namespace, binding.name_any(), e);
                failures += 1;
            }
        }
    }
    Ok(failures)
}

async fn list(registry: &SchemaRegistry, config: &Config, kind: &str) -> anyhow::Result<()> {
    let entry = registry.resolve(kind)?;
    let client = kube::Client::try_default()
        .await
        .context("connecting to Kubernetes cluster")?;
    let namespace = config.namespace_or(client.default_namespace()).to_string();

    match entry.kind.as_str() {
        "Application" => {
            let apps = ResourceClient::<Application>::new(client, &namespace)
                .list()
                .await?;
            println!("{:<32} {:<32} {:<8} REASON", "NAME", "DISPLAY NAME", "STATUS");
            for app in apps.iter() {
                let (status, reason) = app
                    .latest_condition()
                    .map(|c| (c.status.to_string(), c.reason.clone()))
                    .unwrap_or_default();
                println!(
                    "{:<32} {:<32} {:<8} {}",
                    app.name_any(),
                    app.spec.display_name,
                    status,
                    reason
                );
            }
        }
        "SnapshotEnvironmentBinding" => {
            let bindings = ResourceClient::<SnapshotEnvironmentBinding>::new(client, &namespace)
                .list()
                .await?;
            println!(
                "{:<32} {:<24} {:<16} {:<24} {:<24} {:<8} REASON",
                "NAME", "APPLICATION", "ENVIRONMENT", "SNAPSHOT", "CONDITION", "STATUS"
            );
            for binding in bindings.iter() {
                let (type_, status, reason) = binding
                    .latest_condition()
                    .map(|(_, c)| (c.type_.clone(), c.status.to_string(), c.reason.clone()))
                    .unwrap_or_default();
                println!(
                    "{:<32} {:<24} {:<16} {:<24} {:<24} {:<8} {}",
                    binding.name_any(),
                    binding.spec.application,
                    binding.spec.environment,
                    binding.spec.snapshot,
                    type_,
                    status,
                    reason
                );
            }
        }
        other => warn!("Listing {} is not supported", other),
    }

    Ok(())
}
