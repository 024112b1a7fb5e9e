//! AppStudio API: Kubernetes resource definitions for a GitOps deployment platform
//!
//! This crate defines the `Application` and `SnapshotEnvironmentBinding`
//! custom resources, a registry describing them, validation of their specs
//! and references, and a typed client for exchanging them with an API server.

pub mod client;
pub mod config;
pub mod crd;
pub mod error;
pub mod registry;
pub mod validation;

pub use crate::error::{Error, Result};
pub use crate::registry::SchemaRegistry;
