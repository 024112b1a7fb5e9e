//! Typed names for cross-resource references
//!
//! Bindings point at Applications, Environments, Snapshots and components by
//! name. Wrapping each name in its own type keeps them from being mixed up;
//! resolution happens through [`crate::validation::ReferenceResolver`].

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

macro_rules! resource_name {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Debug, Default, Deserialize, Serialize, JsonSchema, PartialEq, Eq, PartialOrd, Ord, Hash,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(name: impl Into<String>) -> Self {
                Self(name.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn is_empty(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.pad(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(name: &str) -> Self {
                Self(name.to_string())
            }
        }

        impl From<String> for $name {
            fn from(name: String) -> Self {
                Self(name)
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }
    };
}

resource_name!(
    /// Name of an Application in the binding's namespace
    ApplicationName
);
resource_name!(
    /// Name of an Environment in the binding's namespace
    EnvironmentName
);
resource_name!(
    /// Name of a Snapshot in the binding's namespace
    SnapshotName
);
resource_name!(
    /// Name of a component of an Application
    ComponentName
);
