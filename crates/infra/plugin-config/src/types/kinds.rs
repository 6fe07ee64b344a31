//! String-valued type tags shared by contexts and servers.
//!
//! Each tag accepts a canonical spelling plus aliases and keeps any other
//! value verbatim in `Other`, so documents written by newer tools survive a
//! load/store cycle unchanged.

use schemars::{JsonSchema, Schema, SchemaGenerator};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

macro_rules! string_tag {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $canonical:literal $(| $alias:literal)* ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// Unrecognised value, carried through verbatim.
            Other(String),
        }

        impl $name {
            pub fn as_str(&self) -> &str {
                match self {
                    $( Self::$variant => $canonical, )+
                    Self::Other(s) => s,
                }
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                let normalised = s.trim().to_lowercase();
                match normalised.as_str() {
                    $( $canonical $(| $alias)* => Self::$variant, )+
                    _ => Self::Other(s),
                }
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self::from(s.to_string())
            }
        }

        impl From<$name> for String {
            fn from(v: $name) -> Self {
                v.as_str().to_string()
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self::from(s))
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl JsonSchema for $name {
            fn schema_name() -> Cow<'static, str> {
                stringify!($name).into()
            }

            fn json_schema(generator: &mut SchemaGenerator) -> Schema {
                String::json_schema(generator)
            }
        }
    };
}

string_tag! {
    /// Kind of endpoint a context talks to. Keys the current-context map.
    ContextType {
        Kubernetes => "kubernetes" | "k8s",
        MissionControl => "mission-control" | "tmc",
        Tanzu => "tanzu",
    }
}

string_tag! {
    /// Legacy target field on contexts; `ContextType` is derived from it when absent.
    Target {
        Kubernetes => "kubernetes" | "k8s",
        MissionControl => "mission-control" | "tmc",
    }
}

string_tag! {
    /// Legacy server type.
    ServerType {
        ManagementCluster => "managementcluster",
        Global => "global",
    }
}

impl ContextType {
    /// The one type whose current pointer coexists with any other type's.
    pub const ALWAYS_COEXISTENT: Self = Self::MissionControl;

    pub fn is_always_coexistent(&self) -> bool {
        *self == Self::ALWAYS_COEXISTENT
    }

    /// Whether contexts of this type have a legacy server counterpart.
    pub fn is_server_representable(&self) -> bool {
        matches!(self, Self::Kubernetes | Self::MissionControl)
    }
}

impl From<&Target> for ContextType {
    fn from(target: &Target) -> Self {
        match target {
            Target::Kubernetes => Self::Kubernetes,
            Target::MissionControl => Self::MissionControl,
            Target::Other(s) => Self::Other(s.clone()),
        }
    }
}

impl Target {
    /// Target implied by a context type; tanzu contexts target kubernetes.
    pub fn for_context_type(context_type: &ContextType) -> Self {
        match context_type {
            ContextType::Kubernetes | ContextType::Tanzu => Self::Kubernetes,
            ContextType::MissionControl => Self::MissionControl,
            ContextType::Other(s) => Self::Other(s.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_normalise() {
        assert_eq!(ContextType::from("k8s"), ContextType::Kubernetes);
        assert_eq!(ContextType::from("TMC"), ContextType::MissionControl);
        assert_eq!(Target::from(" kubernetes "), Target::Kubernetes);
        assert_eq!(
            ServerType::from("managementcluster"),
            ServerType::ManagementCluster
        );
    }

    #[test]
    fn test_unknown_values_are_verbatim() {
        let t = ContextType::from("Operations");
        assert_eq!(t, ContextType::Other("Operations".into()));
        assert_eq!(t.to_string(), "Operations");
        assert_eq!(String::from(t), "Operations");
    }

    #[test]
    fn test_serde_uses_canonical_strings() {
        let yaml = serde_yaml::to_string(&ContextType::MissionControl).unwrap();
        assert_eq!(yaml.trim(), "mission-control");
        let parsed: ContextType = serde_yaml::from_str("k8s").unwrap();
        assert_eq!(parsed, ContextType::Kubernetes);
    }

    #[test]
    fn test_privileged_type() {
        assert!(ContextType::MissionControl.is_always_coexistent());
        assert!(!ContextType::Kubernetes.is_always_coexistent());
        assert!(!ContextType::Tanzu.is_server_representable());
    }

    #[test]
    fn test_target_context_type_mapping() {
        assert_eq!(
            ContextType::from(&Target::MissionControl),
            ContextType::MissionControl
        );
        assert_eq!(
            Target::for_context_type(&ContextType::Tanzu),
            Target::Kubernetes
        );
    }
}
