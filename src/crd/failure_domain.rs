//! Failure domain identities
//!
//! A provider spec never names its failure domain. These types carry the
//! identity recovered by extraction, or requested for injection.

use crate::crd::infrastructure::PlatformType;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Identity of a vSphere failure domain. An empty name means "no match".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VSphereFailureDomain {
    #[serde(default)]
    pub name: String,
}

impl VSphereFailureDomain {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Platform tagged failure domain identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "platform")]
pub enum FailureDomain {
    #[serde(rename = "VSphere")]
    VSphere(VSphereFailureDomain),
}

impl FailureDomain {
    /// Shorthand for a vSphere identity
    pub fn vsphere(name: impl Into<String>) -> Self {
        FailureDomain::VSphere(VSphereFailureDomain::new(name))
    }

    /// Platform the identity belongs to
    pub fn platform_type(&self) -> PlatformType {
        match self {
            FailureDomain::VSphere(_) => PlatformType::VSphere,
        }
    }

    /// Failure domain name, empty when unmatched
    pub fn name(&self) -> &str {
        match self {
            FailureDomain::VSphere(fd) => &fd.name,
        }
    }

    /// True when this identity does not refer to any failure domain
    pub fn is_empty(&self) -> bool {
        self.name().is_empty()
    }
}

impl std::fmt::Display for FailureDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "<none>")
        } else {
            write!(f, "{}", self.name())
        }
    }
}
