//! Provider Configs
//!
//! A provider config pairs a decoded, platform specific provider spec with
//! the cluster Infrastructure it is placed against. Configs are values: every
//! transformation returns a new config and the Infrastructure is only
//! borrowed for lookups.

pub mod decode;
pub mod factory;
pub mod policy;
pub mod vsphere;

pub use factory::*;
pub use policy::*;
pub use vsphere::*;

use crate::crd::{FailureDomain, PlatformType};
use crate::error::Result;
use serde_json::Value;
use std::collections::BTreeSet;

// =============================================================================
// Failure Domain Placement
// =============================================================================

/// Moving a config into a failure domain and recovering the one it is in
pub trait FailureDomainPlacement {
    /// Failure domain identity understood by the implementor
    type FailureDomain;

    /// New config with placement fields taken from the named failure domain.
    /// Unknown names return an equal config.
    fn inject_failure_domain(&self, failure_domain: &Self::FailureDomain) -> Self;

    /// Failure domain the config is currently placed in, empty when none matches
    fn extract_failure_domain(&self) -> Self::FailureDomain;
}

// =============================================================================
// Provider Config
// =============================================================================

/// Platform tagged provider config
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderConfig<'a> {
    VSphere(VSphereProviderConfig<'a>),
}

impl<'a> ProviderConfig<'a> {
    /// Platform of the wrapped spec
    pub fn platform_type(&self) -> PlatformType {
        match self {
            ProviderConfig::VSphere(_) => PlatformType::VSphere,
        }
    }

    /// The vSphere config, if this is one
    pub fn vsphere(&self) -> Option<&VSphereProviderConfig<'a>> {
        match self {
            ProviderConfig::VSphere(config) => Some(config),
        }
    }

    /// Spec encoded back into its raw JSON form
    pub fn raw_config(&self) -> Result<Vec<u8>> {
        match self {
            ProviderConfig::VSphere(config) => decode::encode(config.config()),
        }
    }

    /// Spec as a JSON value
    pub fn to_value(&self) -> Result<Value> {
        let value = match self {
            ProviderConfig::VSphere(config) => serde_json::to_value(config.config())?,
        };
        Ok(value)
    }

    /// Differences between two configs as `path: left != right` lines
    pub fn diff(&self, other: &ProviderConfig<'_>) -> Result<Vec<String>> {
        let mut differences = Vec::new();

        if self.platform_type() != other.platform_type() {
            differences.push(format!(
                "platform: {} != {}",
                self.platform_type(),
                other.platform_type()
            ));
            return Ok(differences);
        }

        diff_values("", &self.to_value()?, &other.to_value()?, &mut differences);
        Ok(differences)
    }
}

impl<'a> FailureDomainPlacement for ProviderConfig<'a> {
    type FailureDomain = FailureDomain;

    fn inject_failure_domain(&self, failure_domain: &FailureDomain) -> Self {
        match (self, failure_domain) {
            (ProviderConfig::VSphere(config), FailureDomain::VSphere(fd)) => {
                ProviderConfig::VSphere(config.inject_failure_domain(fd))
            }
        }
    }

    fn extract_failure_domain(&self) -> FailureDomain {
        match self {
            ProviderConfig::VSphere(config) => {
                FailureDomain::VSphere(config.extract_failure_domain())
            }
        }
    }
}

fn diff_values(path: &str, left: &Value, right: &Value, differences: &mut Vec<String>) {
    match (left, right) {
        (Value::Object(l), Value::Object(r)) => {
            let keys: BTreeSet<&String> = l.keys().chain(r.keys()).collect();
            for key in keys {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                diff_values(
                    &child,
                    l.get(key).unwrap_or(&Value::Null),
                    r.get(key).unwrap_or(&Value::Null),
                    differences,
                );
            }
        }
        (Value::Array(l), Value::Array(r)) if l.len() == r.len() => {
            for (index, (left, right)) in l.iter().zip(r).enumerate() {
                diff_values(&format!("{}[{}]", path, index), left, right, differences);
            }
        }
        _ if left != right => {
            let path = if path.is_empty() { "." } else { path };
            differences.push(format!("{}: {} != {}", path, left, right));
        }
        _ => {}
    }
}
