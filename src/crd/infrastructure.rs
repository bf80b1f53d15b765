//! Infrastructure CRD
//!
//! The cluster-wide topology descriptor (`config.openshift.io/v1`). It declares
//! the platform the cluster runs on and, for vSphere, the ordered list of
//! failure domains control plane machines are spread across.
//!
//! This crate only ever reads an Infrastructure. The mutation helpers at the
//! bottom exist for callers that prepare descriptors (tests, tooling).

use crate::crd::failure_domain::{FailureDomain, VSphereFailureDomain};
use crate::error::{Error, Result};
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Name of the Infrastructure singleton within a cluster
pub const INFRASTRUCTURE_NAME: &str = "cluster";

// =============================================================================
// Infrastructure CRD
// =============================================================================

/// InfrastructureSpec holds the user-settable platform configuration.
#[derive(CustomResource, Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "config.openshift.io",
    version = "v1",
    kind = "Infrastructure",
    plural = "infrastructures",
    status = "InfrastructureStatus",
    printcolumn = r#"{"name": "Platform", "type": "string", "jsonPath": ".status.platformStatus.type"}"#,
    printcolumn = r#"{"name": "Infrastructure Name", "type": "string", "jsonPath": ".status.infrastructureName"}"#,
    printcolumn = r#"{"name": "Age", "type": "date", "jsonPath": ".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureSpec {
    /// Platform specific configuration
    #[serde(default)]
    pub platform_spec: PlatformSpec,
}

/// Platform specific section of the Infrastructure spec
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSpec {
    /// Declared platform type
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    #[schemars(with = "Option<String>")]
    pub platform_type: Option<PlatformType>,

    /// vSphere topology, present on vSphere clusters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vsphere: Option<VSpherePlatformSpec>,
}

/// vSphere platform configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VSpherePlatformSpec {
    /// Failure domains in declared order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failure_domains: Vec<VSpherePlatformFailureDomainSpec>,
}

/// A named vSphere failure domain.
///
/// `region` and `zone` name the partition, `server` is the vCenter that owns it
/// and `topology` pins the vCenter objects machines in it are placed on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VSpherePlatformFailureDomainSpec {
    /// Unique name within the Infrastructure
    pub name: String,

    #[serde(default)]
    pub region: String,

    #[serde(default)]
    pub zone: String,

    /// vCenter server address
    #[serde(default)]
    pub server: String,

    #[serde(default)]
    pub topology: VSpherePlatformTopology,
}

/// vCenter objects a failure domain maps onto. Empty strings are unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VSpherePlatformTopology {
    #[serde(default)]
    pub datacenter: String,

    /// Compute cluster path, e.g. `/dc1/host/cluster1`
    #[serde(default)]
    pub compute_cluster: String,

    /// Port group names; only the first one is used for placement
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub networks: Vec<String>,

    #[serde(default)]
    pub datastore: String,

    /// Absolute resource pool path. Takes precedence over the compute cluster default.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_pool: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub folder: String,

    /// Template path or name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub template: String,
}

// =============================================================================
// Status
// =============================================================================

/// Observed state of the Infrastructure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureStatus {
    /// Unique cluster infrastructure name, used as a prefix for synthesized names
    #[serde(default)]
    pub infrastructure_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_status: Option<PlatformStatus>,
}

/// Observed platform
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PlatformStatus {
    #[serde(rename = "type")]
    #[schemars(with = "String")]
    pub platform_type: PlatformType,
}

// =============================================================================
// Platform Type
// =============================================================================

/// Platform a cluster runs on, in the API's spelling
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlatformType {
    Aws,
    Azure,
    Gcp,
    OpenStack,
    VSphere,
    Nutanix,
    #[default]
    None,
    /// Any platform this crate has no name for
    Unknown(String),
}

impl PlatformType {
    /// API spelling of the platform
    pub fn as_str(&self) -> &str {
        match self {
            PlatformType::Aws => "AWS",
            PlatformType::Azure => "Azure",
            PlatformType::Gcp => "GCP",
            PlatformType::OpenStack => "OpenStack",
            PlatformType::VSphere => "VSphere",
            PlatformType::Nutanix => "Nutanix",
            PlatformType::None => "None",
            PlatformType::Unknown(other) => other,
        }
    }
}

impl From<String> for PlatformType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "AWS" => PlatformType::Aws,
            "Azure" => PlatformType::Azure,
            "GCP" => PlatformType::Gcp,
            "OpenStack" => PlatformType::OpenStack,
            "VSphere" => PlatformType::VSphere,
            "Nutanix" => PlatformType::Nutanix,
            "None" | "" => PlatformType::None,
            _ => PlatformType::Unknown(value),
        }
    }
}

impl From<PlatformType> for String {
    fn from(value: PlatformType) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for PlatformType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Implementations
// =============================================================================

impl Infrastructure {
    /// Create the cluster singleton with the given spec and status
    pub fn new_cluster(spec: InfrastructureSpec, status: InfrastructureStatus) -> Self {
        let mut infrastructure = Infrastructure::new(INFRASTRUCTURE_NAME, spec);
        infrastructure.status = Some(status);
        infrastructure
    }

    /// Platform the cluster runs on.
    ///
    /// The observed status wins over the declared spec. Missing both is `None`.
    pub fn platform_type(&self) -> PlatformType {
        self.status
            .as_ref()
            .and_then(|s| s.platform_status.as_ref())
            .map(|p| p.platform_type.clone())
            .or_else(|| self.spec.platform_spec.platform_type.clone())
            .unwrap_or_default()
    }

    /// Cluster infrastructure name, empty when status is not populated
    pub fn infrastructure_name(&self) -> &str {
        self.status
            .as_ref()
            .map(|s| s.infrastructure_name.as_str())
            .unwrap_or_default()
    }

    /// vSphere failure domains in declared order
    pub fn vsphere_failure_domains(&self) -> &[VSpherePlatformFailureDomainSpec] {
        self.spec
            .platform_spec
            .vsphere
            .as_ref()
            .map(|v| v.failure_domains.as_slice())
            .unwrap_or_default()
    }

    /// Check whether the platform declares any failure domains
    pub fn has_failure_domains(&self) -> bool {
        match self.platform_type() {
            PlatformType::VSphere => !self.vsphere_failure_domains().is_empty(),
            _ => false,
        }
    }

    /// Failure domain identities in declared order
    pub fn failure_domains(&self) -> Vec<FailureDomain> {
        match self.platform_type() {
            PlatformType::VSphere => self
                .vsphere_failure_domains()
                .iter()
                .map(|fd| FailureDomain::VSphere(VSphereFailureDomain::new(&fd.name)))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Insert a vSphere failure domain at `index`, appending when `index` is the length
    pub fn insert_failure_domain(
        &mut self,
        index: usize,
        failure_domain: VSpherePlatformFailureDomainSpec,
    ) -> Result<()> {
        let failure_domains = &mut self
            .spec
            .platform_spec
            .vsphere
            .get_or_insert_with(Default::default)
            .failure_domains;

        if index > failure_domains.len() {
            return Err(Error::Configuration(format!(
                "failure domain index {} out of range, {} failure domains defined",
                index,
                failure_domains.len()
            )));
        }

        failure_domains.insert(index, failure_domain);
        Ok(())
    }

    /// Remove the vSphere failure domain at `index`, returning it
    pub fn remove_failure_domain(&mut self, index: usize) -> Option<VSpherePlatformFailureDomainSpec> {
        let vsphere = self.spec.platform_spec.vsphere.as_mut()?;
        if index < vsphere.failure_domains.len() {
            Some(vsphere.failure_domains.remove(index))
        } else {
            None
        }
    }
}
