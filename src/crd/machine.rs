//! vSphere machine provider spec
//!
//! Typed form of the `machine.openshift.io/v1beta1` `VSphereMachineProviderSpec`
//! payload embedded in Machine and ControlPlaneMachineSet templates. Every
//! field of the payload schema is modelled so that decoding can reject
//! anything it does not recognise and re-encoding loses nothing.

use k8s_openapi::api::core::v1::LocalObjectReference;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

/// Kind of the vSphere provider spec payload
pub const VSPHERE_PROVIDER_SPEC_KIND: &str = "VSphereMachineProviderSpec";

// =============================================================================
// Provider Spec
// =============================================================================

/// Provisioning configuration for a single vSphere machine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VSphereMachineProviderSpec {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_version: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ObjectMeta>,

    /// Secret holding the ignition user data
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data_secret: Option<LocalObjectReference>,

    /// Secret holding vCenter credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_secret: Option<LocalObjectReference>,

    /// VM template to clone from
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub template: String,

    /// Placement of the VM within vCenter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspace: Option<Workspace>,

    #[serde(default)]
    pub network: NetworkSpec,

    #[serde(default, rename = "numCPUs", skip_serializing_if = "is_zero_i32")]
    pub num_cpus: i32,

    #[serde(default, skip_serializing_if = "is_zero_i32")]
    pub num_cores_per_socket: i32,

    #[serde(default, rename = "memoryMiB", skip_serializing_if = "is_zero_i64")]
    pub memory_mib: i64,

    #[serde(default, rename = "diskGiB", skip_serializing_if = "is_zero_i32")]
    pub disk_gib: i32,

    #[serde(default, deserialize_with = "null_as_empty", rename = "tagIDs", skip_serializing_if = "Vec::is_empty")]
    pub tag_ids: Vec<String>,

    /// Snapshot to clone from when linked cloning
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub snapshot: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clone_mode: Option<CloneMode>,

    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub data_disks: Vec<DataDisk>,
}

// =============================================================================
// Sub-Types
// =============================================================================

/// Placement of a VM within vCenter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    /// vCenter server address
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub server: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub datacenter: String,

    /// VM folder path
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub folder: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub datastore: String,

    /// Absolute resource pool path
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_pool: String,
}

/// Network devices attached to the VM
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSpec {
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<NetworkDeviceSpec>,
}

impl NetworkSpec {
    /// A network with one device attached to `network_name`
    pub fn single(network_name: impl Into<String>) -> Self {
        Self {
            devices: vec![NetworkDeviceSpec {
                network_name: network_name.into(),
                ..Default::default()
            }],
        }
    }
}

/// A single network device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct NetworkDeviceSpec {
    /// Port group name
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub network_name: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub gateway: String,

    /// Static addresses in CIDR form
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub ip_addrs: Vec<String>,

    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub nameservers: Vec<String>,

    /// IP address pools to claim addresses from
    #[serde(default, deserialize_with = "null_as_empty", skip_serializing_if = "Vec::is_empty")]
    pub addresses_from_pools: Vec<AddressesFromPool>,
}

/// Reference to an IP address pool
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressesFromPool {
    /// API group of the pool resource
    #[serde(default)]
    pub group: String,

    #[serde(default)]
    pub resource: String,

    #[serde(default)]
    pub name: String,
}

/// How a VM is cloned from its template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum CloneMode {
    FullClone,
    LinkedClone,
}

/// Additional disk attached to the VM
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DataDisk {
    pub name: String,

    #[serde(default, rename = "sizeGiB")]
    pub size_gib: i32,

    /// Thin, Thick or EagerlyZeroed
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub provisioning_mode: String,
}

/// Lists written by Go without `omitempty` arrive as `null`
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn is_zero_i32(value: &i32) -> bool {
    *value == 0
}

fn is_zero_i64(value: &i64) -> bool {
    *value == 0
}

// =============================================================================
// Implementations
// =============================================================================

impl VSphereMachineProviderSpec {
    /// Workspace fields, empty when the spec has no workspace
    pub fn workspace_or_default(&self) -> Workspace {
        self.workspace.clone().unwrap_or_default()
    }

    /// Name of the first network device, if any
    pub fn primary_network(&self) -> Option<&str> {
        self.network
            .devices
            .first()
            .map(|d| d.network_name.as_str())
            .filter(|n| !n.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names_match_api() {
        let spec = VSphereMachineProviderSpec {
            num_cpus: 4,
            num_cores_per_socket: 2,
            memory_mib: 16384,
            disk_gib: 120,
            tag_ids: vec!["urn:tag".into()],
            clone_mode: Some(CloneMode::LinkedClone),
            ..Default::default()
        };

        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["numCPUs"], 4);
        assert_eq!(value["numCoresPerSocket"], 2);
        assert_eq!(value["memoryMiB"], 16384);
        assert_eq!(value["diskGiB"], 120);
        assert_eq!(value["tagIDs"][0], "urn:tag");
        assert_eq!(value["cloneMode"], "linkedClone");
        assert!(value.get("template").is_none());
        assert!(value.get("workspace").is_none());
    }

    #[test]
    fn test_null_lists_decode_as_empty() {
        let device: NetworkDeviceSpec = serde_json::from_value(serde_json::json!({
            "networkName": "vm-network",
            "ipAddrs": null,
            "nameservers": null,
            "addressesFromPools": null
        }))
        .unwrap();
        assert_eq!(device, NetworkDeviceSpec {
            network_name: "vm-network".into(),
            ..Default::default()
        });

        let network: NetworkSpec = serde_json::from_value(serde_json::json!({"devices": null})).unwrap();
        assert!(network.devices.is_empty());
    }

    #[test]
    fn test_primary_network() {
        let mut spec = VSphereMachineProviderSpec::default();
        assert_eq!(spec.primary_network(), None);

        spec.network = NetworkSpec::single("vm-network");
        assert_eq!(spec.primary_network(), Some("vm-network"));
    }

    #[test]
    fn test_workspace_or_default() {
        let mut spec = VSphereMachineProviderSpec::default();
        assert_eq!(spec.workspace_or_default(), Workspace::default());

        spec.workspace = Some(Workspace {
            datacenter: "dc1".into(),
            ..Default::default()
        });
        assert_eq!(spec.workspace_or_default().datacenter, "dc1");
    }
}
