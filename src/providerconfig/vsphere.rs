//! vSphere Provider Config
//!
//! Wraps a decoded `VSphereMachineProviderSpec` together with the cluster
//! Infrastructure it is placed against. Failure domains are matched
//! structurally: the spec itself never records a failure domain name.

use super::decode;
use super::policy::{PlacementPolicy, TemplateSynthesis};
use super::FailureDomainPlacement;
use crate::crd::{
    Infrastructure, NetworkDeviceSpec, NetworkSpec, VSphereFailureDomain,
    VSphereMachineProviderSpec, VSpherePlatformFailureDomainSpec,
};
use crate::error::Result;
use tracing::{debug, trace};

/// Provider spec of a vSphere machine bound to its cluster Infrastructure
#[derive(Debug, Clone)]
pub struct VSphereProviderConfig<'a> {
    provider_config: VSphereMachineProviderSpec,
    infrastructure: &'a Infrastructure,
    policy: PlacementPolicy,
}

impl<'a> VSphereProviderConfig<'a> {
    /// Wrap an already decoded spec
    pub fn new(
        provider_config: VSphereMachineProviderSpec,
        infrastructure: &'a Infrastructure,
        policy: PlacementPolicy,
    ) -> Self {
        Self {
            provider_config,
            infrastructure,
            policy,
        }
    }

    /// Decode a raw vSphere provider spec.
    ///
    /// Only the network name, address pools and nameservers of each network
    /// device are kept; static addressing is dropped.
    pub fn from_raw(
        raw: &[u8],
        infrastructure: &'a Infrastructure,
        policy: PlacementPolicy,
    ) -> Result<Self> {
        let mut spec: VSphereMachineProviderSpec = decode::decode(raw)?;

        debug!(network = ?spec.network, "provider network");
        for device in spec.network.devices.iter_mut() {
            *device = NetworkDeviceSpec {
                network_name: std::mem::take(&mut device.network_name),
                nameservers: std::mem::take(&mut device.nameservers),
                addresses_from_pools: std::mem::take(&mut device.addresses_from_pools),
                ..Default::default()
            };
        }

        Ok(Self::new(spec, infrastructure, policy))
    }

    /// The stored provider spec
    pub fn config(&self) -> &VSphereMachineProviderSpec {
        &self.provider_config
    }

    /// Infrastructure the config is placed against
    pub fn infrastructure(&self) -> &'a Infrastructure {
        self.infrastructure
    }

    /// Policy applied on injection
    pub fn policy(&self) -> PlacementPolicy {
        self.policy
    }

    /// Clear template, workspace and network.
    ///
    /// A spec written for a single zone has no defined meaning for these
    /// fields once several failure domains exist.
    pub(crate) fn clear_placement(mut self) -> Self {
        self.provider_config.template = String::new();
        self.provider_config.workspace = Some(Default::default());
        self.provider_config.network = NetworkSpec::default();
        self
    }

    /// Overwrite placement fields from a single failure domain definition
    fn apply(&mut self, failure_domain: &VSpherePlatformFailureDomainSpec) {
        let infrastructure = self.infrastructure;
        let infrastructure_name = infrastructure.infrastructure_name();
        let failure_domain_count = infrastructure.vsphere_failure_domains().len();
        let policy = self.policy;
        let topology = &failure_domain.topology;
        let spec = &mut self.provider_config;
        let workspace = spec.workspace.get_or_insert_with(Default::default);

        // Explicit resource pool beats the compute cluster default
        if !topology.compute_cluster.is_empty() {
            workspace.resource_pool = format!("{}/resources", topology.compute_cluster);
        }
        if !topology.resource_pool.is_empty() {
            workspace.resource_pool = topology.resource_pool.clone();
        }

        if !topology.datacenter.is_empty() {
            workspace.datacenter = topology.datacenter.clone();
        }
        if !topology.datastore.is_empty() {
            workspace.datastore = topology.datastore.clone();
        }
        if !failure_domain.server.is_empty() {
            workspace.server = failure_domain.server.clone();
        }

        if let Some(network) = topology.networks.first() {
            spec.network = NetworkSpec::single(network.as_str());
        }

        if !topology.template.is_empty() {
            spec.template = policy.template.resolve(&topology.template).to_string();
        } else if policy.template_synthesis.applies(failure_domain_count) {
            spec.template = TemplateSynthesis::template_name(
                infrastructure_name,
                &failure_domain.region,
                &failure_domain.zone,
            );
        }

        workspace.folder = if !topology.folder.is_empty() {
            topology.folder.clone()
        } else {
            policy.folder.synthesize(&workspace.datacenter, infrastructure_name)
        };
    }
}

impl<'a> FailureDomainPlacement for VSphereProviderConfig<'a> {
    type FailureDomain = VSphereFailureDomain;

    /// Every definition with a matching name is applied in order, so with
    /// duplicate names the last one wins. An unknown name changes nothing.
    fn inject_failure_domain(&self, failure_domain: &VSphereFailureDomain) -> Self {
        let mut injected = self.clone();
        let mut matched = false;

        for definition in self.infrastructure.vsphere_failure_domains() {
            if definition.name == failure_domain.name {
                injected.apply(definition);
                matched = true;
            }
        }

        if matched {
            debug!(failure_domain = %failure_domain.name, "injected failure domain");
        } else {
            trace!(failure_domain = %failure_domain.name, "no such failure domain, config unchanged");
        }

        injected
    }

    /// First failure domain whose datacenter, datastore, server and resource
    /// pool all equal the workspace, or an empty identity.
    fn extract_failure_domain(&self) -> VSphereFailureDomain {
        let workspace = self.provider_config.workspace_or_default();

        // An unplaced spec belongs to no failure domain, even one whose
        // matched fields are all unset
        if workspace.datacenter.is_empty()
            && workspace.datastore.is_empty()
            && workspace.server.is_empty()
            && workspace.resource_pool.is_empty()
        {
            return VSphereFailureDomain::default();
        }

        self.infrastructure
            .vsphere_failure_domains()
            .iter()
            .find(|fd| {
                workspace.datacenter == fd.topology.datacenter
                    && workspace.datastore == fd.topology.datastore
                    && workspace.server == fd.server
                    && workspace.resource_pool == fd.topology.resource_pool
            })
            .map(|fd| VSphereFailureDomain::new(&fd.name))
            .unwrap_or_default()
    }
}

impl<'a> PartialEq for VSphereProviderConfig<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.provider_config == other.provider_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{
        InfrastructureSpec, InfrastructureStatus, PlatformSpec, PlatformStatus, PlatformType,
        VSpherePlatformSpec, VSpherePlatformTopology, Workspace,
    };
    use crate::providerconfig::policy::{FolderPolicy, TemplatePolicy};

    fn failure_domain(name: &str, zone: &str) -> VSpherePlatformFailureDomainSpec {
        VSpherePlatformFailureDomainSpec {
            name: name.into(),
            region: "us-east".into(),
            zone: zone.into(),
            server: "vcenter.example.com".into(),
            topology: VSpherePlatformTopology {
                datacenter: "dc1".into(),
                compute_cluster: format!("/dc1/host/{}", zone),
                networks: vec![format!("{}-network", zone), "unused-network".into()],
                datastore: format!("/dc1/datastore/{}", zone),
                ..Default::default()
            },
        }
    }

    fn infrastructure(failure_domains: Vec<VSpherePlatformFailureDomainSpec>) -> Infrastructure {
        Infrastructure::new_cluster(
            InfrastructureSpec {
                platform_spec: PlatformSpec {
                    platform_type: Some(PlatformType::VSphere),
                    vsphere: Some(VSpherePlatformSpec { failure_domains }),
                },
            },
            InfrastructureStatus {
                infrastructure_name: "test-abc12".into(),
                platform_status: Some(PlatformStatus {
                    platform_type: PlatformType::VSphere,
                }),
            },
        )
    }

    fn empty_config(infra: &Infrastructure) -> VSphereProviderConfig<'_> {
        VSphereProviderConfig::new(
            VSphereMachineProviderSpec::default(),
            infra,
            PlacementPolicy::default(),
        )
    }

    #[test]
    fn test_inject_derives_resource_pool_from_compute_cluster() {
        let infra = infrastructure(vec![failure_domain("a", "zone-a"), failure_domain("b", "zone-b")]);
        let config = empty_config(&infra);

        let injected = config.inject_failure_domain(&VSphereFailureDomain::new("b"));
        let workspace = injected.config().workspace.clone().unwrap();

        assert_eq!(workspace.resource_pool, "/dc1/host/zone-b/resources");
        assert_eq!(workspace.datacenter, "dc1");
        assert_eq!(workspace.datastore, "/dc1/datastore/zone-b");
        assert_eq!(workspace.server, "vcenter.example.com");
        assert_eq!(workspace.folder, "/dc1/vm/test-abc12");
        assert_eq!(injected.config().network, NetworkSpec::single("zone-b-network"));
        assert_eq!(injected.config().template, "test-abc12-rhcos-us-east-zone-b");
    }

    #[test]
    fn test_explicit_resource_pool_wins() {
        let mut fd = failure_domain("a", "zone-a");
        fd.topology.compute_cluster = "C".into();
        fd.topology.resource_pool = "P".into();
        let infra = infrastructure(vec![fd]);

        let injected = empty_config(&infra).inject_failure_domain(&VSphereFailureDomain::new("a"));
        assert_eq!(injected.config().workspace.as_ref().unwrap().resource_pool, "P");
    }

    #[test]
    fn test_empty_topology_fields_do_not_erase() {
        let mut fd = failure_domain("a", "zone-a");
        fd.server = String::new();
        fd.topology = VSpherePlatformTopology::default();
        let infra = infrastructure(vec![fd]);

        let mut spec = VSphereMachineProviderSpec::default();
        spec.workspace = Some(Workspace {
            server: "old-vcenter".into(),
            datacenter: "old-dc".into(),
            datastore: "old-ds".into(),
            resource_pool: "old-pool".into(),
            folder: "old-folder".into(),
        });
        spec.network = NetworkSpec::single("old-network");
        spec.template = "old-template".into();
        let config = VSphereProviderConfig::new(spec, &infra, PlacementPolicy::default());

        let injected = config.inject_failure_domain(&VSphereFailureDomain::new("a"));
        let workspace = injected.config().workspace.clone().unwrap();

        assert_eq!(workspace.server, "old-vcenter");
        assert_eq!(workspace.datacenter, "old-dc");
        assert_eq!(workspace.datastore, "old-ds");
        assert_eq!(workspace.resource_pool, "old-pool");
        // Folder is always resolved, from the surviving datacenter
        assert_eq!(workspace.folder, "/old-dc/vm/test-abc12");
        assert_eq!(injected.config().network, NetworkSpec::single("old-network"));
        // Single failure domain, nothing to synthesize
        assert_eq!(injected.config().template, "old-template");
    }

    #[test]
    fn test_template_policies() {
        let mut fd = failure_domain("a", "zone-a");
        fd.topology.template = "/dc1/vm/templates/rhcos-415".into();
        let infra = infrastructure(vec![fd]);
        let target = VSphereFailureDomain::new("a");

        let injected = empty_config(&infra).inject_failure_domain(&target);
        assert_eq!(injected.config().template, "rhcos-415");

        let verbatim = VSphereProviderConfig::new(
            VSphereMachineProviderSpec::default(),
            &infra,
            PlacementPolicy {
                template: TemplatePolicy::Verbatim,
                ..Default::default()
            },
        );
        let injected = verbatim.inject_failure_domain(&target);
        assert_eq!(injected.config().template, "/dc1/vm/templates/rhcos-415");
    }

    #[test]
    fn test_single_zone_template_synthesis_follows_policy() {
        let infra = infrastructure(vec![failure_domain("a", "zone-a")]);
        let target = VSphereFailureDomain::new("a");

        let injected = empty_config(&infra).inject_failure_domain(&target);
        assert!(injected.config().template.is_empty());

        let always = VSphereProviderConfig::new(
            VSphereMachineProviderSpec::default(),
            &infra,
            PlacementPolicy {
                template_synthesis: TemplateSynthesis::Always,
                ..Default::default()
            },
        );
        let injected = always.inject_failure_domain(&target);
        assert_eq!(injected.config().template, "test-abc12-rhcos-us-east-zone-a");
    }

    #[test]
    fn test_folder_policies() {
        let mut with_folder = failure_domain("a", "zone-a");
        with_folder.topology.folder = "/dc1/vm/custom".into();
        let infra = infrastructure(vec![with_folder, failure_domain("b", "zone-b")]);

        let injected = empty_config(&infra).inject_failure_domain(&VSphereFailureDomain::new("a"));
        assert_eq!(injected.config().workspace.as_ref().unwrap().folder, "/dc1/vm/custom");

        let datacenter_vm = VSphereProviderConfig::new(
            VSphereMachineProviderSpec::default(),
            &infra,
            PlacementPolicy {
                folder: FolderPolicy::DatacenterVm,
                ..Default::default()
            },
        );
        let injected = datacenter_vm.inject_failure_domain(&VSphereFailureDomain::new("b"));
        assert_eq!(injected.config().workspace.as_ref().unwrap().folder, "/dc1/vm/");
    }

    #[test]
    fn test_inject_does_not_mutate_input() {
        let infra = infrastructure(vec![failure_domain("a", "zone-a"), failure_domain("b", "zone-b")]);
        let config = empty_config(&infra);
        let before = config.config().clone();

        let injected = config.inject_failure_domain(&VSphereFailureDomain::new("a"));

        assert_eq!(config.config(), &before);
        assert_ne!(injected, config);
    }

    #[test]
    fn test_inject_is_idempotent() {
        let infra = infrastructure(vec![failure_domain("a", "zone-a"), failure_domain("b", "zone-b")]);
        let target = VSphereFailureDomain::new("b");

        let once = empty_config(&infra).inject_failure_domain(&target);
        let twice = once.inject_failure_domain(&target);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_inject_unknown_name_is_noop() {
        let infra = infrastructure(vec![failure_domain("a", "zone-a")]);
        let config = empty_config(&infra);

        let injected = config.inject_failure_domain(&VSphereFailureDomain::new("missing"));
        assert_eq!(injected, config);
        assert!(injected.config().workspace.is_none());
    }

    #[test]
    fn test_duplicate_names_last_definition_wins() {
        let first = failure_domain("dup", "zone-a");
        let mut second = failure_domain("dup", "zone-b");
        second.topology.networks.clear();
        let infra = infrastructure(vec![first, second]);

        let injected = empty_config(&infra).inject_failure_domain(&VSphereFailureDomain::new("dup"));
        let workspace = injected.config().workspace.clone().unwrap();

        assert_eq!(workspace.datastore, "/dc1/datastore/zone-b");
        // The second definition has no networks, so the first one's survives
        assert_eq!(injected.config().network, NetworkSpec::single("zone-a-network"));
    }

    #[test]
    fn test_inject_then_extract_round_trip() {
        let mut fd = failure_domain("fd", "zone-a");
        fd.topology.resource_pool = "/dc1/host/zone-a/Resources/pool".into();
        let infra = infrastructure(vec![fd]);

        let injected = empty_config(&infra).inject_failure_domain(&VSphereFailureDomain::new("fd"));
        assert_eq!(injected.extract_failure_domain(), VSphereFailureDomain::new("fd"));
    }

    #[test]
    fn test_extract_first_match_in_order() {
        let mut a = failure_domain("a", "zone-a");
        a.topology.resource_pool = "pool".into();
        let mut b = a.clone();
        b.name = "b".into();
        let infra = infrastructure(vec![a, b]);

        let mut spec = VSphereMachineProviderSpec::default();
        spec.workspace = Some(Workspace {
            server: "vcenter.example.com".into(),
            datacenter: "dc1".into(),
            datastore: "/dc1/datastore/zone-a".into(),
            resource_pool: "pool".into(),
            folder: "irrelevant".into(),
        });
        let config = VSphereProviderConfig::new(spec, &infra, PlacementPolicy::default());

        assert_eq!(config.extract_failure_domain().name, "a");
    }

    #[test]
    fn test_extract_requires_all_four_fields() {
        let mut fd = failure_domain("a", "zone-a");
        fd.topology.resource_pool = "pool".into();
        let infra = infrastructure(vec![fd]);

        let mut spec = VSphereMachineProviderSpec::default();
        spec.workspace = Some(Workspace {
            server: "other-vcenter".into(),
            datacenter: "dc1".into(),
            datastore: "/dc1/datastore/zone-a".into(),
            resource_pool: "pool".into(),
            folder: String::new(),
        });
        let config = VSphereProviderConfig::new(spec, &infra, PlacementPolicy::default());

        assert_eq!(config.extract_failure_domain(), VSphereFailureDomain::default());
    }

    #[test]
    fn test_extract_from_empty_workspace() {
        let infra = infrastructure(vec![failure_domain("a", "zone-a"), failure_domain("b", "zone-b")]);
        let config = empty_config(&infra);

        assert!(config.extract_failure_domain().name.is_empty());
    }

    #[test]
    fn test_extract_never_matches_unset_workspace() {
        let cluster_only = |name: &str| VSpherePlatformFailureDomainSpec {
            name: name.into(),
            topology: VSpherePlatformTopology {
                compute_cluster: format!("/dc1/host/{}", name),
                ..Default::default()
            },
            ..Default::default()
        };
        let infra = infrastructure(vec![cluster_only("a"), cluster_only("b")]);
        let raw = br#"{"kind":"VSphereMachineProviderSpec"}"#;

        let config = VSphereProviderConfig::from_raw(raw, &infra, PlacementPolicy::default()).unwrap();
        assert_eq!(config.extract_failure_domain(), VSphereFailureDomain::default());
        assert_eq!(empty_config(&infra).extract_failure_domain(), VSphereFailureDomain::default());
    }

    #[test]
    fn test_from_raw_strips_static_addressing() {
        let infra = infrastructure(vec![failure_domain("a", "zone-a")]);
        let raw = serde_json::to_vec(&serde_json::json!({
            "kind": "VSphereMachineProviderSpec",
            "network": {
                "devices": [{
                    "networkName": "vm-network",
                    "gateway": "10.0.0.1",
                    "ipAddrs": ["10.0.0.10/24"],
                    "nameservers": ["10.0.0.2"]
                }]
            }
        }))
        .unwrap();

        let config = VSphereProviderConfig::from_raw(&raw, &infra, PlacementPolicy::default()).unwrap();
        let device = &config.config().network.devices[0];

        assert_eq!(device.network_name, "vm-network");
        assert_eq!(device.nameservers, vec!["10.0.0.2"]);
        assert!(device.gateway.is_empty());
        assert!(device.ip_addrs.is_empty());
    }
}
