//! Provider Config Factory
//!
//! Single dispatch point from a platform to its decoder and config variant.

use super::decode;
use super::policy::PlacementPolicy;
use super::vsphere::VSphereProviderConfig;
use super::ProviderConfig;
use crate::crd::{Infrastructure, PlatformType};
use crate::error::{Error, Result};
use tracing::debug;

/// Factory for creating provider configs from raw provider specs
#[derive(Debug, Clone, Copy, Default)]
pub struct ProviderConfigFactory {
    policy: PlacementPolicy,
}

impl ProviderConfigFactory {
    /// Create a factory whose configs inject with `policy`
    pub fn new(policy: PlacementPolicy) -> Self {
        Self { policy }
    }

    /// Build a provider config for the platform the Infrastructure declares
    pub fn build<'a>(
        &self,
        raw: &[u8],
        infrastructure: &'a Infrastructure,
    ) -> Result<ProviderConfig<'a>> {
        self.build_for_platform(infrastructure.platform_type(), raw, infrastructure)
    }

    /// Build a provider config for the platform named by the payload's `kind`
    pub fn build_from_kind<'a>(
        &self,
        raw: &[u8],
        infrastructure: &'a Infrastructure,
    ) -> Result<ProviderConfig<'a>> {
        let kind = decode::kind_of(raw)?;
        let platform = decode::platform_type_from_kind(&kind)
            .ok_or_else(|| Error::UnsupportedPlatform {
                platform: if kind.is_empty() { "<no kind>".to_string() } else { kind },
            })?;

        self.build_for_platform(platform, raw, infrastructure)
    }

    /// Build a provider config for an explicit platform
    pub fn build_for_platform<'a>(
        &self,
        platform: PlatformType,
        raw: &[u8],
        infrastructure: &'a Infrastructure,
    ) -> Result<ProviderConfig<'a>> {
        match platform {
            PlatformType::VSphere => {
                let mut config = VSphereProviderConfig::from_raw(raw, infrastructure, self.policy)?;

                let failure_domains = infrastructure.vsphere_failure_domains().len();
                if failure_domains > 1 {
                    debug!(
                        failure_domains,
                        "multiple failure domains defined, clearing template, workspace and network"
                    );
                    config = config.clear_placement();
                }

                Ok(ProviderConfig::VSphere(config))
            }
            other => Err(Error::UnsupportedPlatform {
                platform: other.to_string(),
            }),
        }
    }
}

/// Build a provider config with the default placement policy
pub fn new_provider_config<'a>(
    raw: &[u8],
    infrastructure: &'a Infrastructure,
) -> Result<ProviderConfig<'a>> {
    ProviderConfigFactory::default().build(raw, infrastructure)
}
