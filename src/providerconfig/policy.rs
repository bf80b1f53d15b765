//! Placement Policies
//!
//! Template and folder resolution have changed between releases of the
//! installer and machine API. Each rule that has more than one accepted form
//! is a knob here so callers can pick the behaviour their cluster expects.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

// =============================================================================
// Template Policy
// =============================================================================

/// How an explicit topology template is written into the provider spec
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum TemplatePolicy {
    /// Keep only the component after the last `/`
    #[default]
    BaseName,
    /// Use the topology value as given
    Verbatim,
}

impl TemplatePolicy {
    /// Resolve a non-empty topology template
    pub fn resolve<'t>(&self, template: &'t str) -> &'t str {
        match self {
            TemplatePolicy::BaseName => template.rsplit('/').next().unwrap_or(template),
            TemplatePolicy::Verbatim => template,
        }
    }
}

// =============================================================================
// Template Synthesis
// =============================================================================

/// When a template is synthesized for a failure domain without one
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum TemplateSynthesis {
    /// Only when more than one failure domain is defined
    #[default]
    MultiZoneOnly,
    /// Whenever the topology has no template
    Always,
}

impl TemplateSynthesis {
    /// Check whether a template should be synthesized
    pub fn applies(&self, failure_domain_count: usize) -> bool {
        match self {
            TemplateSynthesis::MultiZoneOnly => failure_domain_count > 1,
            TemplateSynthesis::Always => true,
        }
    }

    /// Template name for a failure domain: `<infra>-rhcos-<region>-<zone>`
    pub fn template_name(infrastructure_name: &str, region: &str, zone: &str) -> String {
        format!("{}-rhcos-{}-{}", infrastructure_name, region, zone)
    }
}

// =============================================================================
// Folder Policy
// =============================================================================

/// How a folder is synthesized when the topology has none
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "camelCase")]
pub enum FolderPolicy {
    /// `/<datacenter>/vm/<infrastructureName>`
    #[default]
    ClusterScoped,
    /// `/<datacenter>/vm/`
    DatacenterVm,
}

impl FolderPolicy {
    /// Synthesize a folder path
    pub fn synthesize(&self, datacenter: &str, infrastructure_name: &str) -> String {
        match self {
            FolderPolicy::ClusterScoped => format!("/{}/vm/{}", datacenter, infrastructure_name),
            FolderPolicy::DatacenterVm => format!("/{}/vm/", datacenter),
        }
    }
}

// =============================================================================
// Placement Policy
// =============================================================================

/// Complete placement policy applied during failure domain injection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlacementPolicy {
    pub template: TemplatePolicy,
    pub template_synthesis: TemplateSynthesis,
    pub folder: FolderPolicy,
}

impl PlacementPolicy {
    /// Load a policy from YAML; missing knobs keep their defaults
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }
}
