//! Control Plane Machine Config
//!
//! Normalizes per-platform machine provider specs for control plane nodes
//! and reconciles them against the cluster's failure domains.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                        Reconciliation (external)                             │
//! ├─────────────────────────────────────────────────────────────────────────────┤
//! │  raw provider spec ──┐                          ┌── Infrastructure snapshot │
//! │                      ▼                          ▼                           │
//! │            ┌───────────────────────────────────────────┐                    │
//! │            │         Provider Config Factory           │                    │
//! │            │  platform dispatch + ambiguity clearing   │                    │
//! │            └─────────────────────┬─────────────────────┘                    │
//! │                                  │                                          │
//! │            ┌─────────────────────┴─────────────────────┐                    │
//! │            │   Raw Spec Decoder (strict, schemars)     │                    │
//! │            └─────────────────────┬─────────────────────┘                    │
//! │                                  ▼                                          │
//! │            ┌───────────────────────────────────────────┐                    │
//! │            │     ProviderConfig::VSphere(..)           │                    │
//! │            │  inject_failure_domain ─► new config      │                    │
//! │            │  extract_failure_domain ─► identity       │                    │
//! │            └───────────────────────────────────────────┘                    │
//! └─────────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`providerconfig`]: Provider configs, decoding, factory and placement policy
//! - [`crd`]: Infrastructure CRD, machine provider spec and failure domain types
//! - [`infrastructure`]: Sources of the Infrastructure snapshot
//! - [`error`]: Error types and handling

pub mod crd;
pub mod error;
pub mod infrastructure;
pub mod providerconfig;

// Re-export commonly used types
pub use crd::{
    FailureDomain, Infrastructure, InfrastructureSpec, InfrastructureStatus, PlatformType,
    VSphereFailureDomain, VSphereMachineProviderSpec, VSpherePlatformFailureDomainSpec,
    VSpherePlatformTopology, Workspace,
};

pub use error::{Error, ErrorAction, Result};

pub use infrastructure::{ClusterInfrastructure, FileInfrastructure, InfrastructureSource};

pub use providerconfig::{
    new_provider_config, FailureDomainPlacement, FolderPolicy, PlacementPolicy, ProviderConfig,
    ProviderConfigFactory, TemplatePolicy, TemplateSynthesis, VSphereProviderConfig,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
