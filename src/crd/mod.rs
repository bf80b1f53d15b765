//! API types read and written by the provider config core
//!
//! This module contains:
//! - Infrastructure: the cluster topology descriptor (CRD)
//! - VSphereMachineProviderSpec: the vSphere machine provider payload
//! - FailureDomain: platform tagged failure domain identities

pub mod infrastructure;
pub mod machine;
pub mod failure_domain;

pub use infrastructure::*;
pub use machine::*;
pub use failure_domain::*;
