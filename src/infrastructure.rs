//! Infrastructure Sources
//!
//! The provider config core works on an Infrastructure snapshot it is handed.
//! These adapters fetch that snapshot, either from the cluster or from a file.

use crate::crd::{Infrastructure, INFRASTRUCTURE_NAME};
use crate::error::Result;
use async_trait::async_trait;
use kube::{Api, Client};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Source of the cluster Infrastructure snapshot
#[async_trait]
pub trait InfrastructureSource: Send + Sync {
    /// Fetch the current Infrastructure
    async fn infrastructure(&self) -> Result<Infrastructure>;
}

// =============================================================================
// Cluster
// =============================================================================

/// Reads the `cluster` Infrastructure singleton from the Kubernetes API
pub struct ClusterInfrastructure {
    client: Client,
}

impl ClusterInfrastructure {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using the ambient kubeconfig or in-cluster config
    pub async fn try_default() -> Result<Self> {
        Ok(Self::new(Client::try_default().await?))
    }
}

#[async_trait]
impl InfrastructureSource for ClusterInfrastructure {
    async fn infrastructure(&self) -> Result<Infrastructure> {
        let api: Api<Infrastructure> = Api::all(self.client.clone());
        let infrastructure = api.get(INFRASTRUCTURE_NAME).await?;

        info!(
            platform = %infrastructure.platform_type(),
            failure_domains = infrastructure.vsphere_failure_domains().len(),
            "fetched cluster infrastructure"
        );
        Ok(infrastructure)
    }
}

// =============================================================================
// File
// =============================================================================

/// Reads an Infrastructure manifest (YAML or JSON) from disk
#[derive(Debug, Clone)]
pub struct FileInfrastructure {
    path: PathBuf,
}

impl FileInfrastructure {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl InfrastructureSource for FileInfrastructure {
    async fn infrastructure(&self) -> Result<Infrastructure> {
        debug!(path = %self.path.display(), "reading infrastructure manifest");
        let contents = tokio::fs::read_to_string(&self.path).await?;

        // YAML is a superset of JSON, one parser covers both
        Ok(serde_yaml::from_str(&contents)?)
    }
}
