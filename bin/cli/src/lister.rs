use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use resource_collector::{BoxError, CrossAccountRole, ResourceLister};
use serde::Deserialize;
use software_catalog::{BucketSummary, EcsClusterDescriptor, Tag, VpcDescriptor};
use tracing::debug;

/// Resources of one member account as captured by an earlier discovery run.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AccountSnapshot {
    #[serde(default)]
    pub buckets: Vec<BucketSummary>,
    #[serde(default)]
    pub bucket_tags: HashMap<String, Vec<Tag>>,
    #[serde(default)]
    pub ecs_clusters: Vec<EcsClusterDescriptor>,
    #[serde(default)]
    pub vpcs: Vec<VpcDescriptor>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub accounts: HashMap<String, AccountSnapshot>,
}

/// [`ResourceLister`] backed by a JSON snapshot file.
///
/// An account missing from the snapshot fails the same way a refused role
/// assumption would.
#[derive(Debug)]
pub struct SnapshotLister {
    role: CrossAccountRole,
    snapshot: Snapshot,
}

impl SnapshotLister {
    pub fn new(role: CrossAccountRole, snapshot: Snapshot) -> Self {
        Self { role, snapshot }
    }

    pub fn from_path(role: CrossAccountRole, path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        let snapshot = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;

        Ok(Self::new(role, snapshot))
    }

    fn account(&self, account_id: &str) -> Result<&AccountSnapshot, BoxError> {
        let role_arn = self.role.role_arn(account_id);
        debug!(%role_arn, "Reading account snapshot");

        self.snapshot
            .accounts
            .get(account_id)
            .ok_or_else(|| format!("Unable to assume role {role_arn}: account not in snapshot").into())
    }
}

impl ResourceLister for SnapshotLister {
    fn bucket_tags(&self, account_id: &str, _: &str, bucket: &str) -> Result<Vec<Tag>, BoxError> {
        let account = self.account(account_id)?;
        Ok(account.bucket_tags.get(bucket).cloned().unwrap_or_default())
    }

    fn ecs_clusters(&self, account_id: &str) -> Result<Vec<EcsClusterDescriptor>, BoxError> {
        Ok(self.account(account_id)?.ecs_clusters.clone())
    }

    fn vpcs(&self, account_id: &str) -> Result<Vec<VpcDescriptor>, BoxError> {
        Ok(self.account(account_id)?.vpcs.clone())
    }

    fn s3_buckets(&self, account_id: &str) -> Result<Vec<BucketSummary>, BoxError> {
        Ok(self.account(account_id)?.buckets.clone())
    }
}
