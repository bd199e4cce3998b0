use std::collections::HashMap;

use serde::{Deserialize, Serialize};

pub const SYSTEM_TAG: &str = "org:system";

pub const UNKNOWN: &str = "UNKNOWN";

pub const NO_VALUE: &str = "NO_VALUE";

/// AWS resource tag.
///
/// Organizations, S3 and EC2 spell the fields `Key`/`Value` while ECS uses
/// `key`/`value`; both are accepted.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Tag {
    #[serde(rename = "Key", alias = "key", default)]
    pub key: String,

    #[serde(rename = "Value", alias = "value", default)]
    pub value: Option<String>,
}

impl Tag {
    pub fn new<K: Into<String>, V: Into<String>>(key: K, value: V) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }
}

pub fn tag_map(tags: &[Tag]) -> HashMap<&str, &str> {
    tags.iter()
        .map(|t| (t.key.as_str(), t.value.as_deref().unwrap_or(NO_VALUE)))
        .collect()
}

/// Value of the `org:system` tag, `UNKNOWN` when the resource is untagged.
pub fn system_from_tags(tags: &[Tag]) -> String {
    tag_map(tags)
        .get(SYSTEM_TAG)
        .map_or_else(|| UNKNOWN.to_string(), |s| s.to_string())
}

/// Member account of the organization, as returned by `organizations:ListAccounts`
/// with its tags attached.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AccountDescriptor {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub arn: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl AccountDescriptor {
    pub fn id(&self) -> &str {
        self.id.as_deref().unwrap_or_default()
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct S3BucketDescriptor {
    pub account_id: String,
    pub region: String,
    pub bucket_name: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

/// Bucket entry from `s3:ListBuckets`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BucketSummary {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,
}

/// Cluster from `ecs:DescribeClusters`. Fields other than the ones mapped into
/// the catalog are ignored.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EcsCluster {
    #[serde(default)]
    pub cluster_arn: Option<String>,
    #[serde(default)]
    pub cluster_name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct EcsClusterDescriptor {
    pub cluster: EcsCluster,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl EcsClusterDescriptor {
    pub fn arn(&self) -> &str {
        self.cluster.cluster_arn.as_deref().unwrap_or_default()
    }

    pub fn cluster_name(&self) -> &str {
        self.cluster.cluster_name.as_deref().unwrap_or_default()
    }

    /// `(region, account_id)` from `arn:aws:ecs:{region}:{account}:cluster/{name}`.
    /// Both are empty when the ARN is missing or malformed.
    pub fn region_and_account(&self) -> (&str, &str) {
        let parts: Vec<&str> = self.arn().split(':').collect();
        if parts.len() < 5 {
            return ("", "");
        }

        (parts[3], parts[4])
    }
}

/// VPC from `ec2:DescribeVpcs`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Vpc {
    #[serde(default)]
    pub vpc_id: Option<String>,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub cidr_block: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct VpcDescriptor {
    pub account_id: String,
    pub region: String,
    pub vpc: Vpc,
}

impl VpcDescriptor {
    pub fn vpc_id(&self) -> &str {
        self.vpc.vpc_id.as_deref().unwrap_or_default()
    }
}

/// A raw resource handed over by a lister, ready to be mapped into a catalog entity.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "resource_type", rename_all = "snake_case")]
pub enum ResourceDescriptor {
    Account(AccountDescriptor),
    S3Bucket(S3BucketDescriptor),
    EcsCluster(EcsClusterDescriptor),
    Vpc(VpcDescriptor),
}

impl ResourceDescriptor {
    pub fn tags(&self) -> &[Tag] {
        match self {
            ResourceDescriptor::Account(a) => &a.tags,
            ResourceDescriptor::S3Bucket(b) => &b.tags,
            ResourceDescriptor::EcsCluster(c) => &c.tags,
            ResourceDescriptor::Vpc(v) => &v.vpc.tags,
        }
    }

    pub fn system_tag(&self) -> String {
        system_from_tags(self.tags())
    }
}

impl From<AccountDescriptor> for ResourceDescriptor {
    fn from(value: AccountDescriptor) -> Self {
        ResourceDescriptor::Account(value)
    }
}

impl From<S3BucketDescriptor> for ResourceDescriptor {
    fn from(value: S3BucketDescriptor) -> Self {
        ResourceDescriptor::S3Bucket(value)
    }
}

impl From<EcsClusterDescriptor> for ResourceDescriptor {
    fn from(value: EcsClusterDescriptor) -> Self {
        ResourceDescriptor::EcsCluster(value)
    }
}

impl From<VpcDescriptor> for ResourceDescriptor {
    fn from(value: VpcDescriptor) -> Self {
        ResourceDescriptor::Vpc(value)
    }
}
