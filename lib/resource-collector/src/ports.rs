//! Collaborators that reach outside the catalog: resource discovery inside
//! member accounts and delivery of built entities to downstream queues.

use software_catalog::{BucketSummary, EcsClusterDescriptor, Entity, Tag, VpcDescriptor};

use crate::errors::BoxError;

/// Role assumed in a member account to read its resources.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CrossAccountRole {
    pub role_name: String,
}

impl CrossAccountRole {
    pub fn new<S: Into<String>>(role_name: S) -> Self {
        Self {
            role_name: role_name.into(),
        }
    }

    pub fn role_arn(&self, account_id: &str) -> String {
        format!("arn:aws:iam::{}:role/{}", account_id, self.role_name)
    }
}

/// Read-only view of resources in a member account.
///
/// Implementations act through the [`CrossAccountRole`] of the account.
pub trait ResourceLister {
    /// Tags of `bucket`. An untagged bucket has no tags rather than an error.
    fn bucket_tags(&self, account_id: &str, region: &str, bucket: &str)
        -> Result<Vec<Tag>, BoxError>;

    fn ecs_clusters(&self, account_id: &str) -> Result<Vec<EcsClusterDescriptor>, BoxError>;

    fn vpcs(&self, account_id: &str) -> Result<Vec<VpcDescriptor>, BoxError>;

    fn s3_buckets(&self, account_id: &str) -> Result<Vec<BucketSummary>, BoxError>;
}

/// Downstream delivery of discovery results.
pub trait EntityPublisher {
    /// Queue `entity` for the catalog writer.
    fn publish_entity(&self, entity: &Entity) -> Result<(), BoxError>;

    /// Announce the buckets of `account_id`, one bus event per bucket.
    fn publish_buckets(&self, account_id: &str, buckets: &[BucketSummary])
        -> Result<(), BoxError>;
}

impl<T: ResourceLister + ?Sized> ResourceLister for &T {
    fn bucket_tags(
        &self,
        account_id: &str,
        region: &str,
        bucket: &str,
    ) -> Result<Vec<Tag>, BoxError> {
        (**self).bucket_tags(account_id, region, bucket)
    }

    fn ecs_clusters(&self, account_id: &str) -> Result<Vec<EcsClusterDescriptor>, BoxError> {
        (**self).ecs_clusters(account_id)
    }

    fn vpcs(&self, account_id: &str) -> Result<Vec<VpcDescriptor>, BoxError> {
        (**self).vpcs(account_id)
    }

    fn s3_buckets(&self, account_id: &str) -> Result<Vec<BucketSummary>, BoxError> {
        (**self).s3_buckets(account_id)
    }
}

impl<T: EntityPublisher + ?Sized> EntityPublisher for &T {
    fn publish_entity(&self, entity: &Entity) -> Result<(), BoxError> {
        (**self).publish_entity(entity)
    }

    fn publish_buckets(
        &self,
        account_id: &str,
        buckets: &[BucketSummary],
    ) -> Result<(), BoxError> {
        (**self).publish_buckets(account_id, buckets)
    }
}
