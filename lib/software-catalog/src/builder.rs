use std::collections::BTreeMap;

use crate::entity::{Entity, EntitySpec, Link, Metadata, DEFAULT_NAMESPACE};
use crate::resource::{
    system_from_tags, AccountDescriptor, EcsClusterDescriptor, ResourceDescriptor,
    S3BucketDescriptor, Tag, VpcDescriptor, UNKNOWN,
};

pub const CLOUD_PROVIDER_ANNOTATION: &str = "io.serverlessops/cloud-provider";
pub const ACCOUNT_ID_ANNOTATION: &str = "aws.amazon.com/account-id";
pub const ACCOUNT_EMAIL_ANNOTATION: &str = "aws.amazon.com/account-email";
pub const ARN_ANNOTATION: &str = "aws.amazon.com/arn";
pub const REGION_ANNOTATION: &str = "aws.amazon.com/region";
pub const BUCKET_NAME_ANNOTATION: &str = "aws.amazon.com/bucket-name";
pub const CLUSTER_NAME_ANNOTATION: &str = "aws.amazon.com/cluster-name";
pub const OWNER_ACCOUNT_ID_ANNOTATION: &str = "aws.amazon.com/owner-account-id";
pub const CIDR_BLOCK_ANNOTATION: &str = "aws.amazon.com/cidr-block";

const CLOUD_PROVIDER: &str = "aws";
const AWS_CONSOLE_URL: &str = "https://serverlessops.awsapps.com";

/// Per resource type rules for turning a raw resource into a catalog entity.
///
/// Implementations must be total: missing optional attributes fall back to
/// defaults instead of failing.
pub trait EntityMapping {
    /// Catalog `spec.type`, e.g. `s3-bucket`.
    fn entity_type(&self) -> &'static str;

    fn resource_id(&self) -> String;

    fn tags(&self) -> &[Tag];

    fn description(&self) -> String;

    fn lifecycle(&self) -> String;

    /// Provenance annotations, excluding the cloud provider which every entity carries.
    fn annotations(&self) -> BTreeMap<String, String>;

    fn name(&self) -> String {
        format!("{}-{}", self.entity_type(), self.resource_id())
    }

    fn namespace(&self) -> String {
        DEFAULT_NAMESPACE.to_string()
    }

    fn title(&self) -> String {
        self.resource_id()
    }

    fn system(&self) -> String {
        system_from_tags(self.tags())
    }

    fn links(&self) -> Option<Vec<Link>> {
        None
    }
}

/// Build the catalog entity for `resource` owned by `owner`.
pub fn build<M: EntityMapping + ?Sized>(resource: &M, owner: &str) -> Entity {
    let mut annotations = resource.annotations();
    annotations.insert(
        CLOUD_PROVIDER_ANNOTATION.to_string(),
        CLOUD_PROVIDER.to_string(),
    );

    Entity::new(
        Metadata {
            namespace: resource.namespace(),
            name: resource.name(),
            title: resource.title(),
            description: resource.description(),
            annotations,
            links: resource.links(),
            extra: BTreeMap::new(),
        },
        EntitySpec {
            owner: owner.to_string(),
            system: resource.system(),
            entity_type: resource.entity_type().to_string(),
            lifecycle: resource.lifecycle(),
            extra: BTreeMap::new(),
        },
    )
}

fn annotation_map<const N: usize>(pairs: [(&str, &str); N]) -> BTreeMap<String, String> {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl EntityMapping for AccountDescriptor {
    fn entity_type(&self) -> &'static str {
        "cloud-account"
    }

    fn resource_id(&self) -> String {
        self.id().to_string()
    }

    fn tags(&self) -> &[Tag] {
        &self.tags
    }

    // account entities predate the `{type}-{id}` convention
    fn name(&self) -> String {
        format!("aws-{}", self.id())
    }

    fn description(&self) -> String {
        self.name.clone().unwrap_or_default()
    }

    fn lifecycle(&self) -> String {
        self.status.clone().unwrap_or_default()
    }

    fn annotations(&self) -> BTreeMap<String, String> {
        annotation_map([
            (ACCOUNT_ID_ANNOTATION, self.id()),
            (
                ACCOUNT_EMAIL_ANNOTATION,
                self.email.as_deref().unwrap_or_default(),
            ),
            (ARN_ANNOTATION, self.arn.as_deref().unwrap_or_default()),
        ])
    }

    fn links(&self) -> Option<Vec<Link>> {
        Some(vec![Link {
            url: AWS_CONSOLE_URL.to_string(),
            title: Some("AWS Console".to_string()),
            icon: Some("aws".to_string()),
            link_type: Some("admin-console".to_string()),
        }])
    }
}

impl EntityMapping for S3BucketDescriptor {
    fn entity_type(&self) -> &'static str {
        "s3-bucket"
    }

    fn resource_id(&self) -> String {
        self.bucket_name.clone()
    }

    fn tags(&self) -> &[Tag] {
        &self.tags
    }

    fn description(&self) -> String {
        format!("S3 Bucket in account {}", self.account_id)
    }

    fn lifecycle(&self) -> String {
        "created".to_string()
    }

    fn annotations(&self) -> BTreeMap<String, String> {
        let arn = format!("arn:aws:s3:::{}", self.bucket_name);
        annotation_map([
            (ARN_ANNOTATION, arn.as_str()),
            (ACCOUNT_ID_ANNOTATION, self.account_id.as_str()),
            (REGION_ANNOTATION, self.region.as_str()),
            (BUCKET_NAME_ANNOTATION, self.bucket_name.as_str()),
        ])
    }
}

impl EntityMapping for EcsClusterDescriptor {
    fn entity_type(&self) -> &'static str {
        "ecs-cluster"
    }

    fn resource_id(&self) -> String {
        self.cluster_name().to_string()
    }

    fn tags(&self) -> &[Tag] {
        &self.tags
    }

    // Cluster names are only unique per account
    fn namespace(&self) -> String {
        self.region_and_account().1.to_string()
    }

    fn description(&self) -> String {
        let (_, account_id) = self.region_and_account();
        format!(
            "ECS Cluster {} in account {}",
            self.cluster_name(),
            account_id
        )
    }

    fn lifecycle(&self) -> String {
        self.cluster
            .status
            .clone()
            .unwrap_or_else(|| UNKNOWN.to_string())
    }

    fn annotations(&self) -> BTreeMap<String, String> {
        let (region, account_id) = self.region_and_account();
        annotation_map([
            (ARN_ANNOTATION, self.arn()),
            (ACCOUNT_ID_ANNOTATION, account_id),
            (REGION_ANNOTATION, region),
            (CLUSTER_NAME_ANNOTATION, self.cluster_name()),
        ])
    }
}

impl EntityMapping for VpcDescriptor {
    fn entity_type(&self) -> &'static str {
        "ec2-vpc"
    }

    fn resource_id(&self) -> String {
        self.vpc_id().to_string()
    }

    fn tags(&self) -> &[Tag] {
        &self.vpc.tags
    }

    fn description(&self) -> String {
        format!("VPC {} in account {}", self.vpc_id(), self.account_id)
    }

    fn lifecycle(&self) -> String {
        self.vpc.state.clone().unwrap_or_else(|| UNKNOWN.to_string())
    }

    fn annotations(&self) -> BTreeMap<String, String> {
        let arn = format!(
            "arn:aws:ec2:{}:{}:vpc/{}",
            self.region,
            self.account_id,
            self.vpc_id()
        );
        annotation_map([
            (ARN_ANNOTATION, arn.as_str()),
            (ACCOUNT_ID_ANNOTATION, self.account_id.as_str()),
            (
                OWNER_ACCOUNT_ID_ANNOTATION,
                self.vpc.owner_id.as_deref().unwrap_or(UNKNOWN),
            ),
            (REGION_ANNOTATION, self.region.as_str()),
            (
                CIDR_BLOCK_ANNOTATION,
                self.vpc.cidr_block.as_deref().unwrap_or(UNKNOWN),
            ),
        ])
    }
}

impl ResourceDescriptor {
    pub fn mapping(&self) -> &dyn EntityMapping {
        match self {
            ResourceDescriptor::Account(a) => a,
            ResourceDescriptor::S3Bucket(b) => b,
            ResourceDescriptor::EcsCluster(c) => c,
            ResourceDescriptor::Vpc(v) => v,
        }
    }
}
