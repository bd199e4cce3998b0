//! Backstage catalog entities and the mapping of AWS resources into them.

pub mod builder;
pub mod entity;
pub mod resource;

pub use builder::{build, EntityMapping};
pub use entity::{Entity, EntitySpec, Kind, Link, Metadata};
pub use resource::{
    AccountDescriptor, BucketSummary, EcsCluster, EcsClusterDescriptor, ResourceDescriptor,
    S3BucketDescriptor, Tag, Vpc, VpcDescriptor, UNKNOWN,
};
