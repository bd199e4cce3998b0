//! One entry point per sync flow.
//!
//! Flows ending in the catalog go through [`SyncOrchestrator`]. Discovery flows
//! build entities the same way and hand them to an [`EntityPublisher`] for the
//! catalog writer to pick up.

use catalog_client::{Catalog, OwnerResolver};
use software_catalog::{AccountDescriptor, Entity, S3BucketDescriptor};
use tracing::{debug, error, info, warn};

use crate::errors::{BoxError, SyncError, SyncResult};
use crate::events::{S3BucketEvent, SnsEvent, SqsEvent};
use crate::ports::{EntityPublisher, ResourceLister};
use crate::sync::{BatchPolicy, BatchReport, SyncOrchestrator};

fn lister_error(resource: &'static str, account_id: &str, source: BoxError) -> SyncError {
    error!(resource, account_id, error = %source, "Failed to list account resources");
    SyncError::Lister {
        resource,
        account_id: account_id.to_string(),
        source,
    }
}

fn publish_entity<P: EntityPublisher + ?Sized>(publisher: &P, entity: &Entity) -> SyncResult<()> {
    publisher.publish_entity(entity).map_err(|source| {
        error!(entity = %entity.name(), error = %source, "Failed to publish entity");
        SyncError::Publish {
            message: format!("entity {}", entity.name()),
            source,
        }
    })?;

    info!(entity = %entity.name(), "Entity published");
    Ok(())
}

/// Add each account announced on the topic to the catalog.
pub fn add_account_to_catalog<C: Catalog, O: OwnerResolver>(
    orchestrator: &SyncOrchestrator<C, O>,
    event: &SnsEvent,
) -> SyncResult<BatchReport> {
    debug!(records = event.records.len(), "Received account notification");

    orchestrator.run_batch(&event.records, |record| {
        let account: AccountDescriptor = record.sns.payload()?;
        orchestrator.sync_resource(&account).map(|_| ())
    })
}

/// Write queued entities to the catalog.
pub fn add_entity_to_catalog<C: Catalog, O: OwnerResolver>(
    orchestrator: &SyncOrchestrator<C, O>,
    event: &SqsEvent,
) -> SyncResult<BatchReport> {
    debug!(records = event.records.len(), "Received entity messages");

    orchestrator.run_batch(&event.records, |message| {
        let entity: Entity = message.payload()?;
        orchestrator.upsert(&entity)
    })
}

pub fn remove_entity_from_catalog<C: Catalog, O: OwnerResolver>(
    orchestrator: &SyncOrchestrator<C, O>,
    entity: &Entity,
) -> SyncResult<()> {
    orchestrator.remove(entity)
}

/// Build the entity of each queued account and publish it.
pub fn process_account<C, O, P>(
    orchestrator: &SyncOrchestrator<C, O>,
    publisher: &P,
    event: &SqsEvent,
) -> SyncResult<BatchReport>
where
    C: Catalog,
    O: OwnerResolver,
    P: EntityPublisher + ?Sized,
{
    orchestrator.run_batch(&event.records, |message| {
        let account: AccountDescriptor = message.payload()?;
        let entity = orchestrator.prepare(&account)?;
        publish_entity(publisher, &entity)
    })
}

/// Build the entity of a newly created bucket from its tags and publish it.
pub fn process_created_s3_bucket<C, O, L, P>(
    orchestrator: &SyncOrchestrator<C, O>,
    lister: &L,
    publisher: &P,
    event: &S3BucketEvent,
) -> SyncResult<Entity>
where
    C: Catalog,
    O: OwnerResolver,
    L: ResourceLister + ?Sized,
    P: EntityPublisher + ?Sized,
{
    let detail = &event.detail;
    let account_id = &detail.recipient_account_id;
    let bucket_name = &detail.request_parameters.bucket_name;
    debug!(event = %detail.event_name, bucket = %bucket_name, "Received bucket event");

    let tags = lister
        .bucket_tags(account_id, &detail.aws_region, bucket_name)
        .map_err(|e| lister_error("S3 bucket tags", account_id, e))?;

    let bucket = S3BucketDescriptor {
        account_id: account_id.clone(),
        region: detail.aws_region.clone(),
        bucket_name: bucket_name.clone(),
        tags,
    };

    let entity = orchestrator.prepare(&bucket)?;
    publish_entity(publisher, &entity)?;

    Ok(entity)
}

/// Build and publish an entity for every ECS cluster of each queued account.
///
/// Clusters without an ARN cannot be addressed and are skipped.
pub fn process_ecs_clusters<C, O, L, P>(
    orchestrator: &SyncOrchestrator<C, O>,
    lister: &L,
    publisher: &P,
    event: &SqsEvent,
) -> SyncResult<BatchReport>
where
    C: Catalog,
    O: OwnerResolver,
    L: ResourceLister + ?Sized,
    P: EntityPublisher + ?Sized,
{
    orchestrator.run_batch(&event.records, |message| {
        let account: AccountDescriptor = message.payload()?;
        let clusters = lister
            .ecs_clusters(account.id())
            .map_err(|e| lister_error("ECS clusters", account.id(), e))?;

        for cluster in &clusters {
            if cluster.arn().is_empty() {
                warn!(
                    account_id = account.id(),
                    cluster = cluster.cluster_name(),
                    "Skipping ECS cluster without an ARN"
                );
                continue;
            }

            let entity = orchestrator.prepare(cluster)?;
            publish_entity(publisher, &entity)?;
        }

        Ok(())
    })
}

/// Build and publish an entity for every VPC of each queued account.
pub fn process_vpcs<C, O, L, P>(
    orchestrator: &SyncOrchestrator<C, O>,
    lister: &L,
    publisher: &P,
    event: &SqsEvent,
) -> SyncResult<BatchReport>
where
    C: Catalog,
    O: OwnerResolver,
    L: ResourceLister + ?Sized,
    P: EntityPublisher + ?Sized,
{
    orchestrator.run_batch(&event.records, |message| {
        let account: AccountDescriptor = message.payload()?;
        let vpcs = lister
            .vpcs(account.id())
            .map_err(|e| lister_error("VPCs", account.id(), e))?;

        for vpc in &vpcs {
            let entity = orchestrator.prepare(vpc)?;
            publish_entity(publisher, &entity)?;
        }

        Ok(())
    })
}

/// Announce the buckets of each queued account on the event bus.
pub fn list_account_s3_buckets<L, P>(
    policy: BatchPolicy,
    lister: &L,
    publisher: &P,
    event: &SqsEvent,
) -> SyncResult<BatchReport>
where
    L: ResourceLister + ?Sized,
    P: EntityPublisher + ?Sized,
{
    policy.run(&event.records, |message| {
        let account: AccountDescriptor = message.payload()?;
        let account_id = account.id();
        let buckets = lister
            .s3_buckets(account_id)
            .map_err(|e| lister_error("S3 buckets", account_id, e))?;

        if buckets.is_empty() {
            debug!(account_id, "Account has no S3 buckets");
            return Ok(());
        }

        publisher
            .publish_buckets(account_id, &buckets)
            .map_err(|source| {
                error!(account_id, error = %source, "Failed to publish S3 buckets");
                SyncError::Publish {
                    message: format!("S3 buckets of account {account_id}"),
                    source,
                }
            })?;

        info!(account_id, buckets = buckets.len(), "S3 buckets published");
        Ok(())
    })
}
