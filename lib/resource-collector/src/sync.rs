use std::fmt;

use catalog_client::{Catalog, OwnerResolver};
use software_catalog::{build, Entity, EntityMapping};
use tracing::{error, info};

use crate::errors::{SyncError, SyncResult};

/// How a batch reacts to a record that fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BatchPolicy {
    /// Stop at the first failure. Later records are not attempted.
    #[default]
    AbortOnFirstError,

    /// Attempt every record and report all failures at the end.
    ContinueOnError,
}

#[derive(Debug)]
pub struct RecordFailure {
    pub index: usize,
    pub error: SyncError,
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<RecordFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} records failed",
            self.failures.len(),
            self.attempted
        )?;
        for failure in &self.failures {
            write!(f, "; record {}: {}", failure.index, failure.error)?;
        }

        Ok(())
    }
}

impl BatchPolicy {
    /// Apply `f` to each item in order.
    ///
    /// Under [`BatchPolicy::AbortOnFirstError`] the first error is returned as is.
    /// Under [`BatchPolicy::ContinueOnError`] failures are collected and returned
    /// together as [`SyncError::Batch`].
    pub fn run<T, I, F>(self, items: I, mut f: F) -> SyncResult<BatchReport>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(T) -> SyncResult<()>,
    {
        let mut report = BatchReport::default();

        for (index, item) in items.into_iter().enumerate() {
            report.attempted += 1;
            match f(item) {
                Ok(()) => report.succeeded += 1,
                Err(error) => {
                    error!(record = index, error = %error, "Failed to process record");
                    match self {
                        BatchPolicy::AbortOnFirstError => return Err(error),
                        BatchPolicy::ContinueOnError => {
                            report.failures.push(RecordFailure { index, error })
                        }
                    }
                }
            }
        }

        if report.is_success() {
            Ok(report)
        } else {
            Err(SyncError::Batch(report))
        }
    }
}

/// Drives a resource from its raw description to the catalog.
#[derive(Clone, Debug)]
pub struct SyncOrchestrator<C, O> {
    catalog: C,
    owners: O,
    policy: BatchPolicy,
}

impl<C: Catalog, O: OwnerResolver> SyncOrchestrator<C, O> {
    pub fn new(catalog: C, owners: O) -> Self {
        Self {
            catalog,
            owners,
            policy: BatchPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> BatchPolicy {
        self.policy
    }

    /// Resolve the owner of the resource's system and build its entity.
    ///
    /// The lookup happens even for untagged resources, whose system is `UNKNOWN`.
    pub fn prepare<M: EntityMapping + ?Sized>(&self, resource: &M) -> SyncResult<Entity> {
        let system = resource.system();
        let owner = self.owners.resolve_owner(&system)?;

        Ok(build(resource, &owner))
    }

    pub fn sync_resource<M: EntityMapping + ?Sized>(&self, resource: &M) -> SyncResult<Entity> {
        let entity = self.prepare(resource)?;
        self.upsert(&entity)?;

        Ok(entity)
    }

    pub fn upsert(&self, entity: &Entity) -> SyncResult<()> {
        self.catalog.upsert(entity)?;
        info!(entity = %entity.name(), namespace = %entity.namespace(), "Entity added to catalog");

        Ok(())
    }

    pub fn remove(&self, entity: &Entity) -> SyncResult<()> {
        self.catalog.delete(entity)?;
        info!(entity = %entity.name(), namespace = %entity.namespace(), "Entity removed from catalog");

        Ok(())
    }

    pub fn run_batch<T, I, F>(&self, items: I, f: F) -> SyncResult<BatchReport>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(T) -> SyncResult<()>,
    {
        self.policy.run(items, f)
    }
}
