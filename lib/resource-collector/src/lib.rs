//! Keeps the software catalog in step with the AWS resources of an organization.
//!
//! Each flow in [`handlers`] takes a triggering event, resolves the owning team of
//! every resource, builds its catalog entity and either writes it to the catalog
//! or publishes it for a later write.

pub mod errors;
pub mod events;
pub mod handlers;
pub mod ports;
pub mod settings;
pub mod sync;

pub use errors::{BoxError, SyncError, SyncResult};
pub use ports::{CrossAccountRole, EntityPublisher, ResourceLister};
pub use settings::Settings;
pub use sync::{BatchPolicy, BatchReport, SyncOrchestrator};
