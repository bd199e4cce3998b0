use tracing::debug;

use crate::client::Client;
use crate::errors::CatalogResult;

/// Resolves the owner of a catalog system.
pub trait OwnerResolver {
    /// Owner recorded on the system's catalog entry, `UNKNOWN` when it has none.
    ///
    /// Fails with [`crate::CatalogError::SystemOwnerLookup`] when the system
    /// cannot be read.
    fn resolve_owner(&self, system: &str) -> CatalogResult<String>;
}

impl<T: OwnerResolver + ?Sized> OwnerResolver for &T {
    fn resolve_owner(&self, system: &str) -> CatalogResult<String> {
        (**self).resolve_owner(system)
    }
}

impl OwnerResolver for Client {
    fn resolve_owner(&self, system: &str) -> CatalogResult<String> {
        let record = self.get_system(system)?;
        let owner = record.owner().to_string();
        debug!(system, owner = %owner, "Resolved system owner");

        Ok(owner)
    }
}
