//! Record-store collaborators consumed by the lineage and transit modules

pub mod memory;
pub mod pocketbase;

pub use memory::InMemoryAnimalStore;
pub use pocketbase::PocketBaseClient;

use crate::error::Result;
use crate::types::Animal;
use async_trait::async_trait;

/// Lookup of a single animal by id.
///
/// `Ok(None)` means the id does not resolve to a record. Errors are reserved
/// for the backend itself failing.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnimalLookup: Send + Sync {
    async fn lookup_animal(&self, id: &str) -> Result<Option<Animal>>;
}

/// Turns a stored file reference into something a browser can display
pub trait FileUrlResolver {
    fn file_url(&self, record_id: &str, filename: &str) -> String;
}
