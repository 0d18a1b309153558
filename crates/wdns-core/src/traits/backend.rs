// # Backend Trait
//
// Defines the interface to the remote DNS management API.
//
// ## Implementations
//
// - HTTP/JSON: `wdns-backend-http` crate
//
// ## Usage
//
// ```rust,ignore
// use wdns_core::Backend;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let backend = /* Backend implementation */;
//
//     for zone in backend.list_zones().await? {
//         println!("{} ({})", zone.name, zone.view);
//     }
//
//     Ok(())
// }
// ```

use crate::model::{Record, RecordChange, Zone};
use async_trait::async_trait;

/// Trait for remote DNS backends
///
/// Every method performs a single remote call and reports its outcome.
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Constraints
///
/// - No retry or backoff; a failed call surfaces immediately
/// - No caching; the zone cache is owned by the reconciler
/// - Dropping a returned future must not leave a half-applied mutation
#[async_trait]
pub trait Backend: Send + Sync {
    /// List every zone the backend owns, across all recognized views
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<Zone>)`: The complete zone list
    /// - `Err(Error)`: Transport, backend or parse failure
    async fn list_zones(&self) -> Result<Vec<Zone>, crate::Error>;

    /// List every record owned by the caller, in backend order
    async fn list_records(&self) -> Result<Vec<Record>, crate::Error>;

    /// Create a record set
    async fn create_record(&self, change: &RecordChange) -> Result<(), crate::Error>;

    /// Replace a record set
    async fn update_record(&self, change: &RecordChange) -> Result<(), crate::Error>;

    /// Delete a record set
    async fn delete_record(&self, change: &RecordChange) -> Result<(), crate::Error>;

    /// Get the backend name (for logging/debugging)
    fn backend_name(&self) -> &'static str;
}
