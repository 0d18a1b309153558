// # wdns-core
//
// Core library for reconciling orchestrator-managed DNS records against a
// split-view DNS management backend.
//
// ## Architecture Overview
//
// - **zone**: Longest-suffix resolution of a record name to its owning zone
// - **DomainCache**: Time-bounded, per-view cache of the backend's zones
// - **ViewClassifier**: Private/public partition inference for unlabelled records
// - **Reconciler**: Applies create/update/delete and lists owned records
// - **Backend**: Trait for the remote DNS management API
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from the HTTP client
// 2. **Explicit State**: The zone cache is owned by a reconciler instance
// 3. **No Retries**: A failed backend call surfaces immediately
// 4. **Library-First**: The daemon is a thin layer over this crate

pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod reconciler;
pub mod traits;
pub mod view;
pub mod zone;

// Re-export core types for convenience
pub use cache::{DomainCache, ZoneSnapshot};
pub use config::{BackendConfig, DomainFilter, ServerConfig, WdnsConfig};
pub use error::{Error, MutationFailure, Result};
pub use model::{ChangeKind, Changes, Endpoint, Record, RecordChange, RelativeName, View, Zone};
pub use reconciler::{ApplySummary, Reconciler};
pub use traits::{Backend, HostResolver, SystemResolver};
pub use view::{ViewClassifier, is_private_address};
pub use tokio_util::sync::CancellationToken;
