//! Record reconciler
//!
//! The Reconciler is responsible for:
//! - Deciding the view of each desired record
//! - Keeping the zone cache fresh
//! - Resolving the owning zone and zone-relative name
//! - Applying create/update/delete through the Backend
//! - Converting backend records into orchestrator endpoints
//!
//! ## Architecture
//!
//! ```text
//!                  ┌──────────────┐
//!  Changes ──────▶ │  Reconciler  │ ──────▶ Vec<Endpoint>
//!                  └──────────────┘
//!                          │
//!        ┌─────────────────┼─────────────────┐
//!        ▼                 ▼                 ▼
//! ┌──────────────┐  ┌──────────────┐  ┌──────────────┐
//! │ViewClassifier│  │ DomainCache  │  │   Backend    │
//! │  (view)      │  │ (zone)       │  │ (mutate)     │
//! └──────────────┘  └──────────────┘  └──────────────┘
//! ```
//!
//! ## Mutation Flow
//!
//! 1. Classify the view unless a `view` label is present (aborted on cancel)
//! 2. Refresh the zone cache if its window elapsed
//! 3. Resolve the longest owning zone within the view
//! 4. Strip the zone suffix (apex → `.`)
//! 5. Call the backend and report its outcome unchanged

use crate::cache::DomainCache;
use crate::config::DomainFilter;
use crate::error::{Error, MutationFailure, Result};
use crate::model::{ChangeKind, Changes, Endpoint, Record, RecordChange};
use crate::traits::Backend;
use crate::view::ViewClassifier;
use crate::zone::relative_name;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Counts of mutations applied by a successful batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl ApplySummary {
    fn record(&mut self, kind: ChangeKind) {
        match kind {
            ChangeKind::Create => self.created += 1,
            ChangeKind::Update => self.updated += 1,
            ChangeKind::Delete => self.deleted += 1,
        }
    }
}

/// Applies orchestrator changes to a backend
///
/// ## Threading
///
/// All methods take `&self`; a single reconciler can be shared across
/// tasks behind an `Arc`. The zone cache carries its own synchronization.
pub struct Reconciler {
    /// Backend the records live in
    backend: Arc<dyn Backend>,

    /// Zones owned by the backend, per view
    cache: DomainCache,

    /// View inference for unlabelled endpoints
    classifier: ViewClassifier,

    /// Domains exposed to the orchestrator
    domain_filter: DomainFilter,
}

impl Reconciler {
    /// Create a new reconciler with an empty zone cache
    ///
    /// # Parameters
    ///
    /// - `backend`: Backend implementation
    /// - `classifier`: View classifier
    /// - `domain_filter`: Domains exposed to the orchestrator
    pub fn new(
        backend: Arc<dyn Backend>,
        classifier: ViewClassifier,
        domain_filter: DomainFilter,
    ) -> Self {
        Self {
            backend,
            cache: DomainCache::new(),
            classifier,
            domain_filter,
        }
    }

    /// Replace the zone cache (e.g. to use a custom freshness window)
    pub fn with_cache(mut self, cache: DomainCache) -> Self {
        self.cache = cache;
        self
    }

    /// The zone cache
    pub fn cache(&self) -> &DomainCache {
        &self.cache
    }

    /// The configured domain filter
    pub fn domain_filter(&self) -> &DomainFilter {
        &self.domain_filter
    }

    /// List the records currently owned by the caller
    ///
    /// Records come back in backend order, one endpoint per record, each
    /// labelled with its view. Records outside the domain filter are dropped.
    pub async fn list_records(&self, cancel: &CancellationToken) -> Result<Vec<Endpoint>> {
        let records = cancellable(cancel, self.backend.list_records()).await?;
        let total = records.len();

        let endpoints: Vec<Endpoint> = records
            .iter()
            .filter(|r| self.domain_filter.matches(&r.name))
            .map(Record::to_endpoint)
            .collect();

        debug!(
            "Listed {} record(s) from {} ({} outside domain filter)",
            endpoints.len(),
            self.backend.backend_name(),
            total - endpoints.len()
        );

        Ok(endpoints)
    }

    /// Apply a single mutation
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The backend accepted the mutation
    /// - `Err(Error)`: Classification, zone resolution, cache refresh or
    ///   backend failure for this record only
    pub async fn apply(
        &self,
        kind: ChangeKind,
        endpoint: &Endpoint,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let change = self.resolve_change(kind, endpoint, cancel).await?;

        debug!(
            "{} {} {} in zone {} (view {})",
            kind, change.record_type, change.name, change.zone, change.view
        );

        let call = async {
            match kind {
                ChangeKind::Create => self.backend.create_record(&change).await,
                ChangeKind::Update => self.backend.update_record(&change).await,
                ChangeKind::Delete => self.backend.delete_record(&change).await,
            }
        };
        cancellable(cancel, call).await?;

        info!(
            "Applied {} {} ({}) in view {}",
            kind, endpoint.dns_name, change.record_type, change.view
        );
        Ok(())
    }

    /// Apply a batch of mutations
    ///
    /// Creates run first, then updates (new side), then deletes. Every
    /// mutation is attempted; failures do not stop the remaining ones.
    ///
    /// # Returns
    ///
    /// - `Ok(ApplySummary)`: Every mutation succeeded
    /// - `Err(Error::Batch)`: One entry per failed mutation
    pub async fn apply_changes(
        &self,
        changes: &Changes,
        cancel: &CancellationToken,
    ) -> Result<ApplySummary> {
        let planned = changes
            .create
            .iter()
            .map(|ep| (ChangeKind::Create, ep))
            .chain(changes.update_new.iter().map(|ep| (ChangeKind::Update, ep)))
            .chain(changes.delete.iter().map(|ep| (ChangeKind::Delete, ep)));

        let mut summary = ApplySummary::default();
        let mut failures = Vec::new();

        for (kind, endpoint) in planned {
            match self.apply(kind, endpoint, cancel).await {
                Ok(()) => summary.record(kind),
                Err(e) => {
                    warn!(
                        "Failed to {} {} ({}): {}",
                        kind, endpoint.dns_name, endpoint.record_type, e
                    );
                    failures.push(MutationFailure {
                        kind,
                        name: endpoint.dns_name.clone(),
                        record_type: endpoint.record_type.clone(),
                        error: e,
                    });
                }
            }
        }

        if failures.is_empty() {
            info!(
                "Applied changes: {} created, {} updated, {} deleted",
                summary.created, summary.updated, summary.deleted
            );
            Ok(summary)
        } else {
            Err(Error::Batch(failures))
        }
    }

    /// Turn an endpoint into a backend mutation with zone and relative name
    async fn resolve_change(
        &self,
        kind: ChangeKind,
        endpoint: &Endpoint,
        cancel: &CancellationToken,
    ) -> Result<RecordChange> {
        let view = cancellable(cancel, async {
            Ok(self.classifier.classify(endpoint).await)
        })
        .await?;
        let record = Record::from_endpoint(endpoint, view);
        record.validate()?;

        if kind != ChangeKind::Delete && record.values.is_empty() {
            return Err(Error::invalid_input(format!(
                "record {} ({}) has no values",
                record.name, record.record_type
            )));
        }

        cancellable(
            cancel,
            self.cache
                .ensure_fresh(self.backend.as_ref(), chrono::Utc::now()),
        )
        .await?;

        let zone = self
            .cache
            .snapshot()
            .resolve(&record.name, view)
            .ok_or_else(|| Error::zone_resolution(&record.name, view))?;

        let name = relative_name(&record.name, &zone)
            .ok_or_else(|| Error::zone_resolution(&record.name, view))?;

        Ok(RecordChange {
            zone,
            name,
            record_type: record.record_type,
            view,
            ttl: record.ttl,
            values: record.values,
        })
    }
}

/// Run `fut` unless `cancel` fires first
///
/// The future is dropped on cancellation, so a backend call that has not
/// completed leaves no remote side effect behind.
async fn cancellable<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        res = fut => res,
    }
}
