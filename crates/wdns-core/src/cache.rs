// # Domain Cache
//
// Time-bounded cache of the zones the backend owns, partitioned by view.
//
// ## Refresh Policy
//
// - A refresh replaces the whole zone map; there is no incremental merge
// - Refresh happens only once the freshness window has elapsed
// - A failed refresh keeps the previous map and does not advance the
//   timestamp, so the next access retries immediately
//
// ## Concurrency
//
// Readers load an `Arc` snapshot through `ArcSwap` and never observe a
// half-populated map. Refreshes are serialized by an async mutex; a caller
// that waited on the mutex re-checks freshness before calling the backend.

use crate::error::{Error, Result};
use crate::model::{View, Zone};
use crate::traits::Backend;
use crate::zone::resolve_zone;
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Default freshness window (one hour)
pub const DEFAULT_FRESHNESS_WINDOW: std::time::Duration = std::time::Duration::from_secs(3600);

/// Immutable view → zone-name map produced by one refresh
#[derive(Debug, Clone, Default)]
pub struct ZoneSnapshot {
    zones: HashMap<View, HashSet<String>>,
}

impl ZoneSnapshot {
    /// Build a snapshot from a backend zone listing
    pub fn from_zones(zones: impl IntoIterator<Item = Zone>) -> Self {
        let mut map: HashMap<View, HashSet<String>> = HashMap::new();
        map.insert(View::Private, HashSet::new());
        map.insert(View::Public, HashSet::new());

        for zone in zones {
            map.entry(zone.view)
                .or_default()
                .insert(zone.name.to_ascii_lowercase());
        }

        Self { zones: map }
    }

    /// Whether `view` has a zone called `name`
    pub fn contains(&self, view: View, name: &str) -> bool {
        self.zones.get(&view).is_some_and(|set| set.contains(name))
    }

    /// Longest zone of `view` owning `name`, ignoring ASCII case
    pub fn resolve(&self, name: &str, view: View) -> Option<String> {
        let name = name.to_ascii_lowercase();
        self.zones.get(&view).and_then(|set| resolve_zone(&name, set))
    }

    /// Number of distinct zone names across both views
    pub fn len(&self) -> usize {
        self.zones.values().flatten().collect::<HashSet<_>>().len()
    }

    /// Whether no zone is known
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
struct CacheState {
    snapshot: Arc<ZoneSnapshot>,
    refreshed_at: Option<DateTime<Utc>>,
}

/// Zone cache owned by a reconciler instance
#[derive(Debug)]
pub struct DomainCache {
    /// Snapshot and its timestamp, swapped together
    state: ArcSwap<CacheState>,

    /// Serializes refreshes
    refresh_lock: Mutex<()>,

    /// How long a refresh stays valid
    window: chrono::Duration,
}

impl DomainCache {
    /// Create an empty cache with the default one-hour window
    pub fn new() -> Self {
        Self::with_window(DEFAULT_FRESHNESS_WINDOW)
    }

    /// Create an empty cache with a custom freshness window
    pub fn with_window(window: std::time::Duration) -> Self {
        Self {
            state: ArcSwap::from_pointee(CacheState::default()),
            refresh_lock: Mutex::new(()),
            window: chrono::Duration::seconds(window.as_secs() as i64),
        }
    }

    /// Current zone map
    pub fn snapshot(&self) -> Arc<ZoneSnapshot> {
        Arc::clone(&self.state.load().snapshot)
    }

    /// Time of the last successful refresh
    pub fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.state.load().refreshed_at
    }

    /// Whether a refresh is due at `now`
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        match self.state.load().refreshed_at {
            None => true,
            Some(at) => now > at + self.window,
        }
    }

    /// Refresh from `backend` if the freshness window has elapsed
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The cache is fresh (refreshed now or still valid)
    /// - `Err(Error::CacheRefresh)`: The refresh failed; previous contents kept
    pub async fn ensure_fresh(&self, backend: &dyn Backend, now: DateTime<Utc>) -> Result<()> {
        if !self.is_stale(now) {
            return Ok(());
        }

        let _guard = self.refresh_lock.lock().await;

        if !self.is_stale(now) {
            debug!("Zone cache refreshed by a concurrent caller");
            return Ok(());
        }

        debug!("Refreshing zone cache from {}", backend.backend_name());

        let zones = backend.list_zones().await.map_err(Error::cache_refresh)?;
        let snapshot = ZoneSnapshot::from_zones(zones);

        info!("Zone cache refreshed: {} zone(s)", snapshot.len());

        self.state.store(Arc::new(CacheState {
            snapshot: Arc::new(snapshot),
            refreshed_at: Some(now),
        }));

        Ok(())
    }
}

impl Default for DomainCache {
    fn default() -> Self {
        Self::new()
    }
}
