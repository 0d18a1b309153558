//! Test doubles and common utilities for reconciler contract tests
//!
//! This module provides call-counting test doubles that stand in for the
//! remote backend and the system resolver.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wdns_core::error::{Error, Result};
use wdns_core::traits::{Backend, HostResolver};
use wdns_core::{
    ChangeKind, DomainFilter, Reconciler, Record, RecordChange, View, ViewClassifier, Zone,
};

/// A backend that records every call
pub struct MockBackend {
    zones: Mutex<Vec<Zone>>,
    records: Mutex<Vec<Record>>,
    list_zones_calls: AtomicUsize,
    fail_zones: AtomicBool,
    /// Zone-relative names whose mutation the backend rejects
    rejected: Mutex<HashSet<String>>,
    applied: Mutex<Vec<(ChangeKind, RecordChange)>>,
    zone_delay: Mutex<Option<Duration>>,
}

impl MockBackend {
    pub fn new(zones: Vec<Zone>) -> Arc<Self> {
        Arc::new(Self {
            zones: Mutex::new(zones),
            records: Mutex::new(Vec::new()),
            list_zones_calls: AtomicUsize::new(0),
            fail_zones: AtomicBool::new(false),
            rejected: Mutex::new(HashSet::new()),
            applied: Mutex::new(Vec::new()),
            zone_delay: Mutex::new(None),
        })
    }

    /// Zones used by most tests
    pub fn with_default_zones() -> Arc<Self> {
        Self::new(vec![
            Zone::new(View::Public, "test.net"),
            Zone::new(View::Public, "eu.test.net"),
            Zone::new(View::Public, "aa.eu.test.net"),
            Zone::new(View::Private, "corp.test.net"),
            Zone::new(View::Private, "test.net"),
        ])
    }

    pub fn set_zones(&self, zones: Vec<Zone>) {
        *self.zones.lock().unwrap() = zones;
    }

    pub fn set_records(&self, records: Vec<Record>) {
        *self.records.lock().unwrap() = records;
    }

    pub fn fail_zone_listing(&self, fail: bool) {
        self.fail_zones.store(fail, Ordering::SeqCst);
    }

    pub fn set_zone_delay(&self, delay: Duration) {
        *self.zone_delay.lock().unwrap() = Some(delay);
    }

    pub fn reject(&self, relative_name: &str) {
        self.rejected
            .lock()
            .unwrap()
            .insert(relative_name.to_string());
    }

    /// Number of times list_zones() was called
    pub fn list_zones_calls(&self) -> usize {
        self.list_zones_calls.load(Ordering::SeqCst)
    }

    /// Mutations the backend accepted, in call order
    pub fn applied(&self) -> Vec<(ChangeKind, RecordChange)> {
        self.applied.lock().unwrap().clone()
    }

    fn mutate(&self, kind: ChangeKind, change: &RecordChange) -> Result<()> {
        if self.rejected.lock().unwrap().contains(change.name.as_str()) {
            return Err(Error::backend(format!("record {} is locked", change.name)));
        }
        self.applied.lock().unwrap().push((kind, change.clone()));
        Ok(())
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn list_zones(&self) -> Result<Vec<Zone>> {
        self.list_zones_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.zone_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_zones.load(Ordering::SeqCst) {
            return Err(Error::transport("HTTP code 503 Service Unavailable"));
        }
        Ok(self.zones.lock().unwrap().clone())
    }

    async fn list_records(&self) -> Result<Vec<Record>> {
        Ok(self.records.lock().unwrap().clone())
    }

    async fn create_record(&self, change: &RecordChange) -> Result<()> {
        self.mutate(ChangeKind::Create, change)
    }

    async fn update_record(&self, change: &RecordChange) -> Result<()> {
        self.mutate(ChangeKind::Update, change)
    }

    async fn delete_record(&self, change: &RecordChange) -> Result<()> {
        self.mutate(ChangeKind::Delete, change)
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }
}

/// A resolver answering from a fixed table
pub struct StaticResolver {
    hosts: HashMap<String, IpAddr>,
}

impl StaticResolver {
    pub fn new(hosts: &[(&str, IpAddr)]) -> Arc<Self> {
        Arc::new(Self {
            hosts: hosts
                .iter()
                .map(|(h, ip)| (h.to_string(), *ip))
                .collect(),
        })
    }
}

#[async_trait]
impl HostResolver for StaticResolver {
    async fn resolve(&self, host: &str) -> Option<IpAddr> {
        self.hosts.get(host.trim_end_matches('.')).copied()
    }
}

/// A slow resolver that counts lookups and never resolves anything
pub struct CountingResolver {
    lookups: AtomicUsize,
    delay: Duration,
}

impl CountingResolver {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            lookups: AtomicUsize::new(0),
            delay,
        })
    }

    /// Number of lookups started
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostResolver for CountingResolver {
    async fn resolve(&self, _host: &str) -> Option<IpAddr> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        None
    }
}

/// Reconciler over `backend` with a resolver that knows a public and a private host
pub fn reconciler(backend: Arc<MockBackend>) -> Reconciler {
    let resolver = StaticResolver::new(&[
        ("public.example.org", IpAddr::from([93, 184, 216, 34])),
        ("db.corp.test.net", IpAddr::from([10, 0, 0, 5])),
    ]);
    Reconciler::new(
        backend,
        ViewClassifier::new(resolver),
        DomainFilter::default(),
    )
}

/// Build an owned record
pub fn record(view: View, name: &str, rtype: &str, values: &[&str], ttl: u32) -> Record {
    Record {
        view,
        name: name.to_string(),
        record_type: rtype.to_string(),
        values: values.iter().map(|v| v.to_string()).collect(),
        ttl,
    }
}
