//! Record, zone and endpoint types
//!
//! [`Record`] is the backend's view of a record set, [`Endpoint`] is the
//! shape the orchestrator hands in and expects back. The two convert 1:1.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Label key carrying an explicit view on an [`Endpoint`]
pub const VIEW_LABEL: &str = "view";

/// Visibility partition of DNS answers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    /// Answers served only to internal clients
    Private,
    /// Answers served to external clients
    Public,
}

impl View {
    /// Name used on the wire and in endpoint labels
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Private => "private",
            View::Public => "public",
        }
    }

    /// Parse an explicit view label, case-insensitively
    ///
    /// Returns `None` for anything other than `private` or `public`, so the
    /// caller falls back to inference.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "private" => Some(View::Private),
            "public" => Some(View::Public),
            _ => None,
        }
    }

    /// Map a top-level key of a backend listing payload to a view
    ///
    /// Only `private` and `public` partitions exist on the backend.
    pub fn from_backend_key(key: &str) -> Option<Self> {
        match key {
            "private" => Some(View::Private),
            "public" => Some(View::Public),
            _ => None,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A domain the backend owns under a given view
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Zone {
    /// View the zone is served in
    pub view: View,
    /// Zone name without trailing dot
    pub name: String,
}

impl Zone {
    /// Create a zone, lowercased and without trailing dot
    pub fn new(view: View, name: impl Into<String>) -> Self {
        let name: String = name.into();
        let name = name.trim_end_matches('.').to_ascii_lowercase();
        Self { view, name }
    }
}

/// A record set as held by the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// View the record lives in
    pub view: View,
    /// Fully-qualified record name, lowercase when built from an endpoint
    pub name: String,
    /// Resource record type (A, AAAA, CNAME, SRV, TXT, ...)
    pub record_type: String,
    /// Record data, order-significant
    pub values: Vec<String>,
    /// Time-to-live in seconds
    pub ttl: u32,
}

impl Record {
    /// Build a record from an orchestrator endpoint and an already-decided view
    pub fn from_endpoint(endpoint: &Endpoint, view: View) -> Self {
        Self {
            view,
            name: endpoint.dns_name.trim_end_matches('.').to_ascii_lowercase(),
            record_type: endpoint.record_type.clone(),
            values: endpoint.targets.clone(),
            ttl: endpoint.record_ttl,
        }
    }

    /// Convert to the orchestrator's endpoint shape, labelled with the view
    pub fn to_endpoint(&self) -> Endpoint {
        let mut labels = HashMap::new();
        labels.insert(VIEW_LABEL.to_string(), self.view.as_str().to_string());

        Endpoint {
            dns_name: self.name.clone(),
            record_type: self.record_type.clone(),
            targets: self.values.clone(),
            record_ttl: self.ttl,
            labels,
            set_identifier: String::new(),
            provider_specific: Vec::new(),
        }
    }

    /// Check the record invariants that hold for every operation
    pub fn validate(&self) -> crate::Result<()> {
        if self.name.is_empty() {
            return Err(crate::Error::invalid_input("record name is empty"));
        }
        if self.name.split('.').any(str::is_empty) {
            return Err(crate::Error::invalid_input(format!(
                "record name has an empty label: {}",
                self.name
            )));
        }
        if self.record_type.is_empty() {
            return Err(crate::Error::invalid_input(format!(
                "record {} has no type",
                self.name
            )));
        }
        Ok(())
    }
}

/// Record name relative to its owning zone
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RelativeName {
    /// The zone's own apex record
    Root,
    /// Labels left of the zone suffix
    Label(String),
}

impl RelativeName {
    /// Wire form; the apex is written as `.`
    pub fn as_str(&self) -> &str {
        match self {
            RelativeName::Root => ".",
            RelativeName::Label(label) => label,
        }
    }
}

impl fmt::Display for RelativeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of mutation applied to a single record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeKind::Create => "create",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        })
    }
}

/// A fully resolved mutation, ready for the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordChange {
    /// Owning zone
    pub zone: String,
    /// Name relative to `zone`
    pub name: RelativeName,
    /// Resource record type
    pub record_type: String,
    /// Target view
    pub view: View,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Record data, order-significant
    pub values: Vec<String>,
}

/// Provider-specific property attached to an endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpecific {
    pub name: String,
    pub value: String,
}

/// One DNS endpoint as the orchestrator understands it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoint {
    /// Fully-qualified name
    pub dns_name: String,
    /// Resource record type
    pub record_type: String,
    /// Ordered record data
    #[serde(default)]
    pub targets: Vec<String>,
    /// Time-to-live in seconds, 0 when unset
    #[serde(default, rename = "recordTTL")]
    pub record_ttl: u32,
    /// Free-form labels; `view` selects the partition explicitly
    #[serde(default)]
    pub labels: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub set_identifier: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provider_specific: Vec<ProviderSpecific>,
}

impl Endpoint {
    /// Create an endpoint without labels
    pub fn new(
        dns_name: impl Into<String>,
        record_type: impl Into<String>,
        targets: Vec<String>,
    ) -> Self {
        Self {
            dns_name: dns_name.into(),
            record_type: record_type.into(),
            targets,
            ..Default::default()
        }
    }

    /// Set the TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.record_ttl = ttl;
        self
    }

    /// Attach a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Explicit view label, if present and recognized
    pub fn explicit_view(&self) -> Option<View> {
        self.labels.get(VIEW_LABEL).and_then(|v| View::from_label(v))
    }
}

/// A batch of mutations planned by the orchestrator
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Changes {
    #[serde(default)]
    pub create: Vec<Endpoint>,
    /// Previous state of updated endpoints; informational only
    #[serde(default)]
    pub update_old: Vec<Endpoint>,
    #[serde(default)]
    pub update_new: Vec<Endpoint>,
    #[serde(default)]
    pub delete: Vec<Endpoint>,
}

impl Changes {
    /// Total number of mutations the batch will attempt
    pub fn len(&self) -> usize {
        self.create.len() + self.update_new.len() + self.delete.len()
    }

    /// Whether the batch contains no mutation
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
