//! Error types for the WDNS system
//!
//! This module defines all error types used throughout the crate.
//! Errors keep their structure until they reach a user-facing boundary,
//! where `Display` flattens them into a message.

use crate::model::{ChangeKind, View};
use thiserror::Error;

/// Result type alias for WDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the WDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// Network or HTTP-level failure, including non-200 responses
    #[error("Transport error: {0}")]
    Transport(String),

    /// The backend answered with a non-SUCCESS status
    #[error("Backend error: {0}")]
    Backend(String),

    /// Malformed envelope or a field that cannot be coerced
    #[error("Parse error: {0}")]
    Parse(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No known zone owns the record name
    #[error("No matching zone for {name} in view {view}")]
    ZoneResolution {
        /// Fully-qualified record name
        name: String,
        /// View the lookup was restricted to
        view: View,
    },

    /// The zone cache could not be refreshed; the previous contents remain valid
    #[error("Zone cache refresh failed: {0}")]
    CacheRefresh(#[source] Box<Error>),

    /// Record violates the record invariants
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The caller cancelled the operation
    #[error("Operation cancelled")]
    Cancelled,

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// One or more mutations of a batch failed
    #[error("{}", format_failures(.0))]
    Batch(Vec<MutationFailure>),
}

/// A single failed mutation inside a batch
#[derive(Debug)]
pub struct MutationFailure {
    /// Which operation was attempted
    pub kind: ChangeKind,
    /// Record name the mutation targeted
    pub name: String,
    /// Record type the mutation targeted
    pub record_type: String,
    /// Why it failed
    pub error: Error,
}

impl std::fmt::Display for MutationFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} ({}): {}",
            self.kind, self.name, self.record_type, self.error
        )
    }
}

fn format_failures(failures: &[MutationFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a backend error
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a zone resolution error
    pub fn zone_resolution(name: impl Into<String>, view: View) -> Self {
        Self::ZoneResolution {
            name: name.into(),
            view,
        }
    }

    /// Wrap a failure encountered while refreshing the zone cache
    pub fn cache_refresh(err: Error) -> Self {
        Self::CacheRefresh(Box::new(err))
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Per-mutation failures when this is a batch error
    pub fn failures(&self) -> &[MutationFailure] {
        match self {
            Self::Batch(failures) => failures,
            _ => &[],
        }
    }
}
