//! Longest-suffix zone resolution
//!
//! Maps a fully-qualified record name to the most specific known zone that
//! owns it, and splits the name into its zone-relative part.

use crate::model::RelativeName;
use std::collections::HashSet;

/// Find the longest zone in `zones` that is a dot-suffix of `name`
///
/// The scan walks from the last label towards the first, growing the
/// candidate suffix by one label per step. Every hit overwrites the previous
/// one, so the final assignment is the longest matching suffix.
///
/// Labels are compared exactly; callers lowercase both sides first.
///
/// # Example
///
/// ```rust
/// use std::collections::HashSet;
/// use wdns_core::zone::resolve_zone;
///
/// let zones: HashSet<String> = ["test.net", "eu.test.net"]
///     .into_iter()
///     .map(String::from)
///     .collect();
///
/// assert_eq!(resolve_zone("www.eu.test.net", &zones).as_deref(), Some("eu.test.net"));
/// assert_eq!(resolve_zone("www.example.org", &zones), None);
/// ```
pub fn resolve_zone(name: &str, zones: &HashSet<String>) -> Option<String> {
    let labels: Vec<&str> = name.split('.').collect();
    let mut best = None;

    for i in (0..labels.len()).rev() {
        let suffix = labels[i..].join(".");
        if zones.contains(&suffix) {
            best = Some(suffix);
        }
    }

    best
}

/// Strip the `.<zone>` suffix from `name`
///
/// A name equal to the zone is the zone's apex and yields
/// [`RelativeName::Root`]. Returns `None` when `zone` is not a suffix of
/// `name` at a label boundary.
pub fn relative_name(name: &str, zone: &str) -> Option<RelativeName> {
    if name == zone {
        return Some(RelativeName::Root);
    }

    name.strip_suffix(zone)
        .and_then(|rest| rest.strip_suffix('.'))
        .filter(|label| !label.is_empty())
        .map(|label| RelativeName::Label(label.to_string()))
}
