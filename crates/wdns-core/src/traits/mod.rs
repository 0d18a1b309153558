//! Core traits for the WDNS system
//!
//! This module defines the abstract interfaces that collaborators implement.
//!
//! - [`Backend`]: Remote DNS management API
//! - [`HostResolver`]: Hostname to address resolution used for view inference

pub mod backend;
pub mod resolver;

pub use backend::Backend;
pub use resolver::{HostResolver, SystemResolver};
