//! Hostname resolution used to infer the view of CNAME and SRV records

use async_trait::async_trait;
use std::net::IpAddr;
use std::time::Duration;

/// Default timeout for a single hostname lookup
const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolves a hostname to one address
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// First address the host resolves to, or `None` when it does not resolve
    async fn resolve(&self, host: &str) -> Option<IpAddr>;
}

/// Resolver backed by the operating system's name service
#[derive(Debug, Clone)]
pub struct SystemResolver {
    timeout: Duration,
}

impl SystemResolver {
    /// Create a resolver with the default lookup timeout
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_LOOKUP_TIMEOUT,
        }
    }

    /// Create a resolver with a custom lookup timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SystemResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, host: &str) -> Option<IpAddr> {
        let host = host.trim_end_matches('.');
        if host.is_empty() {
            return None;
        }

        match tokio::time::timeout(self.timeout, tokio::net::lookup_host((host, 0))).await {
            Ok(Ok(mut addrs)) => addrs.next().map(|addr| addr.ip()),
            Ok(Err(e)) => {
                tracing::debug!("Lookup of {} failed: {}", host, e);
                None
            }
            Err(_) => {
                tracing::debug!("Lookup of {} timed out after {:?}", host, self.timeout);
                None
            }
        }
    }
}
