//! View classification
//!
//! Decides whether a desired record belongs to the private or the public
//! partition. An explicit `view` label always wins; otherwise the targets
//! are tested against the private address ranges. When nothing can be
//! inferred the record is private.

use crate::model::{Endpoint, View};
use crate::traits::HostResolver;
use ipnet::IpNet;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::{Arc, LazyLock};
use tracing::debug;

/// Reserved blocks that are never served publicly
const PRIVATE_BLOCKS: &[&str] = &[
    "127.0.0.0/8",    // IPv4 loopback
    "10.0.0.0/8",     // RFC1918
    "172.16.0.0/12",  // RFC1918
    "192.168.0.0/16", // RFC1918
    "169.254.0.0/16", // RFC3927 link-local
    "::1/128",        // IPv6 loopback
    "fe80::/10",      // IPv6 link-local
    "fc00::/7",       // IPv6 unique local
];

static PRIVATE_NETS: LazyLock<Vec<IpNet>> = LazyLock::new(|| {
    PRIVATE_BLOCKS
        .iter()
        .filter_map(|cidr| cidr.parse::<IpNet>().ok())
        .collect()
});

/// View given to TXT records, which carry no address to test
pub const TXT_VIEW: View = View::Private;

/// View used when nothing about the record can be inferred
pub const FALLBACK_VIEW: View = View::Private;

/// Whether `ip` belongs to a private, loopback or link-local range
pub fn is_private_address(ip: IpAddr) -> bool {
    let ip = ip.to_canonical();

    let by_class = match ip {
        IpAddr::V4(v4) => v4.is_loopback() || v4.is_link_local() || is_link_local_multicast_v4(v4),
        IpAddr::V6(v6) => {
            v6.is_loopback() || is_link_local_unicast_v6(v6) || is_link_local_multicast_v6(v6)
        }
    };

    by_class || PRIVATE_NETS.iter().any(|net| net.contains(&ip))
}

fn is_link_local_multicast_v4(ip: Ipv4Addr) -> bool {
    let [a, b, c, _] = ip.octets();
    a == 224 && b == 0 && c == 0
}

fn is_link_local_unicast_v6(ip: Ipv6Addr) -> bool {
    (ip.segments()[0] & 0xffc0) == 0xfe80
}

fn is_link_local_multicast_v6(ip: Ipv6Addr) -> bool {
    (ip.segments()[0] & 0xff0f) == 0xff02
}

fn view_for(ip: IpAddr) -> View {
    if is_private_address(ip) {
        View::Private
    } else {
        View::Public
    }
}

/// Classifies endpoints into views
#[derive(Clone)]
pub struct ViewClassifier {
    resolver: Arc<dyn HostResolver>,
}

impl std::fmt::Debug for ViewClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewClassifier").finish_non_exhaustive()
    }
}

impl ViewClassifier {
    /// Create a classifier resolving CNAME/SRV targets through `resolver`
    pub fn new(resolver: Arc<dyn HostResolver>) -> Self {
        LazyLock::force(&PRIVATE_NETS);
        Self { resolver }
    }

    /// Decide the view of `endpoint`
    pub async fn classify(&self, endpoint: &Endpoint) -> View {
        if let Some(view) = endpoint.explicit_view() {
            return view;
        }

        let inferred = match endpoint.record_type.to_ascii_uppercase().as_str() {
            "A" | "AAAA" => endpoint
                .targets
                .iter()
                .find_map(|t| t.trim().parse::<IpAddr>().ok())
                .map(view_for),
            "CNAME" => self.first_resolved(endpoint.targets.iter().map(String::as_str)).await,
            "SRV" => {
                let hosts = endpoint
                    .targets
                    .iter()
                    .filter_map(|t| t.split_whitespace().next_back());
                self.first_resolved(hosts).await
            }
            "TXT" => Some(TXT_VIEW),
            _ => None,
        };

        let view = inferred.unwrap_or(FALLBACK_VIEW);
        debug!(
            "Classified {} ({}) as {}",
            endpoint.dns_name, endpoint.record_type, view
        );
        view
    }

    async fn first_resolved<'a>(&self, hosts: impl Iterator<Item = &'a str>) -> Option<View> {
        for host in hosts {
            if let Some(ip) = self.resolver.resolve(host).await {
                return Some(view_for(ip));
            }
            debug!("Target {} did not resolve, trying next", host);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct StaticResolver(HashMap<&'static str, IpAddr>);

    #[async_trait]
    impl HostResolver for StaticResolver {
        async fn resolve(&self, host: &str) -> Option<IpAddr> {
            self.0.get(host.trim_end_matches('.')).copied()
        }
    }

    fn classifier() -> ViewClassifier {
        let mut hosts = HashMap::new();
        hosts.insert("dns.google.com", IpAddr::from([8, 8, 8, 8]));
        hosts.insert("db.internal", IpAddr::from([10, 1, 2, 3]));
        ViewClassifier::new(Arc::new(StaticResolver(hosts)))
    }

    fn endpoint(rtype: &str, targets: &[&str]) -> Endpoint {
        Endpoint::new(
            "abcd.test.com",
            rtype,
            targets.iter().map(|t| t.to_string()).collect(),
        )
    }

    #[test]
    fn test_is_private_address() {
        assert!(is_private_address("192.168.1.1".parse().unwrap()));
        assert!(is_private_address("127.0.0.2".parse().unwrap()));
        assert!(!is_private_address("8.8.8.8".parse().unwrap()));
    }

    #[test]
    fn test_private_ranges_and_classes() {
        for ip in [
            "10.20.30.40",
            "172.31.255.255",
            "169.254.10.1",
            "224.0.0.251",
            "::1",
            "fe80::1",
            "fd00::1",
            "ff02::fb",
            "::ffff:192.168.0.1",
        ] {
            assert!(is_private_address(ip.parse().unwrap()), "{} should be private", ip);
        }

        for ip in ["172.32.0.1", "1.1.1.1", "2001:4860:4860::8888", "224.0.1.1", "ff05::2"] {
            assert!(!is_private_address(ip.parse().unwrap()), "{} should be public", ip);
        }
    }

    #[tokio::test]
    async fn test_a_record_private_target() {
        let c = classifier();
        assert_eq!(c.classify(&endpoint("A", &["192.168.0.1"])).await, View::Private);
        assert_eq!(c.classify(&endpoint("A", &["1.2.3.4"])).await, View::Public);
        assert_eq!(c.classify(&endpoint("AAAA", &["2001:db8::1"])).await, View::Public);
    }

    #[tokio::test]
    async fn test_first_parseable_target_decides() {
        let c = classifier();
        let ep = endpoint("A", &["not-an-ip", "8.8.4.4", "10.0.0.1"]);
        assert_eq!(c.classify(&ep).await, View::Public);
    }

    #[tokio::test]
    async fn test_explicit_label_wins() {
        let c = classifier();
        let cname = endpoint("CNAME", &["dns.google.com"]).with_label("view", "private");
        let srv = endpoint("SRV", &["10 60 5060 dns.google.com"]).with_label("view", "Private");
        let a = endpoint("A", &["10.0.0.1"]).with_label("view", "PUBLIC");

        assert_eq!(c.classify(&cname).await, View::Private);
        assert_eq!(c.classify(&srv).await, View::Private);
        assert_eq!(c.classify(&a).await, View::Public);
    }

    #[tokio::test]
    async fn test_unknown_label_falls_back_to_inference() {
        let c = classifier();
        for label in ["staging", "*", "all"] {
            let ep = endpoint("A", &["8.8.8.8"]).with_label("view", label);
            assert_eq!(c.classify(&ep).await, View::Public, "label {}", label);
        }
    }

    #[tokio::test]
    async fn test_cname_and_srv_resolution() {
        let c = classifier();
        assert_eq!(c.classify(&endpoint("CNAME", &["dns.google.com"])).await, View::Public);
        assert_eq!(c.classify(&endpoint("CNAME", &["db.internal"])).await, View::Private);
        assert_eq!(
            c.classify(&endpoint("SRV", &["10 60 5060 dns.google.com"])).await,
            View::Public
        );
    }

    #[tokio::test]
    async fn test_srv_host_is_last_non_empty_token() {
        let c = classifier();
        assert_eq!(
            c.classify(&endpoint("SRV", &["10  60 5060  db.internal "])).await,
            View::Private
        );
        assert_eq!(
            c.classify(&endpoint("SRV", &["10 60 5060 dns.google.com\t"])).await,
            View::Public
        );
    }

    #[tokio::test]
    async fn test_unresolvable_target_tries_next() {
        let c = classifier();
        let ep = endpoint("CNAME", &["nowhere.invalid", "dns.google.com"]);
        assert_eq!(c.classify(&ep).await, View::Public);

        let ep = endpoint("CNAME", &["nowhere.invalid"]);
        assert_eq!(c.classify(&ep).await, View::Private);
    }

    #[tokio::test]
    async fn test_txt_and_other_types_default_private() {
        let c = classifier();
        assert_eq!(c.classify(&endpoint("TXT", &["dns.google.com"])).await, View::Private);
        assert_eq!(c.classify(&endpoint("MX", &["10 dns.google.com"])).await, View::Private);
        assert_eq!(c.classify(&endpoint("A", &[])).await, View::Private);
    }
}
