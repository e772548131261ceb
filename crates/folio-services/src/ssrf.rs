//! SSRF (Server-Side Request Forgery) guard for the image probe.
//!
//! The probe fetches URLs typed in by users, so it must not be usable to reach
//! loopback, private, or link-local hosts from the server.

use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use tokio::net::lookup_host;
use url::Url;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Check a probe target before any request is made.
///
/// Rejects non-HTTP schemes, literal private addresses, internal hostnames, and
/// hostnames that resolve to private addresses (prevents DNS rebinding to the
/// first hop). With `allow_private_ips` only the scheme and host checks remain.
pub async fn check_probe_target(url: &Url, allow_private_ips: bool) -> Result<(), String> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(format!("Scheme '{}' is not allowed", url.scheme()));
    }

    let host = url
        .host_str()
        .ok_or_else(|| "URL must have a host".to_string())?;

    if allow_private_ips {
        return Ok(());
    }

    if is_blocked_host(url) {
        return Err(format!("Host '{}' is private or internal", host));
    }

    // Literal addresses were fully checked above.
    if host_ip(url).is_some() {
        return Ok(());
    }

    let port = url.port_or_known_default().unwrap_or(80);
    let resolved = lookup_host((host, port)).await.map_err(|e| {
        tracing::debug!(host = %host, error = %e, "DNS resolution failed for image probe");
        format!("Hostname could not be resolved: {}", e)
    })?;

    for addr in resolved {
        if is_private_ip(&addr.ip()) {
            return Err(format!(
                "Hostname resolves to private/internal IP address: {}",
                addr.ip()
            ));
        }
    }

    Ok(())
}

/// DNS resolver for the probe client that refuses names resolving to private addresses.
///
/// reqwest calls it for every connection, redirect hops included. Literal IP hosts skip
/// DNS and are covered by [`is_blocked_host`] instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct PublicOnlyResolver;

impl Resolve for PublicOnlyResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(resolve_public(name.as_str().to_string()))
    }
}

async fn resolve_public(host: String) -> Result<Addrs, BoxError> {
    let addrs: Vec<SocketAddr> = lookup_host((host.as_str(), 0)).await?.collect();
    if let Some(addr) = addrs.iter().find(|a| is_private_ip(&a.ip())) {
        tracing::warn!(host = %host, ip = %addr.ip(), "Image probe refused private address");
        return Err(format!("{} resolves to private address {}", host, addr.ip()).into());
    }
    Ok(Box::new(addrs.into_iter()))
}

/// Synchronous part of the guard: literal IPs and well-known internal hostnames.
///
/// Used on redirect hops before any connection is attempted.
pub fn is_blocked_host(url: &Url) -> bool {
    if let Some(ip) = host_ip(url) {
        return is_private_ip(&ip);
    }

    let host = url.host_str().unwrap_or_default().to_lowercase();
    host.is_empty()
        || host == "localhost"
        || host.ends_with(".localhost")
        || host.ends_with(".local")
        || host.ends_with(".internal")
        || host.ends_with(".corp")
}

fn host_ip(url: &Url) -> Option<IpAddr> {
    match url.host()? {
        url::Host::Ipv4(v4) => Some(IpAddr::V4(v4)),
        url::Host::Ipv6(v6) => Some(IpAddr::V6(v6)),
        url::Host::Domain(_) => None,
    }
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            let octets = ipv4.octets();
            octets[0] == 10
                || (octets[0] == 172 && (16..=31).contains(&octets[1]))
                || (octets[0] == 192 && octets[1] == 168)
                || (octets[0] == 100 && (64..=127).contains(&octets[1]))
                || octets[0] == 127
                || (octets[0] == 169 && octets[1] == 254)
                || (224..=239).contains(&octets[0])
                || octets[0] == 0
                || ipv4.is_broadcast()
        }
        IpAddr::V6(ipv6) => {
            // IPv4-mapped addresses (::ffff:x.x.x.x) would bypass the V4-only checks
            if let Some(ipv4) = ipv6.to_ipv4_mapped() {
                return is_private_ip(&IpAddr::V4(ipv4));
            }
            ipv6.is_loopback()
                || ipv6.is_unspecified()
                || ipv6.is_multicast()
                || is_ipv6_link_local(ipv6)
                || is_ipv6_unique_local(ipv6)
        }
    }
}

fn is_ipv6_link_local(ip: &Ipv6Addr) -> bool {
    ip.segments()[0] & 0xffc0 == 0xfe80
}

fn is_ipv6_unique_local(ip: &Ipv6Addr) -> bool {
    ip.segments()[0] & 0xfe00 == 0xfc00
}
