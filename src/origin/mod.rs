//! Local-origin trust check.
//!
//! A request is "local" when its peer host is `localhost`, `127.0.0.1`, or the
//! server's own LAN IPv4 address. This compares IP strings only, so anything
//! able to spoof a source address on the LAN passes the check. It gates the
//! destructive flush endpoint of a LAN tool and is not an authentication
//! mechanism.

use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use thiserror::Error;

pub mod interfaces;

const LOOPBACK_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

#[derive(Debug, Error)]
pub enum OriginError {
    #[error("local IP not found")]
    NoLocalAddress,
    #[error("failed to enumerate network interfaces: {0}")]
    Interfaces(String),
    #[error("invalid peer address {0:?}")]
    InvalidPeer(String),
}

pub trait LocalAddressSource: Send + Sync {
    /// Returns the host's LAN IPv4 address.
    fn resolve_local_address(&self) -> Result<Ipv4Addr, OriginError>;
}

#[derive(Clone)]
pub struct OriginResolver {
    source: Arc<dyn LocalAddressSource>,
}

impl OriginResolver {
    pub fn new(source: Arc<dyn LocalAddressSource>) -> Self {
        Self { source }
    }

    pub fn system() -> Self {
        Self::new(Arc::new(interfaces::SystemInterfaces))
    }

    pub fn resolve_local_address(&self) -> Result<Ipv4Addr, OriginError> {
        self.source.resolve_local_address()
    }

    /// Decides whether `peer` (a `host:port` socket address) is this machine.
    ///
    /// Loopback hosts are accepted without touching the network interfaces;
    /// any other host is compared against a freshly resolved LAN address.
    pub fn is_local(&self, peer: &str) -> Result<bool, OriginError> {
        let host = split_host(peer)?;
        if LOOPBACK_HOSTS.contains(&host) {
            return Ok(true);
        }

        let local = self.resolve_local_address()?;
        Ok(host == local.to_string())
    }
}

/// Strips the port from `host:port` or `[host]:port`.
pub fn split_host(peer: &str) -> Result<&str, OriginError> {
    let invalid = || OriginError::InvalidPeer(peer.to_string());

    if let Some(rest) = peer.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(invalid)?;
        if !tail.starts_with(':') || host.contains('[') {
            return Err(invalid());
        }
        return Ok(host);
    }

    let (host, _port) = peer.rsplit_once(':').ok_or_else(invalid)?;
    if host.contains(':') || host.contains(']') {
        return Err(invalid());
    }
    Ok(host)
}

/// Picks the first IPv4 address that is neither loopback nor link-local.
pub fn first_lan_ipv4<I>(addresses: I) -> Option<Ipv4Addr>
where
    I: IntoIterator<Item = (String, IpAddr)>,
{
    addresses.into_iter().find_map(|(_, ip)| match ip {
        IpAddr::V4(v4) if !v4.is_loopback() && !v4.is_link_local() => Some(v4),
        _ => None,
    })
}
