use std::net::Ipv4Addr;

use local_ip_address::list_afinet_netifas;
use tracing::debug;

use super::{first_lan_ipv4, LocalAddressSource, OriginError};

/// Reads addresses from the host's network interfaces.
pub struct SystemInterfaces;

impl LocalAddressSource for SystemInterfaces {
    fn resolve_local_address(&self) -> Result<Ipv4Addr, OriginError> {
        let interfaces =
            list_afinet_netifas().map_err(|err| OriginError::Interfaces(err.to_string()))?;
        let ip = first_lan_ipv4(interfaces).ok_or(OriginError::NoLocalAddress)?;
        debug!(%ip, "resolved local LAN address");
        Ok(ip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolved_address_is_usable_when_present() {
        // CI containers may have no LAN interface at all.
        match SystemInterfaces.resolve_local_address() {
            Ok(ip) => {
                assert!(!ip.is_loopback());
                assert!(!ip.is_link_local());
            }
            Err(err) => assert!(matches!(
                err,
                OriginError::NoLocalAddress | OriginError::Interfaces(_)
            )),
        }
    }
}
