//! Network helpers

use std::net::{IpAddr, Ipv4Addr, UdpSocket};

/// Best guess at the host's LAN address
///
/// Connecting a UDP socket sends nothing; it only asks the OS which local
/// interface routes outward. Falls back to loopback.
pub fn local_ipv4() -> IpAddr {
    UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .and_then(|socket| {
            socket.connect((Ipv4Addr::new(8, 8, 8, 8), 80))?;
            socket.local_addr()
        })
        .map(|addr| addr.ip())
        .ok()
        .filter(|ip| ip.is_ipv4() && !ip.is_unspecified())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}
