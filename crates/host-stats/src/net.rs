//! Network identity lookups.
//!
//! Two small facilities the host uses to describe itself and its clients:
//! the non-loopback IPv4 addresses of local interfaces (enumerated once,
//! cached for the process lifetime), and the textual local/peer address of
//! an open socket handle (single-call wrappers, no retry, no caching).

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::sync::OnceLock;

use sysinfo::Networks;
use tracing::{debug, warn};

static LOCAL_IPV4: OnceLock<Vec<IpAddr>> = OnceLock::new();

/// Non-loopback IPv4 addresses of local interfaces, in enumeration order.
///
/// Enumerated on the first call and cached for the process lifetime - the
/// result (even an empty one) is reused on every subsequent call, so late
/// interface changes are never observed.
pub fn local_ipv4_addresses() -> &'static [IpAddr] {
    LOCAL_IPV4.get_or_init(enumerate_local_ipv4).as_slice()
}

fn enumerate_local_ipv4() -> Vec<IpAddr> {
    let networks = Networks::new_with_refreshed_list();
    let mut ips = Vec::new();
    for (name, data) in networks.iter() {
        for ip in data.ip_networks() {
            if ip.addr.is_ipv4() && !ip.addr.is_loopback() {
                debug!(interface = %name, address = %ip.addr, "local ipv4 address");
                ips.push(ip.addr);
            }
        }
    }
    if ips.is_empty() {
        warn!("no non-loopback ipv4 addresses found");
    }
    ips
}

/// A connection handle whose endpoint addresses can be queried.
///
/// Implemented for the socket types the host hands around; the lookups
/// below are generic over this so they serve both sync and tokio sockets.
pub trait SocketAddressed {
    /// Address of the local end of the handle.
    fn local_addr(&self) -> io::Result<SocketAddr>;

    /// Address of the remote peer of the handle.
    fn peer_addr(&self) -> io::Result<SocketAddr>;
}

impl SocketAddressed for std::net::TcpStream {
    fn local_addr(&self) -> io::Result<SocketAddr> {
        std::net::TcpStream::local_addr(self)
    }

    fn peer_addr(&self) -> io::Result<SocketAddr> {
        std::net::TcpStream::peer_addr(self)
    }
}

impl SocketAddressed for std::net::UdpSocket {
    fn local_addr(&self) -> io::Result<SocketAddr> {
        std::net::UdpSocket::local_addr(self)
    }

    fn peer_addr(&self) -> io::Result<SocketAddr> {
        std::net::UdpSocket::peer_addr(self)
    }
}

impl SocketAddressed for tokio::net::TcpStream {
    fn local_addr(&self) -> io::Result<SocketAddr> {
        tokio::net::TcpStream::local_addr(self)
    }

    fn peer_addr(&self) -> io::Result<SocketAddr> {
        tokio::net::TcpStream::peer_addr(self)
    }
}

/// Textual IP (v4 or v6, no port) of the local end of `sock`, or the empty
/// string when the handle cannot report one. Never panics.
#[must_use]
pub fn local_address_of<S: SocketAddressed + ?Sized>(sock: &S) -> String {
    match sock.local_addr() {
        Ok(addr) => addr.ip().to_string(),
        Err(e) => {
            debug!(error = %e, "local address lookup failed");
            String::new()
        }
    }
}

/// Textual IP (v4 or v6, no port) of the remote peer of `sock`, or the
/// empty string when the handle cannot report one. Never panics.
#[must_use]
pub fn peer_address_of<S: SocketAddressed + ?Sized>(sock: &S) -> String {
    match sock.peer_addr() {
        Ok(addr) => addr.ip().to_string(),
        Err(e) => {
            debug!(error = %e, "peer address lookup failed");
            String::new()
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, TcpListener, TcpStream, UdpSocket};

    #[test]
    fn test_local_ipv4_excludes_loopback() {
        let loopback = IpAddr::V4(Ipv4Addr::LOCALHOST);
        assert!(
            !local_ipv4_addresses().contains(&loopback),
            "loopback must be filtered out"
        );
    }

    #[test]
    fn test_local_ipv4_is_cached() {
        let first = local_ipv4_addresses();
        let second = local_ipv4_addresses();
        assert!(
            std::ptr::eq(first.as_ptr(), second.as_ptr()),
            "second call must return the cached slice, not a re-enumeration"
        );
        assert_eq!(first, second);
    }

    #[test]
    fn test_local_ipv4_all_v4() {
        assert!(local_ipv4_addresses().iter().all(IpAddr::is_ipv4));
    }

    #[test]
    fn test_addresses_of_connected_tcp_pair() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind listener");
        let addr = listener.local_addr().expect("listener addr");
        let client = TcpStream::connect(addr).expect("connect");
        let (server, _) = listener.accept().expect("accept");

        assert_eq!(local_address_of(&client), "127.0.0.1");
        assert_eq!(peer_address_of(&client), "127.0.0.1");
        assert_eq!(local_address_of(&server), "127.0.0.1");
        assert_eq!(peer_address_of(&server), "127.0.0.1");
    }

    #[test]
    fn test_peer_address_of_unconnected_socket_is_empty() {
        let socket = UdpSocket::bind("127.0.0.1:0").expect("bind socket");
        // No peer: the lookup fails and must degrade to an empty string.
        assert_eq!(peer_address_of(&socket), "");
        // The local end still reports.
        assert_eq!(local_address_of(&socket), "127.0.0.1");
    }
}
