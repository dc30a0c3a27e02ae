//! TCP client for joining games

use super::peer::Peer;
use super::server::DEFAULT_PORT;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};

/// A game client that connects to a server
pub struct Client {
    /// Connection to the server
    peer: Peer,
}

impl Client {
    /// Connect to a server at the given address
    ///
    /// The address can be:
    /// - "IP:PORT" (e.g., "192.168.1.100:5555")
    /// - "IP" (uses default port 5555)
    /// - "hostname:PORT"
    /// - "hostname" (uses default port)
    pub fn connect(addr: &str) -> io::Result<Self> {
        let socket_addr = parse_address(addr)?;
        let peer = Peer::connect(socket_addr)?;
        Ok(Client { peer })
    }

    /// Send a command line to the server
    pub fn send(&self, line: &str) -> io::Result<()> {
        self.peer.send(line)
    }

    /// Poll for incoming lines from the server
    pub fn poll(&mut self) -> Vec<String> {
        self.peer.recv_all()
    }

    /// Check if still connected
    pub fn is_connected(&self) -> bool {
        self.peer.is_alive()
    }
}

/// Parse an address string into a SocketAddr
///
/// Handles formats:
/// - "192.168.1.100:5555" -> parse directly
/// - "192.168.1.100" -> add default port
/// - "hostname:5555" -> resolve and use port
/// - "hostname" -> resolve and use default port
pub fn parse_address(addr: &str) -> io::Result<SocketAddr> {
    // Check if it already has a port
    if addr.contains(':') {
        addr.to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "could not resolve address"))
    } else {
        (addr, DEFAULT_PORT)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "could not resolve address"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address_with_port() {
        let addr = parse_address("127.0.0.1:6000").unwrap();
        assert_eq!(addr.port(), 6000);
    }

    #[test]
    fn test_parse_address_without_port_uses_default() {
        let addr = parse_address("127.0.0.1").unwrap();
        assert_eq!(addr.port(), DEFAULT_PORT);
    }

    #[test]
    fn test_parse_address_invalid() {
        assert!(parse_address("not an address").is_err());
    }
}
