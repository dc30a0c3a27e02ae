#![allow(dead_code)]
//! TCP server for hosting games

use super::peer::Peer;
use std::io;
use std::net::{SocketAddr, TcpListener};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

/// Default port for game servers
pub const DEFAULT_PORT: u16 = 5555;

/// A game server that accepts player connections
pub struct Server {
    /// Local address the server is bound to
    addr: SocketAddr,
    /// Channel to receive new peer connections
    new_peers_rx: Receiver<Peer>,
    /// Connected peers
    peers: Vec<Peer>,
    /// Running flag
    running: bool,
}

impl Server {
    /// Start a server on the given port (0 picks an ephemeral port).
    /// Binding a taken port is an error; there is one well-known port per
    /// host.
    pub fn start(port: u16) -> io::Result<Self> {
        let listener = TcpListener::bind(format!("0.0.0.0:{}", port))?;
        let addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;

        let (new_peers_tx, new_peers_rx) = channel();

        // Spawn acceptor thread
        thread::spawn(move || {
            accept_loop(listener, new_peers_tx);
        });

        Ok(Server {
            addr,
            new_peers_rx,
            peers: Vec::new(),
            running: true,
        })
    }

    /// Get the address the server is listening on
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the port the server is listening on
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Poll for new connections, received lines, and disconnections
    pub fn poll(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();

        // Accept new peers
        loop {
            match self.new_peers_rx.try_recv() {
                Ok(peer) => {
                    events.push(ServerEvent::PeerConnected { addr: peer.addr });
                    self.peers.push(peer);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.running = false;
                    break;
                }
            }
        }

        // Collect lines from peers and track disconnections
        let mut disconnected = Vec::new();
        for (i, peer) in self.peers.iter_mut().enumerate() {
            for line in peer.recv_all() {
                events.push(ServerEvent::LineReceived {
                    from: peer.addr,
                    line,
                });
            }
            if !peer.is_alive() {
                disconnected.push(i);
            }
        }

        // Remove disconnected peers (in reverse order to preserve indices)
        for i in disconnected.into_iter().rev() {
            let peer = self.peers.remove(i);
            events.push(ServerEvent::PeerDisconnected { addr: peer.addr });
        }

        events
    }

    /// Send a line to all connected peers
    pub fn broadcast(&self, line: &str) {
        for peer in &self.peers {
            let _ = peer.send(line);
        }
    }

    /// Send a line to a specific peer by address
    pub fn send_to(&self, addr: SocketAddr, line: &str) -> io::Result<()> {
        for peer in &self.peers {
            if peer.addr == addr {
                return peer.send(line);
            }
        }
        Err(io::Error::new(io::ErrorKind::NotFound, "peer not found"))
    }

    /// Drop a peer, closing its connection
    pub fn drop_peer(&mut self, addr: SocketAddr) {
        self.peers.retain(|p| p.addr != addr);
    }

    /// Get the number of connected peers
    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Get addresses of all connected peers, in accept order
    pub fn peer_addrs(&self) -> Vec<SocketAddr> {
        self.peers.iter().map(|p| p.addr).collect()
    }

    /// Check if the server is still running
    pub fn is_running(&self) -> bool {
        self.running
    }
}

/// Events from the server
#[derive(Debug, Clone)]
pub enum ServerEvent {
    /// A new peer connected
    PeerConnected { addr: SocketAddr },
    /// A peer disconnected
    PeerDisconnected { addr: SocketAddr },
    /// A line was received from a peer
    LineReceived { from: SocketAddr, line: String },
}

fn accept_loop(listener: TcpListener, tx: Sender<Peer>) {
    loop {
        match listener.accept() {
            Ok((stream, _addr)) => {
                if let Ok(peer) = Peer::new(stream) {
                    if tx.send(peer).is_err() {
                        break;
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(50));
            }
            Err(_) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_starts_on_ephemeral_port() {
        let server = Server::start(0);
        assert!(server.is_ok());
        let server = server.unwrap();
        assert_ne!(server.port(), 0);
        assert!(server.is_running());
    }

    #[test]
    fn test_server_accepts_connection_and_receives_lines() {
        let mut server = Server::start(0).unwrap();
        let addr = server.addr();

        let client = Peer::connect(addr).unwrap();
        thread::sleep(Duration::from_millis(200));

        let events = server.poll();
        assert!(events
            .iter()
            .any(|e| matches!(e, ServerEvent::PeerConnected { .. })));
        assert_eq!(server.peer_count(), 1);

        client.send("draw").unwrap();
        thread::sleep(Duration::from_millis(300));

        let events = server.poll();
        assert!(events.iter().any(
            |e| matches!(e, ServerEvent::LineReceived { line, .. } if line == "draw")
        ));
    }

    #[test]
    fn test_server_broadcast_reaches_client() {
        let mut server = Server::start(0).unwrap();
        let addr = server.addr();

        let mut client = Peer::connect(addr).unwrap();
        thread::sleep(Duration::from_millis(200));
        server.poll();

        server.broadcast("--- GAME STARTING! ---");
        thread::sleep(Duration::from_millis(300));

        let lines = client.recv_all();
        assert!(lines.contains(&"--- GAME STARTING! ---".to_string()));
    }

    #[test]
    fn test_drop_peer_removes_connection() {
        let mut server = Server::start(0).unwrap();
        let addr = server.addr();

        let _client = Peer::connect(addr).unwrap();
        thread::sleep(Duration::from_millis(200));
        server.poll();
        assert_eq!(server.peer_count(), 1);

        let peer_addr = server.peers[0].addr;
        server.drop_peer(peer_addr);
        assert_eq!(server.peer_count(), 0);
    }
}
