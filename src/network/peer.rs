//! Peer connection handling

use super::protocol::LineBuffer;
use std::io::{self, ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

/// A connected peer
///
/// Owns one reader thread and one writer thread for the socket; the
/// owning loop talks to them over channels, so it never blocks on the
/// network itself.
pub struct Peer {
    /// Peer's address
    pub addr: SocketAddr,
    /// Channel to send lines to this peer
    tx: Sender<String>,
    /// Channel to receive lines from this peer
    rx: Receiver<String>,
    /// Whether the connection is still alive
    alive: bool,
}

impl Peer {
    /// Create a new peer from a TCP stream
    pub fn new(stream: TcpStream) -> io::Result<Self> {
        let addr = stream.peer_addr()?;

        stream.set_nonblocking(false)?;
        stream.set_read_timeout(Some(Duration::from_millis(100)))?;
        stream.set_write_timeout(Some(Duration::from_secs(5)))?;

        let (outgoing_tx, outgoing_rx) = channel::<String>();
        let (incoming_tx, incoming_rx) = channel::<String>();

        let mut read_stream = stream.try_clone()?;
        let mut write_stream = stream;

        // Writer thread: frames each line with a trailing newline
        thread::spawn(move || {
            while let Ok(line) = outgoing_rx.recv() {
                let framed = format!("{}\n", line);
                if write_stream.write_all(framed.as_bytes()).is_err() {
                    break;
                }
                if write_stream.flush().is_err() {
                    break;
                }
            }
        });

        // Reader thread: TCP has no message boundaries, so raw reads go
        // through a LineBuffer that carries partial fragments over to the
        // next read.
        thread::spawn(move || {
            let mut buffer = LineBuffer::new();
            let mut chunk = [0u8; 1024];
            loop {
                match read_stream.read(&mut chunk) {
                    Ok(0) => break, // connection closed
                    Ok(n) => {
                        buffer.extend(&chunk[..n]);
                        while let Some(line) = buffer.next_line() {
                            if incoming_tx.send(line).is_err() {
                                return;
                            }
                        }
                    }
                    Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                        // Timeout, continue trying
                        continue;
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Peer {
            addr,
            tx: outgoing_tx,
            rx: incoming_rx,
            alive: true,
        })
    }

    /// Connect to a peer at the given address
    pub fn connect(addr: SocketAddr) -> io::Result<Self> {
        let stream = TcpStream::connect_timeout(&addr, Duration::from_secs(5))?;
        Self::new(stream)
    }

    /// Queue a line for sending to this peer
    pub fn send(&self, line: &str) -> io::Result<()> {
        self.tx
            .send(line.to_string())
            .map_err(|_| io::Error::new(ErrorKind::BrokenPipe, "peer disconnected"))
    }

    /// Try to receive a line from this peer (non-blocking)
    pub fn try_recv(&mut self) -> Option<String> {
        match self.rx.try_recv() {
            Ok(line) => Some(line),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.alive = false;
                None
            }
        }
    }

    /// Receive all pending lines from this peer
    pub fn recv_all(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        while let Some(line) = self.try_recv() {
            lines.push(line);
        }
        lines
    }

    /// Check if the peer connection is still alive
    pub fn is_alive(&self) -> bool {
        self.alive
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_peer_connect_and_send_line() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let peer = Peer::connect(addr).unwrap();
            peer.send("play 3").unwrap();
            thread::sleep(Duration::from_millis(100));
            peer
        });

        let (stream, _) = listener.accept().unwrap();
        let mut server_peer = Peer::new(stream).unwrap();

        thread::sleep(Duration::from_millis(300));

        let lines = server_peer.recv_all();
        assert!(lines.contains(&"play 3".to_string()));

        handle.join().unwrap();
    }

    #[test]
    fn test_coalesced_lines_arrive_separately() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let mut stream = TcpStream::connect(addr).unwrap();
            // Two commands in one write, plus a partial fragment completed
            // by a second write
            stream.write_all(b"draw\nplay 1\npl").unwrap();
            stream.flush().unwrap();
            thread::sleep(Duration::from_millis(100));
            stream.write_all(b"ay 2\n").unwrap();
            stream.flush().unwrap();
            thread::sleep(Duration::from_millis(200));
        });

        let (stream, _) = listener.accept().unwrap();
        let mut server_peer = Peer::new(stream).unwrap();

        thread::sleep(Duration::from_millis(500));

        let lines = server_peer.recv_all();
        assert_eq!(lines, vec!["draw", "play 1", "play 2"]);

        handle.join().unwrap();
    }
}
