//! Lobby management and the serialized game loop
//!
//! Handles:
//! - Accepting connections until the game starts
//! - Seat assignment (seat index = join order, fixed at start)
//! - Host start signal (Enter on the server console) and auto-start at
//!   capacity
//! - Rejecting late joiners and over-capacity connections
//! - Running the game: one loop owns the `Session` and processes one
//!   inbound line at a time
//!
//! All engine mutations funnel through this loop. Connection reader
//! threads only enqueue lines onto channels; nothing outside the loop can
//! observe or touch game state mid-action.

use crate::game::session::{Outbound, Session};
use crate::game::Deck;
use crate::network::{Server, ServerEvent};
use std::io::{self, BufRead};
use std::net::SocketAddr;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

/// Minimum number of players to start a game
pub const MIN_PLAYERS: usize = 2;

/// Maximum number of players in a lobby
pub const MAX_PLAYERS: usize = 10;

/// How often the owning loop polls for new events
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Host a game: run the lobby until it starts, then run the session to
/// completion. The process serves exactly one game.
pub fn run(port: u16) -> io::Result<()> {
    let mut server = Server::start(port)?;
    log::info!(
        "lobby open on port {}, waiting for at least {} players (max {})",
        server.port(),
        MIN_PLAYERS,
        MAX_PLAYERS
    );

    let start_rx = spawn_host_start_listener();
    let mut seats: Vec<SocketAddr> = Vec::new();
    let mut prompted = false;

    loop {
        for event in server.poll() {
            match event {
                ServerEvent::PeerConnected { addr } => {
                    if seats.len() >= MAX_PLAYERS {
                        let _ = server.send_to(addr, "Sorry, the lobby is full.");
                        server.drop_peer(addr);
                        log::warn!("rejected {}: lobby is full", addr);
                        continue;
                    }
                    seats.push(addr);
                    let seat_no = seats.len();
                    log::info!("Player {} connected from {}", seat_no, addr);
                    let _ = server.send_to(addr, &format!("Welcome, Player {}!", seat_no));
                    server.broadcast(&format!(
                        "Player {} has joined the lobby. ({}/{})",
                        seat_no,
                        seats.len(),
                        MAX_PLAYERS
                    ));
                }
                ServerEvent::PeerDisconnected { addr } => {
                    if let Some(i) = seats.iter().position(|a| *a == addr) {
                        seats.remove(i);
                        log::info!("a player left the lobby ({} remaining)", seats.len());
                    }
                }
                ServerEvent::LineReceived { .. } => {
                    // Pre-game chatter is ignored
                }
            }
        }

        if !server.is_running() {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "listener stopped before the game started",
            ));
        }

        if seats.len() == MAX_PLAYERS {
            log::info!("max players reached, starting game automatically");
            server.broadcast("Max players reached! Starting game automatically...");
            break;
        }

        if seats.len() >= MIN_PLAYERS && !prompted {
            log::info!(
                "{} players are in. Press Enter to start the game...",
                seats.len()
            );
            prompted = true;
        }

        match start_rx.try_recv() {
            Ok(()) if seats.len() >= MIN_PLAYERS => {
                log::info!("host started the game");
                server.broadcast(&format!(
                    "The host has started the game with {} players!",
                    seats.len()
                ));
                break;
            }
            Ok(()) => {
                log::warn!(
                    "not enough players to start ({}/{})",
                    seats.len(),
                    MIN_PLAYERS
                );
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {}
        }

        thread::sleep(POLL_INTERVAL);
    }

    run_game(server, seats)
}

/// The game loop: the single owner of the `Session`. Each received line is
/// dispatched and its outbound messages delivered before the next event is
/// taken, making every action one atomic step.
fn run_game(mut server: Server, seats: Vec<SocketAddr>) -> io::Result<()> {
    log::info!("starting game with {} players", seats.len());

    let (mut session, out) = Session::start(seats.len(), Deck::new());
    deliver(&server, &seats, out);

    while session.is_running() {
        for event in server.poll() {
            match event {
                ServerEvent::LineReceived { from, line } => {
                    if let Some(seat) = seats.iter().position(|a| *a == from) {
                        let out = session.handle_line(seat, &line);
                        deliver(&server, &seats, out);
                    }
                }
                ServerEvent::PeerDisconnected { addr } => {
                    if let Some(seat) = seats.iter().position(|a| *a == addr) {
                        log::warn!("Player {} disconnected", seat + 1);
                        let out = session.handle_disconnect(seat);
                        deliver(&server, &seats, out);
                    }
                }
                ServerEvent::PeerConnected { addr } => {
                    let _ = server.send_to(addr, "Sorry, the game has already started.");
                    server.drop_peer(addr);
                    log::warn!("rejected late joiner {}", addr);
                }
            }
            if !session.is_running() {
                break;
            }
        }
        thread::sleep(POLL_INTERVAL);
    }

    // Let the writer threads drain the final announcements
    thread::sleep(Duration::from_millis(200));
    log::info!("game over, server finished");
    Ok(())
}

/// Write the engine's outbound messages to the sockets. Broadcasts go to
/// every peer; targeted lines go to the seat's connection.
fn deliver(server: &Server, seats: &[SocketAddr], out: Vec<Outbound>) {
    for msg in out {
        match msg {
            Outbound::Broadcast(line) => server.broadcast(&line),
            Outbound::To(seat, line) => {
                if let Some(addr) = seats.get(seat) {
                    let _ = server.send_to(*addr, &line);
                }
            }
        }
    }
}

/// Read the server console; every Enter press is a start signal.
fn spawn_host_start_listener() -> Receiver<()> {
    let (tx, rx) = channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            if line.is_err() {
                break;
            }
            if tx.send(()).is_err() {
                break;
            }
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::peer::Peer;

    #[test]
    fn test_player_count_limits() {
        assert!(MIN_PLAYERS >= 2);
        assert!(MAX_PLAYERS <= 10);
        assert!(MIN_PLAYERS <= MAX_PLAYERS);
    }

    #[test]
    fn test_deliver_routes_broadcast_and_targeted_lines() {
        let mut server = Server::start(0).unwrap();
        let addr = server.addr();

        let mut alice = Peer::connect(addr).unwrap();
        let mut bob = Peer::connect(addr).unwrap();
        thread::sleep(Duration::from_millis(300));
        server.poll();
        assert_eq!(server.peer_count(), 2);

        // Seat order mirrors the server's accept order
        let seats = server.peer_addrs();
        deliver(
            &server,
            &seats,
            vec![
                Outbound::Broadcast("It is Player 1's turn.".to_string()),
                Outbound::To(0, "YOUR_TURN".to_string()),
            ],
        );
        thread::sleep(Duration::from_millis(300));

        let first = alice.recv_all();
        let second = bob.recv_all();
        // Both got the broadcast; only one connection got the prompt
        assert!(first.contains(&"It is Player 1's turn.".to_string()));
        assert!(second.contains(&"It is Player 1's turn.".to_string()));
        let prompts = first
            .iter()
            .chain(second.iter())
            .filter(|l| l.as_str() == "YOUR_TURN")
            .count();
        assert_eq!(prompts, 1);
    }
}
