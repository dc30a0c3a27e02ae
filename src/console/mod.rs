//! Console client: renders server state and forwards player input
//!
//! A thin wrapper over the wire protocol. It tracks the top card, the
//! latest hand listing, the advertised legal moves, and which prompt (if
//! any) is open, then gates stdin lines on that prompt so only sensible
//! commands reach the server. The server stays authoritative; this side
//! only decides what to show and when to ask.

use crate::network::protocol::ServerLine;
use crate::network::Client;
use crossterm::style::Stylize;
use std::io::{self, BufRead};
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;

/// Which input the client is currently being asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Prompt {
    /// Not our turn; typed lines are dropped.
    None,
    /// `play <n>` or `draw`.
    Turn,
    /// A color token.
    Color,
    /// `p` or `k`.
    Draw,
}

/// Client-side picture of the game, built from received lines.
#[derive(Debug, Default)]
struct View {
    top_card: String,
    hand: Vec<(usize, String)>,
    pending_hand: Vec<(usize, String)>,
    collecting_hand: bool,
    valid_moves: Vec<usize>,
}

/// Connect to a server and play until the game ends or the connection
/// drops.
pub fn run(addr: &str) -> io::Result<()> {
    let mut client = Client::connect(addr)?;
    println!("Connected to server! Waiting for game to start...");

    let input_rx = spawn_input_listener();
    let mut view = View::default();
    let mut prompt = Prompt::None;

    loop {
        for line in client.poll() {
            if let Some(next) = apply_server_line(&mut view, &line) {
                prompt = next;
                match prompt {
                    Prompt::Turn => println!("{}", render_turn(&view)),
                    Prompt::Color => println!("\nWhat color? (RED, GREEN, BLUE, YELLOW)"),
                    Prompt::Draw => println!("\nPlay the card you drew? (p)lay or (k)eep?"),
                    Prompt::None => {}
                }
            }
        }

        if !client.is_connected() {
            println!("Disconnected from server.");
            break;
        }

        match input_rx.try_recv() {
            Ok(line) => {
                if forward_input(&client, prompt, line.trim())? {
                    prompt = Prompt::None;
                }
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => break,
        }

        thread::sleep(Duration::from_millis(50));
    }

    Ok(())
}

/// Fold one received line into the view. Returns the prompt the line
/// opens, if any; announcements are printed as they arrive.
fn apply_server_line(view: &mut View, line: &str) -> Option<Prompt> {
    match ServerLine::parse(line) {
        ServerLine::TopCard(card) => view.top_card = card,
        ServerLine::HandHeader => {
            view.pending_hand.clear();
            view.collecting_hand = true;
        }
        ServerLine::HandEntry { place, card } if view.collecting_hand => {
            view.pending_hand.push((place, card));
        }
        ServerLine::HandFooter => {
            view.hand = std::mem::take(&mut view.pending_hand);
            view.collecting_hand = false;
        }
        ServerLine::ValidMoves(moves) => view.valid_moves = moves,
        ServerLine::NoValidMoves => view.valid_moves.clear(),
        ServerLine::YourTurn => return Some(Prompt::Turn),
        ServerLine::ChooseColor => return Some(Prompt::Color),
        ServerLine::DrawChoice => return Some(Prompt::Draw),
        ServerLine::HandEntry { .. } => {}
        ServerLine::Announcement(text) => {
            // The structured TOP_CARD line already carries this
            if !text.starts_with("Top card is now:") {
                println!("{}", text);
            }
        }
    }
    None
}

/// The full your-turn display: top card box, hand with legal positions
/// marked, and a suggestion line.
fn render_turn(view: &View) -> String {
    let mut s = String::new();
    s.push_str("\n=========================\n");
    s.push_str(&format!("   TOP CARD: {}\n", colorize(&view.top_card)));
    s.push_str("=========================\n\n");

    s.push_str("--- Your Hand ---\n");
    for (place, card) in &view.hand {
        s.push_str(&format!(" {}.{}", place, colorize(card)));
        if view.valid_moves.contains(place) {
            s.push_str("   <-- VALID");
        }
        s.push('\n');
    }
    s.push_str("-----------------\n\n");

    if view.valid_moves.is_empty() {
        s.push_str(">>> You have no valid cards. You must type 'draw'.");
    } else {
        s.push_str(">>> Type 'play N' (e.g., 'play 3') or 'draw'.");
    }
    s
}

/// Style a card rendering by its leading color token.
fn colorize(card: &str) -> String {
    match card.split(' ').next() {
        Some("RED") => card.red().to_string(),
        Some("GREEN") => card.green().to_string(),
        Some("BLUE") => card.blue().to_string(),
        Some("YELLOW") => card.yellow().to_string(),
        // Wild and Draw4 have no color until resolved
        _ => card.bold().to_string(),
    }
}

/// Gate a typed line on the open prompt and send it if it belongs.
/// Returns true when the line was sent (closing the prompt).
fn forward_input(client: &Client, prompt: Prompt, line: &str) -> io::Result<bool> {
    if line.is_empty() {
        return Ok(false);
    }
    match prompt {
        Prompt::None => Ok(false),
        Prompt::Turn => {
            if line.starts_with("play ") || line == "draw" {
                client.send(line)?;
                Ok(true)
            } else {
                println!("Invalid command. (e.g., 'play 3' or 'draw')");
                Ok(false)
            }
        }
        Prompt::Color | Prompt::Draw => {
            client.send(line)?;
            Ok(true)
        }
    }
}

/// Read stdin lines into a channel so the poll loop never blocks on input.
fn spawn_input_listener() -> Receiver<String> {
    let (tx, rx) = channel();
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}
