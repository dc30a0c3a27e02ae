//! Wire protocol: newline-framed UTF-8 text lines
//!
//! Server -> client traffic mixes structured lines (consumed
//! programmatically by the client) with free-text announcements. Client ->
//! server commands are plain words. TCP gives no message boundaries, so
//! both sides run the same buffered framing: raw bytes accumulate in a
//! `LineBuffer` and complete `\n`-terminated lines are split off, with any
//! trailing fragment carried over into the next read.

/// Structured server -> client lines.
///
/// `to_line` and `parse` are inverses for every structured variant; any
/// line that matches no structured form parses as an `Announcement`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerLine {
    /// Current top card, e.g. `TOP_CARD:RED 5`.
    TopCard(String),
    /// Opening line of the hand listing.
    HandHeader,
    /// One hand entry, e.g. ` 3.GREEN Skip` (1-indexed).
    HandEntry { place: usize, card: String },
    /// Closing line of the hand listing.
    HandFooter,
    /// 1-indexed legal positions, e.g. `VALID_MOVES:1,3,5`.
    ValidMoves(Vec<usize>),
    NoValidMoves,
    /// Prompt opening the normal play sub-state.
    YourTurn,
    /// Prompt opening the color-choice sub-state.
    ChooseColor,
    /// Prompt opening the play-or-keep sub-state.
    DrawChoice,
    /// Free-text broadcast; no fixed grammar beyond being a single line.
    Announcement(String),
}

impl ServerLine {
    /// Render as a wire line (without the trailing newline).
    pub fn to_line(&self) -> String {
        match self {
            ServerLine::TopCard(card) => format!("TOP_CARD:{}", card),
            ServerLine::HandHeader => "--- Your Hand ---".to_string(),
            ServerLine::HandEntry { place, card } => format!(" {}.{}", place, card),
            ServerLine::HandFooter => "-----------------".to_string(),
            ServerLine::ValidMoves(moves) => {
                let csv: Vec<String> = moves.iter().map(|m| m.to_string()).collect();
                format!("VALID_MOVES:{}", csv.join(","))
            }
            ServerLine::NoValidMoves => "NO_VALID_MOVES".to_string(),
            ServerLine::YourTurn => "YOUR_TURN".to_string(),
            ServerLine::ChooseColor => "CHOOSE_COLOR".to_string(),
            ServerLine::DrawChoice => "DRAW_CHOICE".to_string(),
            ServerLine::Announcement(text) => text.clone(),
        }
    }

    /// Classify a received line.
    pub fn parse(line: &str) -> ServerLine {
        if let Some(card) = line.strip_prefix("TOP_CARD:") {
            return ServerLine::TopCard(card.to_string());
        }
        if let Some(csv) = line.strip_prefix("VALID_MOVES:") {
            let moves: Vec<usize> = csv.split(',').filter_map(|s| s.trim().parse().ok()).collect();
            return ServerLine::ValidMoves(moves);
        }
        match line {
            "--- Your Hand ---" => return ServerLine::HandHeader,
            "-----------------" => return ServerLine::HandFooter,
            "NO_VALID_MOVES" => return ServerLine::NoValidMoves,
            "YOUR_TURN" => return ServerLine::YourTurn,
            "CHOOSE_COLOR" => return ServerLine::ChooseColor,
            "DRAW_CHOICE" => return ServerLine::DrawChoice,
            _ => {}
        }
        if let Some(entry) = parse_hand_entry(line) {
            return entry;
        }
        ServerLine::Announcement(line.to_string())
    }
}

/// Hand entries look like ` 3.GREEN Skip`: a leading space, a 1-indexed
/// position, a dot, then the card rendering.
fn parse_hand_entry(line: &str) -> Option<ServerLine> {
    let rest = line.strip_prefix(' ')?;
    let (place, card) = rest.split_once('.')?;
    let place: usize = place.parse().ok()?;
    Some(ServerLine::HandEntry {
        place,
        card: card.to_string(),
    })
}

/// A client command while in the normal play sub-state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `play <n>` with a 1-indexed hand position.
    Play(usize),
    /// `draw`.
    Draw,
    /// `play` with a missing or non-numeric position.
    MalformedPlay,
    /// Anything else.
    Unknown,
}

impl Command {
    /// Parse an already-trimmed input line.
    pub fn parse(line: &str) -> Command {
        if line == "draw" {
            return Command::Draw;
        }
        if let Some(rest) = line.strip_prefix("play ") {
            return match rest.split_whitespace().next().and_then(|n| n.parse().ok()) {
                Some(place) => Command::Play(place),
                None => Command::MalformedPlay,
            };
        }
        Command::Unknown
    }
}

/// Buffered line framing with carry-over.
///
/// Feed raw reads in with `extend`; pull complete lines out with
/// `next_line`. Bytes after the last `\n` stay buffered until the rest of
/// the line arrives.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        LineBuffer { buf: Vec::new() }
    }

    /// Append raw bytes from a read.
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Split off the next complete line, without its terminator. Returns
    /// `None` while only a partial line is buffered.
    pub fn next_line(&mut self) -> Option<String> {
        let pos = self.buf.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.buf.drain(..=pos).take(pos).collect();
        let mut line = String::from_utf8_lossy(&line).into_owned();
        if line.ends_with('\r') {
            line.pop();
        }
        Some(line)
    }
}
