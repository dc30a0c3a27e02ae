//! Authoritative game session: turn state machine and per-seat dispatch
//!
//! The session owns every piece of shared game state (deck, hands, top
//! card, turn pointer, direction, per-seat interaction sub-state) and is
//! mutated exclusively through `handle_line` / `handle_disconnect`, one
//! inbound message at a time. It performs no I/O: every call returns the
//! `Outbound` messages the owning loop must deliver, which keeps the whole
//! rule set testable without sockets.

use super::rules::{is_playable, legal_moves};
use super::{Card, CardType, Color, Deck, Hand, Rank};
use crate::network::protocol::{Command, ServerLine};
use thiserror::Error;

/// Cards dealt to each seat at the start of the game.
pub const STARTING_HAND: usize = 7;

/// Turn rotation direction, flipped by Reverse cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Clockwise,
    CounterClockwise,
}

impl Direction {
    pub fn flip(self) -> Direction {
        match self {
            Direction::Clockwise => Direction::CounterClockwise,
            Direction::CounterClockwise => Direction::Clockwise,
        }
    }
}

/// Interaction sub-state of one seat.
///
/// At most one seat is in a non-`Playing` state at a time, and it is
/// always the active seat; the side states narrow which inputs that seat
/// may send until they resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeatState {
    /// Normal dispatch: `play <n>` / `draw` when it is this seat's turn.
    Playing,
    /// Just played a Wild/Draw4; only a color token is accepted.
    ChoosingColor,
    /// Just drew a playable card; only `p` or `k` is accepted.
    DrawChoice,
}

/// A message the owning loop must deliver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// One line to every connected seat.
    Broadcast(String),
    /// One line to a single seat.
    To(usize, String),
}

/// Per-seat rule violations. None are fatal to the session; each maps to a
/// reply line, usually followed by a re-issued prompt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error("It's not your turn.")]
    NotYourTurn,
    #[error("Invalid index. Try again.")]
    IndexOutOfRange,
    #[error("Cannot play {played}. It doesn't match {top}.")]
    IllegalCard { played: String, top: String },
    #[error("Invalid command. Use 'play N' where N is card number.")]
    MalformedPlay,
    #[error("Invalid command. (e.g., 'play 3' or 'draw')")]
    UnknownCommand,
    #[error("Invalid color. (RED, GREEN, BLUE, YELLOW)")]
    InvalidColor,
    #[error("Invalid choice. (p)lay or (k)eep?")]
    InvalidChoice,
}

/// One running game.
pub struct Session {
    hands: Vec<Hand>,
    deck: Deck,
    top_card: Card,
    turn: usize,
    direction: Direction,
    running: bool,
    seat_states: Vec<SeatState>,
}

impl Session {
    /// Deal a new game for `seats` players and return it together with the
    /// opening announcements and the first turn prompt.
    ///
    /// The starting top card is redrawn until it is a plain number card.
    pub fn start(seats: usize, mut deck: Deck) -> (Self, Vec<Outbound>) {
        deck.shuffle();

        let mut hands: Vec<Hand> = (0..seats).map(|_| Hand::new()).collect();
        for hand in &mut hands {
            for _ in 0..STARTING_HAND {
                hand.add(deck.deal());
            }
        }

        let mut top_card = deck.deal();
        while top_card.kind() != CardType::Number {
            deck.put_back(top_card);
            deck.shuffle();
            top_card = deck.deal();
        }

        let session = Session {
            hands,
            deck,
            top_card,
            turn: 0,
            direction: Direction::Clockwise,
            running: true,
            seat_states: vec![SeatState::Playing; seats],
        };

        let mut out = vec![
            Outbound::Broadcast("--- GAME STARTING! ---".to_string()),
            Outbound::Broadcast(format!("All {} players have joined.", seats)),
        ];
        session.notify_turn(&mut out);
        (session, out)
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Dispatch one inbound line from a seat.
    ///
    /// The seat's sub-state picks the handler; in the normal state only the
    /// active seat's commands are accepted. Each call is one atomic step
    /// against the session state.
    pub fn handle_line(&mut self, seat: usize, line: &str) -> Vec<Outbound> {
        let mut out = Vec::new();
        let line = line.trim();
        if line.is_empty() || !self.running {
            return out;
        }

        match self.seat_states[seat] {
            SeatState::ChoosingColor => self.color_choice(seat, line, &mut out),
            SeatState::DrawChoice => self.draw_choice(seat, line, &mut out),
            SeatState::Playing if seat != self.turn => {
                out.push(Outbound::To(seat, TurnError::NotYourTurn.to_string()));
            }
            SeatState::Playing => match Command::parse(line) {
                Command::Play(place) => self.play_card(seat, place, &mut out),
                Command::Draw => self.player_draws(seat, &mut out),
                Command::MalformedPlay => {
                    out.push(Outbound::To(seat, TurnError::MalformedPlay.to_string()));
                    out.push(Outbound::To(seat, ServerLine::YourTurn.to_line()));
                }
                Command::Unknown => {
                    out.push(Outbound::To(seat, TurnError::UnknownCommand.to_string()));
                    out.push(Outbound::To(seat, ServerLine::YourTurn.to_line()));
                }
            },
        }
        out
    }

    /// A seat's transport closed. The session cannot continue with fewer
    /// players: announce and halt.
    pub fn handle_disconnect(&mut self, seat: usize) -> Vec<Outbound> {
        let mut out = Vec::new();
        if self.running {
            self.running = false;
            out.push(Outbound::Broadcast(format!(
                "Player {} has left. The game cannot continue.",
                seat + 1
            )));
        }
        out
    }

    /// The seat one step along the current direction from `seat`.
    fn step(&self, seat: usize) -> usize {
        let n = self.hands.len();
        match self.direction {
            Direction::Clockwise => (seat + 1) % n,
            Direction::CounterClockwise => (seat + n - 1) % n,
        }
    }

    /// The single turn-advance operation: one step per simple play, called
    /// twice for Skip/Draw2/Draw4.
    fn advance(&mut self) {
        self.turn = self.step(self.turn);
    }

    fn play_card(&mut self, seat: usize, place: usize, out: &mut Vec<Outbound>) {
        let Some(&played) = self.hands[seat].get(place) else {
            out.push(Outbound::To(seat, TurnError::IndexOutOfRange.to_string()));
            out.push(Outbound::To(seat, ServerLine::YourTurn.to_line()));
            return;
        };

        if !is_playable(&self.top_card, &played) {
            let err = TurnError::IllegalCard {
                played: played.to_string(),
                top: self.top_card.to_string(),
            };
            out.push(Outbound::To(seat, err.to_string()));
            out.push(Outbound::To(seat, ServerLine::YourTurn.to_line()));
            return;
        }

        self.hands[seat].remove(place);
        self.finish_play(seat, played, out, false);
    }

    /// Shared tail of the normal play path and the drawn-card play path:
    /// the card is already validated and removed from the hand.
    fn finish_play(&mut self, seat: usize, played: Card, out: &mut Vec<Outbound>, drawn: bool) {
        self.top_card = played;
        let verb = if drawn { "played the drawn card" } else { "played" };
        out.push(Outbound::Broadcast(format!(
            "Player {} {}: {}",
            seat + 1,
            verb,
            played
        )));

        if self.hands[seat].is_empty() {
            self.announce_win(seat, out);
            return;
        }
        if self.hands[seat].len() == 1 {
            out.push(Outbound::Broadcast(format!("Player {} yells UNO!", seat + 1)));
        }

        self.apply_effect(seat, played, out);

        if self.running && self.seat_states[seat] == SeatState::Playing {
            self.notify_turn(out);
        }
    }

    /// The effect table for a card that just landed on top of the discard.
    fn apply_effect(&mut self, seat: usize, played: Card, out: &mut Vec<Outbound>) {
        match played.rank {
            Rank::Skip => {
                let target = self.step(self.turn);
                out.push(Outbound::Broadcast(format!("Player {} is skipped!", target + 1)));
                self.advance();
                self.advance();
            }
            Rank::Reverse => {
                self.direction = self.direction.flip();
                out.push(Outbound::Broadcast("Direction REVERSED!".to_string()));
                self.advance();
            }
            Rank::DrawTwo => {
                let target = self.step(self.turn);
                out.push(Outbound::Broadcast(format!("Player {} draws 2 cards!", target + 1)));
                for _ in 0..2 {
                    let card = self.deck.deal();
                    self.hands[target].add(card);
                }
                self.send_hand(target, out);
                self.advance();
                self.advance();
            }
            Rank::Wild | Rank::DrawFour => {
                // Hold the turn pointer until the color is supplied.
                self.seat_states[seat] = SeatState::ChoosingColor;
                out.push(Outbound::To(seat, ServerLine::ChooseColor.to_line()));
            }
            _ => {
                self.advance();
            }
        }
    }

    fn color_choice(&mut self, seat: usize, line: &str, out: &mut Vec<Outbound>) {
        let Some(color) = Color::parse(line) else {
            out.push(Outbound::To(seat, TurnError::InvalidColor.to_string()));
            out.push(Outbound::To(seat, ServerLine::ChooseColor.to_line()));
            return;
        };

        self.seat_states[seat] = SeatState::Playing;
        self.top_card.color = Some(color);
        out.push(Outbound::Broadcast(format!(
            "Player {} chose {}.",
            seat + 1,
            color
        )));

        if self.top_card.rank == Rank::DrawFour {
            let target = self.step(self.turn);
            out.push(Outbound::Broadcast(format!("Player {} draws 4 cards!", target + 1)));
            for _ in 0..4 {
                let card = self.deck.deal();
                self.hands[target].add(card);
            }
            self.send_hand(target, out);
            self.advance();
            self.advance();
        } else {
            self.advance();
        }

        if self.running {
            self.notify_turn(out);
        }
    }

    fn player_draws(&mut self, seat: usize, out: &mut Vec<Outbound>) {
        let card = self.deck.deal();
        self.hands[seat].add(card);
        out.push(Outbound::Broadcast(format!("Player {} draws a card.", seat + 1)));
        out.push(Outbound::To(seat, format!("You drew: {}", card)));

        if is_playable(&self.top_card, &card) {
            out.push(Outbound::To(
                seat,
                "You can play this card! (p)lay or (k)eep?".to_string(),
            ));
            self.send_hand(seat, out);
            let place = self.hands[seat].len();
            out.push(Outbound::To(seat, ServerLine::ValidMoves(vec![place]).to_line()));
            out.push(Outbound::To(seat, ServerLine::DrawChoice.to_line()));
            self.seat_states[seat] = SeatState::DrawChoice;
        } else {
            out.push(Outbound::To(seat, "You cannot play this card.".to_string()));
            self.advance();
            if self.running {
                self.notify_turn(out);
            }
        }
    }

    fn draw_choice(&mut self, seat: usize, line: &str, out: &mut Vec<Outbound>) {
        if line.eq_ignore_ascii_case("p") {
            self.seat_states[seat] = SeatState::Playing;
            let place = self.hands[seat].len();
            let drawn = self.hands[seat].remove(place).expect("drawn card present");
            self.finish_play(seat, drawn, out, true);
        } else if line.eq_ignore_ascii_case("k") {
            self.seat_states[seat] = SeatState::Playing;
            out.push(Outbound::Broadcast(format!("Player {} keeps the card.", seat + 1)));
            self.advance();
            if self.running {
                self.notify_turn(out);
            }
        } else {
            out.push(Outbound::To(seat, TurnError::InvalidChoice.to_string()));
            out.push(Outbound::To(seat, ServerLine::DrawChoice.to_line()));
        }
    }

    fn announce_win(&mut self, seat: usize, out: &mut Vec<Outbound>) {
        out.push(Outbound::Broadcast("--- GAME OVER ---".to_string()));
        out.push(Outbound::Broadcast(format!("PLAYER {} WINS!", seat + 1)));
        self.running = false;
    }

    /// Announce the new turn to everyone and prompt the active seat with
    /// its hand and legal positions.
    fn notify_turn(&self, out: &mut Vec<Outbound>) {
        out.push(Outbound::Broadcast(format!("Top card is now: {}", self.top_card)));
        out.push(Outbound::Broadcast(format!(
            "It is Player {}'s turn.",
            self.turn + 1
        )));

        out.push(Outbound::To(
            self.turn,
            ServerLine::TopCard(self.top_card.to_string()).to_line(),
        ));
        self.send_hand(self.turn, out);

        let moves = legal_moves(&self.top_card, &self.hands[self.turn]);
        if moves.is_empty() {
            out.push(Outbound::To(self.turn, ServerLine::NoValidMoves.to_line()));
        } else {
            out.push(Outbound::To(self.turn, ServerLine::ValidMoves(moves).to_line()));
        }

        out.push(Outbound::To(self.turn, ServerLine::YourTurn.to_line()));
    }

    fn send_hand(&self, seat: usize, out: &mut Vec<Outbound>) {
        out.push(Outbound::To(seat, ServerLine::HandHeader.to_line()));
        for (i, card) in self.hands[seat].cards().iter().enumerate() {
            let entry = ServerLine::HandEntry {
                place: i + 1,
                card: card.to_string(),
            };
            out.push(Outbound::To(seat, entry.to_line()));
        }
        out.push(Outbound::To(seat, ServerLine::HandFooter.to_line()));
    }
}
