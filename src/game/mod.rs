#![allow(dead_code)]
//! Game model: card identity, deck composition, player hands

pub mod rules;
pub mod session;

use once_cell::sync::Lazy;
use rand::prelude::*;
use rand::rngs::StdRng;
use std::fmt;

/// Number of cards in a freshly built deck:
/// 2 copies of each (color, colored rank) pair plus 4 Wild and 4 Draw4.
pub const DECK_SIZE: usize = 112;

/// The four card colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Blue,
    Yellow,
}

impl Color {
    /// All colors in display order.
    pub const ALL: [Color; 4] = [Color::Red, Color::Green, Color::Blue, Color::Yellow];

    /// Wire/display token for this color.
    pub fn as_str(self) -> &'static str {
        match self {
            Color::Red => "RED",
            Color::Green => "GREEN",
            Color::Blue => "BLUE",
            Color::Yellow => "YELLOW",
        }
    }

    /// Parse a color token (case-insensitive). Anything outside the four
    /// colors is rejected.
    pub fn parse(token: &str) -> Option<Color> {
        Color::ALL
            .into_iter()
            .find(|c| token.eq_ignore_ascii_case(c.as_str()))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The fifteen card ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rank {
    Zero,
    One,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Skip,
    Reverse,
    DrawTwo,
    DrawFour,
    Wild,
}

impl Rank {
    /// The thirteen ranks that come in all four colors.
    pub const COLORED: [Rank; 13] = [
        Rank::Zero,
        Rank::One,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Skip,
        Rank::Reverse,
        Rank::DrawTwo,
    ];

    /// The card type is derived from the rank alone.
    pub fn kind(self) -> CardType {
        match self {
            Rank::Skip | Rank::Reverse | Rank::DrawTwo => CardType::Action,
            Rank::DrawFour | Rank::Wild => CardType::ActionNoColor,
            _ => CardType::Number,
        }
    }

    /// Wire/display token for this rank.
    pub fn as_str(self) -> &'static str {
        match self {
            Rank::Zero => "0",
            Rank::One => "1",
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Skip => "Skip",
            Rank::Reverse => "Reverse",
            Rank::DrawTwo => "Draw2",
            Rank::DrawFour => "Draw4",
            Rank::Wild => "Wild",
        }
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Card category deciding how a card matches and what playing it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardType {
    /// Colored digit card; matches by color or rank.
    Number,
    /// Colored special card (Skip, Reverse, Draw2); matches by color or rank.
    Action,
    /// Colorless special card (Wild, Draw4); always playable, color chosen
    /// after play.
    ActionNoColor,
}

/// A single card.
///
/// `color` is `None` exactly for colorless action cards, until a color is
/// assigned to one sitting on top of the discard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Card {
    pub rank: Rank,
    pub color: Option<Color>,
}

impl Card {
    /// Create a card. The color is dropped for colorless ranks.
    pub fn new(color: Color, rank: Rank) -> Self {
        match rank.kind() {
            CardType::ActionNoColor => Card { rank, color: None },
            _ => Card {
                rank,
                color: Some(color),
            },
        }
    }

    /// Create a colorless Wild or Draw4.
    pub fn wild(rank: Rank) -> Self {
        Card { rank, color: None }
    }

    pub fn kind(&self) -> CardType {
        self.rank.kind()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.color {
            Some(color) => write!(f, "{} {}", color, self.rank),
            None => write!(f, "{}", self.rank),
        }
    }
}

/// Full deck composition, built once and cloned on every rebuild.
static DECK_TEMPLATE: Lazy<Vec<Card>> = Lazy::new(|| {
    let mut cards = Vec::with_capacity(DECK_SIZE);
    for color in Color::ALL {
        for rank in Rank::COLORED {
            cards.push(Card::new(color, rank));
            cards.push(Card::new(color, rank));
        }
    }
    for _ in 0..4 {
        cards.push(Card::wild(Rank::Wild));
        cards.push(Card::wild(Rank::DrawFour));
    }
    cards
});

/// The draw deck.
///
/// Owns its RNG so dealing and reshuffling stay deterministic under a
/// seeded constructor.
pub struct Deck {
    cards: Vec<Card>,
    rng: StdRng,
}

impl Deck {
    /// A freshly built, unshuffled deck with an OS-seeded RNG.
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// A deck with a fixed seed (for testing).
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        let mut deck = Deck {
            cards: Vec::new(),
            rng,
        };
        deck.build();
        deck
    }

    /// Reset to the full 112-card composition, in deterministic order.
    pub fn build(&mut self) {
        self.cards = DECK_TEMPLATE.clone();
    }

    /// Randomize the card order.
    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut self.rng);
    }

    /// Remove and return the top card. An empty deck is rebuilt and
    /// reshuffled first, so this never fails. Cards already dealt are not
    /// recycled; the rebuild duplicates them back into circulation.
    pub fn deal(&mut self) -> Card {
        if self.cards.is_empty() {
            log::info!("deck is empty, rebuilding and shuffling");
            self.build();
            self.shuffle();
        }
        self.cards.pop().expect("deck was just rebuilt")
    }

    /// Return a card to the deck (used when redrawing the starting card).
    pub fn put_back(&mut self, card: Card) {
        self.cards.push(card);
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

/// A player's hand. All player-facing positions are 1-indexed.
#[derive(Debug, Default)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    pub fn new() -> Self {
        Hand { cards: Vec::new() }
    }

    /// Append a card to the hand.
    pub fn add(&mut self, card: Card) {
        self.cards.push(card);
    }

    /// Remove and return the card at a 1-indexed position, or `None` if the
    /// position is out of range. Callers validate before mutating.
    pub fn remove(&mut self, place: usize) -> Option<Card> {
        if (1..=self.cards.len()).contains(&place) {
            Some(self.cards.remove(place - 1))
        } else {
            None
        }
    }

    /// Look at the card at a 1-indexed position without removing it.
    pub fn get(&self, place: usize) -> Option<&Card> {
        if place >= 1 {
            self.cards.get(place - 1)
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }
}
