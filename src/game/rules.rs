//! Play legality: which cards may go on top of the current discard

use super::{Card, CardType, Hand};

/// Whether `candidate` may be played on `top`.
///
/// A card matches by color, by rank, or by being a colorless action card
/// (Wild/Draw4), which is always playable. This is the single predicate
/// used both for validating an attempted play and for computing the
/// advertised set of legal positions.
pub fn is_playable(top: &Card, candidate: &Card) -> bool {
    candidate.color == top.color
        || candidate.rank == top.rank
        || candidate.kind() == CardType::ActionNoColor
}

/// 1-indexed positions in `hand` that are legal to play on `top`.
pub fn legal_moves(top: &Card, hand: &Hand) -> Vec<usize> {
    hand.cards()
        .iter()
        .enumerate()
        .filter(|(_, card)| is_playable(top, card))
        .map(|(i, _)| i + 1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Color, Rank};

    #[test]
    fn test_matches_by_color() {
        let top = Card::new(Color::Red, Rank::Five);
        assert!(is_playable(&top, &Card::new(Color::Red, Rank::Nine)));
        assert!(is_playable(&top, &Card::new(Color::Red, Rank::Skip)));
    }

    #[test]
    fn test_matches_by_rank() {
        let top = Card::new(Color::Red, Rank::Five);
        assert!(is_playable(&top, &Card::new(Color::Blue, Rank::Five)));

        let top = Card::new(Color::Green, Rank::DrawTwo);
        assert!(is_playable(&top, &Card::new(Color::Yellow, Rank::DrawTwo)));
    }

    #[test]
    fn test_wild_is_always_playable() {
        for color in Color::ALL {
            for rank in Rank::COLORED {
                let top = Card::new(color, rank);
                assert!(is_playable(&top, &Card::wild(Rank::Wild)));
                assert!(is_playable(&top, &Card::wild(Rank::DrawFour)));
            }
        }
    }

    #[test]
    fn test_mismatch_is_rejected() {
        let top = Card::new(Color::Red, Rank::Five);
        assert!(!is_playable(&top, &Card::new(Color::Blue, Rank::Nine)));
        assert!(!is_playable(&top, &Card::new(Color::Green, Rank::Skip)));
    }

    #[test]
    fn test_resolved_wild_matches_by_chosen_color() {
        let mut top = Card::wild(Rank::Wild);
        top.color = Some(Color::Blue);

        assert!(is_playable(&top, &Card::new(Color::Blue, Rank::Two)));
        assert!(!is_playable(&top, &Card::new(Color::Red, Rank::Two)));
    }

    #[test]
    fn test_legal_moves_are_1_indexed() {
        let top = Card::new(Color::Red, Rank::Five);

        let mut hand = Hand::new();
        hand.add(Card::new(Color::Blue, Rank::Nine)); // 1: no
        hand.add(Card::new(Color::Red, Rank::One)); // 2: color match
        hand.add(Card::new(Color::Green, Rank::Five)); // 3: rank match
        hand.add(Card::wild(Rank::Wild)); // 4: wild
        hand.add(Card::new(Color::Yellow, Rank::Skip)); // 5: no

        assert_eq!(legal_moves(&top, &hand), vec![2, 3, 4]);
    }

    #[test]
    fn test_legal_moves_empty_when_nothing_fits() {
        let top = Card::new(Color::Red, Rank::Five);

        let mut hand = Hand::new();
        hand.add(Card::new(Color::Blue, Rank::Nine));
        hand.add(Card::new(Color::Green, Rank::Skip));

        assert!(legal_moves(&top, &hand).is_empty());
    }
}
