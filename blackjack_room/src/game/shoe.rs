//! Card source for a single round.

use super::entities::{CARDS_PER_DECK, Card, Rank, Suit};
use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};

/// Pool of shuffled cards backing one round.
///
/// Running out of cards is a normal outcome: [`Shoe::draw`] returns `None`
/// and the caller decides how to wind the round down.
#[derive(Clone, Debug)]
pub struct Shoe {
    // Drawn from the back.
    cards: Vec<Card>,
}

impl Shoe {
    /// Build `deck_count` standard decks and shuffle them together.
    pub fn new<R: Rng + ?Sized>(deck_count: usize, rng: &mut R) -> Self {
        let mut cards = Vec::with_capacity(deck_count * CARDS_PER_DECK);
        for _ in 0..deck_count {
            for suit in Suit::ALL {
                for rank in Rank::ALL {
                    cards.push(Card::new(suit, rank));
                }
            }
        }
        cards.shuffle(rng);
        Self { cards }
    }

    /// Stacked shoe: the first card of `cards` is drawn first.
    pub fn from_cards(cards: impl IntoIterator<Item = Card>) -> Self {
        let mut cards: Vec<Card> = cards.into_iter().collect();
        cards.reverse();
        Self { cards }
    }

    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    pub fn remaining(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Supplies a fresh shoe whenever a round starts.
pub trait DeckSource: Send {
    fn fresh_shoe(&mut self, deck_count: usize) -> Shoe;
}

/// Production deck source backed by a seedable RNG.
#[derive(Debug)]
pub struct ShuffledDecks {
    rng: StdRng,
}

impl ShuffledDecks {
    /// Seed from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible shuffles, useful for replaying a session.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for ShuffledDecks {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl DeckSource for ShuffledDecks {
    fn fresh_shoe(&mut self, deck_count: usize) -> Shoe {
        Shoe::new(deck_count, &mut self.rng)
    }
}

/// Hands out the same prearranged cards for every round, ignoring the
/// requested deck count.
#[derive(Clone, Debug, Default)]
pub struct StackedDeck {
    cards: Vec<Card>,
}

impl StackedDeck {
    /// The first card of `cards` is drawn first.
    pub fn new(cards: impl IntoIterator<Item = Card>) -> Self {
        Self {
            cards: cards.into_iter().collect(),
        }
    }
}

impl DeckSource for StackedDeck {
    fn fresh_shoe(&mut self, _deck_count: usize) -> Shoe {
        Shoe::from_cards(self.cards.iter().copied())
    }
}
