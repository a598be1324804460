use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Serialize};
use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

/// Number of cards in a full hand.
pub const HAND_SIZE: usize = 5;

/// Number of distinct cards in a deck.
pub const DECK_SIZE: usize = 52;

/// Type alias for round wins. Scores only ever go up.
pub type Score = u32;

/// Identifies one slot in the router's client table. Players are keyed by
/// the ID of the connection they play through.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ClientId(pub u16);

impl ClientId {
    /// The authority's slot. On a participant this is the connection to the
    /// host; on the host it is the engine itself.
    pub const AUTHORITY: ClientId = ClientId(0);

    #[must_use]
    pub fn is_authority(self) -> bool {
        self == Self::AUTHORITY
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for ClientId {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

/// Suits in ascending order.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Suit {
    Diamonds,
    Clubs,
    Hearts,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Diamonds, Suit::Clubs, Suit::Hearts, Suit::Spades];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Diamonds => "♦",
            Self::Clubs => "♣",
            Self::Hearts => "♥",
            Self::Spades => "♠",
        };
        write!(f, "{repr}")
    }
}

/// Card faces in ascending order. Aces are high except in the wheel
/// straight, which the evaluator handles on its own.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Face {
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "4")]
    Four,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "6")]
    Six,
    #[serde(rename = "7")]
    Seven,
    #[serde(rename = "8")]
    Eight,
    #[serde(rename = "9")]
    Nine,
    #[serde(rename = "10")]
    Ten,
    #[serde(rename = "J")]
    Jack,
    #[serde(rename = "Q")]
    Queen,
    #[serde(rename = "K")]
    King,
    #[serde(rename = "A")]
    Ace,
}

/// Placeholder for face values (two=2u8 ... ace=14u8).
pub type Value = u8;

impl Face {
    pub const ALL: [Face; 13] = [
        Face::Two,
        Face::Three,
        Face::Four,
        Face::Five,
        Face::Six,
        Face::Seven,
        Face::Eight,
        Face::Nine,
        Face::Ten,
        Face::Jack,
        Face::Queen,
        Face::King,
        Face::Ace,
    ];

    #[must_use]
    pub fn value(self) -> Value {
        self as Value + 2
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Jack => "J",
            Self::Queen => "Q",
            Self::King => "K",
            Self::Ace => "A",
            face => return write!(f, "{}", face.value()),
        };
        write!(f, "{repr}")
    }
}

/// A card is a suit and a face plus the `selected` flag a client sets when
/// it marks the card for a swap. Equality, hashing and ordering only look at
/// the suit and face.
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct Card {
    pub suit: Suit,
    pub face: Face,
    #[serde(default)]
    pub selected: bool,
}

impl Card {
    #[must_use]
    pub fn new(suit: Suit, face: Face) -> Self {
        Self {
            suit,
            face,
            selected: false,
        }
    }

    #[must_use]
    pub fn selected(self) -> Self {
        Self {
            selected: true,
            ..self
        }
    }
}

impl PartialEq for Card {
    fn eq(&self, other: &Self) -> bool {
        self.suit == other.suit && self.face == other.face
    }
}

impl Eq for Card {}

impl Hash for Card {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.suit.hash(state);
        self.face.hash(state);
    }
}

impl PartialOrd for Card {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Card {
    fn cmp(&self, other: &Self) -> Ordering {
        self.suit
            .cmp(&other.suit)
            .then_with(|| self.face.cmp(&other.face))
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = format!("{}{}", self.face, self.suit);
        write!(f, "{repr:>3}")
    }
}

/// Cards still available for drawing. Drawing takes from the back.
#[derive(Clone, Debug)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// A freshly shuffled 52-card deck.
    #[must_use]
    pub fn new() -> Self {
        Self::shuffled(&mut rand::rng())
    }

    #[must_use]
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut deck = Self::ordered();
        deck.cards.shuffle(rng);
        deck
    }

    /// All 52 cards in ascending order, so the ace of spades is drawn first.
    #[must_use]
    pub fn ordered() -> Self {
        let cards = Suit::ALL
            .into_iter()
            .flat_map(|suit| Face::ALL.into_iter().map(move |face| Card::new(suit, face)))
            .collect();
        Self { cards }
    }

    /// A deck that deals the given cards, last card first.
    #[must_use]
    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    /// Remove and return the last `n` cards. Asking for more cards than
    /// remain returns whatever is left.
    pub fn draw(&mut self, n: usize) -> Vec<Card> {
        let n = n.min(self.cards.len());
        self.cards.split_off(self.cards.len() - n)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn contains(&self, card: &Card) -> bool {
        self.cards.contains(card)
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

/// A seat at any card game.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Player {
    pub id: ClientId,
    pub hand: Vec<Card>,
    pub score: Score,
}

impl Player {
    #[must_use]
    pub fn new(id: ClientId) -> Self {
        Self {
            id,
            hand: Vec::with_capacity(HAND_SIZE),
            score: 0,
        }
    }

    /// Move up to `n` cards from the deck into the hand, keeping the hand
    /// sorted.
    pub fn draw(&mut self, deck: &mut Deck, n: usize) {
        self.hand.extend(deck.draw(n));
        self.hand.sort();
    }

    pub fn win(&mut self) {
        self.score += 1;
    }
}

/// A draw poker seat: a player plus whether they've used their one swap
/// for the current hand.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PokerPlayer {
    pub player: Player,
    pub swapped: bool,
}

impl PokerPlayer {
    #[must_use]
    pub fn new(id: ClientId) -> Self {
        Self {
            player: Player::new(id),
            swapped: false,
        }
    }

    /// Throw away the current hand and draw a full new one.
    pub fn reset_hand(&mut self, deck: &mut Deck) -> Vec<Card> {
        let discarded = std::mem::take(&mut self.player.hand);
        self.swapped = false;
        self.player.draw(deck, HAND_SIZE);
        discarded
    }

    /// Discard every card in `cards` that is actually in the hand, then top
    /// the hand back up. Cards that aren't held are skipped. Returns the
    /// discarded cards.
    pub fn swap(&mut self, deck: &mut Deck, cards: &[Card]) -> Vec<Card> {
        let mut discarded = Vec::with_capacity(cards.len());
        for card in cards {
            if let Some(idx) = self.player.hand.iter().position(|held| held == card) {
                let mut card = self.player.hand.remove(idx);
                card.selected = false;
                discarded.push(card);
            }
        }
        self.player
            .draw(deck, HAND_SIZE.saturating_sub(self.player.hand.len()));
        self.swapped = true;
        discarded
    }
}

/// Render a hand as a single line, e.g. `" 2♦ 10♣  Q♥"`.
#[must_use]
pub fn hand_to_string(hand: &[Card]) -> String {
    hand.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ")
}
