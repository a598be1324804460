//! Five-card hand evaluation.
//!
//! Every five-card hand falls into one of 7462 equivalence classes. A hand's
//! strength is its class index counted from the best class, so a royal flush
//! is 1 and 7-5-4-3-2 offsuit is 7462. Lower is better.

use std::{fmt, sync::LazyLock};

use super::entities::{Card, Value};

/// Hand strength. 1 is the best possible hand.
pub type Strength = u32;

/// Number of distinct five-card hand classes.
pub const HAND_CLASSES: usize = 7462;

/// Weakest strength any hand can be assigned.
pub const WORST_STRENGTH: Strength = HAND_CLASSES as Strength;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Rank {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::HighCard => "high card",
            Self::OnePair => "one pair",
            Self::TwoPair => "two pair",
            Self::ThreeOfAKind => "three of a kind",
            Self::Straight => "straight",
            Self::Flush => "flush",
            Self::FullHouse => "full house",
            Self::FourOfAKind => "four of a kind",
            Self::StraightFlush => "straight flush",
        };
        write!(f, "{repr}")
    }
}

/// A hand's category plus the face values that break ties within it, in
/// the order they're compared. Greater values are better hands.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct HandValue {
    pub rank: Rank,
    pub values: Vec<Value>,
}

/// Classify a hand. Meant for five cards; shorter hands are still ranked by
/// their groups and high cards but never count as straights or flushes.
#[must_use]
pub fn eval(hand: &[Card]) -> HandValue {
    let mut counts = [0u8; 15];
    for card in hand {
        counts[card.face.value() as usize] += 1;
    }

    // Groups ordered by size, then by face value, both descending.
    let mut groups: Vec<(u8, Value)> = (2..=14u8)
        .rev()
        .filter(|&value| counts[value as usize] > 0)
        .map(|value| (counts[value as usize], value))
        .collect();
    groups.sort_by(|a, b| b.cmp(a));
    let values: Vec<Value> = groups.iter().map(|&(_, value)| value).collect();

    let is_full = hand.len() == 5;
    let is_flush = is_full && hand.iter().all(|card| card.suit == hand[0].suit);
    let straight_high = if is_full && groups.len() == 5 {
        straight_high(&values)
    } else {
        None
    };

    let largest = groups.first().map(|g| g.0);
    let second = groups.get(1).map(|g| g.0);
    let rank = match (straight_high, is_flush, largest, second) {
        (Some(_), true, _, _) => Rank::StraightFlush,
        (_, _, Some(4), _) => Rank::FourOfAKind,
        (_, _, Some(3), Some(2)) => Rank::FullHouse,
        (_, true, _, _) => Rank::Flush,
        (Some(_), false, _, _) => Rank::Straight,
        (_, _, Some(3), _) => Rank::ThreeOfAKind,
        (_, _, Some(2), Some(2)) => Rank::TwoPair,
        (_, _, Some(2), _) => Rank::OnePair,
        _ => Rank::HighCard,
    };

    match straight_high {
        Some(high) => HandValue {
            rank,
            values: vec![high],
        },
        None => HandValue { rank, values },
    }
}

/// Highest card of a straight given five distinct values in descending
/// order. The wheel (A-5-4-3-2) plays as a five-high straight.
fn straight_high(values: &[Value]) -> Option<Value> {
    if values.windows(2).all(|w| w[0] == w[1] + 1) {
        Some(values[0])
    } else if values == [14, 5, 4, 3, 2] {
        Some(5)
    } else {
        None
    }
}

/// Every hand class from weakest to strongest.
static CLASSES: LazyLock<Vec<HandValue>> = LazyLock::new(|| {
    let mut classes = Vec::with_capacity(HAND_CLASSES);
    let faces: Vec<Value> = (2..=14).rev().collect();

    for combo in combinations(&faces, 5) {
        match straight_high(&combo) {
            Some(high) => {
                for rank in [Rank::Straight, Rank::StraightFlush] {
                    classes.push(HandValue {
                        rank,
                        values: vec![high],
                    });
                }
            }
            None => {
                for rank in [Rank::HighCard, Rank::Flush] {
                    classes.push(HandValue {
                        rank,
                        values: combo.clone(),
                    });
                }
            }
        }
    }

    for &major in &faces {
        let others: Vec<Value> = faces.iter().copied().filter(|&v| v != major).collect();

        for kickers in combinations(&others, 3) {
            let mut values = vec![major];
            values.extend(kickers);
            classes.push(HandValue {
                rank: Rank::OnePair,
                values,
            });
        }
        for kickers in combinations(&others, 2) {
            let mut values = vec![major];
            values.extend(kickers);
            classes.push(HandValue {
                rank: Rank::ThreeOfAKind,
                values,
            });
        }
        for &minor in &others {
            classes.push(HandValue {
                rank: Rank::FullHouse,
                values: vec![major, minor],
            });
            classes.push(HandValue {
                rank: Rank::FourOfAKind,
                values: vec![major, minor],
            });
            if minor < major {
                for &kicker in others.iter().filter(|&&v| v != minor) {
                    classes.push(HandValue {
                        rank: Rank::TwoPair,
                        values: vec![major, minor, kicker],
                    });
                }
            }
        }
    }

    classes.sort();
    classes
});

/// All `k`-element combinations of `items`, preserving their order.
fn combinations(items: &[Value], k: usize) -> Vec<Vec<Value>> {
    if k == 0 {
        return vec![Vec::new()];
    }
    let mut out = Vec::new();
    for (idx, &head) in items.iter().enumerate() {
        for mut tail in combinations(&items[idx + 1..], k - 1) {
            tail.insert(0, head);
            out.push(tail);
        }
    }
    out
}

/// Strength of an already classified hand. Values that fall between two
/// classes (only possible for short hands) take the weaker neighbour.
#[must_use]
pub fn strength_of(value: &HandValue) -> Strength {
    let len = CLASSES.len();
    let strength = match CLASSES.binary_search(value) {
        Ok(idx) => len - idx,
        Err(idx) => (len + 1 - idx).min(len),
    };
    strength as Strength
}

/// Strength of a hand, from 1 (royal flush) to 7462.
#[must_use]
pub fn strength(hand: &[Card]) -> Strength {
    strength_of(&eval(hand))
}

/// Indices of every minimum in `strengths`. Ties return more than one
/// index; an empty slice returns none.
#[must_use]
pub fn argmin(strengths: &[Strength]) -> Vec<usize> {
    let Some(&best) = strengths.iter().min() else {
        return Vec::new();
    };
    strengths
        .iter()
        .enumerate()
        .filter(|&(_, &s)| s == best)
        .map(|(idx, _)| idx)
        .collect()
}
