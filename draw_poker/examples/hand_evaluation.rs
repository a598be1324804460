//! Hand Evaluation Example
//!
//! Demonstrates how to classify hands and pick round winners.

use draw_poker::entities::{Card, Deck, Face, Suit, hand_to_string};
use draw_poker::functional::{argmin, eval, strength};

fn card(face: Face, suit: Suit) -> Card {
    Card::new(suit, face)
}

fn main() {
    println!("=== Draw Poker Hand Evaluation Example ===\n");

    // Example 1: Evaluate a single hand
    println!("Example 1: Evaluating a 5-card hand");
    let royal = vec![
        card(Face::Ace, Suit::Hearts),
        card(Face::King, Suit::Hearts),
        card(Face::Queen, Suit::Hearts),
        card(Face::Jack, Suit::Hearts),
        card(Face::Ten, Suit::Hearts),
    ];
    let value = eval(&royal);
    println!("Hand: {}", hand_to_string(&royal));
    println!("Rank: {} (strength {})\n", value.rank, strength(&royal));

    // Example 2: Compare two hands
    println!("Example 2: Comparing two hands");
    let aces = vec![
        card(Face::Ace, Suit::Spades),
        card(Face::Ace, Suit::Hearts),
        card(Face::Ten, Suit::Clubs),
        card(Face::Nine, Suit::Diamonds),
        card(Face::Two, Suit::Spades),
    ];
    let kings = vec![
        card(Face::King, Suit::Spades),
        card(Face::King, Suit::Hearts),
        card(Face::Ten, Suit::Diamonds),
        card(Face::Nine, Suit::Clubs),
        card(Face::Two, Suit::Hearts),
    ];
    let strengths = [strength(&aces), strength(&kings)];
    println!("Hand A: {} -> {}", hand_to_string(&aces), strengths[0]);
    println!("Hand B: {} -> {}", hand_to_string(&kings), strengths[1]);
    match argmin(&strengths).as_slice() {
        [0] => println!("Hand A wins\n"),
        [1] => println!("Hand B wins\n"),
        _ => println!("Split pot\n"),
    }

    // Example 3: Deal a table from a shuffled deck
    println!("Example 3: Dealing four hands");
    let mut deck = Deck::new();
    let hands: Vec<Vec<Card>> = (0..4)
        .map(|_| {
            let mut hand = deck.draw(5);
            hand.sort();
            hand
        })
        .collect();
    let strengths: Vec<_> = hands.iter().map(|hand| strength(hand)).collect();
    for (idx, hand) in hands.iter().enumerate() {
        println!(
            "Player {}: {}  {} ({})",
            idx + 1,
            hand_to_string(hand),
            eval(hand).rank,
            strengths[idx]
        );
    }
    let winners: Vec<String> = argmin(&strengths)
        .into_iter()
        .map(|idx| (idx + 1).to_string())
        .collect();
    println!("Winner(s): player {}", winners.join(", "));
}
