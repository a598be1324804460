use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use draw_poker::{
    ClientId, GameSettings, Poker,
    entities::{Card, Deck, Face, Suit},
    functional::{argmin, eval, strength},
    messages::{Action, ClientMessage, Message, decode, encode},
};

fn card(face: Face, suit: Suit) -> Card {
    Card::new(suit, face)
}

/// Helper to create a freshly dealt game with N players
fn setup_game_with_players(n_players: u16) -> Poker {
    let ids: Vec<ClientId> = (1..=n_players).map(ClientId).collect();
    let (game, _) = Poker::new(&ids, GameSettings::default()).unwrap();
    game
}

/// Benchmark classifying a royal flush
fn bench_hand_eval_5_cards(c: &mut Criterion) {
    let cards = vec![
        card(Face::Ace, Suit::Spades),
        card(Face::King, Suit::Spades),
        card(Face::Queen, Suit::Spades),
        card(Face::Jack, Suit::Spades),
        card(Face::Ten, Suit::Spades),
    ];

    c.bench_function("hand_eval_5_cards", |b| {
        b.iter(|| eval(&cards));
    });
}

/// Benchmark strength lookups for 100 dealt hands
fn bench_strength_100_hands(c: &mut Criterion) {
    let mut all_hands = Vec::new();
    for _ in 0..10 {
        let mut deck = Deck::new();
        for _ in 0..10 {
            all_hands.push(deck.draw(5));
        }
    }

    c.bench_function("strength_100_hands", |b| {
        b.iter(|| {
            all_hands
                .iter()
                .map(|cards| strength(cards))
                .collect::<Vec<_>>()
        });
    });
}

/// Benchmark picking winners among five hands
fn bench_hand_comparison(c: &mut Criterion) {
    let mut deck = Deck::new();
    let strengths: Vec<_> = (0..5).map(|_| strength(&deck.draw(5))).collect();

    c.bench_function("hand_comparison_5_hands", |b| {
        b.iter(|| argmin(&strengths));
    });
}

/// Benchmark a full round with different player counts
fn bench_full_round(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_round");

    for n_players in [2u16, 3, 5].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_players", n_players)),
            n_players,
            |b, &n| {
                b.iter(|| {
                    let mut game = setup_game_with_players(n);
                    for id in 1..=n {
                        let mut hand = game.player(ClientId(id)).unwrap().player.hand.clone();
                        hand[0].selected = true;
                        game.swap(ClientId(id), &hand).unwrap();
                    }
                    game
                });
            },
        );
    }

    group.finish();
}

/// Benchmark encoding and decoding a swap request
fn bench_message_codec(c: &mut Criterion) {
    let mut deck = Deck::new();
    let msg = Message::Client(ClientMessage {
        sender_id: Some(ClientId(3)),
        action: Action::Swap { hand: deck.draw(5) },
    });
    let bytes = encode(&msg).unwrap();

    c.bench_function("encode_swap", |b| {
        b.iter(|| encode(&msg).unwrap());
    });
    c.bench_function("decode_swap", |b| {
        b.iter(|| decode(&bytes).unwrap());
    });
}

criterion_group!(
    hand_evaluation,
    bench_hand_eval_5_cards,
    bench_strength_100_hands,
    bench_hand_comparison
);

criterion_group!(game_operations, bench_full_round, bench_message_codec);

criterion_main!(hand_evaluation, game_operations);
