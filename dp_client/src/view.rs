//! What a participant knows about the game, built from session events.

use draw_poker::{
    ClientId, SessionEvent,
    entities::{Card, Score, hand_to_string},
    messages::{Action, ServerMessage},
};
use std::fmt::Write;

/// The player's side of the table.
#[derive(Debug, Default)]
pub struct PlayerView {
    pub own_id: Option<ClientId>,
    pub hand: Vec<Card>,
    pub scores: Vec<(ClientId, Score)>,
    /// Whether a swap was already sent this round.
    pub swapped: bool,
    /// Set once the authority is gone.
    pub disconnected: bool,
}

impl PlayerView {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold an event into the view and return the lines to show the user.
    pub fn apply(&mut self, event: SessionEvent) -> Vec<String> {
        match event {
            SessionEvent::AssignedId(id) => {
                self.own_id = Some(id);
                vec![format!("Joined as player {id}. Waiting for the host to start.")]
            }
            SessionEvent::Message(message) => self.apply_message(message),
            SessionEvent::AuthorityLost => {
                *self = Self {
                    disconnected: true,
                    ..Self::default()
                };
                vec!["Lost the connection to the host.".to_string()]
            }
            SessionEvent::Notice(notice) => vec![notice],
            SessionEvent::Connected { .. } | SessionEvent::PeerLost { .. } => Vec::new(),
        }
    }

    fn apply_message(&mut self, message: ServerMessage) -> Vec<String> {
        match message {
            ServerMessage::Start { hand, init } => {
                self.hand = hand;
                self.scores = init;
                self.swapped = false;
                vec![
                    format!("Game on with {} players.", self.scores.len()),
                    self.describe_hand(),
                ]
            }
            ServerMessage::Hand { hand } => {
                self.hand = hand;
                self.swapped = false;
                vec!["New round.".to_string(), self.describe_hand()]
            }
            ServerMessage::SwapAck { hand, swapped } => {
                self.hand = hand;
                self.swapped = swapped;
                vec![
                    "Swap accepted. Waiting for the others.".to_string(),
                    self.describe_hand(),
                ]
            }
            ServerMessage::Reveal { hs, won } => {
                let mut lines = Vec::with_capacity(hs.len() + 1);
                for (id, score, hand) in &hs {
                    let mut line = format!("  {id}: {}  ({score} pts)", hand_to_string(hand));
                    if won.contains(id) {
                        line.push_str("  *");
                    }
                    if Some(*id) == self.own_id {
                        line.push_str("  <- you");
                    }
                    lines.push(line);
                }
                self.scores = hs.into_iter().map(|(id, score, _)| (id, score)).collect();
                let outcome = match self.own_id {
                    Some(id) if won.contains(&id) && won.len() > 1 => "You split the point.",
                    Some(id) if won.contains(&id) => "You win the round!",
                    _ => "You lose the round.",
                };
                lines.insert(0, outcome.to_string());
                lines.push("Type 'deal' for another round.".to_string());
                lines
            }
            // Consumed by the router.
            ServerMessage::AssignId { .. } => Vec::new(),
        }
    }

    /// The current hand with 1-based positions.
    #[must_use]
    pub fn describe_hand(&self) -> String {
        if self.hand.is_empty() {
            return "No cards yet.".to_string();
        }
        let mut out = String::from("Your hand:");
        for (idx, card) in self.hand.iter().enumerate() {
            let _ = write!(out, "  {}:{}", idx + 1, card.to_string().trim());
        }
        out
    }

    /// Build a swap from 1-based positions into the current hand.
    pub fn swap(&self, positions: &[usize]) -> Result<Action, String> {
        if self.hand.is_empty() {
            return Err("You have no cards to swap.".to_string());
        }
        if self.swapped {
            return Err("You already swapped this round.".to_string());
        }
        let mut hand = self.hand.clone();
        for &position in positions {
            match hand.get_mut(position.wrapping_sub(1)) {
                Some(card) => card.selected = true,
                None => return Err(format!("You don't have a card at position {position}.")),
            }
        }
        Ok(Action::Swap { hand })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use draw_poker::entities::{Face, Suit};

    fn hand() -> Vec<Card> {
        vec![
            Card::new(Suit::Clubs, Face::Two),
            Card::new(Suit::Clubs, Face::Nine),
            Card::new(Suit::Hearts, Face::Four),
            Card::new(Suit::Spades, Face::Jack),
            Card::new(Suit::Spades, Face::Ace),
        ]
    }

    #[test]
    fn test_assigned_id_is_remembered() {
        let mut view = PlayerView::new();
        let lines = view.apply(SessionEvent::AssignedId(ClientId(3)));
        assert_eq!(view.own_id, Some(ClientId(3)));
        assert_eq!(lines[0], "Joined as player 3. Waiting for the host to start.");
    }

    #[test]
    fn test_start_sets_hand_and_scores() {
        let mut view = PlayerView::new();
        view.apply(SessionEvent::Message(ServerMessage::Start {
            hand: hand(),
            init: vec![(ClientId(1), 0), (ClientId(2), 0)],
        }));
        assert_eq!(view.hand, hand());
        assert_eq!(view.scores.len(), 2);
        assert!(!view.swapped);
    }

    #[test]
    fn test_swap_marks_positions() {
        let mut view = PlayerView::new();
        view.hand = hand();
        let Ok(Action::Swap { hand }) = view.swap(&[1, 5]) else {
            panic!("expected a swap");
        };
        let selected: Vec<bool> = hand.iter().map(|c| c.selected).collect();
        assert_eq!(selected, vec![true, false, false, false, true]);
    }

    #[test]
    fn test_swap_rejects_bad_state() {
        let mut view = PlayerView::new();
        assert!(view.swap(&[]).is_err());

        view.hand = hand();
        assert!(view.swap(&[0]).is_err());
        assert!(view.swap(&[6]).is_err());

        view.swapped = true;
        assert!(view.swap(&[]).is_err());
    }

    #[test]
    fn test_hand_resets_swapped() {
        let mut view = PlayerView::new();
        view.swapped = true;
        view.apply(SessionEvent::Message(ServerMessage::Hand { hand: hand() }));
        assert!(!view.swapped);
    }

    #[test]
    fn test_reveal_reports_split() {
        let mut view = PlayerView::new();
        view.own_id = Some(ClientId(2));
        let lines = view.apply(SessionEvent::Message(ServerMessage::Reveal {
            hs: vec![(ClientId(1), 1, hand()), (ClientId(2), 1, hand())],
            won: vec![ClientId(1), ClientId(2)],
        }));
        assert_eq!(lines[0], "You split the point.");
        assert_eq!(view.scores, vec![(ClientId(1), 1), (ClientId(2), 1)]);
    }

    #[test]
    fn test_authority_lost_clears_view() {
        let mut view = PlayerView::new();
        view.own_id = Some(ClientId(1));
        view.hand = hand();
        view.apply(SessionEvent::AuthorityLost);
        assert!(view.disconnected);
        assert!(view.hand.is_empty());
        assert_eq!(view.own_id, None);
    }

    #[test]
    fn test_describe_hand_numbers_cards() {
        let mut view = PlayerView::new();
        assert_eq!(view.describe_hand(), "No cards yet.");
        view.hand = hand();
        let text = view.describe_hand();
        assert!(text.contains("1:"));
        assert!(text.contains("5:"));
    }
}
