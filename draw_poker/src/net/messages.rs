//! Protocol values exchanged between the authority and its clients, plus the
//! JSON codec that puts them on the wire.
//!
//! Every message travels as one UTF-8 JSON object per frame. The object is a
//! flat record of optional fields; which fields are present decides which
//! message it is.

use serde::{Deserialize, Serialize};
use std::fmt;

pub use crate::game::entities::ClientId;
use crate::game::entities::{Card, Score, hand_to_string};

use super::errors::{ProtocolError, Result};

/// Something a seated player asks the authority to do.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Action {
    /// Swap every card flagged `selected` in `hand`. Each player gets one
    /// swap per hand.
    Swap { hand: Vec<Card> },
    /// Throw in every hand and deal a fresh one from a new deck.
    Deal,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Swap { hand } => {
                let selected = hand.iter().filter(|card| card.selected).count();
                write!(f, "swap {selected} card(s)")
            }
            Self::Deal => write!(f, "deal"),
        }
    }
}

/// A client's request. `sender_id` is stamped on outbound messages by the
/// client's router; the authority trusts its own connection table instead.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientMessage {
    pub sender_id: Option<ClientId>,
    pub action: Action,
}

/// One `(player, score, hand)` triple of an end-of-round reveal.
pub type Revealed = (ClientId, Score, Vec<Card>);

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ServerMessage {
    /// Sent once, first, to every new connection.
    AssignId { id: ClientId },
    /// A game began. Carries the recipient's hand and the initial scoreboard.
    Start {
        hand: Vec<Card>,
        init: Vec<(ClientId, Score)>,
    },
    /// A fresh hand after a deal.
    Hand { hand: Vec<Card> },
    /// The recipient's swap went through but others still have to swap.
    SwapAck { hand: Vec<Card>, swapped: bool },
    /// Every hand, every score, and who won the round.
    Reveal {
        hs: Vec<Revealed>,
        won: Vec<ClientId>,
    },
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::AssignId { id } => write!(f, "assigned ID {id}"),
            Self::Start { hand, init } => {
                write!(f, "game started with {} players: {}", init.len(), hand_to_string(hand))
            }
            Self::Hand { hand } => write!(f, "new hand: {}", hand_to_string(hand)),
            Self::SwapAck { hand, .. } => write!(f, "swapped: {}", hand_to_string(hand)),
            Self::Reveal { hs, won } => {
                let winners = won.iter().map(ToString::to_string).collect::<Vec<_>>();
                write!(f, "{} hands revealed, won by {}", hs.len(), winners.join(", "))
            }
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Message {
    Client(ClientMessage),
    Server(ServerMessage),
}

impl From<ClientMessage> for Message {
    fn from(value: ClientMessage) -> Self {
        Self::Client(value)
    }
}

impl From<ServerMessage> for Message {
    fn from(value: ServerMessage) -> Self {
        Self::Server(value)
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
enum ActionKind {
    Swap,
    Deal,
}

/// Wire shape shared by every message.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct Frame {
    #[serde(rename = "assign-id", skip_serializing_if = "Option::is_none")]
    assign_id: Option<ClientId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    init: Option<Vec<(ClientId, Score)>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hand: Option<Vec<Card>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<ActionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    swapped: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hs: Option<Vec<Revealed>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    won: Option<Vec<ClientId>>,
    #[serde(rename = "senderId", skip_serializing_if = "Option::is_none")]
    sender_id: Option<ClientId>,
}

impl Frame {
    fn field_names(&self) -> String {
        let present = [
            ("assign-id", self.assign_id.is_some()),
            ("init", self.init.is_some()),
            ("hand", self.hand.is_some()),
            ("action", self.action.is_some()),
            ("swapped", self.swapped.is_some()),
            ("hs", self.hs.is_some()),
            ("won", self.won.is_some()),
            ("senderId", self.sender_id.is_some()),
        ];
        let names: Vec<&str> = present
            .into_iter()
            .filter_map(|(name, is_some)| is_some.then_some(name))
            .collect();
        if names.is_empty() {
            "no fields".to_string()
        } else {
            names.join(", ")
        }
    }
}

impl From<Message> for Frame {
    fn from(value: Message) -> Self {
        match value {
            Message::Client(ClientMessage { sender_id, action }) => match action {
                Action::Swap { hand } => Self {
                    action: Some(ActionKind::Swap),
                    hand: Some(hand),
                    sender_id,
                    ..Default::default()
                },
                Action::Deal => Self {
                    action: Some(ActionKind::Deal),
                    sender_id,
                    ..Default::default()
                },
            },
            Message::Server(msg) => match msg {
                ServerMessage::AssignId { id } => Self {
                    assign_id: Some(id),
                    ..Default::default()
                },
                ServerMessage::Start { hand, init } => Self {
                    init: Some(init),
                    hand: Some(hand),
                    ..Default::default()
                },
                ServerMessage::Hand { hand } => Self {
                    hand: Some(hand),
                    ..Default::default()
                },
                ServerMessage::SwapAck { hand, swapped } => Self {
                    hand: Some(hand),
                    swapped: Some(swapped),
                    ..Default::default()
                },
                ServerMessage::Reveal { hs, won } => Self {
                    hs: Some(hs),
                    won: Some(won),
                    ..Default::default()
                },
            },
        }
    }
}

impl TryFrom<Frame> for Message {
    type Error = ProtocolError;

    /// Each arm is one legal combination of fields. Anything else is
    /// rejected rather than guessed at.
    fn try_from(frame: Frame) -> Result<Self> {
        let msg = match frame {
            Frame {
                assign_id: Some(id),
                init: None,
                hand: None,
                action: None,
                swapped: None,
                hs: None,
                won: None,
                sender_id: None,
            } => ServerMessage::AssignId { id }.into(),
            Frame {
                assign_id: None,
                init: None,
                hand: Some(hand),
                action: Some(ActionKind::Swap),
                swapped: None,
                hs: None,
                won: None,
                sender_id,
            } => ClientMessage {
                sender_id,
                action: Action::Swap { hand },
            }
            .into(),
            Frame {
                assign_id: None,
                init: None,
                hand: None,
                action: Some(ActionKind::Deal),
                swapped: None,
                hs: None,
                won: None,
                sender_id,
            } => ClientMessage {
                sender_id,
                action: Action::Deal,
            }
            .into(),
            Frame {
                assign_id: None,
                init: Some(init),
                hand: Some(hand),
                action: None,
                swapped: None,
                hs: None,
                won: None,
                sender_id: None,
            } => ServerMessage::Start { hand, init }.into(),
            Frame {
                assign_id: None,
                init: None,
                hand: None,
                action: None,
                swapped: None,
                hs: Some(hs),
                won: Some(won),
                sender_id: None,
            } => ServerMessage::Reveal { hs, won }.into(),
            Frame {
                assign_id: None,
                init: None,
                hand: Some(hand),
                action: None,
                swapped: Some(swapped),
                hs: None,
                won: None,
                sender_id: None,
            } => ServerMessage::SwapAck { hand, swapped }.into(),
            Frame {
                assign_id: None,
                init: None,
                hand: Some(hand),
                action: None,
                swapped: None,
                hs: None,
                won: None,
                sender_id: None,
            } => ServerMessage::Hand { hand }.into(),
            other => return Err(ProtocolError::UnrecognizedShape(other.field_names())),
        };
        Ok(msg)
    }
}

/// Serialize a message into one frame payload.
pub fn encode(msg: &Message) -> Result<Vec<u8>> {
    let frame = Frame::from(msg.clone());
    Ok(serde_json::to_vec(&frame)?)
}

/// Parse one frame payload.
pub fn decode(payload: &[u8]) -> Result<Message> {
    let text = std::str::from_utf8(payload)?;
    let frame: Frame = serde_json::from_str(text)?;
    Message::try_from(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{Face, Suit};

    fn sample_hand() -> Vec<Card> {
        vec![
            Card::new(Suit::Diamonds, Face::Two),
            Card::new(Suit::Clubs, Face::Ten).selected(),
            Card::new(Suit::Hearts, Face::Queen),
            Card::new(Suit::Hearts, Face::King),
            Card::new(Suit::Spades, Face::Ace).selected(),
        ]
    }

    #[test]
    fn test_assign_id_wire_format() {
        let msg: Message = ServerMessage::AssignId { id: ClientId(3) }.into();
        let bytes = encode(&msg).unwrap();
        assert_eq!(std::str::from_utf8(&bytes).unwrap(), r#"{"assign-id":3}"#);
        assert_eq!(decode(&bytes).unwrap(), msg);
    }

    #[test]
    fn test_deal_wire_format() {
        let msg: Message = ClientMessage {
            sender_id: Some(ClientId(2)),
            action: Action::Deal,
        }
        .into();
        let bytes = encode(&msg).unwrap();
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            r#"{"action":"deal","senderId":2}"#
        );
    }

    #[test]
    fn test_swap_keeps_selected_flags() {
        let msg: Message = ClientMessage {
            sender_id: Some(ClientId(1)),
            action: Action::Swap { hand: sample_hand() },
        }
        .into();
        let decoded = decode(&encode(&msg).unwrap()).unwrap();
        let Message::Client(ClientMessage {
            action: Action::Swap { hand },
            ..
        }) = decoded
        else {
            panic!("expected a swap, got {decoded:?}");
        };
        let flags: Vec<bool> = hand.iter().map(|card| card.selected).collect();
        assert_eq!(flags, vec![false, true, false, false, true]);
    }

    #[test]
    fn test_sender_id_is_optional() {
        let msg = decode(br#"{"action":"deal"}"#).unwrap();
        assert_eq!(
            msg,
            Message::Client(ClientMessage {
                sender_id: None,
                action: Action::Deal
            })
        );
    }

    #[test]
    fn test_start_and_reveal_shapes() {
        let start = decode(
            br#"{"init":[[1,0],[2,3]],"hand":[{"suit":"clubs","face":"J","selected":false}]}"#,
        )
        .unwrap();
        assert_eq!(
            start,
            Message::Server(ServerMessage::Start {
                hand: vec![Card::new(Suit::Clubs, Face::Jack)],
                init: vec![(ClientId(1), 0), (ClientId(2), 3)],
            })
        );

        let reveal = decode(br#"{"hs":[[1,1,[]],[2,0,[]]],"won":[1]}"#).unwrap();
        assert_eq!(
            reveal,
            Message::Server(ServerMessage::Reveal {
                hs: vec![(ClientId(1), 1, vec![]), (ClientId(2), 0, vec![])],
                won: vec![ClientId(1)],
            })
        );
    }

    #[test]
    fn test_hand_and_swap_ack_are_distinct() {
        let hand = decode(br#"{"hand":[]}"#).unwrap();
        assert_eq!(hand, Message::Server(ServerMessage::Hand { hand: vec![] }));
        let ack = decode(br#"{"hand":[],"swapped":true}"#).unwrap();
        assert_eq!(
            ack,
            Message::Server(ServerMessage::SwapAck {
                hand: vec![],
                swapped: true
            })
        );
    }

    #[test]
    fn test_unknown_field_is_rejected() {
        let err = decode(br#"{"hand":[],"chips":100}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::Json(_)));
    }

    #[test]
    fn test_illegal_combination_is_rejected() {
        let err = decode(br#"{"assign-id":1,"hand":[]}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::UnrecognizedShape(_)));
        let err = decode(br#"{"action":"deal","hand":[]}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::UnrecognizedShape(_)));
        let err = decode(b"{}").unwrap_err();
        assert!(matches!(err, ProtocolError::UnrecognizedShape(ref s) if s == "no fields"));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(decode(&[0xff, 0xfe]), Err(ProtocolError::Utf8(_))));
        assert!(matches!(decode(b"not json"), Err(ProtocolError::Json(_))));
        assert!(matches!(decode(br#"{"action":"fold"}"#), Err(ProtocolError::Json(_))));
    }
}
