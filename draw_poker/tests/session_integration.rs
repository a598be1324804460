/// Integration tests for sessions: an authority router and participant
/// routers wired together with in-memory channels.
use draw_poker::{
    ClientId, Role, Router, RouterError, RouterHandle, RouterSettings, SessionEvent,
    entities::Card,
    functional::{argmin, strength},
    messages::{Action, ServerMessage},
    router::SessionSnapshot,
    transport::memory,
};
use std::time::Duration;
use tokio::{sync::mpsc::UnboundedReceiver, time::timeout};

const WAIT: Duration = Duration::from_secs(5);

type Events = UnboundedReceiver<SessionEvent>;

fn spawn(role: Role) -> (RouterHandle, Events) {
    let (router, handle, events) = Router::new(role, RouterSettings::default());
    tokio::spawn(router.run());
    (handle, events)
}

async fn next_event(events: &mut Events) -> SessionEvent {
    timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event stream closed")
}

/// Next game message, skipping connection bookkeeping.
async fn next_message(events: &mut Events) -> ServerMessage {
    loop {
        if let SessionEvent::Message(message) = next_event(events).await {
            return message;
        }
    }
}

async fn wait_for(events: &mut Events, wanted: &SessionEvent) {
    loop {
        if &next_event(events).await == wanted {
            return;
        }
    }
}

/// Connect a participant to `host` and wait until it knows its ID.
async fn join(host: &RouterHandle) -> (RouterHandle, Events, ClientId) {
    let (participant, mut events) = spawn(Role::Participant);
    let (host_side, participant_side) = memory::pair("host", "participant");
    let id = host.add_connection(host_side).await.unwrap();
    assert_eq!(
        participant.add_connection(participant_side).await.unwrap(),
        ClientId::AUTHORITY
    );
    wait_for(&mut events, &SessionEvent::AssignedId(id)).await;
    (participant, events, id)
}

fn select(hand: &[Card], positions: &[usize]) -> Vec<Card> {
    let mut hand = hand.to_vec();
    for &idx in positions {
        hand[idx].selected = true;
    }
    hand
}

#[tokio::test]
async fn test_two_player_round_end_to_end() {
    let (host, mut host_events) = spawn(Role::Authority { headless: false });
    let (remote, mut remote_events, remote_id) = join(&host).await;
    assert_eq!(remote_id, ClientId(2));
    assert_eq!(host.connected().await.unwrap(), 1);

    host.start_game().await.unwrap();
    let ServerMessage::Start { init, .. } = next_message(&mut host_events).await else {
        panic!("expected start on the host");
    };
    assert_eq!(init, vec![(ClientId(1), 0), (ClientId(2), 0)]);
    assert!(matches!(
        next_message(&mut remote_events).await,
        ServerMessage::Start { .. }
    ));

    // The host deals and both players get a fresh hand.
    host.submit(Action::Deal).await.unwrap();
    let ServerMessage::Hand { hand: host_hand } = next_message(&mut host_events).await else {
        panic!("expected a hand on the host");
    };
    let ServerMessage::Hand { hand: remote_hand } = next_message(&mut remote_events).await else {
        panic!("expected a hand on the participant");
    };
    assert_eq!(host_hand.len(), 5);
    assert_eq!(remote_hand.len(), 5);

    // The participant swaps two cards and only it hears back.
    let selected = select(&remote_hand, &[0, 4]);
    remote
        .submit(Action::Swap {
            hand: selected.clone(),
        })
        .await
        .unwrap();
    let ServerMessage::SwapAck { hand: swapped, swapped: true } =
        next_message(&mut remote_events).await
    else {
        panic!("expected a swap ack");
    };
    assert_eq!(swapped.len(), 5);
    let unchanged = remote_hand[1..4].iter().filter(|c| swapped.contains(c)).count();
    assert_eq!(unchanged, 3);
    assert!(!swapped.contains(&remote_hand[0]));
    assert!(!swapped.contains(&remote_hand[4]));

    // The host stands pat and the round is revealed to everyone.
    host.submit(Action::Swap { hand: host_hand.clone() }).await.unwrap();
    let host_reveal = next_message(&mut host_events).await;
    let remote_reveal = next_message(&mut remote_events).await;
    assert_eq!(host_reveal, remote_reveal);

    let ServerMessage::Reveal { hs, won } = host_reveal else {
        panic!("expected a reveal");
    };
    assert_eq!(hs.len(), 2);
    assert_eq!(hs[0].2, host_hand);
    assert_eq!(hs[1].2, swapped);

    let strengths: Vec<_> = hs.iter().map(|(_, _, hand)| strength(hand)).collect();
    let expected: Vec<ClientId> = argmin(&strengths).into_iter().map(|i| hs[i].0).collect();
    assert_eq!(won, expected);
    for (id, score, _) in &hs {
        assert_eq!(*score, u32::from(won.contains(id)));
    }
}

#[tokio::test]
async fn test_second_swap_is_ignored() {
    let (host, mut host_events) = spawn(Role::Authority { headless: false });
    let (remote, mut remote_events, _) = join(&host).await;
    host.start_game().await.unwrap();
    let ServerMessage::Start { hand, .. } = next_message(&mut remote_events).await else {
        panic!("expected start");
    };
    next_message(&mut host_events).await;

    remote.submit(Action::Swap { hand: hand.clone() }).await.unwrap();
    next_message(&mut remote_events).await;
    remote
        .submit(Action::Swap {
            hand: select(&hand, &[0, 1, 2]),
        })
        .await
        .unwrap();

    // Nothing comes back for the second swap; the round still needs the host.
    assert!(
        timeout(Duration::from_millis(200), next_message(&mut remote_events))
            .await
            .is_err()
    );
    let snapshot = host.snapshot().await.unwrap();
    assert_eq!(snapshot.scores, vec![(ClientId(1), 0), (ClientId(2), 0)]);
}

#[tokio::test]
async fn test_ids_are_reused_smallest_first() {
    let (host, mut host_events) = spawn(Role::Authority { headless: true });
    let (a, _a_events, a_id) = join(&host).await;
    let (_b, _b_events, b_id) = join(&host).await;
    assert_eq!((a_id, b_id), (ClientId(1), ClientId(2)));

    a.shutdown().await.unwrap();
    wait_for(
        &mut host_events,
        &SessionEvent::PeerLost {
            id: ClientId(1),
            connected: 1,
        },
    )
    .await;

    let (_c, _c_events, c_id) = join(&host).await;
    assert_eq!(c_id, ClientId(1));
}

#[tokio::test]
async fn test_departed_player_completes_round() {
    let (host, mut host_events) = spawn(Role::Authority { headless: true });
    let (a, mut a_events, _) = join(&host).await;
    let (b, _b_events, b_id) = join(&host).await;

    host.start_game().await.unwrap();
    let ServerMessage::Start { hand, .. } = next_message(&mut a_events).await else {
        panic!("expected start");
    };
    a.submit(Action::Swap { hand }).await.unwrap();
    assert!(matches!(
        next_message(&mut a_events).await,
        ServerMessage::SwapAck { .. }
    ));

    b.shutdown().await.unwrap();
    wait_for(
        &mut host_events,
        &SessionEvent::PeerLost {
            id: b_id,
            connected: 1,
        },
    )
    .await;

    let ServerMessage::Reveal { hs, won } = next_message(&mut a_events).await else {
        panic!("expected a reveal");
    };
    assert_eq!(hs.len(), 1);
    assert_eq!(won, vec![hs[0].0]);
}

#[tokio::test]
async fn test_losing_the_authority_resets_the_participant() {
    let (host, _host_events) = spawn(Role::Authority { headless: true });
    let (remote, mut remote_events, id) = join(&host).await;
    assert_eq!(remote.snapshot().await.unwrap().own_id, Some(id));

    host.shutdown().await.unwrap();
    wait_for(&mut remote_events, &SessionEvent::AuthorityLost).await;

    let snapshot: SessionSnapshot = remote.snapshot().await.unwrap();
    assert_eq!(snapshot.own_id, None);
    assert!(snapshot.clients.is_empty());
    assert_eq!(remote.connected().await.unwrap(), 0);
    assert!(matches!(
        remote.submit(Action::Deal).await,
        Err(RouterError::UnknownDestination(ClientId::AUTHORITY))
    ));
}

#[tokio::test]
async fn test_participant_actions_without_a_game_are_dropped() {
    let (host, _host_events) = spawn(Role::Authority { headless: true });
    let (remote, mut remote_events, _) = join(&host).await;

    remote.submit(Action::Deal).await.unwrap();

    assert!(
        timeout(Duration::from_millis(200), next_message(&mut remote_events))
            .await
            .is_err()
    );
    assert_eq!(host.connected().await.unwrap(), 1);
}
