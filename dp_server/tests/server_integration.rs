/// Integration tests for the host session: a real authority router with the
/// host's event loop on top, and participants joined over in-memory channels.
use dp_server::{
    config::{HostTransport, ServerConfig},
    host::{HostSession, HostStats},
};
use draw_poker::{
    ClientId, DealPolicy, Role, Router, RouterHandle, SessionEvent,
    messages::{Action, ServerMessage},
    net::framing::{Framing, MAX_FRAME_SIZE},
    router::{DEFAULT_MAX_CLIENTS, DEFAULT_QUEUE_CAPACITY},
    transport::memory,
};
use std::time::Duration;
use tokio::{sync::mpsc::UnboundedReceiver, time::timeout};

const WAIT: Duration = Duration::from_secs(5);

type Events = UnboundedReceiver<SessionEvent>;

/// The seat a non-headless host plays from.
const HOST_SEAT: ClientId = ClientId(1);

fn config(players: usize, headless: bool) -> ServerConfig {
    ServerConfig {
        transport: HostTransport::WebSocket,
        host: "127.0.0.1".to_string(),
        port: 0,
        framing: Framing::NulTerminated,
        max_frame_size: MAX_FRAME_SIZE,
        players,
        headless,
        deal_policy: DealPolicy::Anyone,
        max_clients: DEFAULT_MAX_CLIENTS,
        queue_capacity: DEFAULT_QUEUE_CAPACITY,
        metrics_bind: None,
    }
}

/// Start an authority router for `config` and the host session that drives it.
fn host(config: &ServerConfig) -> (RouterHandle, HostSession, Events) {
    let (router, handle, events) = Router::new(
        Role::Authority {
            headless: config.headless,
        },
        config.router_settings(),
    );
    tokio::spawn(router.run());
    let session = HostSession::new(handle.clone(), config);
    (handle, session, events)
}

async fn next_event(events: &mut Events) -> SessionEvent {
    timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event stream closed")
}

async fn next_message(events: &mut Events) -> ServerMessage {
    loop {
        if let SessionEvent::Message(message) = next_event(events).await {
            return message;
        }
    }
}

/// Feed host events into the session until `done` holds.
async fn pump(session: &mut HostSession, events: &mut Events, done: impl Fn(&HostSession) -> bool) {
    while !done(session) {
        let event = next_event(events).await;
        session.handle_event(event).await;
    }
}

async fn join(host: &RouterHandle) -> (RouterHandle, Events, ClientId) {
    let (router, handle, mut events) = Router::new(Role::Participant, Default::default());
    tokio::spawn(router.run());
    let (host_side, participant_side) = memory::pair("host", "participant");
    let id = host.add_connection(host_side).await.unwrap();
    handle.add_connection(participant_side).await.unwrap();
    loop {
        if next_event(&mut events).await == SessionEvent::AssignedId(id) {
            break;
        }
    }
    (handle, events, id)
}

#[tokio::test]
async fn test_game_starts_once_the_table_fills() {
    let config = config(3, false);
    let (handle, mut session, mut events) = host(&config);

    let (_a, mut a_events, _) = join(&handle).await;
    pump(&mut session, &mut events, |s| s.connected() == 1).await;
    assert!(!session.is_started());
    assert!(
        timeout(Duration::from_millis(200), next_message(&mut a_events))
            .await
            .is_err()
    );

    let (_b, _b_events, _) = join(&handle).await;
    pump(&mut session, &mut events, HostSession::is_started).await;
    assert_eq!(session.stats().games_started, 1);

    let ServerMessage::Start { init, .. } = next_message(&mut a_events).await else {
        panic!("expected start");
    };
    assert_eq!(init.len(), 3);
}

#[tokio::test]
async fn test_extra_joiner_does_not_restart_the_game() {
    let config = config(2, false);
    let (handle, mut session, mut events) = host(&config);

    let (_a, _a_events, _) = join(&handle).await;
    pump(&mut session, &mut events, HostSession::is_started).await;
    let (_b, _b_events, _) = join(&handle).await;
    pump(&mut session, &mut events, |s| s.connected() == 2).await;

    assert_eq!(session.stats().games_started, 1);
}

#[tokio::test]
async fn test_host_seat_stands_pat_and_scores_on_reveal() {
    let config = config(2, false);
    let (handle, mut session, mut events) = host(&config);
    let (remote, mut remote_events, remote_id) = join(&handle).await;

    let mut dealt = None;
    while session.stats().stood_pat == 0 {
        let event = next_event(&mut events).await;
        if let SessionEvent::Message(ServerMessage::Start { hand, .. }) = &event {
            dealt = Some(hand.clone());
        }
        session.handle_event(event).await;
    }
    let dealt = dealt.expect("host seat was dealt a hand");
    assert_eq!(session.stats().rounds_scored, 0);

    let ServerMessage::Start { hand, .. } = next_message(&mut remote_events).await else {
        panic!("expected start");
    };
    remote.submit(Action::Swap { hand }).await.unwrap();
    assert!(matches!(
        next_message(&mut remote_events).await,
        ServerMessage::Reveal { .. }
    ));

    let mut revealed = None;
    while session.stats().rounds_scored == 0 {
        let event = next_event(&mut events).await;
        if let SessionEvent::Message(ServerMessage::Reveal { hs, .. }) = &event {
            revealed = hs
                .iter()
                .find(|(id, _, _)| *id == HOST_SEAT)
                .map(|(_, _, hand)| hand.clone());
        }
        session.handle_event(event).await;
    }
    assert_eq!(revealed, Some(dealt));
    assert_eq!(
        session.stats(),
        HostStats {
            games_started: 1,
            rounds_scored: 1,
            stood_pat: 1,
        }
    );

    let snapshot = handle.snapshot().await.unwrap();
    assert!(snapshot.scores.iter().any(|(id, _)| *id == remote_id));
}

#[tokio::test]
async fn test_game_rearms_when_the_table_empties() {
    let config = config(2, false);
    let (handle, mut session, mut events) = host(&config);

    let (a, _a_events, _) = join(&handle).await;
    pump(&mut session, &mut events, HostSession::is_started).await;

    a.shutdown().await.unwrap();
    pump(&mut session, &mut events, |s| s.connected() == 0).await;
    assert!(!session.is_started());

    let (_b, mut b_events, _) = join(&handle).await;
    pump(&mut session, &mut events, |s| s.stats().games_started == 2).await;
    assert!(session.is_started());
    assert!(matches!(
        next_message(&mut b_events).await,
        ServerMessage::Start { .. }
    ));
}

#[tokio::test]
async fn test_headless_host_waits_for_every_seat() {
    let config = config(2, true);
    let (handle, mut session, mut events) = host(&config);

    let (_a, mut a_events, _) = join(&handle).await;
    pump(&mut session, &mut events, |s| s.connected() == 1).await;
    assert!(!session.is_started());

    let (_b, _b_events, _) = join(&handle).await;
    pump(&mut session, &mut events, HostSession::is_started).await;
    let ServerMessage::Start { init, .. } = next_message(&mut a_events).await else {
        panic!("expected start");
    };
    assert_eq!(init.len(), 2);
    assert_eq!(session.stats().stood_pat, 0);
}

#[tokio::test]
async fn test_run_returns_stats_when_the_router_stops() {
    let config = config(2, false);
    let (handle, session, events) = host(&config);
    let task = tokio::spawn(session.run(events));

    let (_a, mut a_events, _) = join(&handle).await;
    assert!(matches!(
        next_message(&mut a_events).await,
        ServerMessage::Start { .. }
    ));

    handle.shutdown().await.unwrap();
    let stats = timeout(WAIT, task).await.unwrap().unwrap();
    assert_eq!(stats.games_started, 1);
}
