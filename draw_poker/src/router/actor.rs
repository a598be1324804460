//! Router actor: owns the session and serializes every change to it.

use tokio::sync::{mpsc, oneshot};

use super::{
    messages::{RouterError, RouterMessage, SessionEvent, SessionSnapshot},
    session::{ConnectionKey, ReaderGuard, Role, Route, RouterSettings, Session},
};
use crate::{
    game::{Envelope, Poker, Recipient, entities::ClientId},
    net::{
        messages::{Action, ClientMessage, Message, ServerMessage, decode, encode},
        transport::{Channel, FrameSink, FrameSource},
    },
};

/// Inbox capacity. Readers wait when the router falls behind.
const INBOX_CAPACITY: usize = 100;

/// Router handle for sending messages
#[derive(Clone, Debug)]
pub struct RouterHandle {
    sender: mpsc::Sender<RouterMessage>,
}

impl RouterHandle {
    async fn request<T>(
        &self,
        message: impl FnOnce(oneshot::Sender<T>) -> RouterMessage,
    ) -> Result<T, RouterError> {
        let (response, rx) = oneshot::channel();
        self.sender
            .send(message(response))
            .await
            .map_err(|_| RouterError::Closed)?;
        rx.await.map_err(|_| RouterError::Closed)
    }

    async fn notify(&self, message: RouterMessage) -> Result<(), RouterError> {
        self.sender
            .send(message)
            .await
            .map_err(|_| RouterError::Closed)
    }

    /// Register an open connection and start reading from it. On the
    /// authority the new client is sent its ID before anything else.
    pub async fn add_connection(&self, channel: Channel) -> Result<ClientId, RouterError> {
        self.request(|response| RouterMessage::AddConnection { channel, response })
            .await?
    }

    pub async fn remove_connection(&self, key: ConnectionKey) -> Result<(), RouterError> {
        self.notify(RouterMessage::RemoveConnection {
            key,
            reason: "removed".to_string(),
        })
        .await
    }

    pub async fn dispatch(&self, key: ConnectionKey, frame: Vec<u8>) -> Result<(), RouterError> {
        self.notify(RouterMessage::Dispatch { key, frame }).await
    }

    pub async fn send(&self, message: ServerMessage, to: ClientId) -> Result<(), RouterError> {
        self.request(|response| RouterMessage::Send {
            message,
            to,
            response,
        })
        .await?
    }

    pub async fn send_all(&self, message: ServerMessage) -> Result<(), RouterError> {
        self.notify(RouterMessage::SendAll { message }).await
    }

    /// Play an action as this process's own player.
    pub async fn submit(&self, action: Action) -> Result<(), RouterError> {
        self.request(|response| RouterMessage::Submit { action, response })
            .await?
    }

    pub async fn start_game(&self) -> Result<(), RouterError> {
        self.request(|response| RouterMessage::StartGame { response })
            .await?
    }

    pub async fn connected(&self) -> Result<usize, RouterError> {
        self.request(|response| RouterMessage::Connected { response })
            .await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, RouterError> {
        self.request(|response| RouterMessage::Snapshot { response })
            .await
    }

    pub async fn shutdown(&self) -> Result<(), RouterError> {
        self.notify(RouterMessage::Shutdown).await
    }

    /// Whether the router has stopped.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

/// Connection router for one process
pub struct Router {
    /// Connection table, own ID, and game
    session: Session,

    settings: RouterSettings,

    /// Message inbox
    inbox: mpsc::Receiver<RouterMessage>,

    /// For connection tasks. Doesn't keep the router alive.
    weak_sender: mpsc::WeakSender<RouterMessage>,

    /// Presentation layer notifications
    events: mpsc::UnboundedSender<SessionEvent>,

    next_key: u64,

    is_closed: bool,
}

impl Router {
    #[must_use]
    pub fn new(
        role: Role,
        settings: RouterSettings,
    ) -> (Self, RouterHandle, mpsc::UnboundedReceiver<SessionEvent>) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let (events, events_rx) = mpsc::unbounded_channel();
        let router = Self {
            session: Session::new(role, settings.max_clients),
            settings,
            inbox,
            weak_sender: sender.downgrade(),
            events,
            next_key: 0,
            is_closed: false,
        };
        (router, RouterHandle { sender }, events_rx)
    }

    /// Run the router until it's shut down or every handle is dropped.
    pub async fn run(mut self) {
        log::info!("Router starting as {}", self.session.role);

        while let Some(message) = self.inbox.recv().await {
            self.handle_message(message);
            if self.is_closed {
                break;
            }
        }

        log::info!("Router closed");
    }

    fn handle_message(&mut self, message: RouterMessage) {
        match message {
            RouterMessage::AddConnection { channel, response } => {
                let _ = response.send(self.add_connection(channel));
            }
            RouterMessage::RemoveConnection { key, reason } => {
                self.remove_connection(key, &reason);
            }
            RouterMessage::Dispatch { key, frame } => self.dispatch(key, &frame),
            RouterMessage::Send {
                message,
                to,
                response,
            } => {
                let _ = response.send(self.send(to, message.into()));
            }
            RouterMessage::SendAll { message } => self.send_all(&message),
            RouterMessage::Submit { action, response } => {
                let _ = response.send(self.submit(action));
            }
            RouterMessage::StartGame { response } => {
                let _ = response.send(self.start_game());
            }
            RouterMessage::Connected { response } => {
                let _ = response.send(self.session.table.remote_count());
            }
            RouterMessage::Snapshot { response } => {
                let _ = response.send(self.snapshot());
            }
            RouterMessage::Shutdown => {
                log::info!("Router shutting down");
                self.session = Session::new(self.session.role, self.settings.max_clients);
                self.is_closed = true;
            }
        }
    }

    fn emit(&self, event: SessionEvent) {
        // Nobody listening is fine; a headless host may ignore events.
        let _ = self.events.send(event);
    }

    fn add_connection(&mut self, channel: Channel) -> Result<ClientId, RouterError> {
        let (peer, mut sink, source) = channel.split();

        let Some(id) = self.session.table.next_free() else {
            let max = self.session.table.max_clients();
            log::warn!("Refusing connection from {peer}: all {max} client IDs are taken");
            tokio::spawn(async move {
                let _ = sink.close().await;
            });
            self.emit(SessionEvent::Notice(format!(
                "refused {peer}: all {max} client IDs are taken"
            )));
            return Err(RouterError::CapacityReached { max });
        };

        let greeting = if self.session.role.is_authority() {
            Some(encode(&ServerMessage::AssignId { id }.into())?)
        } else {
            None
        };

        let key = ConnectionKey(self.next_key);
        self.next_key += 1;

        let (queue, queue_rx) = mpsc::channel(self.settings.queue_capacity);
        if let Some(frame) = greeting {
            // The queue is fresh, so there's always room for the first frame.
            let _ = queue.try_send(frame);
        }
        self.spawn_writer(key, sink, queue_rx);
        let reader = self.spawn_reader(key, source);

        self.session.table.allocate(Route::Remote {
            key,
            peer: peer.clone(),
            queue,
            reader: ReaderGuard(reader),
        })?;

        let connected = self.session.table.remote_count();
        log::info!("Client {id} connected from {peer} ({connected} connected)");
        self.emit(SessionEvent::Connected { id, connected });
        Ok(id)
    }

    /// Drains one connection's outbound queue in order. Ends, closing the
    /// sink, once the route holding the queue is dropped.
    fn spawn_writer(
        &self,
        key: ConnectionKey,
        mut sink: Box<dyn FrameSink>,
        mut queue: mpsc::Receiver<Vec<u8>>,
    ) {
        let inbox = self.weak_sender.clone();
        tokio::spawn(async move {
            while let Some(frame) = queue.recv().await {
                if let Err(err) = sink.send(frame).await {
                    if let Some(inbox) = inbox.upgrade() {
                        let _ = inbox
                            .send(RouterMessage::RemoveConnection {
                                key,
                                reason: format!("send failed: {err}"),
                            })
                            .await;
                    }
                    break;
                }
            }
            let _ = sink.close().await;
        });
    }

    /// Feeds frames from one connection into the inbox until the connection
    /// ends, then reports it gone.
    fn spawn_reader(
        &self,
        key: ConnectionKey,
        mut source: Box<dyn FrameSource>,
    ) -> tokio::task::AbortHandle {
        let inbox = self.weak_sender.clone();
        let task = tokio::spawn(async move {
            let reason = loop {
                match source.recv().await {
                    Ok(Some(frame)) => {
                        let Some(inbox) = inbox.upgrade() else {
                            return;
                        };
                        if inbox
                            .send(RouterMessage::Dispatch { key, frame })
                            .await
                            .is_err()
                        {
                            return;
                        }
                    }
                    Ok(None) => break "connection closed".to_string(),
                    Err(err) => break format!("receive failed: {err}"),
                }
            };
            if let Some(inbox) = inbox.upgrade() {
                let _ = inbox
                    .send(RouterMessage::RemoveConnection { key, reason })
                    .await;
            }
        });
        task.abort_handle()
    }

    fn remove_connection(&mut self, key: ConnectionKey, reason: &str) {
        let Some(id) = self.session.table.id_of(key) else {
            log::debug!("Connection {key} already removed ({reason})");
            return;
        };

        if self.session.table.is_authority(id) {
            log::warn!("Lost connection to the authority: {reason}");
            self.session = Session::new(self.session.role, self.settings.max_clients);
            self.emit(SessionEvent::AuthorityLost);
            return;
        }

        self.session.table.remove(id);
        let connected = self.session.table.remote_count();
        log::info!("Client {id} disconnected: {reason} ({connected} connected)");
        self.emit(SessionEvent::PeerLost { id, connected });
        self.emit(SessionEvent::Notice(format!(
            "client {id} disconnected: {reason}"
        )));

        if let Some(game) = self.session.game.as_mut() {
            let envelopes = game.remove_player(id);
            self.deliver(envelopes);
        }
    }

    fn dispatch(&mut self, key: ConnectionKey, frame: &[u8]) {
        let Some(id) = self.session.table.id_of(key) else {
            log::debug!("Dropping frame from removed connection {key}");
            return;
        };

        let message = match decode(frame) {
            Ok(message) => message,
            Err(err) => {
                log::warn!("Dropping frame from client {id}: {err}");
                return;
            }
        };

        match (self.session.role, message) {
            (Role::Authority { .. }, Message::Client(ClientMessage { sender_id, action })) => {
                if sender_id.is_some_and(|claimed| claimed != id) {
                    log::warn!(
                        "Client {id} claimed to be {:?}, using the connection's ID",
                        sender_id
                    );
                }
                if let Err(err) = self.apply(id, action) {
                    log::warn!("Client {id}: {err}");
                }
            }
            (Role::Participant, Message::Server(message)) if self.session.table.is_authority(id) => {
                if let ServerMessage::AssignId { id: assigned } = message {
                    log::info!("Assigned client ID {assigned}");
                    self.session.own_id = Some(assigned);
                    self.emit(SessionEvent::AssignedId(assigned));
                } else {
                    self.emit(SessionEvent::Message(message));
                }
            }
            (_, message) => {
                log::warn!("Dropping unexpected message from client {id}: {message:?}");
            }
        }
    }

    /// Run an action through the engine as `sender` and deliver the result.
    fn apply(&mut self, sender: ClientId, action: Action) -> Result<(), RouterError> {
        let game = self.session.game.as_mut().ok_or(RouterError::NoGame)?;
        log::debug!("Client {sender}: {action}");
        let envelopes = game.handle(sender, action)?;
        self.deliver(envelopes);
        Ok(())
    }

    fn deliver(&mut self, envelopes: Vec<Envelope>) {
        for Envelope { to, message } in envelopes {
            match to {
                Recipient::Player(id) => {
                    if let Err(err) = self.send(id, message.into()) {
                        log::warn!("Failed to deliver to client {id}: {err}");
                    }
                }
                Recipient::Everyone => self.send_all(&message),
            }
        }
    }

    fn send(&mut self, to: ClientId, message: Message) -> Result<(), RouterError> {
        let (key, reason) = match self.session.table.get(to) {
            None => return Err(RouterError::UnknownDestination(to)),
            Some(Route::Engine) => {
                log::debug!("Dropping message addressed to the engine");
                return Ok(());
            }
            Some(Route::Local) => {
                match message {
                    Message::Server(message) => self.emit(SessionEvent::Message(message)),
                    Message::Client(_) => log::debug!("Dropping client message addressed to self"),
                }
                return Ok(());
            }
            Some(Route::Remote { key, queue, .. }) => {
                let frame = encode(&message)?;
                match queue.try_send(frame) {
                    Ok(()) => return Ok(()),
                    Err(mpsc::error::TrySendError::Full(_)) => (*key, "outbound queue full"),
                    Err(mpsc::error::TrySendError::Closed(_)) => (*key, "connection closed"),
                }
            }
        };
        self.remove_connection(key, reason);
        Ok(())
    }

    fn send_all(&mut self, message: &ServerMessage) {
        let ids: Vec<ClientId> = self
            .session
            .table
            .ids()
            .filter(|id| !id.is_authority())
            .collect();
        for id in ids {
            if let Err(err) = self.send(id, message.clone().into()) {
                log::warn!("Failed to deliver to client {id}: {err}");
            }
        }
    }

    fn submit(&mut self, action: Action) -> Result<(), RouterError> {
        match self.session.role {
            Role::Authority { .. } => {
                let own_id = self.session.own_id.ok_or(RouterError::NoLocalSeat)?;
                self.apply(own_id, action)
            }
            Role::Participant => {
                let message = ClientMessage {
                    sender_id: self.session.own_id,
                    action,
                };
                self.send(ClientId::AUTHORITY, message.into())
            }
        }
    }

    fn start_game(&mut self) -> Result<(), RouterError> {
        if !self.session.role.is_authority() {
            return Err(RouterError::NotAuthority);
        }
        let seats: Vec<ClientId> = self
            .session
            .table
            .ids()
            .filter(|id| !id.is_authority())
            .collect();
        let (game, envelopes) = Poker::new(&seats, self.settings.game)?;
        log::info!("Starting a game with {} players", seats.len());
        self.session.game = Some(game);
        self.deliver(envelopes);
        Ok(())
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            role: self.session.role,
            own_id: self.session.own_id,
            clients: self.session.table.ids().collect(),
            scores: self
                .session
                .game
                .as_ref()
                .map(Poker::scores)
                .unwrap_or_default(),
            phase: self.session.game.as_ref().map(Poker::phase),
        }
    }
}
