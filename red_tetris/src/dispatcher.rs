//! Boundary between client connections and rooms
//!
//! The dispatcher runs as one task. It owns the room registry and the state of every
//! connection: which room and player name it joined and which keys are held down.
//! Client messages are validated and turned into room commands; events published by
//! rooms are routed back to the right connections.

use std::collections::{HashMap, HashSet};

use tetris_arena::{
    ArenaConfig, ArenaError, ClosedRoom, ConnectionId, PlayerName, Registry, Result, RoomName,
    RoomSender,
};

use crate::config::GameConfig;
use crate::protocol::{
    key_input, Audience, ClientMessage, JoinRejection, KeyInput, KeyPhase, RoomEvent, ServerEvent,
};
use crate::room::{Room, RoomCommand};

/// Input of the dispatcher task
#[derive(Debug)]
pub enum Inbound {
    /// New connection and the channel its events go to
    Connect {
        connection: ConnectionId,
        outbound: flume::Sender<ServerEvent>,
    },
    /// Message received on a connection
    Message {
        connection: ConnectionId,
        message: ClientMessage,
    },
    /// Connection closed by the transport
    Disconnect { connection: ConnectionId },
    /// Stop every room and exit
    Stop,
}

/// Room membership of one connection
#[derive(Debug)]
struct Session {
    room: RoomName,
    room_id: u64,
    player: PlayerName,
    /// Set once the room confirmed the join
    joined: bool,
    pressed: HashSet<String>,
}

#[derive(Debug)]
struct Connection {
    outbound: flume::Sender<ServerEvent>,
    session: Option<Session>,
}

impl Connection {
    fn send(&self, event: ServerEvent) {
        if self.outbound.send(event).is_err() {
            tracing::trace!("Outbound channel closed, event dropped");
        }
    }
}

pub struct Dispatcher {
    registry: Registry<Room>,
    connections: HashMap<ConnectionId, Connection>,
    inbound_tx: flume::Sender<Inbound>,
    inbound_rx: flume::Receiver<Inbound>,
    events_rx: flume::Receiver<RoomEvent>,
    closed_rx: flume::Receiver<ClosedRoom>,
}

impl Dispatcher {
    pub fn new(config: GameConfig, arena: ArenaConfig) -> Self {
        let (events_tx, events_rx) = flume::unbounded();
        let factory = move |name: &RoomName, sender: RoomSender<RoomCommand>| {
            Room::new(
                name.clone(),
                config.clone(),
                events_tx.clone(),
                sender,
                rand::random(),
            )
        };
        let registry = Registry::new(arena, factory);
        let closed_rx = registry.closed_receiver();
        let (inbound_tx, inbound_rx) = flume::unbounded();
        Self {
            registry,
            connections: HashMap::new(),
            inbound_tx,
            inbound_rx,
            events_rx,
            closed_rx,
        }
    }

    /// Handle used by transports to talk to the dispatcher task
    pub fn handle(&self) -> DispatcherHandle {
        DispatcherHandle {
            tx: self.inbound_tx.clone(),
        }
    }

    /// Dispatcher main loop, returns after [`DispatcherHandle::stop`]
    pub async fn run(mut self) {
        tracing::info!("Dispatcher started");
        loop {
            tokio::select! {
                inbound = self.inbound_rx.recv_async() => match inbound {
                    Ok(Inbound::Stop) | Err(_) => break,
                    Ok(inbound) => self.handle_inbound(inbound),
                },
                Ok(event) = self.events_rx.recv_async() => self.route(event),
                Ok(closed) = self.closed_rx.recv_async() => self.room_closed(closed),
            }
        }

        self.registry.shutdown().await;
        while let Ok(event) = self.events_rx.try_recv() {
            self.route(event);
        }
        tracing::info!("Dispatcher stopped");
    }

    fn handle_inbound(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Connect {
                connection,
                outbound,
            } => {
                tracing::debug!("{} connected", connection);
                self.connections.insert(
                    connection,
                    Connection {
                        outbound,
                        session: None,
                    },
                );
            }
            Inbound::Message {
                connection,
                message,
            } => self.handle_message(connection, message),
            Inbound::Disconnect { connection } => {
                tracing::debug!("{} disconnected", connection);
                if let Some(mut conn) = self.connections.remove(&connection) {
                    if let Some(session) = conn.session.take() {
                        self.leave(session);
                    }
                }
            }
            Inbound::Stop => {}
        }
    }

    fn handle_message(&mut self, connection: ConnectionId, message: ClientMessage) {
        let Some(conn) = self.connections.get_mut(&connection) else {
            tracing::debug!("Message from unknown {} dropped", connection);
            return;
        };

        match message {
            ClientMessage::Join { room, player } => {
                self.join(connection, &room, &player);
                return;
            }
            ClientMessage::Disconnect => {
                if let Some(session) = conn.session.take() {
                    self.leave(session);
                }
                return;
            }
            _ => {}
        }

        let Some(session) = conn.session.as_mut().filter(|s| s.joined) else {
            tracing::debug!("{} sent a game message before joining a room", connection);
            return;
        };
        let player = session.player.clone();
        let command = match message {
            ClientMessage::LeaderStart { speed } => RoomCommand::LeaderStart { player, speed },
            ClientMessage::Move { direction } => RoomCommand::Move { player, direction },
            ClientMessage::Rotate => RoomCommand::Rotate { player },
            ClientMessage::SetSpeedMode { mode } => RoomCommand::SetSpeedMode { player, mode },
            ClientMessage::Keyboard { phase, key } => {
                // A held key repeats its down event, only the first one counts
                let fresh = match phase {
                    KeyPhase::Down => session.pressed.insert(key.clone()),
                    KeyPhase::Up => session.pressed.remove(&key),
                };
                if !fresh {
                    return;
                }
                match key_input(phase, &key) {
                    Some(KeyInput::Move(direction)) => RoomCommand::Move { player, direction },
                    Some(KeyInput::Rotate) => RoomCommand::Rotate { player },
                    Some(KeyInput::Speed(mode)) => RoomCommand::SetSpeedMode { player, mode },
                    None => return,
                }
            }
            ClientMessage::Join { .. } | ClientMessage::Disconnect => return,
        };
        let (room, room_id) = (session.room.clone(), session.room_id);
        self.send_to_room(&room, room_id, command);
    }

    fn send_to_room(&self, room: &RoomName, room_id: u64, command: RoomCommand) {
        match self.registry.get(room) {
            Some(handle) if handle.id() == room_id => {
                if let Err(e) = handle.send(command) {
                    tracing::debug!("Command for room '{}' dropped: {}", room, e);
                }
            }
            _ => tracing::debug!("Command for closed room '{}' dropped", room),
        }
    }

    fn leave(&mut self, session: Session) {
        self.send_to_room(
            &session.room,
            session.room_id,
            RoomCommand::Disconnect {
                player: session.player,
            },
        );
    }

    fn reply(&self, connection: ConnectionId, event: ServerEvent) {
        if let Some(conn) = self.connections.get(&connection) {
            conn.send(event);
        }
    }

    /// Validate a join request and forward it to the room
    fn join(&mut self, connection: ConnectionId, room: &str, player: &str) {
        if self
            .connections
            .get(&connection)
            .is_some_and(|conn| conn.session.is_some())
        {
            tracing::debug!("{} is already in a room, join ignored", connection);
            return;
        }
        let names = RoomName::new(room).and_then(|room| Ok((room, PlayerName::new(player)?)));
        let (room, player) = match names {
            Ok(names) => names,
            Err(e) => {
                tracing::debug!("Join from {} rejected: {}", connection, e);
                self.reply(
                    connection,
                    ServerEvent::InvalidName {
                        reason: JoinRejection::Malformed,
                    },
                );
                return;
            }
        };

        // Rooms that already exited must be forgotten before a room instance is picked
        while let Ok(closed) = self.closed_rx.try_recv() {
            self.room_closed(closed);
        }
        self.request_join(connection, room, player);
    }

    fn request_join(&mut self, connection: ConnectionId, room: RoomName, player: PlayerName) {
        match self.send_join(connection, &room, &player) {
            Ok(room_id) => {
                if let Some(conn) = self.connections.get_mut(&connection) {
                    conn.session = Some(Session {
                        room,
                        room_id,
                        player,
                        joined: false,
                        pressed: HashSet::new(),
                    });
                }
            }
            Err(e) => {
                tracing::debug!("Join of '{}' to room '{}' failed: {}", player, room, e);
                if let Some(reason) = JoinRejection::from_error(&e) {
                    self.reply(connection, ServerEvent::InvalidName { reason });
                }
            }
        }
    }

    /// Queue the join into the room, opening it if needed. Returns the room instance id
    fn send_join(
        &mut self,
        connection: ConnectionId,
        room: &RoomName,
        player: &PlayerName,
    ) -> Result<u64> {
        for _ in 0..2 {
            let handle = self.registry.get_or_create(room)?;
            let command = RoomCommand::Join {
                player: player.clone(),
                connection,
            };
            match handle.send(command) {
                Ok(()) => return Ok(handle.id()),
                Err(_) => {
                    // Task exited between the lookup and the send
                    self.registry.discard(room);
                }
            }
        }
        Err(ArenaError::RoomClosed(room.to_string()))
    }

    fn route(&mut self, event: RoomEvent) {
        match event.audience {
            Audience::Connection(connection) => {
                let Some(conn) = self.connections.get_mut(&connection) else {
                    tracing::trace!("Event for gone {} dropped", connection);
                    return;
                };
                let mut rejected = false;
                if let Some(session) = conn.session.as_mut().filter(|s| s.room == event.room) {
                    match &event.event {
                        ServerEvent::Joined { .. } => session.joined = true,
                        ServerEvent::InvalidName { .. } => rejected = !session.joined,
                        _ => {}
                    }
                }
                if rejected {
                    conn.session = None;
                }
                conn.send(event.event);
            }
            Audience::All => {
                let destroyed = matches!(event.event, ServerEvent::RoomDestroyed { .. });
                for conn in self.connections.values_mut() {
                    let member = conn
                        .session
                        .as_ref()
                        .is_some_and(|s| s.joined && s.room == event.room);
                    if !member {
                        continue;
                    }
                    conn.send(event.event.clone());
                    if destroyed {
                        conn.session = None;
                    }
                }
            }
        }
    }

    /// Forget a room that exited and settle the connections still pointing at it
    fn room_closed(&mut self, closed: ClosedRoom) {
        // Events published before the exit must reach their recipients first
        while let Ok(event) = self.events_rx.try_recv() {
            self.route(event);
        }
        self.registry.remove_closed(&closed);

        let stranded: Vec<ConnectionId> = self
            .connections
            .iter()
            .filter(|(_, conn)| conn.session.as_ref().is_some_and(|s| s.room_id == closed.id))
            .map(|(connection, _)| *connection)
            .collect();
        for connection in stranded {
            let Some(session) = self
                .connections
                .get_mut(&connection)
                .and_then(|conn| conn.session.take())
            else {
                continue;
            };
            if session.joined {
                self.reply(
                    connection,
                    ServerEvent::RoomDestroyed {
                        room: session.room.to_string(),
                    },
                );
            } else {
                // The join was queued into a room that was already closing
                tracing::debug!("Retrying join of '{}' to room '{}'", session.player, session.room);
                self.request_join(connection, session.room, session.player);
            }
        }
    }
}

/// Cloneable handle to a running dispatcher
#[derive(Debug, Clone)]
pub struct DispatcherHandle {
    tx: flume::Sender<Inbound>,
}

impl DispatcherHandle {
    /// Register a new connection
    pub fn connect(&self) -> Result<ClientLink> {
        let connection = ConnectionId::generate();
        let (outbound, events) = flume::unbounded();
        self.tx
            .send(Inbound::Connect {
                connection,
                outbound,
            })
            .map_err(|_| ArenaError::ShuttingDown)?;
        Ok(ClientLink {
            connection,
            tx: self.tx.clone(),
            events,
        })
    }

    /// Ask the dispatcher to stop all rooms and exit
    pub fn stop(&self) {
        let _ = self.tx.send(Inbound::Stop);
    }
}

/// One client connection as seen by a transport
///
/// Dropping the link disconnects the client.
#[derive(Debug)]
pub struct ClientLink {
    connection: ConnectionId,
    tx: flume::Sender<Inbound>,
    events: flume::Receiver<ServerEvent>,
}

impl ClientLink {
    pub fn connection(&self) -> ConnectionId {
        self.connection
    }

    pub fn send(&self, message: ClientMessage) -> Result<()> {
        self.tx
            .send(Inbound::Message {
                connection: self.connection,
                message,
            })
            .map_err(|_| ArenaError::ShuttingDown)
    }

    /// Next event for this client, fails once the dispatcher is gone
    pub async fn recv(&self) -> Result<ServerEvent> {
        self.events
            .recv_async()
            .await
            .map_err(|_| ArenaError::ShuttingDown)
    }
}

impl Drop for ClientLink {
    fn drop(&mut self) {
        let _ = self.tx.send(Inbound::Disconnect {
            connection: self.connection,
        });
    }
}
