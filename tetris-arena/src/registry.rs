//! Registry of open rooms, owned by the server process

use std::collections::HashMap;

use crate::config::ArenaConfig;
use crate::engine::{EngineFactory, RoomEngine};
use crate::error::{ArenaError, Result};
use crate::room::{ClosedRoom, RoomHandle, RoomSender};
use crate::types::RoomName;

/// Set of running rooms keyed by name
///
/// Rooms are created on demand by [`Registry::get_or_create`] and removed when their
/// task reports back through [`Registry::closed_receiver`]. The registry is meant to
/// be owned by a single task, it is not shared.
pub struct Registry<E: RoomEngine> {
    config: ArenaConfig,
    rooms: HashMap<RoomName, RoomHandle<E::Command>>,
    factory: Box<dyn EngineFactory<E>>,
    closed_tx: flume::Sender<ClosedRoom>,
    closed_rx: flume::Receiver<ClosedRoom>,
    next_id: u64,
}

impl<E: RoomEngine> Registry<E> {
    pub fn new(config: ArenaConfig, factory: impl EngineFactory<E>) -> Self {
        let (closed_tx, closed_rx) = flume::unbounded();
        Self {
            config,
            rooms: HashMap::new(),
            factory: Box::new(factory),
            closed_tx,
            closed_rx,
            next_id: 1,
        }
    }

    /// Receiver of room exit notifications, to be passed to [`Registry::remove_closed`]
    pub fn closed_receiver(&self) -> flume::Receiver<ClosedRoom> {
        self.closed_rx.clone()
    }

    pub fn get(&self, name: &RoomName) -> Option<&RoomHandle<E::Command>> {
        self.rooms.get(name)
    }

    /// Return the room with this name, opening it first if needed
    ///
    /// A stale handle whose task already exited is replaced by a fresh room.
    pub fn get_or_create(&mut self, name: &RoomName) -> Result<&RoomHandle<E::Command>> {
        if self.rooms.get(name).is_some_and(|room| room.is_finished()) {
            self.discard(name);
        }

        if !self.rooms.contains_key(name) {
            if let Some(max) = self.config.max_rooms {
                if self.rooms.len() >= max {
                    return Err(ArenaError::RoomLimit(max));
                }
            }

            let id = self.next_id;
            self.next_id += 1;

            let (sender, receiver) = RoomSender::channel();
            let engine = (self.factory)(name, sender.clone());
            let handle = RoomHandle::spawn(
                id,
                name.clone(),
                engine,
                sender,
                receiver,
                self.closed_tx.clone(),
            );
            tracing::debug!("Registry opened room '{}' (id {})", name, id);
            self.rooms.insert(name.clone(), handle);
        }

        self.rooms
            .get(name)
            .ok_or_else(|| ArenaError::RoomNotFound(name.to_string()))
    }

    /// Drop the entry for a room regardless of its state
    pub fn discard(&mut self, name: &RoomName) -> bool {
        self.rooms.remove(name).is_some()
    }

    /// Remove a room after its task exited
    ///
    /// Only the instance that actually closed is removed: if a new room with the same
    /// name was opened meanwhile, it stays.
    pub fn remove_closed(&mut self, closed: &ClosedRoom) -> bool {
        match self.rooms.get(&closed.name) {
            Some(handle) if handle.id() == closed.id => {
                self.rooms.remove(&closed.name);
                tracing::info!("Room '{}' destroyed", closed.name);
                true
            }
            _ => false,
        }
    }

    /// Stop every room and wait for the tasks to finish
    pub async fn shutdown(&mut self) {
        for (_, handle) in self.rooms.drain() {
            handle.stop().await;
        }
        // Exit notifications are irrelevant once everything is stopped
        self.closed_rx.drain();
    }
}
