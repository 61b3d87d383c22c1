//! Room actor: one task per room, one command in flight at a time

use crate::engine::RoomEngine;
use crate::error::{ArenaError, Result};
use crate::types::RoomName;

/// Messages accepted by a room task
#[derive(Debug, Clone)]
pub enum RoomMessage<C> {
    /// Process an engine command
    Command(C),
    /// Stop the room's run loop
    Stop,
}

/// Cloneable sender into a room task
#[derive(Debug)]
pub struct RoomSender<C> {
    tx: flume::Sender<RoomMessage<C>>,
}

impl<C> Clone for RoomSender<C> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<C> RoomSender<C> {
    /// Create an unbounded room channel
    pub fn channel() -> (Self, flume::Receiver<RoomMessage<C>>) {
        let (tx, rx) = flume::unbounded();
        (Self { tx }, rx)
    }

    /// Queue a command for the room, fails once the room task is gone
    pub fn send(&self, command: C) -> Result<()> {
        self.tx
            .send(RoomMessage::Command(command))
            .map_err(|_| ArenaError::RoomClosed("room task has exited".to_string()))
    }

    /// Ask the room task to stop after the commands already queued
    pub fn stop(&self) {
        let _ = self.tx.send(RoomMessage::Stop);
    }
}

/// Notification sent by a room task when it exits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedRoom {
    /// Name of the closed room
    pub name: RoomName,
    /// Registry id of the closed room instance
    pub id: u64,
}

/// Registry side handle of a running room task
#[derive(Debug)]
pub struct RoomHandle<C> {
    id: u64,
    name: RoomName,
    sender: RoomSender<C>,
    task: tokio::task::JoinHandle<()>,
}

impl<C> RoomHandle<C> {
    /// Spawn the room task for `engine`
    pub(crate) fn spawn<E>(
        id: u64,
        name: RoomName,
        engine: E,
        sender: RoomSender<C>,
        receiver: flume::Receiver<RoomMessage<C>>,
        closed_tx: flume::Sender<ClosedRoom>,
    ) -> Self
    where
        C: Send + 'static,
        E: RoomEngine<Command = C>,
    {
        let task = tokio::spawn(run_room(engine, receiver, name.clone(), id, closed_tx));
        Self {
            id,
            name,
            sender,
            task,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &RoomName {
        &self.name
    }

    pub fn sender(&self) -> &RoomSender<C> {
        &self.sender
    }

    /// Queue a command for this room
    pub fn send(&self, command: C) -> Result<()> {
        self.sender
            .send(command)
            .map_err(|_| ArenaError::RoomClosed(self.name.to_string()))
    }

    /// Whether the room task has already finished
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the room and wait for its task to finish
    pub async fn stop(self) {
        self.sender.stop();
        if let Err(e) = self.task.await {
            tracing::error!("Room '{}' task failed: {}", self.name, e);
        }
    }
}

/// Room task body
///
/// Runs until the engine reports an empty room, a Stop message arrives or a command
/// fails with a fatal error. The engine is always shut down before the registry is
/// notified.
pub(crate) async fn run_room<E>(
    mut engine: E,
    receiver: flume::Receiver<RoomMessage<E::Command>>,
    name: RoomName,
    id: u64,
    closed_tx: flume::Sender<ClosedRoom>,
) where
    E: RoomEngine,
{
    tracing::info!("Room '{}' opened", name);

    while let Ok(message) = receiver.recv_async().await {
        match message {
            RoomMessage::Stop => {
                tracing::info!("Room '{}' stop requested", name);
                break;
            }
            RoomMessage::Command(command) => match engine.handle(command) {
                Ok(()) => {}
                Err(e) if e.is_fatal() => {
                    tracing::error!("Room '{}' torn down: {}", name, e);
                    break;
                }
                Err(e) => {
                    tracing::debug!("Room '{}' rejected command: {}", name, e);
                }
            },
        }
        if engine.is_empty() {
            break;
        }
    }

    engine.shutdown();
    tracing::info!("Room '{}' closed", name);
    let _ = closed_tx.send(ClosedRoom { name, id });
}
