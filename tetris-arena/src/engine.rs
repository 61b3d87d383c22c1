use crate::error::Result;
use crate::room::RoomSender;
use crate::types::RoomName;

/// Trait for room engine integration
///
/// One engine instance owns the whole state of a room. The arena runs it inside a
/// dedicated task and feeds it one command at a time, so the engine never sees two
/// mutations interleaved.
pub trait RoomEngine: Send + 'static {
    /// Command type delivered to the room (client input, timer ticks)
    type Command: Send + 'static;

    /// Apply one command to the room state
    ///
    /// Errors for which [`crate::ArenaError::is_fatal`] is true tear the room down,
    /// any other error is logged and the room keeps running.
    fn handle(&mut self, command: Self::Command) -> Result<()>;

    /// Whether the room has nobody left in it and can be destroyed
    fn is_empty(&self) -> bool;

    /// Release timers and notify members before the room task exits
    fn shutdown(&mut self);
}

/// Type alias for engine factory function
///
/// This function creates a room engine given:
/// - The name of the room being opened
/// - A sender the engine can hand to its own timers to post commands back into the room
///
/// # Example
/// ```ignore
/// fn create_room(name: &RoomName, sender: RoomSender<Command>) -> MyRoom {
///     MyRoom::new(name.clone(), sender)
/// }
/// ```
pub trait EngineFactory<E: RoomEngine>:
    Fn(&RoomName, RoomSender<E::Command>) -> E + Send + Sync + 'static
{
}

// Blanket implementation for all types that satisfy the trait bounds
impl<E, F> EngineFactory<E> for F
where
    E: RoomEngine,
    F: Fn(&RoomName, RoomSender<E::Command>) -> E + Send + Sync + 'static,
{
}
