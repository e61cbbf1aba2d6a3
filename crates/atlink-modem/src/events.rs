//! Events surfaced to the application and the callback slots that receive them.
//!
//! Every slot holds at most one callback. Callbacks run synchronously on the
//! task that detected the event, after the engine has released its own
//! locks, so a callback may enqueue commands or query the connection table.
//! It must not register a callback for its own slot.

use atlink_core::{ConnectionId, ConnectionInfo, ConnectionStatus};
use atlink_protocol::AtCommand;
use bytes::Bytes;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A framed-data message delivered by the radio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataReceived {
    pub connection_id: ConnectionId,
    /// Length announced in the header.
    pub declared_length: usize,
    /// Captured bytes; shorter than `declared_length` when truncated.
    pub data: Bytes,
    /// Capacity of the capture buffer at the time of capture.
    pub capacity: usize,
}

impl DataReceived {
    pub fn is_truncated(&self) -> bool {
        self.declared_length > self.capacity
    }
}

/// Event detected by the stream fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModemEvent {
    DataReceived(DataReceived),
    ConnectionChanged(ConnectionInfo),
    ResetDetected,
}

impl fmt::Display for ModemEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModemEvent::DataReceived(data) => write!(
                f,
                "data from connection {} ({} bytes)",
                data.connection_id, data.declared_length
            ),
            ModemEvent::ConnectionChanged(info) => write!(f, "{info}"),
            ModemEvent::ResetDetected => write!(f, "module reset"),
        }
    }
}

pub type CommandSentFn = Box<dyn FnMut(AtCommand) + Send>;
pub type DataReceivedFn = Box<dyn FnMut(&DataReceived) + Send>;
pub type ConnectionChangedFn = Box<dyn FnMut(ConnectionId, ConnectionStatus) + Send>;
pub type ResetDetectedFn = Box<dyn FnMut() + Send>;

type Slot<F> = Mutex<Option<F>>;

fn lock<F>(slot: &Slot<F>) -> MutexGuard<'_, Option<F>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
pub(crate) struct Callbacks {
    command_sent: Slot<CommandSentFn>,
    data_received: Slot<DataReceivedFn>,
    connection_changed: Slot<ConnectionChangedFn>,
    reset_detected: Slot<ResetDetectedFn>,
}

impl Callbacks {
    pub(crate) fn set_command_sent(&self, callback: CommandSentFn) {
        *lock(&self.command_sent) = Some(callback);
    }

    pub(crate) fn set_data_received(&self, callback: DataReceivedFn) {
        *lock(&self.data_received) = Some(callback);
    }

    pub(crate) fn set_connection_changed(&self, callback: ConnectionChangedFn) {
        *lock(&self.connection_changed) = Some(callback);
    }

    pub(crate) fn set_reset_detected(&self, callback: ResetDetectedFn) {
        *lock(&self.reset_detected) = Some(callback);
    }

    pub(crate) fn command_sent(&self, command: AtCommand) {
        if let Some(callback) = lock(&self.command_sent).as_mut() {
            callback(command);
        }
    }

    pub(crate) fn emit(&self, event: &ModemEvent) {
        match event {
            ModemEvent::DataReceived(data) => {
                if let Some(callback) = lock(&self.data_received).as_mut() {
                    callback(data);
                }
            }
            ModemEvent::ConnectionChanged(info) => {
                if let Some(callback) = lock(&self.connection_changed).as_mut() {
                    callback(info.connection_id, info.new_status);
                }
            }
            ModemEvent::ResetDetected => {
                if let Some(callback) = lock(&self.reset_detected).as_mut() {
                    callback();
                }
            }
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("command_sent", &lock(&self.command_sent).is_some())
            .field("data_received", &lock(&self.data_received).is_some())
            .field("connection_changed", &lock(&self.connection_changed).is_some())
            .field("reset_detected", &lock(&self.reset_detected).is_some())
            .finish()
    }
}
