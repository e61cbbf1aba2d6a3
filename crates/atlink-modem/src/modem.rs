//! The protocol-core context object.
//!
//! A [`Modem`] owns everything the engine shares between its tasks: the
//! transport, the staged command queue, the inbound matchers, the connection
//! table and the callback slots. Share it through an [`Arc`](std::sync::Arc):
//! the receive task feeds inbound bytes while the application enqueues
//! commands and a background loop dispatches them.
//!
//! # Locking
//!
//! - the transport sits behind an async mutex, held for one read or write
//! - an async dispatch lock is held for a whole command, from pop to
//!   confirmation or drop, and for every armed wait
//! - the command queue and the inbound matchers each sit behind a std mutex
//!   that is never held across an `.await`
//! - the connection table is lock-free
//!
//! # Examples
//!
//! ```
//! use atlink_core::{ConnectionStatus, ModemConfig};
//! use atlink_hardware::{TokioDelay, mock::MockSerial};
//! use atlink_modem::Modem;
//! use atlink_protocol::{AtCommand, CommandParams, MuxMode, Operation};
//!
//! # fn main() -> atlink_core::Result<()> {
//! let (serial, _handle) = MockSerial::new();
//! let modem = Modem::new(serial, TokioDelay::new(), &ModemConfig::default())?;
//!
//! modem.enqueue(AtCommand::Multiplex, Operation::Set, MuxMode::Multiple.into())?;
//! assert_eq!(modem.pending_commands(), 1);
//!
//! modem.process_inbound(b"2,CONNECT\r\n");
//! assert_eq!(modem.connection_status(2), ConnectionStatus::Open);
//! # Ok(())
//! # }
//! ```

use crate::connections::ConnectionTable;
use crate::events::{Callbacks, DataReceived, ModemEvent};
use crate::inbound::Inbound;
use atlink_core::constants::MAX_CONNECTIONS;
use atlink_core::{ConnectionId, ConnectionStatus, Error, ModemConfig, Result};
use atlink_hardware::{Delay, Transport};
use atlink_protocol::{AtCommand, CommandParams, CommandQueue, Operation, WaitProcedure};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

/// Largest literal set any wait procedure arms.
fn required_pool_size() -> usize {
    [
        WaitProcedure::Ready,
        WaitProcedure::OkBusyError,
        WaitProcedure::SendPrompt,
    ]
    .iter()
    .map(|procedure| procedure.literals().len())
    .max()
    .unwrap_or(0)
}

/// ESP8266 AT-command engine over a transport `T`, sleeping with `D`.
pub struct Modem<T, D> {
    pub(crate) transport: tokio::sync::Mutex<T>,
    pub(crate) delay: D,
    pub(crate) dispatch: tokio::sync::Mutex<()>,
    pub(crate) outbound: Mutex<CommandQueue>,
    pub(crate) inbound: Mutex<Inbound>,
    pub(crate) connections: ConnectionTable,
    pub(crate) callbacks: Callbacks,
    pub(crate) config: ModemConfig,
}

impl<T: Transport, D: Delay> Modem<T, D> {
    /// Build an engine from a validated configuration.
    ///
    /// # Errors
    /// Returns `Error::Config` if the configuration is invalid or the matcher
    /// pool cannot hold the largest response set.
    pub fn new(transport: T, delay: D, config: &ModemConfig) -> Result<Self> {
        config.validate()?;
        let required = required_pool_size();
        if config.matcher_pool_size < required {
            return Err(Error::Config(format!(
                "matcher_pool_size must be at least {required}, got {}",
                config.matcher_pool_size
            )));
        }

        debug!(
            queue_capacity = config.queue_capacity,
            send_buffer_size = config.send_buffer_size,
            matcher_pool_size = config.matcher_pool_size,
            "modem initialised"
        );
        Ok(Self {
            transport: tokio::sync::Mutex::new(transport),
            delay,
            dispatch: tokio::sync::Mutex::new(()),
            outbound: Mutex::new(CommandQueue::from_config(config)?),
            inbound: Mutex::new(Inbound::new(
                config.matcher_pool_size,
                config.receive_buffer_size,
            )),
            connections: ConnectionTable::new(),
            callbacks: Callbacks::default(),
            config: config.clone(),
        })
    }

    /// Validate, stage and queue a command for the dispatch loop.
    ///
    /// # Errors
    /// Validation and capacity errors from [`CommandQueue::enqueue`]; nothing
    /// is queued or staged when an error is returned.
    pub fn enqueue(
        &self,
        command: AtCommand,
        operation: Operation,
        params: CommandParams,
    ) -> Result<()> {
        self.outbound().enqueue(command, operation, params)?;
        debug!(%command, %operation, "command queued");
        Ok(())
    }

    /// Feed inbound bytes through the fan-out and fire the resulting callbacks.
    ///
    /// Returns the events, in detection order.
    pub fn process_inbound(&self, bytes: &[u8]) -> Vec<ModemEvent> {
        if bytes.is_empty() {
            return Vec::new();
        }
        trace!(len = bytes.len(), rx = %String::from_utf8_lossy(bytes).escape_debug(), "rx");

        let mut events = Vec::new();
        {
            let mut inbound = self.inbound();
            for &byte in bytes {
                inbound.feed(byte, &self.connections, &mut events);
            }
        }
        for event in &events {
            self.callbacks.emit(event);
        }
        events
    }

    /// Write bytes straight to the transport, bypassing the queue.
    ///
    /// # Errors
    /// Returns `Error::Transport` if the write fails.
    pub async fn write_raw(&self, bytes: &[u8]) -> Result<()> {
        self.write(bytes).await?;
        Ok(())
    }

    /// Capacity of the framed-data capture buffer used from the next payload on.
    pub fn set_receive_buffer(&self, capacity: usize) {
        self.inbound().set_receive_buffer(capacity);
    }

    pub fn receive_buffer(&self) -> usize {
        self.inbound().receive_buffer()
    }

    /// Status of a connection; IDs the radio cannot report read as closed.
    pub fn connection_status(&self, id: u8) -> ConnectionStatus {
        self.connections.status_of(id)
    }

    /// Status of every connection slot.
    pub fn connections(&self) -> [ConnectionStatus; MAX_CONNECTIONS] {
        self.connections.snapshot()
    }

    pub fn open_connections(&self) -> Vec<ConnectionId> {
        ConnectionId::all()
            .filter(|id| self.connections.status(*id).is_open())
            .collect()
    }

    pub fn pending_commands(&self) -> usize {
        self.outbound().len()
    }

    /// Free bytes in the send ring.
    pub fn send_buffer_free(&self) -> usize {
        self.outbound().ring().free()
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }

    pub fn config(&self) -> &ModemConfig {
        &self.config
    }

    /// Called once per command confirmed by the dispatch loop.
    pub fn register_command_sent(&self, callback: impl FnMut(AtCommand) + Send + 'static) {
        self.callbacks.set_command_sent(Box::new(callback));
    }

    /// Called once per framed-data message.
    pub fn register_data_received(
        &self,
        callback: impl FnMut(&DataReceived) + Send + 'static,
    ) {
        self.callbacks.set_data_received(Box::new(callback));
    }

    /// Called for every lifecycle notification, including closes caused by a reset.
    pub fn register_connection_changed(
        &self,
        callback: impl FnMut(ConnectionId, ConnectionStatus) + Send + 'static,
    ) {
        self.callbacks.set_connection_changed(Box::new(callback));
    }

    pub fn register_reset_detected(&self, callback: impl FnMut() + Send + 'static) {
        self.callbacks.set_reset_detected(Box::new(callback));
    }

    pub(crate) async fn write(&self, bytes: &[u8]) -> atlink_hardware::Result<()> {
        let mut transport = self.transport.lock().await;
        transport.write_all(bytes).await?;
        trace!(len = bytes.len(), tx = %String::from_utf8_lossy(bytes).escape_debug(), "tx");
        Ok(())
    }

    pub(crate) fn outbound(&self) -> MutexGuard<'_, CommandQueue> {
        self.outbound.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn inbound(&self) -> MutexGuard<'_, Inbound> {
        self.inbound.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T, D> std::fmt::Debug for Modem<T, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Modem")
            .field("connections", &self.connections)
            .field("callbacks", &self.callbacks)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
