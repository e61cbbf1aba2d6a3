//! Bounded command FIFO backed by the send ring.
//!
//! [`CommandQueue::enqueue`] validates a command, stages its parameter bytes
//! (and a copied payload, if any) at the tail of the [`RingBuffer`] and pushes
//! a [`QueuedCommand`] describing them. Because commands are dispatched one at
//! a time in FIFO order, the bytes of the command at the front of the queue are
//! always at the head of the ring: a queued command only records lengths.
//!
//! ```
//! use atlink_protocol::{AtCommand, CommandQueue, MuxMode, Operation};
//!
//! let mut queue = CommandQueue::new(4, 64).unwrap();
//! queue.enqueue(AtCommand::Multiplex, Operation::Set, MuxMode::Multiple.into()).unwrap();
//!
//! let cmd = queue.pop().unwrap();
//! assert_eq!(queue.line(&cmd).as_ref(), b"AT+CIPMUX=1\r\n");
//! ```

use crate::commands::{AtCommand, Operation};
use crate::params::{CommandParams, ContentStorage, render};
use crate::ring_buffer::RingBuffer;
use atlink_core::constants::LINE_TERMINATOR;
use atlink_core::{Error, ModemConfig, Result};
use bytes::{BufMut, Bytes, BytesMut};
use std::collections::VecDeque;

/// Payload sent after a command has been accepted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Payload {
    #[default]
    Empty,
    /// Staged in the ring right after the parameters.
    Internal { len: usize },
    /// Held by reference, nothing staged.
    External(Bytes),
}

impl Payload {
    pub fn is_empty(&self) -> bool {
        matches!(self, Payload::Empty)
    }

    /// Payload size in bytes.
    pub fn len(&self) -> usize {
        match self {
            Payload::Empty => 0,
            Payload::Internal { len } => *len,
            Payload::External(bytes) => bytes.len(),
        }
    }
}

/// A command waiting in (or just popped from) the FIFO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedCommand {
    pub command: AtCommand,
    pub operation: Operation,
    /// Parameter bytes still staged at the head of the ring.
    pub params_len: usize,
    pub payload: Payload,
}

impl QueuedCommand {
    /// Bytes this command still holds in the ring.
    pub fn staged_len(&self) -> usize {
        match self.payload {
            Payload::Internal { len } => self.params_len + len,
            _ => self.params_len,
        }
    }
}

#[derive(Debug)]
pub struct CommandQueue {
    ring: RingBuffer,
    fifo: VecDeque<QueuedCommand>,
    capacity: usize,
}

impl CommandQueue {
    /// Create a queue of `capacity` commands staging into `buffer_size` bytes.
    ///
    /// # Errors
    /// Returns `Error::Config` unless both sizes are powers of two.
    pub fn new(capacity: usize, buffer_size: usize) -> Result<Self> {
        if !capacity.is_power_of_two() {
            return Err(Error::Config(format!(
                "queue capacity must be a power of two, got {capacity}"
            )));
        }
        Ok(Self {
            ring: RingBuffer::new(buffer_size)?,
            fifo: VecDeque::with_capacity(capacity),
            capacity,
        })
    }

    pub fn from_config(config: &ModemConfig) -> Result<Self> {
        Self::new(config.queue_capacity, config.send_buffer_size)
    }

    /// Validate, stage and queue a command.
    ///
    /// `params` is only read for [`Operation::Set`]. On error nothing is
    /// queued and the ring holds exactly what it held before the call.
    ///
    /// # Errors
    /// - `Error::InvalidOperation` if `command` does not accept `operation`
    /// - `Error::QueueFull` if the FIFO is full
    /// - `Error::InvalidParameter` if the parameters are out of domain
    /// - `Error::BufferFull` if the staged bytes do not fit in the ring
    pub fn enqueue(
        &mut self,
        command: AtCommand,
        operation: Operation,
        params: CommandParams,
    ) -> Result<()> {
        if !command.supports(operation) {
            return Err(Error::InvalidOperation {
                command: command.to_string(),
                operation: operation.to_string(),
            });
        }
        if self.is_full() {
            return Err(Error::QueueFull {
                capacity: self.capacity,
            });
        }

        let mut queued = QueuedCommand {
            command,
            operation,
            params_len: 0,
            payload: Payload::Empty,
        };

        if operation == Operation::Set {
            let rendered = render(command, &params)?;
            queued.params_len = self.ring.append(&rendered.params)?;

            queued.payload = match rendered.payload {
                None => Payload::Empty,
                Some((bytes, ContentStorage::Reference)) => Payload::External(bytes),
                Some((bytes, ContentStorage::Copy)) => match self.ring.append(&bytes) {
                    Ok(len) => Payload::Internal { len },
                    Err(e) => {
                        self.ring.delete_back(queued.params_len);
                        return Err(e);
                    }
                },
            };
        }

        self.fifo.push_back(queued);
        Ok(())
    }

    /// Take the oldest command. Its staged bytes stay in the ring until released.
    pub fn pop(&mut self) -> Option<QueuedCommand> {
        self.fifo.pop_front()
    }

    /// The full command line: literal, operation, parameters and terminator.
    pub fn line(&self, cmd: &QueuedCommand) -> Bytes {
        let params = self.ring.front(cmd.params_len);
        let mut line = BytesMut::with_capacity(
            cmd.command.len() + cmd.operation.as_str().len() + params.len() + LINE_TERMINATOR.len(),
        );
        line.put_slice(cmd.command.as_str().as_bytes());
        line.put_slice(cmd.operation.as_str().as_bytes());
        line.put_slice(&params);
        line.put_slice(LINE_TERMINATOR);
        line.freeze()
    }

    /// Drop the parameter bytes of an accepted command.
    pub fn release_params(&mut self, cmd: &mut QueuedCommand) {
        self.ring.delete_front(cmd.params_len);
        cmd.params_len = 0;
    }

    /// Take the payload of a command whose parameters were released.
    ///
    /// A staged payload is copied out and removed from the ring.
    pub fn take_payload(&mut self, cmd: &mut QueuedCommand) -> Option<Bytes> {
        match std::mem::take(&mut cmd.payload) {
            Payload::Empty => None,
            Payload::Internal { len } => {
                let bytes = self.ring.front(len);
                self.ring.delete_front(len);
                Some(bytes)
            }
            Payload::External(bytes) => Some(bytes),
        }
    }

    /// Free everything the command still holds in the ring.
    pub fn discard(&mut self, cmd: &mut QueuedCommand) {
        self.ring.delete_front(cmd.staged_len());
        cmd.params_len = 0;
        cmd.payload = Payload::Empty;
    }

    pub fn len(&self) -> usize {
        self.fifo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fifo.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.fifo.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn ring(&self) -> &RingBuffer {
        &self.ring
    }

    /// Queued commands, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &QueuedCommand> {
        self.fifo.iter()
    }
}
