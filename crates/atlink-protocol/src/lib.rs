//! Protocol core of the AT-command link: byte matchers, the command catalogue,
//! the parameter formatter and the staged command queue.
//!
//! Everything here is synchronous and performs no I/O.

pub mod commands;
pub mod matcher;
pub mod params;
pub mod queue;
pub mod ring_buffer;

pub use commands::{AtCommand, Operation, OperationSet, WaitOutcome, WaitProcedure, send_ack_literal};
pub use matcher::{MatchStatus, Matcher, MatcherKind, Pattern};
pub use params::{
    CommandParams, ContentStorage, Encryption, MuxMode, PayloadLength, SendData, ServerConfig,
    ServerMode, SoftApConfig, WifiMode,
};
pub use queue::{CommandQueue, Payload, QueuedCommand};
pub use ring_buffer::RingBuffer;
