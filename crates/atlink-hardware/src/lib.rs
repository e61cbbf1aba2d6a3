//! Platform capabilities for the AT-command engine.
//!
//! The engine talks to the radio through two traits:
//!
//! - [`Transport`]: non-blocking reads of whatever bytes are pending and
//!   all-or-nothing writes.
//! - [`Delay`]: millisecond sleeps that a `stop` call can interrupt.
//!
//! Implementations provided here:
//!
//! | Type | Trait | Use |
//! |------|-------|-----|
//! | [`SerialTransport`] | [`Transport`] | real UART via `serialport` |
//! | [`MockSerial`](mock::MockSerial) | [`Transport`] | scripted link for tests |
//! | [`TokioDelay`] | [`Delay`] | tokio timer with cancellation |
//!
//! # Thread Safety
//!
//! Both traits require `Send` (and `Delay` also `Sync`) and their futures are
//! `Send`, so an engine generic over them can run inside `tokio::spawn`.

pub mod delay;
pub mod error;
pub mod mock;
pub mod serial;
pub mod traits;

pub use delay::TokioDelay;
pub use error::{HardwareError, Result};
pub use serial::SerialTransport;
pub use traits::{Delay, Transport};
