//! ESP8266 AT-command engine.
//!
//! This crate ties the protocol pieces to a transport and a timer:
//!
//! - **Dispatch loop**: sends queued commands one at a time, waits for the
//!   device response, retries busy or silent commands and drops the rest
//! - **Stream fan-out**: feeds inbound bytes to the framed-data, lifecycle
//!   and reset matchers and to whatever the wait engine has armed
//! - **Connection table**: open/closed status per connection ID
//! - **Callbacks**: command sent, data received, connection changed, reset
//!
//! # Example
//!
//! ```no_run
//! use atlink_core::ModemConfig;
//! use atlink_hardware::{SerialTransport, TokioDelay};
//! use atlink_modem::Modem;
//! use atlink_protocol::{AtCommand, CommandParams, Operation};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ModemConfig::default();
//! let serial = SerialTransport::open("/dev/ttyUSB0", config.baud_rate)?;
//! let modem = Arc::new(Modem::new(serial, TokioDelay::new(), &config)?);
//!
//! modem.register_reset_detected(|| println!("radio rebooted"));
//!
//! let cancel = CancellationToken::new();
//! let receiver = modem.spawn_receive_task(cancel.clone());
//!
//! modem.enqueue(AtCommand::Reset, Operation::Execute, CommandParams::None)?;
//! modem.do_work().await;
//!
//! cancel.cancel();
//! receiver.await?;
//! # Ok(())
//! # }
//! ```

mod connections;
mod dispatch;
mod events;
mod inbound;
mod modem;
mod receive;

pub use connections::ConnectionTable;
pub use dispatch::DispatchOutcome;
pub use events::{
    CommandSentFn, ConnectionChangedFn, DataReceived, DataReceivedFn, ModemEvent, ResetDetectedFn,
};
pub use modem::Modem;
