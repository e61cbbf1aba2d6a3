//! Mock devices that can be driven programmatically without hardware.

pub mod serial;

pub use serial::{MockSerial, MockSerialHandle};
