//! Scripted serial link for tests and demos.
//!
//! [`MockSerial`] plays the radio side of the link. Tests feed inbound bytes
//! through a [`MockSerialHandle`], inspect what the engine wrote, and install
//! auto-responses that fire when a written chunk starts with a trigger:
//!
//! ```
//! use atlink_hardware::mock::MockSerial;
//! use atlink_hardware::Transport;
//!
//! #[tokio::main]
//! async fn main() -> atlink_hardware::Result<()> {
//!     let (mut serial, handle) = MockSerial::new();
//!     handle.respond_to("AT+CIPMUX", "\r\nOK\r\n");
//!
//!     serial.write_all(b"AT+CIPMUX=1\r\n").await?;
//!
//!     let mut buf = [0u8; 16];
//!     let n = serial.read_available(&mut buf).await?;
//!     assert_eq!(&buf[..n], b"\r\nOK\r\n");
//!     assert_eq!(handle.written(), b"AT+CIPMUX=1\r\n");
//!     Ok(())
//! }
//! ```

use crate::{HardwareError, Result, traits::Transport};
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug)]
struct Rule {
    trigger: Bytes,
    response: Bytes,
    once: bool,
}

#[derive(Debug, Default)]
struct State {
    rx: VecDeque<u8>,
    writes: Vec<Bytes>,
    rules: Vec<Rule>,
    disconnected: bool,
}

type Shared = Arc<Mutex<State>>;

fn lock(shared: &Shared) -> MutexGuard<'_, State> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Simulated radio end of the serial link.
#[derive(Debug)]
pub struct MockSerial {
    state: Shared,
    name: String,
}

impl MockSerial {
    /// Create a mock link and the handle that controls it.
    pub fn new() -> (Self, MockSerialHandle) {
        Self::with_name("Mock Serial")
    }

    pub fn with_name(name: impl Into<String>) -> (Self, MockSerialHandle) {
        let state = Shared::default();
        let serial = Self {
            state: Arc::clone(&state),
            name: name.into(),
        };
        (serial, MockSerialHandle { state })
    }
}

impl Transport for MockSerial {
    async fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut state = lock(&self.state);
        if state.disconnected {
            return Err(HardwareError::disconnected(self.name.clone()));
        }

        let n = buf.len().min(state.rx.len());
        for (slot, byte) in buf.iter_mut().zip(state.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    async fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = lock(&self.state);
        if state.disconnected {
            return Err(HardwareError::disconnected(self.name.clone()));
        }

        let chunk = Bytes::copy_from_slice(bytes);
        if let Some(pos) = state
            .rules
            .iter()
            .position(|rule| chunk.starts_with(&rule.trigger))
        {
            let response = state.rules[pos].response.clone();
            if state.rules[pos].once {
                state.rules.remove(pos);
            }
            state.rx.extend(response.iter().copied());
        }
        state.writes.push(chunk);
        Ok(())
    }
}

/// Control side of a [`MockSerial`]. Cheap to clone.
#[derive(Debug, Clone)]
pub struct MockSerialHandle {
    state: Shared,
}

impl MockSerialHandle {
    /// Queue bytes for the engine to read.
    pub fn push_rx(&self, bytes: impl AsRef<[u8]>) {
        lock(&self.state).rx.extend(bytes.as_ref().iter().copied());
    }

    /// Bytes queued but not read yet.
    pub fn pending_rx(&self) -> usize {
        lock(&self.state).rx.len()
    }

    /// Reply with `response` every time a write starts with `trigger`.
    ///
    /// Rules are checked in installation order; the first match wins.
    pub fn respond_to(&self, trigger: impl AsRef<[u8]>, response: impl AsRef<[u8]>) {
        self.add_rule(trigger.as_ref(), response.as_ref(), false);
    }

    /// Like [`respond_to`](Self::respond_to), but the rule is removed after it fires.
    pub fn respond_once(&self, trigger: impl AsRef<[u8]>, response: impl AsRef<[u8]>) {
        self.add_rule(trigger.as_ref(), response.as_ref(), true);
    }

    fn add_rule(&self, trigger: &[u8], response: &[u8], once: bool) {
        lock(&self.state).rules.push(Rule {
            trigger: Bytes::copy_from_slice(trigger),
            response: Bytes::copy_from_slice(response),
            once,
        });
    }

    pub fn clear_rules(&self) {
        lock(&self.state).rules.clear();
    }

    /// Every write call, in order.
    pub fn writes(&self) -> Vec<Bytes> {
        lock(&self.state).writes.clone()
    }

    /// All written bytes concatenated.
    pub fn written(&self) -> Vec<u8> {
        lock(&self.state)
            .writes
            .iter()
            .flat_map(|w| w.iter().copied())
            .collect()
    }

    /// Number of write calls starting with `prefix`.
    pub fn count_writes(&self, prefix: impl AsRef<[u8]>) -> usize {
        let prefix = prefix.as_ref();
        lock(&self.state)
            .writes
            .iter()
            .filter(|w| w.starts_with(prefix))
            .count()
    }

    pub fn clear_writes(&self) {
        lock(&self.state).writes.clear();
    }

    /// Make every further read and write fail.
    pub fn disconnect(&self) {
        lock(&self.state).disconnected = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_drains_pushed_bytes() {
        let (mut serial, handle) = MockSerial::new();
        handle.push_rx(b"hello world");

        let mut buf = [0u8; 5];
        assert_eq!(serial.read_available(&mut buf).await.unwrap(), 5);
        assert_eq!(&buf, b"hello");
        assert_eq!(handle.pending_rx(), 6);

        let mut buf = [0u8; 32];
        let n = serial.read_available(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b" world");
        assert_eq!(serial.read_available(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_writes_recorded_in_order() {
        let (mut serial, handle) = MockSerial::new();
        serial.write_all(b"AT").await.unwrap();
        serial.write_all(b"\r\n").await.unwrap();

        assert_eq!(handle.writes().len(), 2);
        assert_eq!(handle.written(), b"AT\r\n");
        assert_eq!(handle.count_writes("AT"), 1);

        handle.clear_writes();
        assert!(handle.written().is_empty());
    }

    #[tokio::test]
    async fn test_respond_to_fires_every_time() {
        let (mut serial, handle) = MockSerial::new();
        handle.respond_to("AT+RST", "\r\nready\r\n");

        serial.write_all(b"AT+RST\r\n").await.unwrap();
        serial.write_all(b"AT+RST\r\n").await.unwrap();
        serial.write_all(b"AT\r\n").await.unwrap();

        let mut buf = [0u8; 64];
        let n = serial.read_available(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"\r\nready\r\n\r\nready\r\n");
    }

    #[tokio::test]
    async fn test_respond_once_then_fallback() {
        let (mut serial, handle) = MockSerial::new();
        handle.respond_once("AT", "busy p...");
        handle.respond_to("AT", "\r\nOK");

        serial.write_all(b"AT\r\n").await.unwrap();
        serial.write_all(b"AT\r\n").await.unwrap();

        let mut buf = [0u8; 64];
        let n = serial.read_available(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"busy p...\r\nOK");
    }

    #[tokio::test]
    async fn test_disconnect_fails_io() {
        let (mut serial, handle) = MockSerial::with_name("uart2");
        handle.disconnect();

        let mut buf = [0u8; 4];
        assert!(matches!(
            serial.read_available(&mut buf).await,
            Err(HardwareError::Disconnected { .. })
        ));
        assert!(serial.write_all(b"AT").await.is_err());
    }
}
