//! UART transport over the `serialport` crate.

use crate::error::{HardwareError, Result};
use crate::traits::Transport;
use serialport::SerialPort;
use std::io::{Read, Write};
use std::time::Duration;
use tracing::{debug, trace};

/// Write timeout; the radio drains its UART far faster than this.
const WRITE_TIMEOUT: Duration = Duration::from_millis(500);

/// Radio link on a local serial port (8N1, no flow control).
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    path: String,
}

impl SerialTransport {
    /// Open `path` at `baud_rate`.
    ///
    /// # Errors
    /// Returns `HardwareError::InitializationFailed` if the port cannot be opened.
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        if baud_rate == 0 {
            return Err(HardwareError::configuration("baud rate must be non-zero"));
        }

        let port = serialport::new(path, baud_rate)
            .timeout(WRITE_TIMEOUT)
            .open()
            .map_err(|e| HardwareError::initialization_failed(format!("{path}: {e}")))?;

        debug!(path, baud_rate, "serial port opened");
        Ok(Self {
            port,
            path: path.to_string(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Debug for SerialTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialTransport")
            .field("path", &self.path)
            .finish()
    }
}

impl Transport for SerialTransport {
    async fn read_available(&mut self, buf: &mut [u8]) -> Result<usize> {
        let pending = self.port.bytes_to_read()? as usize;
        if pending == 0 || buf.is_empty() {
            return Ok(0);
        }

        let want = pending.min(buf.len());
        match self.port.read(&mut buf[..want]) {
            Ok(n) => {
                trace!(bytes = n, "serial read");
                Ok(n)
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }
}
