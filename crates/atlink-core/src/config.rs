//! Engine configuration.
//!
//! [`ModemConfig`] carries every sizing and timing knob of the protocol core.
//! All fields have defaults matching the radio firmware, so a configuration
//! file only needs to mention what it changes:
//!
//! ```
//! use atlink_core::ModemConfig;
//!
//! let config = ModemConfig::from_json_str(r#"{ "wait_timeout_ms": 3000 }"#).unwrap();
//! assert_eq!(config.wait_timeout_ms, 3000);
//! assert_eq!(config.queue_capacity, 16);
//! ```

use crate::{Error, Result, constants::*};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Sizing and timing of the protocol core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModemConfig {
    /// Number of pending commands the FIFO holds (power of two).
    pub queue_capacity: usize,

    /// Capacity of the ring buffer staging parameters and payloads (power of two).
    pub send_buffer_size: usize,

    /// Number of free-use matchers the wait engine may arm at once.
    pub matcher_pool_size: usize,

    /// Time budget for a single wait procedure.
    pub wait_timeout_ms: u64,

    /// Sleep between two polls of the armed matchers.
    pub poll_interval_ms: u64,

    /// Delay after a command that has no wait procedure.
    pub settle_delay_ms: u64,

    /// Period of the receive task.
    pub receive_period_ms: u64,

    /// Maximum bytes read from the transport per receive activation.
    pub read_chunk_size: usize,

    /// Capacity of the default framed-data capture buffer.
    pub receive_buffer_size: usize,

    /// Boot time of the radio before the first command.
    pub startup_delay_ms: u64,

    /// UART speed.
    pub baud_rate: u32,
}

impl Default for ModemConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            send_buffer_size: DEFAULT_SEND_BUFFER_SIZE,
            matcher_pool_size: DEFAULT_MATCHER_POOL_SIZE,
            wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            receive_period_ms: DEFAULT_RECEIVE_PERIOD_MS,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            receive_buffer_size: DEFAULT_RECEIVE_BUFFER_SIZE,
            startup_delay_ms: DEFAULT_STARTUP_DELAY_MS,
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

impl ModemConfig {
    /// Parse and validate a configuration from JSON text.
    ///
    /// # Errors
    /// Returns `Error::Config` if the JSON is malformed or a value is out of range.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ModemConfig =
            serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file cannot be read, `Error::Config` if it is invalid.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Check that every capacity is usable.
    ///
    /// # Errors
    /// Returns `Error::Config` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !self.queue_capacity.is_power_of_two() {
            return Err(Error::Config(format!(
                "queue_capacity must be a power of two, got {}",
                self.queue_capacity
            )));
        }
        if !self.send_buffer_size.is_power_of_two() {
            return Err(Error::Config(format!(
                "send_buffer_size must be a power of two, got {}",
                self.send_buffer_size
            )));
        }
        if self.matcher_pool_size == 0 {
            return Err(Error::Config("matcher_pool_size must be at least 1".into()));
        }
        if self.poll_interval_ms == 0 {
            return Err(Error::Config("poll_interval_ms must be at least 1".into()));
        }
        if self.receive_period_ms == 0 {
            return Err(Error::Config("receive_period_ms must be at least 1".into()));
        }
        if self.read_chunk_size == 0 {
            return Err(Error::Config("read_chunk_size must be at least 1".into()));
        }
        if self.receive_buffer_size > MAX_FRAMED_LENGTH {
            return Err(Error::Config(format!(
                "receive_buffer_size must be at most {MAX_FRAMED_LENGTH}, got {}",
                self.receive_buffer_size
            )));
        }
        if self.baud_rate == 0 {
            return Err(Error::Config("baud_rate must be non-zero".into()));
        }
        Ok(())
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn receive_period(&self) -> Duration {
        Duration::from_millis(self.receive_period_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        let config = ModemConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.wait_timeout(), Duration::from_millis(1500));
        assert_eq!(config.receive_period(), Duration::from_millis(20));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ModemConfig::from_json_str(r#"{"baud_rate": 9600}"#).unwrap();
        assert_eq!(config.baud_rate, 9600);
        assert_eq!(config.send_buffer_size, DEFAULT_SEND_BUFFER_SIZE);
    }

    #[rstest]
    #[case(r#"{"queue_capacity": 12}"#)]
    #[case(r#"{"queue_capacity": 0}"#)]
    #[case(r#"{"send_buffer_size": 1000}"#)]
    #[case(r#"{"matcher_pool_size": 0}"#)]
    #[case(r#"{"poll_interval_ms": 0}"#)]
    #[case(r#"{"read_chunk_size": 0}"#)]
    #[case(r#"{"baud_rate": 0}"#)]
    #[case(r#"{"receive_buffer_size": 65536}"#)]
    #[case(r#"{"receive_buffer_size": 18446744073709551615}"#)]
    #[case(r#"{"queue_capacity": "sixteen"}"#)]
    fn test_invalid_config_rejected(#[case] json: &str) {
        assert!(matches!(
            ModemConfig::from_json_str(json),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_receive_buffer_up_to_largest_frame_accepted() {
        let json = format!(r#"{{"receive_buffer_size": {MAX_FRAMED_LENGTH}}}"#);
        let config = ModemConfig::from_json_str(&json).unwrap();
        assert_eq!(config.receive_buffer_size, MAX_FRAMED_LENGTH);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"wait_timeout_ms": 250, "queue_capacity": 8}}"#).unwrap();

        let config = ModemConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.wait_timeout_ms, 250);
        assert_eq!(config.queue_capacity, 8);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = ModemConfig::from_json_file("/nonexistent/atlink.json");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
