//! Core constants for the ESP8266 AT-command link.
//!
//! This module gathers the wire literals and the default sizing used by the
//! protocol core. Wire literals are byte strings because the link is a raw
//! serial stream: nothing on it is guaranteed to be valid UTF-8.
//!
//! # Outbound framing
//!
//! Every queued command is transmitted as a single line:
//!
//! ```text
//! <COMMAND><OPERATION><PARAMS>\r\n
//! AT+CIPSERVER  =   1,8080  \r\n
//! ```
//!
//! # Inbound framing
//!
//! The radio interleaves unframed notifications with command responses:
//!
//! ```text
//! +IPD,<id>,<len>:<len bytes of payload>     data from a client
//! <id>,CONNECT\r\n                           client connected
//! <id>,CLOSED\r\n                            client disconnected
//! <id>,CONNECT FAIL\r\n                      connection attempt failed
//! \r\nready\r\n                              module (re)booted
//! ```
//!
//! # Usage
//!
//! ```
//! use atlink_core::constants::*;
//!
//! assert_eq!(LINE_TERMINATOR, b"\r\n");
//! assert_eq!(MAX_CONNECTIONS, 5);
//! assert!(IPD_PREFIX.starts_with(b"+IPD"));
//! ```

// ============================================================================
// Connections
// ============================================================================

/// Maximum number of simultaneous connections accepted by the module.
///
/// Connection IDs on the wire are single decimal digits `0..MAX_CONNECTIONS`.
pub const MAX_CONNECTIONS: usize = 5;

/// Highest connection ID digit the module can report.
pub const MAX_CONNECTION_DIGIT: u8 = b'0' + (MAX_CONNECTIONS as u8) - 1;

// ============================================================================
// Outbound framing
// ============================================================================

/// Terminator appended to every command line.
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

/// Separator between fields of a formatted parameter list.
pub const PARAM_SEPARATOR: u8 = b',';

/// Quote used around string parameters (SSID, password).
pub const PARAM_QUOTE: u8 = b'"';

// ============================================================================
// Inbound framing
// ============================================================================

/// Literal prefix of a framed-data notification.
pub const IPD_PREFIX: &[u8] = b"+IPD,";

/// Separator between the connection ID and the declared length.
pub const IPD_SEPARATOR: u8 = b',';

/// Terminator between the declared length and the payload.
pub const IPD_LENGTH_TERMINATOR: u8 = b':';

/// Suffix following the connection ID when a client connects.
pub const CONNECT_SUFFIX: &[u8] = b",CONNECT\r\n";

/// Suffix following the connection ID when a client disconnects.
pub const CLOSED_SUFFIX: &[u8] = b",CLOSED\r\n";

/// Suffix following the connection ID when a connection attempt fails.
pub const CONNECT_FAIL_SUFFIX: &[u8] = b",CONNECT FAIL\r\n";

/// Banner printed by the module after every boot.
pub const RESET_BANNER: &[u8] = b"\r\nready\r\n";

// ============================================================================
// Response literals
// ============================================================================

/// Response emitted while the module is still processing a previous command.
pub const RESPONSE_BUSY: &[u8] = b"busy p...";

/// Successful command completion.
pub const RESPONSE_OK: &[u8] = b"\r\nOK";

/// Failed command completion.
pub const RESPONSE_ERROR: &[u8] = b"\r\nERROR";

/// Prompt asking for the payload of a send command.
pub const RESPONSE_SEND_PROMPT: &[u8] = b"OK\r\n>";

/// Response that ends a reset: the boot banner without its trailing newline.
pub const RESPONSE_READY: &[u8] = b"\r\nready";

// ============================================================================
// Parameter domains
// ============================================================================

/// Maximum SSID length in bytes.
pub const MAX_SSID_LENGTH: usize = 32;

/// Minimum password length for encrypted access points.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length for encrypted access points.
pub const MAX_PASSWORD_LENGTH: usize = 64;

/// Valid 802.11b/g/n channel range.
pub const WIFI_CHANNELS: std::ops::RangeInclusive<u8> = 1..=14;

/// Largest payload a single send command may carry.
pub const MAX_SEND_LENGTH: usize = 2048;

/// Port value meaning "use the module default port".
pub const DEFAULT_SERVER_PORT: u16 = 0;

// ============================================================================
// Default sizing and timing
// ============================================================================

/// Default number of commands the FIFO holds. Must be a power of two.
pub const DEFAULT_QUEUE_CAPACITY: usize = 16;

/// Default send buffer capacity in bytes. Must be a power of two.
pub const DEFAULT_SEND_BUFFER_SIZE: usize = 2048;

/// Default number of free-use matchers available to the wait engine.
pub const DEFAULT_MATCHER_POOL_SIZE: usize = 5;

/// Default wait-engine timeout budget (milliseconds).
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 1500;

/// Default wait-engine poll unit (milliseconds).
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1;

/// Delay applied after commands that have no wait procedure (milliseconds).
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 200;

/// Period of the receive task (milliseconds).
pub const DEFAULT_RECEIVE_PERIOD_MS: u64 = 20;

/// Bytes drained from the transport per receive activation.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 254;

/// Default capture buffer size for framed data.
pub const DEFAULT_RECEIVE_BUFFER_SIZE: usize = 2048;

/// Largest payload length a framed-data header may declare. Capture buffers
/// beyond this size are never filled.
pub const MAX_FRAMED_LENGTH: usize = u16::MAX as usize;

/// Time the radio needs after power-up before it accepts commands (milliseconds).
pub const DEFAULT_STARTUP_DELAY_MS: u64 = 900;

/// UART speed of the radio.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_connection_digit() {
        assert_eq!(MAX_CONNECTION_DIGIT, b'4');
    }

    #[test]
    fn test_default_capacities_are_powers_of_two() {
        assert!(DEFAULT_QUEUE_CAPACITY.is_power_of_two());
        assert!(DEFAULT_SEND_BUFFER_SIZE.is_power_of_two());
    }

    #[test]
    fn test_ready_response_is_banner_prefix() {
        assert!(RESET_BANNER.starts_with(RESPONSE_READY));
    }
}
