//! Parameters of `Set` operations and their wire formatting.
//!
//! | Command | Parameters | Rendered |
//! |---------|------------|----------|
//! | `AT+CWMODE` | [`WifiMode`] | `2` |
//! | `AT+CIPMUX` | [`MuxMode`] | `1` |
//! | `AT+CIPSERVER` | [`ServerConfig`] | `1,8080` or `1` for the default port |
//! | `AT+CWSAP*` | [`SoftApConfig`] | `"ssid","password",5,3` |
//! | `AT+CIPSEND*` | [`SendData`] | `2,11` followed by the payload |
//! | `AT+CIPCLOSE` | [`ConnectionId`] | `2` |

use crate::commands::AtCommand;
use atlink_core::constants::{
    DEFAULT_SERVER_PORT, MAX_PASSWORD_LENGTH, MAX_SEND_LENGTH, MAX_SSID_LENGTH,
    MIN_PASSWORD_LENGTH, PARAM_QUOTE, PARAM_SEPARATOR, WIFI_CHANNELS,
};
use atlink_core::{ConnectionId, Error, Result};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// `AT+CWMODE` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WifiMode {
    Station = 1,
    SoftAp = 2,
    StationAndSoftAp = 3,
}

/// `AT+CIPMUX` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuxMode {
    Single = 0,
    Multiple = 1,
}

/// `AT+CIPSERVER` mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerMode {
    Delete = 0,
    Create = 1,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub mode: ServerMode,
    /// `0` keeps the module's default port.
    pub port: u16,
}

impl ServerConfig {
    pub fn create(port: u16) -> Self {
        Self {
            mode: ServerMode::Create,
            port,
        }
    }

    pub fn delete() -> Self {
        Self {
            mode: ServerMode::Delete,
            port: DEFAULT_SERVER_PORT,
        }
    }
}

/// Soft-AP encryption (`ecn`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encryption {
    Open = 0,
    WpaPsk = 2,
    Wpa2Psk = 3,
    WpaWpa2Psk = 4,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftApConfig {
    pub ssid: String,
    /// Ignored for [`Encryption::Open`], otherwise 8 to 64 bytes.
    pub password: String,
    /// 1 to 14.
    pub channel: u8,
    pub encryption: Encryption,
}

impl SoftApConfig {
    /// Check the SSID length, the password length and the channel.
    ///
    /// # Errors
    /// Returns `Error::InvalidParameter` naming the first value out of range.
    pub fn validate(&self) -> Result<()> {
        if self.ssid.is_empty() || self.ssid.len() > MAX_SSID_LENGTH {
            return Err(Error::InvalidParameter(format!(
                "SSID must be 1 to {MAX_SSID_LENGTH} bytes, got {}",
                self.ssid.len()
            )));
        }
        if self.encryption != Encryption::Open
            && !(MIN_PASSWORD_LENGTH..=MAX_PASSWORD_LENGTH).contains(&self.password.len())
        {
            return Err(Error::InvalidParameter(format!(
                "password must be {MIN_PASSWORD_LENGTH} to {MAX_PASSWORD_LENGTH} bytes, got {}",
                self.password.len()
            )));
        }
        if !WIFI_CHANNELS.contains(&self.channel) {
            return Err(Error::InvalidParameter(format!(
                "channel must be in {WIFI_CHANNELS:?}, got {}",
                self.channel
            )));
        }
        Ok(())
    }
}

/// How many payload bytes a send command carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadLength {
    Exact(usize),
    /// Up to the first zero byte, or the whole content if there is none.
    ZeroTerminated,
}

/// Where the payload waits until it is transmitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ContentStorage {
    /// Copied into the send ring.
    #[default]
    Copy,
    /// Kept as a reference to the caller's buffer.
    Reference,
}

/// Parameters of the `AT+CIPSEND` family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendData {
    pub connection_id: ConnectionId,
    pub content: Bytes,
    pub length: PayloadLength,
    pub storage: ContentStorage,
}

impl SendData {
    /// Send all of `content`, copied into the ring.
    pub fn new(connection_id: ConnectionId, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        Self {
            connection_id,
            length: PayloadLength::Exact(content.len()),
            content,
            storage: ContentStorage::Copy,
        }
    }

    pub fn with_length(mut self, length: PayloadLength) -> Self {
        self.length = length;
        self
    }

    pub fn with_storage(mut self, storage: ContentStorage) -> Self {
        self.storage = storage;
        self
    }

    /// Resolved payload, bounded by the declared length.
    ///
    /// # Errors
    /// Returns `Error::InvalidParameter` for empty content, a zero length, a
    /// length beyond the content or above the module limit.
    pub fn payload(&self) -> Result<Bytes> {
        if self.content.is_empty() {
            return Err(Error::InvalidParameter("send content is empty".into()));
        }

        let length = match self.length {
            PayloadLength::Exact(length) => length,
            PayloadLength::ZeroTerminated => self
                .content
                .iter()
                .position(|&b| b == 0)
                .unwrap_or(self.content.len()),
        };

        if length == 0 {
            return Err(Error::InvalidParameter("send length is zero".into()));
        }
        if length > self.content.len() {
            return Err(Error::InvalidParameter(format!(
                "send length {length} exceeds content of {} bytes",
                self.content.len()
            )));
        }
        if length > MAX_SEND_LENGTH {
            return Err(Error::InvalidParameter(format!(
                "send length {length} exceeds limit of {MAX_SEND_LENGTH}"
            )));
        }

        Ok(self.content.slice(..length))
    }
}

/// Parameters handed to `enqueue`.
///
/// Only `Set` operations use them; other operations ignore whatever is passed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CommandParams {
    #[default]
    None,
    WifiMode(WifiMode),
    Mux(MuxMode),
    Server(ServerConfig),
    SoftAp(SoftApConfig),
    Send(SendData),
    Close(ConnectionId),
}

impl From<WifiMode> for CommandParams {
    fn from(mode: WifiMode) -> Self {
        CommandParams::WifiMode(mode)
    }
}

impl From<MuxMode> for CommandParams {
    fn from(mode: MuxMode) -> Self {
        CommandParams::Mux(mode)
    }
}

impl From<ServerConfig> for CommandParams {
    fn from(config: ServerConfig) -> Self {
        CommandParams::Server(config)
    }
}

impl From<SoftApConfig> for CommandParams {
    fn from(config: SoftApConfig) -> Self {
        CommandParams::SoftAp(config)
    }
}

impl From<SendData> for CommandParams {
    fn from(data: SendData) -> Self {
        CommandParams::Send(data)
    }
}

/// Output of the formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Bytes placed after the operation literal.
    pub params: Vec<u8>,
    /// Data sent after the command is accepted.
    pub payload: Option<(Bytes, ContentStorage)>,
}

impl Rendered {
    fn params(params: Vec<u8>) -> Self {
        Self {
            params,
            payload: None,
        }
    }
}

/// Render the parameters of a `Set` operation for `command`.
///
/// # Errors
/// Returns `Error::InvalidParameter` if the parameters do not belong to the
/// command or a value is out of domain.
pub fn render(command: AtCommand, params: &CommandParams) -> Result<Rendered> {
    let mut out = Vec::with_capacity(16);

    match (command, params) {
        (AtCommand::WifiMode, CommandParams::WifiMode(mode)) => {
            out.push(digit(*mode as u8));
        }
        (AtCommand::Multiplex, CommandParams::Mux(mode)) => {
            out.push(digit(*mode as u8));
        }
        (AtCommand::Server, CommandParams::Server(config)) => {
            out.push(digit(config.mode as u8));
            if config.port != DEFAULT_SERVER_PORT {
                out.push(PARAM_SEPARATOR);
                write!(out, "{}", config.port)?;
            }
        }
        (
            AtCommand::SoftAp | AtCommand::SoftApCurrent | AtCommand::SoftApDefault,
            CommandParams::SoftAp(config),
        ) => render_soft_ap(config, &mut out)?,
        (AtCommand::Send | AtCommand::SendEx | AtCommand::SendBuf, CommandParams::Send(data)) => {
            let payload = data.payload()?;
            out.push(data.connection_id.as_digit());
            out.push(PARAM_SEPARATOR);
            write!(out, "{}", payload.len())?;
            return Ok(Rendered {
                params: out,
                payload: Some((payload, data.storage)),
            });
        }
        (AtCommand::Close, CommandParams::Close(id)) => {
            out.push(id.as_digit());
        }
        (command, params) => {
            return Err(Error::InvalidParameter(format!(
                "{params:?} is not a parameter set for {command}"
            )));
        }
    }

    Ok(Rendered::params(out))
}

fn render_soft_ap(config: &SoftApConfig, out: &mut Vec<u8>) -> Result<()> {
    config.validate()?;

    quoted(out, config.ssid.as_bytes());
    out.push(PARAM_SEPARATOR);
    quoted(out, config.password.as_bytes());
    out.push(PARAM_SEPARATOR);
    write!(out, "{}", config.channel)?;
    out.push(PARAM_SEPARATOR);
    out.push(digit(config.encryption as u8));
    Ok(())
}

fn quoted(out: &mut Vec<u8>, value: &[u8]) {
    out.push(PARAM_QUOTE);
    out.extend_from_slice(value);
    out.push(PARAM_QUOTE);
}

#[inline]
fn digit(value: u8) -> u8 {
    b'0' + value
}
