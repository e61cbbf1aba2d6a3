//! AT command catalogue.
//!
//! Every command the driver can queue is a variant of [`AtCommand`]. Each
//! variant knows its wire literal, which [`Operation`]s it accepts, how many
//! transmission attempts it gets, and which [`WaitProcedure`] confirms it.
//!
//! # Wire Format
//!
//! ```text
//! <COMMAND><OPERATION><PARAMS>\r\n
//! AT+CWMODE  =?                   Test
//! AT+CWMODE  ?                    Query
//! AT+CWMODE  =         2          Set
//! AT+RST                          Execute
//! ```
//!
//! # Example
//!
//! ```
//! use atlink_protocol::{AtCommand, Operation, WaitProcedure};
//!
//! let cmd = AtCommand::Multiplex;
//! assert_eq!(cmd.as_str(), "AT+CIPMUX");
//! assert!(cmd.supports(Operation::Set));
//! assert!(!cmd.supports(Operation::Execute));
//! assert_eq!(cmd.max_attempts(), 1);
//! assert_eq!(cmd.wait_procedure(), Some(WaitProcedure::OkBusyError));
//! ```

use atlink_core::constants::{
    RESPONSE_BUSY, RESPONSE_ERROR, RESPONSE_OK, RESPONSE_READY, RESPONSE_SEND_PROMPT,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation kind of an AT command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// `=?`, lists the accepted parameter ranges.
    Test,
    /// `?`, reads the current value.
    Query,
    /// `=<params>`, writes a value.
    Set,
    /// No suffix, runs the command.
    Execute,
}

impl Operation {
    /// Suffix appended to the command literal.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Test => "=?",
            Operation::Query => "?",
            Operation::Set => "=",
            Operation::Execute => "",
        }
    }

    const fn bit(self) -> u8 {
        match self {
            Operation::Test => 0b0001,
            Operation::Query => 0b0010,
            Operation::Set => 0b0100,
            Operation::Execute => 0b1000,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Operation::Test => "test",
            Operation::Query => "query",
            Operation::Set => "set",
            Operation::Execute => "execute",
        };
        f.write_str(name)
    }
}

/// Set of operations a command accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OperationSet(u8);

impl OperationSet {
    const EXECUTE: Self = Self(Operation::Execute.bit());
    const SET: Self = Self(Operation::Set.bit());
    const QUERY_SET: Self = Self(Operation::Query.bit() | Operation::Set.bit());
    const TEST_QUERY_SET: Self =
        Self(Operation::Test.bit() | Operation::Query.bit() | Operation::Set.bit());

    #[must_use]
    pub fn contains(&self, operation: Operation) -> bool {
        self.0 & operation.bit() != 0
    }

    /// Accepted operations in `Test, Query, Set, Execute` order.
    pub fn iter(&self) -> impl Iterator<Item = Operation> + '_ {
        [
            Operation::Test,
            Operation::Query,
            Operation::Set,
            Operation::Execute,
        ]
        .into_iter()
        .filter(|op| self.contains(*op))
    }
}

/// Commands understood by the radio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AtCommand {
    /// `AT`, liveness probe.
    Attention,
    /// `ATE0`, disables command echo.
    EchoOff,
    /// `AT+RST`, restarts the module.
    Reset,
    /// `AT+CWMODE`, station / soft-AP / both.
    WifiMode,
    /// `AT+CWSAP`, soft-AP configuration.
    SoftAp,
    /// `AT+CWSAP_CUR`, soft-AP configuration, not saved to flash.
    SoftApCurrent,
    /// `AT+CWSAP_DEF`, soft-AP configuration, saved to flash.
    SoftApDefault,
    /// `AT+CIPMUX`, single or multiple connections.
    Multiplex,
    /// `AT+CIPSERVER`, TCP server control.
    Server,
    /// `AT+CIPSEND`
    Send,
    /// `AT+CIPSENDEX`
    SendEx,
    /// `AT+CIPSENDBUF`
    SendBuf,
    /// `AT+CIPCLOSE`, closes one connection.
    Close,
}

impl AtCommand {
    pub const ALL: [AtCommand; 13] = [
        AtCommand::Attention,
        AtCommand::EchoOff,
        AtCommand::Reset,
        AtCommand::WifiMode,
        AtCommand::SoftAp,
        AtCommand::SoftApCurrent,
        AtCommand::SoftApDefault,
        AtCommand::Multiplex,
        AtCommand::Server,
        AtCommand::Send,
        AtCommand::SendEx,
        AtCommand::SendBuf,
        AtCommand::Close,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AtCommand::Attention => "AT",
            AtCommand::EchoOff => "ATE0",
            AtCommand::Reset => "AT+RST",
            AtCommand::WifiMode => "AT+CWMODE",
            AtCommand::SoftAp => "AT+CWSAP",
            AtCommand::SoftApCurrent => "AT+CWSAP_CUR",
            AtCommand::SoftApDefault => "AT+CWSAP_DEF",
            AtCommand::Multiplex => "AT+CIPMUX",
            AtCommand::Server => "AT+CIPSERVER",
            AtCommand::Send => "AT+CIPSEND",
            AtCommand::SendEx => "AT+CIPSENDEX",
            AtCommand::SendBuf => "AT+CIPSENDBUF",
            AtCommand::Close => "AT+CIPCLOSE",
        }
    }

    pub fn allowed_operations(&self) -> OperationSet {
        match self {
            AtCommand::Attention | AtCommand::EchoOff | AtCommand::Reset => OperationSet::EXECUTE,
            AtCommand::WifiMode => OperationSet::TEST_QUERY_SET,
            AtCommand::SoftAp
            | AtCommand::SoftApCurrent
            | AtCommand::SoftApDefault
            | AtCommand::Multiplex
            | AtCommand::Server => OperationSet::QUERY_SET,
            AtCommand::Send | AtCommand::SendEx | AtCommand::SendBuf | AtCommand::Close => {
                OperationSet::SET
            }
        }
    }

    #[inline]
    pub fn supports(&self, operation: Operation) -> bool {
        self.allowed_operations().contains(operation)
    }

    /// Transmission attempts before the command is dropped.
    pub fn max_attempts(&self) -> u8 {
        match self {
            AtCommand::Reset => 5,
            AtCommand::Attention
            | AtCommand::SoftAp
            | AtCommand::SoftApCurrent
            | AtCommand::SoftApDefault => 3,
            AtCommand::Send | AtCommand::SendEx => 2,
            AtCommand::EchoOff
            | AtCommand::WifiMode
            | AtCommand::Multiplex
            | AtCommand::Server
            | AtCommand::SendBuf
            | AtCommand::Close => 1,
        }
    }

    /// Procedure that confirms the command, if any.
    ///
    /// Commands without one are assumed sent and followed by a settle delay.
    pub fn wait_procedure(&self) -> Option<WaitProcedure> {
        match self {
            AtCommand::EchoOff => None,
            AtCommand::Reset => Some(WaitProcedure::Ready),
            AtCommand::Send | AtCommand::SendEx | AtCommand::SendBuf => {
                Some(WaitProcedure::SendPrompt)
            }
            _ => Some(WaitProcedure::OkBusyError),
        }
    }

    /// True for the commands followed by a data payload.
    pub fn is_send(&self) -> bool {
        matches!(self, AtCommand::Send | AtCommand::SendEx | AtCommand::SendBuf)
    }

    /// Length of the command literal in bytes.
    #[inline]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.as_str().len()
    }
}

impl fmt::Display for AtCommand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Response classification of a wait procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitOutcome {
    Busy,
    Ok,
    Error,
    Timeout,
}

impl WaitOutcome {
    /// Busy and timeout earn another attempt.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, WaitOutcome::Busy | WaitOutcome::Timeout)
    }
}

impl fmt::Display for WaitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            WaitOutcome::Busy => "busy",
            WaitOutcome::Ok => "ok",
            WaitOutcome::Error => "error",
            WaitOutcome::Timeout => "timeout",
        };
        f.write_str(name)
    }
}

/// Response sets awaited after transmitting a command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaitProcedure {
    /// Boot banner after `AT+RST`.
    Ready,
    /// `busy p...`, `\r\nOK` or `\r\nERROR`.
    OkBusyError,
    /// `busy p...`, the `>` payload prompt or `\r\nERROR`.
    SendPrompt,
}

const READY_LITERALS: &[&[u8]] = &[RESPONSE_READY];
const OK_BUSY_ERROR_LITERALS: &[&[u8]] = &[RESPONSE_BUSY, RESPONSE_OK, RESPONSE_ERROR];
const SEND_PROMPT_LITERALS: &[&[u8]] = &[RESPONSE_BUSY, RESPONSE_SEND_PROMPT, RESPONSE_ERROR];

impl WaitProcedure {
    /// Literals to arm, in index order.
    pub fn literals(&self) -> &'static [&'static [u8]] {
        match self {
            WaitProcedure::Ready => READY_LITERALS,
            WaitProcedure::OkBusyError => OK_BUSY_ERROR_LITERALS,
            WaitProcedure::SendPrompt => SEND_PROMPT_LITERALS,
        }
    }

    /// Map the index returned by the wait engine (or `None` on timeout).
    pub fn classify(&self, matched: Option<usize>) -> WaitOutcome {
        match (self, matched) {
            (_, None) => WaitOutcome::Timeout,
            (WaitProcedure::Ready, Some(_)) => WaitOutcome::Ok,
            (_, Some(0)) => WaitOutcome::Busy,
            (_, Some(1)) => WaitOutcome::Ok,
            (_, Some(_)) => WaitOutcome::Error,
        }
    }
}

/// Acknowledgement echoed after a payload of `length` bytes: `Recv <length> byte`.
pub fn send_ack_literal(length: usize) -> Vec<u8> {
    format!("Recv {length} byte").into_bytes()
}
