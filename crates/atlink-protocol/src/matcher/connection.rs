//! Connection lifecycle matchers.
//!
//! Each lifecycle notification is a literal prefix, a single connection ID
//! digit and a literal suffix. Either literal may be empty. The ESP8266 AT
//! firmware puts the ID first:
//!
//! ```text
//! 0,CONNECT\r\n
//! 3,CLOSED\r\n
//! 1,CONNECT FAIL\r\n
//! ```

use super::{LiteralCursor, MatcherKind, Pattern, Scan, Step};
use atlink_core::ConnectionId;
use atlink_core::constants::{CLOSED_SUFFIX, CONNECT_FAIL_SUFFIX, CONNECT_SUFFIX};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Prefix,
    Digit,
    Suffix,
}

/// Recognizes one kind of connection lifecycle event.
#[derive(Debug, Clone)]
pub struct ConnectionEventPattern {
    kind: MatcherKind,
    prefix: LiteralCursor,
    suffix: LiteralCursor,
    state: State,
    connection_id: ConnectionId,
}

impl ConnectionEventPattern {
    /// `<id>,CONNECT\r\n`
    pub fn open() -> Self {
        Self::with_literals(MatcherKind::ConnectionOpen, b"", CONNECT_SUFFIX)
    }

    /// `<id>,CLOSED\r\n`
    pub fn close() -> Self {
        Self::with_literals(MatcherKind::ConnectionClose, b"", CLOSED_SUFFIX)
    }

    /// `<id>,CONNECT FAIL\r\n`
    pub fn failed() -> Self {
        Self::with_literals(MatcherKind::ConnectionFailed, b"", CONNECT_FAIL_SUFFIX)
    }

    /// Lifecycle matcher with custom framing around the ID digit.
    pub fn with_literals(
        kind: MatcherKind,
        prefix: &'static [u8],
        suffix: &'static [u8],
    ) -> Self {
        let prefix = LiteralCursor::new(prefix);
        let state = Self::start_state(&prefix);
        Self {
            kind,
            prefix,
            suffix: LiteralCursor::new(suffix),
            state,
            connection_id: ConnectionId::default(),
        }
    }

    fn start_state(prefix: &LiteralCursor) -> State {
        if prefix.is_empty() {
            State::Digit
        } else {
            State::Prefix
        }
    }
}

impl Pattern for ConnectionEventPattern {
    type Results = ConnectionId;

    fn kind(&self) -> MatcherKind {
        self.kind
    }

    fn reset(&mut self) {
        self.prefix.reset();
        self.suffix.reset();
        self.state = Self::start_state(&self.prefix);
    }

    fn step(&mut self, byte: u8) -> Step {
        match self.state {
            State::Prefix => match self.prefix.advance(byte) {
                Scan::Partial => Step::Incomplete,
                Scan::Done => {
                    self.state = State::Digit;
                    Step::Incomplete
                }
                Scan::Mismatch => Step::NotMatching,
            },
            State::Digit => match ConnectionId::from_digit(byte) {
                Some(id) if self.suffix.is_empty() => {
                    self.connection_id = id;
                    Step::Complete
                }
                Some(id) => {
                    self.connection_id = id;
                    self.state = State::Suffix;
                    Step::Incomplete
                }
                None => Step::NotMatching,
            },
            State::Suffix => match self.suffix.advance(byte) {
                Scan::Partial => Step::Incomplete,
                Scan::Done => Step::Complete,
                Scan::Mismatch => Step::NotMatching,
            },
        }
    }

    fn results(&self) -> ConnectionId {
        self.connection_id
    }
}
