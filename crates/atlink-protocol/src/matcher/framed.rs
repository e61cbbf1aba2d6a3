//! Framed-data matcher for `+IPD` notifications.
//!
//! The radio announces data received from a client as
//!
//! ```text
//! +IPD,<id>,<len>:<len bytes of payload>
//! ```
//!
//! with no terminator after the payload: the declared length is the only
//! framing. The matcher captures the payload into a bounded buffer. Bytes past
//! the buffer capacity are counted but dropped so the matcher stays in step with
//! the stream; callers detect truncation by comparing
//! [`FramedData::payload_length`] with [`FramedData::capacity`].
//!
//! # Example
//!
//! ```
//! use atlink_protocol::matcher::{FramedDataPattern, MatchStatus, Matcher};
//!
//! let mut ipd = Matcher::new(FramedDataPattern::new(10));
//! ipd.init();
//!
//! let mut status = MatchStatus::Initialized;
//! for &byte in b"+IPD,2,5:hello" {
//!     status = ipd.feed(byte);
//! }
//!
//! assert_eq!(status, MatchStatus::Complete);
//! let data = ipd.results().unwrap();
//! assert_eq!(data.connection_id.as_u8(), 2);
//! assert_eq!(data.payload_length, 5);
//! assert_eq!(ipd.pattern().captured(), b"hello");
//! ```

use super::{LiteralCursor, MatcherKind, Pattern, Scan, Step, push_digit};
use atlink_core::ConnectionId;
use atlink_core::constants::{
    IPD_LENGTH_TERMINATOR, IPD_PREFIX, IPD_SEPARATOR, MAX_FRAMED_LENGTH,
};

/// Largest payload length the header may declare.
pub const MAX_DECLARED_LENGTH: usize = MAX_FRAMED_LENGTH;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Scanning the `+IPD,` prefix.
    Prefix,
    /// Expecting the connection ID digit.
    ConnectionId,
    /// Expecting the `,` after the ID.
    Separator,
    /// Accumulating the decimal length up to `:`.
    Length,
    /// Counting payload bytes.
    Payload,
}

/// Header and capture details of a complete framed-data message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramedData {
    pub connection_id: ConnectionId,
    /// Length declared in the header.
    pub payload_length: usize,
    /// Capture buffer capacity at the time of the match.
    pub capacity: usize,
}

impl FramedData {
    /// True if part of the payload did not fit in the capture buffer.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.payload_length > self.capacity
    }

    /// Number of payload bytes actually stored.
    #[must_use]
    pub fn stored_length(&self) -> usize {
        self.payload_length.min(self.capacity)
    }
}

#[derive(Debug, Clone)]
pub struct FramedDataPattern {
    state: State,
    prefix: LiteralCursor,
    connection_id: ConnectionId,
    length: u32,
    written: usize,
    buffer: Vec<u8>,
    capacity: usize,
    results: Option<FramedData>,
}

impl FramedDataPattern {
    /// Create a matcher whose capture buffer holds `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self {
            state: State::Prefix,
            prefix: LiteralCursor::new(IPD_PREFIX),
            connection_id: ConnectionId::default(),
            length: 0,
            written: 0,
            buffer: Vec::with_capacity(capacity.min(MAX_DECLARED_LENGTH)),
            capacity,
            results: None,
        }
    }

    /// Replace the capture buffer capacity.
    ///
    /// Takes effect at the start of the next payload; a capture already in
    /// progress keeps writing up to the new limit.
    pub fn set_capture_buffer(&mut self, capacity: usize) {
        self.capacity = capacity;
        let usable = capacity.min(MAX_DECLARED_LENGTH);
        if self.buffer.capacity() < usable {
            self.buffer.reserve(usable - self.buffer.len());
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// True while the matcher is consuming payload bytes.
    pub fn is_capturing(&self) -> bool {
        self.state == State::Payload
    }

    /// Payload bytes stored by the last (or current) capture.
    pub fn captured(&self) -> &[u8] {
        &self.buffer
    }

    fn step_once(&mut self, byte: u8) -> Step {
        match self.state {
            State::Prefix => match self.prefix.advance(byte) {
                Scan::Partial => Step::Incomplete,
                Scan::Done => {
                    self.state = State::ConnectionId;
                    Step::Incomplete
                }
                Scan::Mismatch => Step::NotMatching,
            },
            State::ConnectionId => match ConnectionId::from_digit(byte) {
                Some(id) => {
                    self.connection_id = id;
                    self.state = State::Separator;
                    Step::Incomplete
                }
                None => Step::NotMatching,
            },
            State::Separator if byte == IPD_SEPARATOR => {
                self.length = 0;
                self.state = State::Length;
                Step::Incomplete
            }
            State::Separator => Step::NotMatching,
            State::Length if byte == IPD_LENGTH_TERMINATOR => {
                if self.length == 0 {
                    return Step::NotMatching;
                }
                self.written = 0;
                self.buffer.clear();
                self.state = State::Payload;
                Step::Incomplete
            }
            State::Length => match push_digit(self.length, byte, MAX_DECLARED_LENGTH as u32) {
                Some(length) => {
                    self.length = length;
                    Step::Incomplete
                }
                None => Step::NotMatching,
            },
            State::Payload => {
                if self.buffer.len() < self.capacity {
                    self.buffer.push(byte);
                }
                self.written += 1;

                if self.written == self.length as usize {
                    self.results = Some(FramedData {
                        connection_id: self.connection_id,
                        payload_length: self.written,
                        capacity: self.capacity,
                    });
                    Step::Complete
                } else {
                    Step::Incomplete
                }
            }
        }
    }
}

impl Default for FramedDataPattern {
    fn default() -> Self {
        Self::new(atlink_core::constants::DEFAULT_RECEIVE_BUFFER_SIZE)
    }
}

impl Pattern for FramedDataPattern {
    type Results = FramedData;

    fn kind(&self) -> MatcherKind {
        MatcherKind::FramedData
    }

    fn reset(&mut self) {
        self.state = State::Prefix;
        self.prefix.reset();
        self.length = 0;
        self.written = 0;
    }

    /// A byte that breaks a partial header is re-evaluated once from the
    /// start state, so `++IPD,` still resynchronises on the second `+`.
    fn step(&mut self, byte: u8) -> Step {
        let in_progress = self.state != State::Prefix || !self.prefix.at_start();
        match self.step_once(byte) {
            Step::NotMatching if in_progress => {
                self.reset();
                self.step_once(byte)
            }
            step => step,
        }
    }

    fn results(&self) -> FramedData {
        self.results.unwrap_or(FramedData {
            connection_id: self.connection_id,
            payload_length: 0,
            capacity: self.capacity,
        })
    }

    fn release(&mut self) {
        self.buffer.clear();
        self.results = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::{MatchStatus, Matcher};
    use rstest::rstest;

    fn ipd(capacity: usize) -> Matcher<FramedDataPattern> {
        let mut matcher = Matcher::new(FramedDataPattern::new(capacity));
        matcher.init();
        matcher
    }

    fn feed_all(matcher: &mut Matcher<FramedDataPattern>, bytes: &[u8]) -> Vec<MatchStatus> {
        bytes.iter().map(|&b| matcher.feed(b)).collect()
    }

    #[test]
    fn test_hello_scenario() {
        let mut matcher = ipd(10);
        let statuses = feed_all(&mut matcher, b"+IPD,2,5:hello");

        assert!(statuses[..statuses.len() - 1]
            .iter()
            .all(|s| *s == MatchStatus::Incomplete));
        assert_eq!(statuses.last(), Some(&MatchStatus::Complete));

        let data = matcher.results().unwrap();
        assert_eq!(data.connection_id.as_u8(), 2);
        assert_eq!(data.payload_length, 5);
        assert!(!data.is_truncated());
        assert_eq!(matcher.pattern().captured(), b"hello");
    }

    #[test]
    fn test_out_of_range_connection_id() {
        let mut matcher = ipd(10);
        let statuses = feed_all(&mut matcher, b"+IPD,9");

        assert_eq!(statuses[5], MatchStatus::NotMatching);
        assert!(!matcher.pattern().is_capturing());

        // back to scanning the prefix
        let statuses = feed_all(&mut matcher, b"+IPD,1,1:x");
        assert_eq!(statuses.last(), Some(&MatchStatus::Complete));
    }

    #[test]
    fn test_zero_length_rejected() {
        let mut matcher = ipd(10);
        let statuses = feed_all(&mut matcher, b"+IPD,0,0:");
        assert_eq!(statuses.last(), Some(&MatchStatus::NotMatching));
    }

    #[test]
    fn test_leading_zero_length_accepted() {
        let mut matcher = ipd(10);
        let statuses = feed_all(&mut matcher, b"+IPD,0,03:abc");
        assert_eq!(statuses.last(), Some(&MatchStatus::Complete));
        assert_eq!(matcher.results().unwrap().payload_length, 3);
    }

    #[test]
    fn test_truncates_and_counts() {
        let mut matcher = ipd(4);
        let statuses = feed_all(&mut matcher, b"+IPD,3,8:abcdefgh");

        assert_eq!(statuses.last(), Some(&MatchStatus::Complete));
        let data = matcher.results().unwrap();
        assert_eq!(data.payload_length, 8);
        assert_eq!(data.capacity, 4);
        assert!(data.is_truncated());
        assert_eq!(data.stored_length(), 4);
        assert_eq!(matcher.pattern().captured(), b"abcd");
    }

    #[test]
    fn test_zero_capacity_still_counts() {
        let mut matcher = ipd(0);
        let statuses = feed_all(&mut matcher, b"+IPD,1,3:abc");
        assert_eq!(statuses.last(), Some(&MatchStatus::Complete));
        assert!(matcher.pattern().captured().is_empty());
    }

    #[test]
    fn test_payload_may_contain_header_bytes() {
        let mut matcher = ipd(16);
        let statuses = feed_all(&mut matcher, b"+IPD,0,6:+IPD,1");
        assert_eq!(statuses.last(), Some(&MatchStatus::Complete));
        assert_eq!(matcher.pattern().captured(), b"+IPD,1");
    }

    #[test]
    fn test_is_capturing_tracks_payload_state() {
        let mut matcher = ipd(8);
        feed_all(&mut matcher, b"+IPD,0,2");
        assert!(!matcher.pattern().is_capturing());
        matcher.feed(b':');
        assert!(matcher.pattern().is_capturing());
        matcher.feed(b'a');
        assert!(matcher.pattern().is_capturing());
        matcher.feed(b'b');
        assert!(!matcher.pattern().is_capturing());
    }

    #[rstest]
    #[case(b"++IPD,1,2:ok".as_slice())]
    #[case(b"+I+IPD,1,2:ok".as_slice())]
    #[case(b"+IPD,+IPD,1,2:ok".as_slice())]
    #[case(b"+IPD,1+IPD,1,2:ok".as_slice())]
    fn test_mismatch_retries_from_start(#[case] input: &[u8]) {
        let mut matcher = ipd(8);
        let statuses = feed_all(&mut matcher, input);
        assert_eq!(statuses.last(), Some(&MatchStatus::Complete));
        assert_eq!(matcher.pattern().captured(), b"ok");
    }

    #[test]
    fn test_failed_retry_reports_not_matching() {
        let mut matcher = ipd(8);
        feed_all(&mut matcher, b"+IP");
        assert_eq!(matcher.feed(b'x'), MatchStatus::NotMatching);
        assert_eq!(matcher.feed(b'+'), MatchStatus::Incomplete);
    }

    #[test]
    fn test_length_overflow_rejected() {
        let mut matcher = ipd(8);
        let statuses = feed_all(&mut matcher, b"+IPD,0,65536");
        assert_eq!(statuses.last(), Some(&MatchStatus::NotMatching));
    }

    #[test]
    fn test_set_capture_buffer_applies_to_next_payload() {
        let mut matcher = ipd(2);
        feed_all(&mut matcher, b"+IPD,0,4:abcd");
        assert_eq!(matcher.pattern().captured(), b"ab");

        matcher.pattern_mut().set_capture_buffer(8);
        feed_all(&mut matcher, b"+IPD,0,4:wxyz");
        assert_eq!(matcher.pattern().captured(), b"wxyz");
        assert_eq!(matcher.results().unwrap().capacity, 8);
    }

    #[test]
    fn test_oversized_capacity_reserves_largest_frame_only() {
        let mut matcher = ipd(usize::MAX);
        assert_eq!(matcher.pattern().capacity(), usize::MAX);
        feed_all(&mut matcher, b"+IPD,0,3:abc");
        assert_eq!(matcher.pattern().captured(), b"abc");

        matcher.pattern_mut().set_capture_buffer(usize::MAX / 2);
        assert_eq!(matcher.pattern().capacity(), usize::MAX / 2);
    }

    #[test]
    fn test_captured_survives_completion_reset() {
        let mut matcher = ipd(8);
        feed_all(&mut matcher, b"+IPD,4,3:abc");
        matcher.feed(b'\r');
        assert_eq!(matcher.pattern().captured(), b"abc");
    }
}
