//! Byte-at-a-time pattern matchers.
//!
//! A matcher receives the inbound serial stream one byte at a time and decides
//! whether the bytes seen so far form a known pattern. Some matchers also
//! extract data (a connection ID, a declared length, a payload) which is
//! exposed as *results* once the pattern completes.
//!
//! # Structure
//!
//! Every concrete pattern implements [`Pattern`], a small state machine over
//! its own private state. [`Matcher`] wraps a pattern and owns the uniform
//! lifecycle shared by all of them:
//!
//! ```text
//!  Uninitialized ──init()──> Initialized ──feed()──> Incomplete ⇄ Incomplete
//!        ^                                              │
//!        │                                              ├──> NotMatching ┐
//!        └──────────────deinit()────────────────────    ├──> Complete    ├─ state machine
//!                                                       │                │  restarted in the
//!                                                       └────────────────┘  same feed() call
//! ```
//!
//! `NotMatching` and `Complete` are self-resetting: the pattern's private state
//! returns to its start state inside the same [`Matcher::feed`] call, so the
//! next byte always begins a fresh attempt. Results survive the reset and are
//! readable while the status stays `Complete`.
//!
//! # Example
//!
//! ```
//! use atlink_protocol::matcher::{LiteralPattern, MatchStatus, Matcher};
//!
//! let mut ok = Matcher::new(LiteralPattern::new(b"OK"));
//! ok.init();
//!
//! assert_eq!(ok.feed(b'O'), MatchStatus::Incomplete);
//! assert_eq!(ok.feed(b'K'), MatchStatus::Complete);
//! assert_eq!(ok.feed(b'X'), MatchStatus::NotMatching);
//! ```

pub mod connection;
pub mod framed;
pub mod literal;
pub mod motor;

pub use connection::ConnectionEventPattern;
pub use framed::{FramedData, FramedDataPattern};
pub use literal::LiteralPattern;
pub use motor::{CharacterizePattern, CharacterizeRequest, DutyCyclePattern, MotorCommand, MotorDirection};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a matcher after its last operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MatchStatus {
    /// `init()` has not been called, or `deinit()` invalidated the matcher.
    #[default]
    Uninitialized,

    /// `init()` has been called and no byte has been fed yet.
    Initialized,

    /// The last byte fits the pattern but does not complete it.
    Incomplete,

    /// The last byte cannot be part of the pattern.
    NotMatching,

    /// The last byte completed the pattern; results are valid.
    Complete,
}

impl MatchStatus {
    /// True for the two statuses that restart the state machine.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, MatchStatus::NotMatching | MatchStatus::Complete)
    }

    /// True once `init()` has been called.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        !matches!(self, MatchStatus::Uninitialized)
    }
}

/// Identifies which pattern a matcher recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherKind {
    FramedData,
    ConnectionOpen,
    ConnectionClose,
    ConnectionFailed,
    DutyCycle,
    Literal,
    ResetDetected,
    Characterize,
}

impl fmt::Display for MatcherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatcherKind::FramedData => "framed-data",
            MatcherKind::ConnectionOpen => "connection-open",
            MatcherKind::ConnectionClose => "connection-close",
            MatcherKind::ConnectionFailed => "connection-failed",
            MatcherKind::DutyCycle => "duty-cycle",
            MatcherKind::Literal => "literal",
            MatcherKind::ResetDetected => "reset-detected",
            MatcherKind::Characterize => "characterize",
        };
        f.write_str(name)
    }
}

/// Outcome of a single state machine step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Incomplete,
    NotMatching,
    Complete,
}

impl Step {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Step::Incomplete)
    }
}

impl From<Step> for MatchStatus {
    fn from(step: Step) -> Self {
        match step {
            Step::Incomplete => MatchStatus::Incomplete,
            Step::NotMatching => MatchStatus::NotMatching,
            Step::Complete => MatchStatus::Complete,
        }
    }
}

/// A concrete pattern: private state plus a results record.
///
/// Implementations only describe the state machine. Status bookkeeping and
/// the reset-on-terminal discipline live in [`Matcher`].
pub trait Pattern {
    /// Data extracted by a complete match.
    type Results: Clone;

    /// Which pattern this is.
    fn kind(&self) -> MatcherKind;

    /// Return the private state to the start state. Results are left alone.
    fn reset(&mut self);

    /// Consume one byte.
    fn step(&mut self, byte: u8) -> Step;

    /// Results of the last complete match.
    fn results(&self) -> Self::Results;

    /// Release resources held by the pattern. Most patterns hold none.
    fn release(&mut self) {}
}

/// Uniform lifecycle around a [`Pattern`].
#[derive(Debug, Clone)]
pub struct Matcher<P> {
    pattern: P,
    status: MatchStatus,
}

impl<P: Pattern> Matcher<P> {
    /// Wrap a pattern. The matcher starts `Uninitialized`.
    pub fn new(pattern: P) -> Self {
        Self {
            pattern,
            status: MatchStatus::Uninitialized,
        }
    }

    /// Reset the private state and mark the matcher ready for input.
    ///
    /// Calling `init()` again restarts an in-progress match.
    pub fn init(&mut self) {
        self.pattern.reset();
        self.status = MatchStatus::Initialized;
    }

    /// Consume exactly one byte and return the new status.
    ///
    /// An `Uninitialized` matcher ignores the byte and stays `Uninitialized`.
    pub fn feed(&mut self, byte: u8) -> MatchStatus {
        if !self.status.is_initialized() {
            return self.status;
        }

        let step = self.pattern.step(byte);
        if step.is_terminal() {
            self.pattern.reset();
        }
        self.status = step.into();
        self.status
    }

    /// Invalidate the matcher. It must be initialized again before use.
    pub fn deinit(&mut self) {
        self.pattern.release();
        self.pattern.reset();
        self.status = MatchStatus::Uninitialized;
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn kind(&self) -> MatcherKind {
        self.pattern.kind()
    }

    pub fn is_complete(&self) -> bool {
        self.status == MatchStatus::Complete
    }

    /// Results of the match, available only while the status is `Complete`.
    pub fn results(&self) -> Option<P::Results> {
        self.is_complete().then(|| self.pattern.results())
    }

    pub fn pattern(&self) -> &P {
        &self.pattern
    }

    pub fn pattern_mut(&mut self) -> &mut P {
        &mut self.pattern
    }
}

/// Cursor over a static literal, shared by the patterns that scan a prefix.
#[derive(Debug, Clone)]
pub(crate) struct LiteralCursor {
    literal: &'static [u8],
    pos: usize,
}

/// Result of advancing a [`LiteralCursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Scan {
    Partial,
    Done,
    Mismatch,
}

impl LiteralCursor {
    pub(crate) const fn new(literal: &'static [u8]) -> Self {
        Self { literal, pos: 0 }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.literal.is_empty()
    }

    pub(crate) fn at_start(&self) -> bool {
        self.pos == 0
    }

    pub(crate) fn reset(&mut self) {
        self.pos = 0;
    }

    pub(crate) fn advance(&mut self, byte: u8) -> Scan {
        match self.literal.get(self.pos) {
            Some(&expected) if expected == byte => {
                self.pos += 1;
                if self.pos == self.literal.len() {
                    Scan::Done
                } else {
                    Scan::Partial
                }
            }
            _ => Scan::Mismatch,
        }
    }
}

/// Append one ASCII digit to a decimal accumulator, bounded by `max`.
///
/// Returns `None` if `byte` is not a digit or the value would exceed `max`.
pub(crate) fn push_digit(value: u32, byte: u8, max: u32) -> Option<u32> {
    if !byte.is_ascii_digit() {
        return None;
    }
    value
        .checked_mul(10)
        .and_then(|v| v.checked_add(u32::from(byte - b'0')))
        .filter(|v| *v <= max)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Pattern that completes on "ab" and counts resets.
    #[derive(Debug, Default)]
    struct Ab {
        pos: usize,
        resets: usize,
        released: bool,
    }

    impl Pattern for Ab {
        type Results = usize;

        fn kind(&self) -> MatcherKind {
            MatcherKind::Literal
        }

        fn reset(&mut self) {
            self.pos = 0;
            self.resets += 1;
        }

        fn step(&mut self, byte: u8) -> Step {
            match (self.pos, byte) {
                (0, b'a') => {
                    self.pos = 1;
                    Step::Incomplete
                }
                (1, b'b') => Step::Complete,
                _ => Step::NotMatching,
            }
        }

        fn results(&self) -> usize {
            self.resets
        }

        fn release(&mut self) {
            self.released = true;
        }
    }

    #[test]
    fn test_new_matcher_is_uninitialized() {
        let matcher = Matcher::new(Ab::default());
        assert_eq!(matcher.status(), MatchStatus::Uninitialized);
        assert_eq!(matcher.results(), None);
    }

    #[test]
    fn test_feed_before_init_is_ignored() {
        let mut matcher = Matcher::new(Ab::default());
        assert_eq!(matcher.feed(b'a'), MatchStatus::Uninitialized);
        assert_eq!(matcher.pattern().pos, 0);
    }

    #[test]
    fn test_init_sets_initialized() {
        let mut matcher = Matcher::new(Ab::default());
        matcher.init();
        assert_eq!(matcher.status(), MatchStatus::Initialized);
    }

    #[test]
    fn test_terminal_status_resets_state_in_same_call() {
        let mut matcher = Matcher::new(Ab::default());
        matcher.init();

        assert_eq!(matcher.feed(b'a'), MatchStatus::Incomplete);
        assert_eq!(matcher.feed(b'b'), MatchStatus::Complete);
        assert_eq!(matcher.pattern().pos, 0);

        assert_eq!(matcher.feed(b'a'), MatchStatus::Incomplete);
        assert_eq!(matcher.feed(b'x'), MatchStatus::NotMatching);
        assert_eq!(matcher.pattern().pos, 0);
    }

    #[test]
    fn test_results_only_while_complete() {
        let mut matcher = Matcher::new(Ab::default());
        matcher.init();
        matcher.feed(b'a');
        assert!(matcher.results().is_none());
        matcher.feed(b'b');
        assert!(matcher.results().is_some());
        matcher.feed(b'a');
        assert!(matcher.results().is_none());
    }

    #[test]
    fn test_deinit_releases_and_invalidates() {
        let mut matcher = Matcher::new(Ab::default());
        matcher.init();
        matcher.feed(b'a');
        matcher.deinit();

        assert_eq!(matcher.status(), MatchStatus::Uninitialized);
        assert!(matcher.pattern().released);
        assert_eq!(matcher.feed(b'b'), MatchStatus::Uninitialized);
    }

    #[test]
    fn test_literal_cursor() {
        let mut cursor = LiteralCursor::new(b"ab");
        assert!(cursor.at_start());
        assert_eq!(cursor.advance(b'a'), Scan::Partial);
        assert!(!cursor.at_start());
        assert_eq!(cursor.advance(b'b'), Scan::Done);
        cursor.reset();
        assert_eq!(cursor.advance(b'b'), Scan::Mismatch);
    }

    #[test]
    fn test_push_digit() {
        assert_eq!(push_digit(0, b'7', 100), Some(7));
        assert_eq!(push_digit(10, b'0', 100), Some(100));
        assert_eq!(push_digit(10, b'1', 100), None);
        assert_eq!(push_digit(1, b'x', 100), None);
        assert_eq!(push_digit(u32::MAX, b'9', u32::MAX), None);
    }
}
