//! Literal matcher.

use super::{MatcherKind, Pattern, Step};

/// Matches a fixed byte string, position by position.
///
/// A mismatching byte resets the position to zero and is not re-examined:
/// the next byte starts a fresh attempt. An empty literal never matches.
#[derive(Debug, Clone)]
pub struct LiteralPattern {
    kind: MatcherKind,
    literal: Vec<u8>,
    pos: usize,
}

impl LiteralPattern {
    pub fn new(literal: impl Into<Vec<u8>>) -> Self {
        Self::with_kind(MatcherKind::Literal, literal)
    }

    /// Literal matcher reporting a specific kind (e.g. the reset banner).
    pub fn with_kind(kind: MatcherKind, literal: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            literal: literal.into(),
            pos: 0,
        }
    }

    /// Replace the literal. The position restarts at zero.
    pub fn set_literal(&mut self, literal: &[u8]) {
        self.literal.clear();
        self.literal.extend_from_slice(literal);
        self.pos = 0;
    }

    pub fn literal(&self) -> &[u8] {
        &self.literal
    }

    /// Number of bytes matched so far.
    pub fn position(&self) -> usize {
        self.pos
    }
}

impl Pattern for LiteralPattern {
    type Results = ();

    fn kind(&self) -> MatcherKind {
        self.kind
    }

    fn reset(&mut self) {
        self.pos = 0;
    }

    fn step(&mut self, byte: u8) -> Step {
        match self.literal.get(self.pos) {
            Some(&expected) if expected == byte => {
                self.pos += 1;
                if self.pos == self.literal.len() {
                    Step::Complete
                } else {
                    Step::Incomplete
                }
            }
            _ => Step::NotMatching,
        }
    }

    fn results(&self) {}
}
