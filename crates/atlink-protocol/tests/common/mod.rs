//! Shared helpers for the protocol integration tests.

#![allow(dead_code)]

use atlink_protocol::{MatchStatus, Matcher, Pattern};

/// Feed every byte and collect the status after each one.
pub fn feed_all<P: Pattern>(matcher: &mut Matcher<P>, bytes: &[u8]) -> Vec<MatchStatus> {
    bytes.iter().map(|&b| matcher.feed(b)).collect()
}

/// Feed every byte and return the final status.
pub fn feed_last<P: Pattern>(matcher: &mut Matcher<P>, bytes: &[u8]) -> MatchStatus {
    bytes
        .iter()
        .fold(matcher.status(), |_, &b| matcher.feed(b))
}

/// Initialized matcher around `pattern`.
pub fn ready<P: Pattern>(pattern: P) -> Matcher<P> {
    let mut matcher = Matcher::new(pattern);
    matcher.init();
    matcher
}

/// `+IPD,<id>,<len>:` header.
pub fn ipd_header(id: u8, len: usize) -> Vec<u8> {
    format!("+IPD,{id},{len}:").into_bytes()
}
