//! Stream fan-out.
//!
//! Every inbound byte is offered to the standing matchers and to the armed
//! free-use matchers of the wait engine. The framed-data matcher goes first
//! and, while it is capturing a payload, it sees the byte alone: payload
//! bytes never advance a lifecycle or response matcher.
//!
//! ```text
//!            ┌──> +IPD (framed data) ── capturing? ──> stop
//! byte ──────┤
//!            ├──> <id>,CONNECT / <id>,CLOSED / <id>,CONNECT FAIL
//!            ├──> \r\nready\r\n (reset)
//!            └──> free-use pool (armed by the wait engine)
//! ```
//!
//! Detected events are collected and handed back to the caller, which fires
//! the callbacks once the inbound lock is released.

use crate::connections::ConnectionTable;
use crate::events::{DataReceived, ModemEvent};
use atlink_core::constants::RESET_BANNER;
use atlink_core::{ConnectionInfo, ConnectionStatus, Error, Result};
use atlink_protocol::matcher::{ConnectionEventPattern, FramedDataPattern, LiteralPattern};
use atlink_protocol::{MatchStatus, Matcher, MatcherKind};
use bytes::Bytes;
use tracing::{debug, info};

#[derive(Debug)]
pub(crate) struct Inbound {
    framed: Matcher<FramedDataPattern>,
    lifecycle: [Matcher<ConnectionEventPattern>; 3],
    reset: Matcher<LiteralPattern>,
    pool: Vec<Matcher<LiteralPattern>>,
    armed: usize,
}

impl Inbound {
    pub(crate) fn new(pool_size: usize, receive_buffer_size: usize) -> Self {
        let mut inbound = Self {
            framed: Matcher::new(FramedDataPattern::new(receive_buffer_size)),
            lifecycle: [
                Matcher::new(ConnectionEventPattern::open()),
                Matcher::new(ConnectionEventPattern::close()),
                Matcher::new(ConnectionEventPattern::failed()),
            ],
            reset: Matcher::new(LiteralPattern::with_kind(
                MatcherKind::ResetDetected,
                RESET_BANNER,
            )),
            pool: (0..pool_size)
                .map(|_| Matcher::new(LiteralPattern::new(Vec::new())))
                .collect(),
            armed: 0,
        };
        inbound.framed.init();
        inbound.lifecycle.iter_mut().for_each(Matcher::init);
        inbound.reset.init();
        inbound
    }

    pub(crate) fn set_receive_buffer(&mut self, capacity: usize) {
        self.framed.pattern_mut().set_capture_buffer(capacity);
    }

    pub(crate) fn receive_buffer(&self) -> usize {
        self.framed.pattern().capacity()
    }

    pub(crate) fn pool_size(&self) -> usize {
        self.pool.len()
    }

    /// Arm one free-use matcher per literal, replacing any previous set.
    pub(crate) fn arm<L: AsRef<[u8]>>(&mut self, literals: &[L]) -> Result<()> {
        if literals.len() > self.pool.len() {
            return Err(Error::TooManyLiterals {
                requested: literals.len(),
                available: self.pool.len(),
            });
        }

        self.disarm();
        for (matcher, literal) in self.pool.iter_mut().zip(literals) {
            matcher.pattern_mut().set_literal(literal.as_ref());
            matcher.init();
        }
        self.armed = literals.len();
        Ok(())
    }

    /// Index of the first armed literal that has been seen.
    pub(crate) fn armed_match(&self) -> Option<usize> {
        self.pool[..self.armed].iter().position(Matcher::is_complete)
    }

    pub(crate) fn disarm(&mut self) {
        self.pool[..self.armed].iter_mut().for_each(Matcher::deinit);
        self.armed = 0;
    }

    /// Offer one byte to every matcher, pushing whatever it completes onto `events`.
    pub(crate) fn feed(
        &mut self,
        byte: u8,
        connections: &ConnectionTable,
        events: &mut Vec<ModemEvent>,
    ) {
        let was_capturing = self.framed.pattern().is_capturing();
        if let MatchStatus::Complete = self.framed.feed(byte) {
            if let Some(header) = self.framed.results() {
                debug!(
                    connection = %header.connection_id,
                    length = header.payload_length,
                    truncated = header.is_truncated(),
                    "framed data received"
                );
                events.push(ModemEvent::DataReceived(DataReceived {
                    connection_id: header.connection_id,
                    declared_length: header.payload_length,
                    data: Bytes::copy_from_slice(self.framed.pattern().captured()),
                    capacity: header.capacity,
                }));
            }
        }
        if was_capturing || self.framed.pattern().is_capturing() {
            return;
        }

        for matcher in &mut self.lifecycle {
            if matcher.feed(byte) != MatchStatus::Complete {
                continue;
            }
            let Some(id) = matcher.results() else {
                continue;
            };
            let status = match matcher.kind() {
                MatcherKind::ConnectionOpen => ConnectionStatus::Open,
                _ => ConnectionStatus::Closed,
            };
            connections.set(id, status);
            info!(connection = %id, %status, event = %matcher.kind(), "connection changed");
            events.push(ModemEvent::ConnectionChanged(ConnectionInfo::new(id, status)));
        }

        if self.reset.feed(byte) == MatchStatus::Complete {
            info!("module reset detected");
            for id in connections.close_all() {
                info!(connection = %id, "connection closed by reset");
                events.push(ModemEvent::ConnectionChanged(ConnectionInfo::new(
                    id,
                    ConnectionStatus::Closed,
                )));
            }
            events.push(ModemEvent::ResetDetected);
        }

        for matcher in &mut self.pool[..self.armed] {
            if !matcher.is_complete() {
                matcher.feed(byte);
            }
        }
    }
}
