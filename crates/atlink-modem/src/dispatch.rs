//! Dispatch loop and wait engine.
//!
//! Commands leave the queue one at a time, in the order they were queued.
//! Each popped command runs through:
//!
//! ```text
//!            ┌──────────── Busy / Timeout (attempts left) ───────────┐
//!            v                                                       │
//! Send ──> Wait ──> Ok ──> release params ──> payload? ──> command-sent
//!            │                                 │
//!            │                                 └──> send payload, wait for
//!            │                                      "Recv <N> byte" / ERROR
//!            ├──> Error ──────────────────────────> dropped (no callback)
//!            └──> Busy / Timeout (last attempt) ──> dropped (no callback)
//! ```
//!
//! Commands without a wait procedure are written once, confirmed, then
//! followed by a settle delay.
//!
//! The wait engine arms one free-use literal matcher per candidate, then
//! sleeps one poll unit at a time until an armed matcher completes or the
//! budget runs out. Bytes reach the matchers through the receive task, so
//! a wait only ends early when the fan-out runs concurrently.

use crate::modem::Modem;
use atlink_core::constants::RESPONSE_ERROR;
use atlink_hardware::{Delay, Transport};
use atlink_protocol::{QueuedCommand, WaitOutcome, send_ack_literal};
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// How a dispatched command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchOutcome {
    /// Accepted by the device; the command-sent callback fired.
    Confirmed,
    /// The device answered with an error; dropped without a retry.
    Rejected,
    /// Every attempt ended busy or timed out; dropped.
    Exhausted,
}

impl fmt::Display for DispatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DispatchOutcome::Confirmed => "confirmed",
            DispatchOutcome::Rejected => "rejected",
            DispatchOutcome::Exhausted => "exhausted",
        };
        f.write_str(name)
    }
}

impl<T: Transport, D: Delay> Modem<T, D> {
    /// Dispatch queued commands until the queue is empty.
    ///
    /// Commands queued while this runs (from a callback, say) are dispatched
    /// too. Returns the number of commands processed.
    pub async fn do_work(&self) -> usize {
        let mut processed = 0;
        while self.dispatch_next().await.is_some() {
            processed += 1;
        }
        processed
    }

    /// Dispatch the oldest queued command, if any.
    ///
    /// Concurrent callers take turns: a queued command's line is staged at
    /// the head of the send ring, so only one may be in flight.
    pub async fn dispatch_next(&self) -> Option<DispatchOutcome> {
        let _in_flight = self.dispatch.lock().await;
        let mut cmd = self.outbound().pop()?;
        let outcome = self.dispatch(&mut cmd).await;
        debug!(command = %cmd.command, %outcome, "command dispatched");
        Some(outcome)
    }

    /// Run [`do_work`](Self::do_work) every receive period until `cancel` fires.
    pub async fn run_dispatch_loop(&self, cancel: CancellationToken) {
        let idle = self.config.receive_period();
        loop {
            self.do_work().await;
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(idle) => {}
            }
        }
        debug!("dispatch loop stopped");
    }

    /// Wait until one of `literals` is seen on the inbound stream.
    ///
    /// Returns the index of the first literal seen, or `None` once the wait
    /// budget is spent or the delay is stopped. Waits behind any command in
    /// flight, since both use the free-use pool.
    ///
    /// # Errors
    /// Returns `Error::TooManyLiterals` if the free-use pool is smaller than
    /// `literals`.
    pub async fn wait_for_any<L>(&self, literals: &[L]) -> atlink_core::Result<Option<usize>>
    where
        L: AsRef<[u8]> + Sync,
    {
        let _in_flight = self.dispatch.lock().await;
        self.inbound().arm(literals)?;
        let matched = self.poll_armed().await;
        self.inbound().disarm();
        Ok(matched)
    }

    async fn dispatch(&self, cmd: &mut QueuedCommand) -> DispatchOutcome {
        let command = cmd.command;
        let line = self.outbound().line(cmd);

        let Some(procedure) = command.wait_procedure() else {
            if let Err(e) = self.write(&line).await {
                warn!(%command, error = %e, "transmit failed");
            }
            self.confirm(cmd).await;
            self.delay.delay_ms(self.config.settle_delay_ms).await;
            return DispatchOutcome::Confirmed;
        };

        let max_attempts = command.max_attempts();
        for attempt in 1..=max_attempts {
            let matched = self.transmit_and_wait(&line, procedure.literals()).await;
            let outcome = procedure.classify(matched);
            debug!(%command, attempt, %outcome, "wait finished");

            match outcome {
                WaitOutcome::Ok => {
                    self.confirm(cmd).await;
                    return DispatchOutcome::Confirmed;
                }
                WaitOutcome::Error => {
                    warn!(%command, attempt, "device reported error, dropping command");
                    self.outbound().discard(cmd);
                    return DispatchOutcome::Rejected;
                }
                WaitOutcome::Busy | WaitOutcome::Timeout if attempt < max_attempts => {
                    warn!(%command, attempt, max_attempts, %outcome, "retrying command");
                }
                WaitOutcome::Busy | WaitOutcome::Timeout => {}
            }
        }

        warn!(%command, max_attempts, "retry limit exceeded, dropping command");
        self.outbound().discard(cmd);
        DispatchOutcome::Exhausted
    }

    /// Release the parameters, send the payload if any, then report the command sent.
    async fn confirm(&self, cmd: &mut QueuedCommand) {
        let payload = {
            let mut outbound = self.outbound();
            outbound.release_params(cmd);
            outbound.take_payload(cmd)
        };

        if let Some(payload) = payload {
            let len = payload.len();
            let ack = send_ack_literal(len);
            let literals: [&[u8]; 2] = [&ack, RESPONSE_ERROR];
            match self.transmit_and_wait(&payload, &literals).await {
                Some(0) => debug!(command = %cmd.command, len, "payload acknowledged"),
                Some(_) => warn!(command = %cmd.command, len, "payload rejected by device"),
                None => warn!(command = %cmd.command, len, "payload not acknowledged"),
            }
        }

        info!(command = %cmd.command, "command sent");
        self.callbacks.command_sent(cmd.command);
    }

    /// Arm `literals`, write `bytes`, then wait for one of them.
    async fn transmit_and_wait<L>(&self, bytes: &[u8], literals: &[L]) -> Option<usize>
    where
        L: AsRef<[u8]> + Sync,
    {
        let armed = self.inbound().arm(literals);
        if let Err(e) = armed {
            warn!(error = %e, "cannot arm response matchers");
            return None;
        }

        let matched = match self.write(bytes).await {
            Ok(()) => self.poll_armed().await,
            Err(e) => {
                warn!(error = %e, "transmit failed");
                None
            }
        };
        self.inbound().disarm();
        matched
    }

    async fn poll_armed(&self) -> Option<usize> {
        let unit = self.config.poll_interval_ms;
        let mut remaining = self.config.wait_timeout_ms;
        loop {
            let matched = self.inbound().armed_match();
            if matched.is_some() {
                return matched;
            }
            if remaining == 0 {
                return None;
            }

            let slice = unit.min(remaining);
            if !self.delay.delay_ms(slice).await {
                debug!("wait interrupted by delay stop");
                return None;
            }
            remaining -= slice;
        }
    }
}
