//! Periodic receive task.
//!
//! Every receive period the task drains whatever the transport has pending,
//! up to `read_chunk_size` bytes, and runs it through the fan-out. It never
//! waits for data: an idle link costs one empty read per period.

use crate::modem::Modem;
use atlink_core::Result;
use atlink_hardware::{Delay, Transport};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

impl<T: Transport, D: Delay> Modem<T, D> {
    /// Read one chunk from the transport and feed it through the fan-out.
    ///
    /// Returns the number of bytes processed.
    ///
    /// # Errors
    /// Returns `Error::Transport` if the read fails.
    pub async fn poll_inbound(&self) -> Result<usize> {
        let mut chunk = vec![0u8; self.config.read_chunk_size];
        let n = {
            let mut transport = self.transport.lock().await;
            transport.read_available(&mut chunk).await?
        };
        self.process_inbound(&chunk[..n]);
        Ok(n)
    }
}

impl<T, D> Modem<T, D>
where
    T: Transport + 'static,
    D: Delay + 'static,
{
    /// Spawn the fan-out on a fixed interval until `cancel` fires.
    ///
    /// Read errors are logged and the task keeps running.
    pub fn spawn_receive_task(self: &Arc<Self>, cancel: CancellationToken) -> JoinHandle<()> {
        let modem = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(modem.config.receive_period());
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if let Err(e) = modem.poll_inbound().await {
                            warn!(error = %e, "receive failed");
                        }
                    }
                }
            }
            debug!("receive task stopped");
        })
    }
}
