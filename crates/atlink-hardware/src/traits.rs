//! Capabilities consumed by the protocol engine.
//!
//! The engine needs two things from the platform: a byte-oriented duplex
//! link to the radio ([`Transport`]) and a millisecond sleep that can be
//! interrupted ([`Delay`]). Both are async traits. Methods are declared as
//! returning `impl Future + Send` so engines generic over them can be spawned
//! on a multi-threaded runtime; implementations simply write `async fn`.

use crate::error::Result;
use std::future::Future;

/// Duplex byte link to the radio.
///
/// # Examples
///
/// ```no_run
/// use atlink_hardware::{Result, Transport};
///
/// async fn drain<T: Transport>(link: &mut T) -> Result<Vec<u8>> {
///     let mut chunk = [0u8; 64];
///     let n = link.read_available(&mut chunk).await?;
///     Ok(chunk[..n].to_vec())
/// }
/// ```
pub trait Transport: Send {
    /// Read the bytes that are available right now, up to `buf.len()`.
    ///
    /// Returns `Ok(0)` when nothing is pending; it never waits for data.
    fn read_available(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<usize>> + Send;

    /// Write every byte of `bytes` or fail.
    fn write_all(&mut self, bytes: &[u8]) -> impl Future<Output = Result<()>> + Send;
}

/// Interruptible millisecond sleep.
pub trait Delay: Send + Sync {
    /// Sleep about `ms` milliseconds.
    ///
    /// Returns `false` if [`Delay::stop`] cut the sleep short.
    fn delay_ms(&self, ms: u64) -> impl Future<Output = bool> + Send;

    /// Wake every sleep currently in progress.
    fn stop(&self);
}
