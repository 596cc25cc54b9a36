//! Background acquisition thread.
//!
//! Owns the `ReadingSource`, polls it at a fixed interval and forwards every
//! item over a bounded channel. Sends block when the channel is full, so a slow
//! consumer throttles polling instead of losing readings.
//!
//! Each `Feeder` spawns exactly one thread, which is shut down and joined when
//! the `Feeder` is dropped.
use crossbeam_channel as xch;
use soh_traits::clock::Clock;
use soh_traits::{RawSample, ReadingSource};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Longest single sleep between shutdown checks.
const SLEEP_STEP: Duration = Duration::from_millis(100);

/// One item produced by the source.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedItem {
    Sample(RawSample),
    /// The source failed this poll; the feeder keeps polling.
    SourceError(String),
}

pub struct Feeder {
    /// `None` only during drop, so a blocked send can fail before the join.
    rx: Option<xch::Receiver<FeedItem>>,
    shutdown: Arc<AtomicBool>,
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl core::fmt::Debug for Feeder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Feeder")
            .field("pending", &self.rx.as_ref().map_or(0, xch::Receiver::len))
            .field("shutdown", &self.shutdown.load(Ordering::Relaxed))
            .finish()
    }
}

fn paced_sleep<C: Clock>(clock: &C, total: Duration, shutdown: &AtomicBool) {
    let mut left = total;
    while !left.is_zero() && !shutdown.load(Ordering::Relaxed) {
        let step = left.min(SLEEP_STEP);
        clock.sleep(step);
        left -= step;
    }
}

impl Feeder {
    /// Spawn the polling thread.
    ///
    /// The source is polled immediately, then once per `poll_interval`. When it
    /// reports exhaustion the thread exits and the channel disconnects after
    /// the remaining items are drained.
    pub fn spawn<S, C>(mut source: S, poll_interval: Duration, capacity: usize, clock: C) -> Self
    where
        S: ReadingSource + Send + 'static,
        C: Clock + Send + 'static,
    {
        let (tx, rx) = xch::bounded(capacity.max(1));
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();

        let join_handle = std::thread::spawn(move || {
            let mut polls: u64 = 0;
            loop {
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("feeder thread received shutdown signal");
                    break;
                }

                polls += 1;
                let item = match source.next_sample() {
                    Ok(Some(sample)) => FeedItem::Sample(sample),
                    Ok(None) => {
                        tracing::debug!(polls, "source exhausted");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "source poll failed");
                        FeedItem::SourceError(e.to_string())
                    }
                };
                // If send fails, consumer is gone; exit gracefully
                if tx.send(item).is_err() {
                    tracing::debug!("feeder consumer disconnected, exiting thread");
                    break;
                }

                paced_sleep(&clock, poll_interval, &shutdown_clone);
            }
            tracing::trace!("feeder thread exiting cleanly");
        });

        Self {
            rx: Some(rx),
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Wait up to `timeout` for the next item.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<FeedItem, xch::RecvTimeoutError> {
        match &self.rx {
            Some(rx) => rx.recv_timeout(timeout),
            None => Err(xch::RecvTimeoutError::Disconnected),
        }
    }

    /// Block until the next item; `None` once the source is exhausted.
    pub fn recv(&self) -> Option<FeedItem> {
        self.rx.as_ref()?.recv().ok()
    }

    /// Ask the thread to stop after its current poll.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

impl Drop for Feeder {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        // Unblocks a pending send before we wait on the thread.
        drop(self.rx.take());
        // A source blocked in I/O delays the join until its own timeout fires.
        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("feeder thread joined successfully");
                }
                Err(e) => {
                    tracing::warn!(?e, "feeder thread panicked during shutdown");
                }
            }
        }
    }
}
