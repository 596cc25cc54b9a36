//! Acquisition loop: feeder thread -> predictor -> caller callback.
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::RecvTimeoutError;
use soh_traits::ReadingSource;
use soh_traits::clock::Clock;

use crate::config::RunnerCfg;
use crate::error::{Result, SohError};
use crate::feeder::{FeedItem, Feeder};
use crate::predictor::SohPredictor;
use crate::status::Estimate;
use crate::types::Reading;

/// How often the loop re-checks the shutdown flag while waiting for data.
const SHUTDOWN_POLL: Duration = Duration::from_millis(50);

/// Counters accumulated over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Samples received from the source, rejected ones included.
    pub samples: u64,
    pub predictions: u64,
    pub clamped: u64,
    /// Readings refused by the buffer (non-finite values).
    pub rejected: u64,
    pub source_errors: u64,
    /// Recoverable pipeline failures (normalization or inference).
    pub inference_errors: u64,
}

/// What happened to one feeder item.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    Estimate { reading: Reading, estimate: Estimate },
    Rejected(SohError),
    SourceError(String),
    InferenceFailed(SohError),
}

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Shutdown,
    SourceExhausted,
}

/// Summary returned when the loop ends without a fatal error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub stats: RunStats,
    pub reason: StopReason,
    /// Time on `clock` from start until the feeder thread was joined.
    pub elapsed: Duration,
}

/// Drive `predictor` from `source` until shutdown or exhaustion.
///
/// Rejected readings, source failures and per-window pipeline failures are
/// counted, reported to `on_event` and skipped. A shape mismatch fails every
/// window the same way and ends the run with an error.
pub fn run<S, C, F>(
    source: S,
    predictor: &mut SohPredictor,
    cfg: &RunnerCfg,
    clock: C,
    shutdown: &AtomicBool,
    mut on_event: F,
) -> Result<RunSummary>
where
    S: ReadingSource + Send + 'static,
    C: Clock + Clone + Send + 'static,
    F: FnMut(&RunEvent),
{
    let started = clock.now();
    let feeder = Feeder::spawn(source, cfg.poll_interval, cfg.channel_capacity, clock.clone());
    let mut stats = RunStats::default();
    tracing::info!(
        window_size = predictor.window_size(),
        poll_interval_ms = u64::try_from(cfg.poll_interval.as_millis()).unwrap_or(u64::MAX),
        "acquisition started"
    );

    let reason = loop {
        if shutdown.load(Ordering::Relaxed) {
            break StopReason::Shutdown;
        }
        let item = match feeder.recv_timeout(SHUTDOWN_POLL) {
            Ok(item) => item,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break StopReason::SourceExhausted,
        };

        let sample = match item {
            FeedItem::Sample(sample) => sample,
            FeedItem::SourceError(msg) => {
                stats.source_errors += 1;
                on_event(&RunEvent::SourceError(msg));
                continue;
            }
        };
        stats.samples += 1;
        let reading = Reading::from(sample);

        match predictor.predict_reading(reading) {
            Ok(estimate) => {
                if let Estimate::Ready(p) = &estimate {
                    stats.predictions += 1;
                    if p.was_clamped {
                        stats.clamped += 1;
                    }
                    if cfg.log_every > 0 && stats.predictions % cfg.log_every == 0 {
                        tracing::info!(
                            elapsed_ms = clock.ms_since(started),
                            predictions = stats.predictions,
                            soh = p.value,
                            rejected = stats.rejected,
                            source_errors = stats.source_errors,
                            "progress"
                        );
                    }
                }
                on_event(&RunEvent::Estimate { reading, estimate });
            }
            Err(report) => match report.downcast_ref::<SohError>().cloned() {
                Some(e @ SohError::InvalidReading(_)) => {
                    stats.rejected += 1;
                    on_event(&RunEvent::Rejected(e));
                }
                Some(e) if !e.is_fatal() => {
                    stats.inference_errors += 1;
                    tracing::warn!(error = %e, "inference failed, skipping window");
                    on_event(&RunEvent::InferenceFailed(e));
                }
                _ => {
                    tracing::error!(error = %report, "fatal pipeline error");
                    return Err(report);
                }
            },
        }
    };

    drop(feeder);
    let elapsed = Duration::from_millis(clock.ms_since(started));
    tracing::info!(
        ?reason,
        elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        samples = stats.samples,
        predictions = stats.predictions,
        clamped = stats.clamped,
        rejected = stats.rejected,
        source_errors = stats.source_errors,
        inference_errors = stats.inference_errors,
        "acquisition stopped"
    );
    Ok(RunSummary {
        stats,
        reason,
        elapsed,
    })
}
