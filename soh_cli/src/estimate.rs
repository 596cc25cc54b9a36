//! Artifact loading, source assembly, and per-estimate output.

use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use eyre::WrapErr;
use serde_json::json;
use soh_core::runner::{self, RunEvent, RunSummary};
use soh_core::{Estimate, RunStats, RunnerCfg, SohPredictor};
use soh_traits::clock::MonotonicClock;
use soh_traits::{BoxError, RawSample, ReadingSource};

/// Load the three artifacts named in `[artifacts]` and build a predictor.
///
/// Relative artifact paths are resolved against the config file's directory.
pub fn load_predictor(cfg: &soh_config::Config, cfg_path: &Path) -> eyre::Result<SohPredictor> {
    let base = cfg_path.parent().unwrap_or_else(|| Path::new("."));
    let model_path = base.join(&cfg.artifacts.model);
    let sx_path = base.join(&cfg.artifacts.scaler_x);
    let sy_path = base.join(&cfg.artifacts.scaler_y);

    let set = soh_artifacts::load_all(&model_path, &sx_path, &sy_path).map_err(|(path, e)| {
        eyre::Report::new(e).wrap_err(format!("load artifact {}", path.display()))
    })?;
    tracing::info!(
        model = %model_path.display(),
        window = set.model.window_size(),
        features = set.model.n_features(),
        "artifacts loaded"
    );

    SohPredictor::builder()
        .with_model(set.model)
        .with_input_scaler(set.scaler_x)
        .with_output_scaler(set.scaler_y)
        .with_config((&cfg.window).into())
        .build()
}

/// Source wrapper that reports exhaustion after `left` samples.
pub struct Limited<S> {
    inner: S,
    left: u64,
}

impl<S> Limited<S> {
    pub fn new(inner: S, limit: u64) -> Self {
        Self { inner, left: limit }
    }
}

impl<S: ReadingSource> ReadingSource for Limited<S> {
    fn next_sample(&mut self) -> Result<Option<RawSample>, BoxError> {
        if self.left == 0 {
            return Ok(None);
        }
        self.left -= 1;
        self.inner.next_sample()
    }
}

/// Text line for one estimate.
pub fn render_estimate(e: &Estimate) -> String {
    match e {
        Estimate::Buffering {
            filled,
            window_size,
        } => format!("buffering ({filled}/{window_size})"),
        Estimate::Ready(p) if p.was_clamped => format!("SOH: {:.2}% (clamped)", p.value),
        Estimate::Ready(p) => format!("SOH: {:.2}%", p.value),
    }
}

fn event_json(event: &RunEvent) -> serde_json::Value {
    match event {
        RunEvent::Estimate { reading, estimate } => {
            let input = json!({
                "voltage": reading.voltage(),
                "current": reading.current(),
                "temperature": reading.temperature(),
            });
            match estimate {
                Estimate::Buffering {
                    filled,
                    window_size,
                } => json!({
                    "event": "buffering",
                    "filled": filled,
                    "window_size": window_size,
                    "reading": input,
                }),
                Estimate::Ready(p) => json!({
                    "event": "estimate",
                    "soh": p.value,
                    "clamped": p.was_clamped,
                    "raw_soh": p.unclamped,
                    "reading": input,
                }),
            }
        }
        RunEvent::Rejected(e) => json!({ "event": "rejected", "message": e.to_string() }),
        RunEvent::SourceError(msg) => json!({ "event": "source_error", "message": msg }),
        RunEvent::InferenceFailed(e) => {
            json!({ "event": "inference_error", "message": e.to_string() })
        }
    }
}

fn print_event(event: &RunEvent, json: bool) {
    if json {
        println!("{}", event_json(event));
        return;
    }
    match event {
        RunEvent::Estimate { estimate, .. } => println!("{}", render_estimate(estimate)),
        RunEvent::Rejected(e) => eprintln!("skipped reading: {e}"),
        RunEvent::SourceError(msg) => eprintln!("source error: {msg}"),
        RunEvent::InferenceFailed(e) => eprintln!("estimate failed: {e}"),
    }
}

/// Final statistics, one line.
pub fn render_stats(s: &RunStats) -> String {
    format!(
        "samples={} predictions={} clamped={} rejected={} source_errors={} inference_errors={}",
        s.samples, s.predictions, s.clamped, s.rejected, s.source_errors, s.inference_errors
    )
}

fn stats_json(summary: &RunSummary) -> serde_json::Value {
    let s = &summary.stats;
    json!({
        "event": "summary",
        "stopped": format!("{:?}", summary.reason),
        "elapsed_ms": u64::try_from(summary.elapsed.as_millis()).unwrap_or(u64::MAX),
        "samples": s.samples,
        "predictions": s.predictions,
        "clamped": s.clamped,
        "rejected": s.rejected,
        "source_errors": s.source_errors,
        "inference_errors": s.inference_errors,
    })
}

/// Run `source` through the predictor, printing every event and the final statistics.
pub fn run_source<S>(
    source: S,
    predictor: &mut SohPredictor,
    cfg: &RunnerCfg,
    shutdown: &AtomicBool,
    json: bool,
) -> eyre::Result<RunSummary>
where
    S: ReadingSource + Send + 'static,
{
    let summary = runner::run(source, predictor, cfg, MonotonicClock::new(), shutdown, |e| {
        print_event(e, json);
    })
    .wrap_err("acquisition loop failed")?;
    if json {
        println!("{}", stats_json(&summary));
    } else {
        println!("{}", render_stats(&summary.stats));
    }
    Ok(summary)
}

/// Runner settings for offline sources: no pacing unless asked for.
pub fn offline_runner_cfg(cfg: &soh_config::Config, interval_ms: u64) -> RunnerCfg {
    let base: RunnerCfg = (&cfg.runner).into();
    RunnerCfg {
        poll_interval: Duration::from_millis(interval_ms),
        ..base
    }
}

/// ThingSpeak connection parameters from the `[thingspeak]` table.
pub fn thingspeak_params(
    ts: &soh_config::ThingSpeakCfg,
) -> soh_acquisition::ThingSpeakParams {
    soh_acquisition::ThingSpeakParams {
        base_url: ts.base_url.clone(),
        channel_id: ts.channel_id.clone(),
        read_api_key: ts.read_api_key.clone(),
        timeout: Duration::from_millis(ts.timeout_ms),
        fields: soh_acquisition::FieldMap {
            voltage: ts.voltage_field.clone(),
            current: ts.current_field.clone(),
            temperature: ts.temperature_field.clone(),
        },
    }
}
