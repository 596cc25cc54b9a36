#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! `soh` binary: battery state-of-health estimation from live or recorded readings.

mod cli;
mod error_fmt;
mod estimate;
mod logging;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;

use crate::cli::{Cli, Commands, JSON_MODE};
use crate::error_fmt::{ConfigError, exit_code_for_error, format_error_json, humanize};

fn load_config(path: &Path) -> eyre::Result<soh_config::Config> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        eyre::Report::new(ConfigError(format!(
            "cannot read config {}: {e}",
            path.display()
        )))
    })?;
    let cfg = soh_config::load_toml(&text)
        .map_err(|e| eyre::Report::new(ConfigError(format!("parse {}: {e}", path.display()))))?;
    cfg.validate()
        .map_err(|e| eyre::Report::new(ConfigError(e.to_string())))?;
    Ok(cfg)
}

fn run(cli: &Cli, shutdown: &Arc<AtomicBool>) -> eyre::Result<()> {
    let cfg = load_config(&cli.config)?;
    logging::init(&cfg.logging, cli.log_level.as_deref(), cli.json)?;
    tracing::debug!(config = %cli.config.display(), "config loaded");

    let mut predictor = estimate::load_predictor(&cfg, &cli.config)?;

    match &cli.cmd {
        Commands::SelfCheck => {
            if cli.json {
                println!(
                    "{}",
                    serde_json::json!({ "status": "ok", "window_size": predictor.window_size() })
                );
            } else {
                println!("ok (window_size={})", predictor.window_size());
            }
        }
        Commands::Replay { csv, interval_ms } => {
            let rows = soh_config::load_readings_csv(csv)?;
            tracing::info!(rows = rows.len(), csv = %csv.display(), "replaying readings");
            let source = soh_acquisition::ReplaySource::new(rows.iter().map(|r| {
                soh_traits::RawSample::new(r.voltage, r.current, r.temperature)
            }));
            let runner_cfg = estimate::offline_runner_cfg(&cfg, *interval_ms);
            estimate::run_source(source, &mut predictor, &runner_cfg, shutdown, cli.json)?;
        }
        Commands::Simulate { count, interval_ms } => {
            let source = soh_acquisition::SimulatedSource::new().with_limit(*count);
            let runner_cfg = estimate::offline_runner_cfg(&cfg, *interval_ms);
            estimate::run_source(source, &mut predictor, &runner_cfg, shutdown, cli.json)?;
        }
        Commands::Bridge { max_samples } => {
            let ts = cfg.thingspeak.as_ref().ok_or_else(|| {
                eyre::Report::new(ConfigError(
                    "bridge needs a [thingspeak] table in the config".into(),
                ))
            })?;
            let source = soh_acquisition::ThingSpeakSource::new(estimate::thingspeak_params(ts))
                .wrap_err("create ThingSpeak client")?;
            tracing::info!(url = %source.redacted_url(), "bridging ThingSpeak channel");
            let runner_cfg: soh_core::RunnerCfg = (&cfg.runner).into();
            let source = estimate::Limited::new(source, max_samples.unwrap_or(u64::MAX));
            estimate::run_source(source, &mut predictor, &runner_cfg, shutdown, cli.json)?;
        }
    }
    Ok(())
}

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let flag = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            flag.store(true, Ordering::Relaxed);
        }) {
            eprintln!("warning: cannot install Ctrl-C handler: {e}");
        }
    }

    if let Err(err) = run(&cli, &shutdown) {
        tracing::error!(error = %err, "soh failed");
        if JSON_MODE.get().copied().unwrap_or(false) {
            eprintln!("{}", format_error_json(&err));
        } else {
            eprintln!("{}", humanize(&err));
        }
        std::process::exit(exit_code_for_error(&err));
    }
}
