#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schemas and reading CSV parsing for the SOH estimator.
//!
//! - `Config` and sub-structs are deserialized from TOML and validated.
//! - The readings CSV loader enforces headers and rejects non-numeric rows so a
//!   replay never feeds a silently shifted column into the model.
use serde::Deserialize;
use std::path::PathBuf;

/// Default window length the shipped artifacts were fitted for.
pub const DEFAULT_WINDOW_SIZE: usize = 10;

/// Readings CSV schema.
///
/// Expected headers:
/// voltage,current,temperature
///
/// Example:
/// voltage,current,temperature
/// 3.71,-1.20,24.8
/// 3.70,-1.21,24.9
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct ReadingRow {
    pub voltage: f64,
    pub current: f64,
    pub temperature: f64,
}

#[derive(Debug, Deserialize)]
pub struct Artifacts {
    /// Path to the exported sequence model (JSON weights).
    pub model: PathBuf,
    /// Path to the input (3-feature) scaler.
    pub scaler_x: PathBuf,
    /// Path to the output (1-feature) scaler.
    pub scaler_y: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct WindowCfg {
    /// Readings per model input; must match what the artifacts were fitted for.
    pub size: usize,
}

impl Default for WindowCfg {
    fn default() -> Self {
        Self {
            size: DEFAULT_WINDOW_SIZE,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RunnerCfg {
    /// Delay between two source polls (ms). ThingSpeak allows one request per 15 s.
    pub poll_interval_ms: u64,
    /// Capacity of the feeder -> predictor channel.
    pub channel_capacity: usize,
}

impl Default for RunnerCfg {
    fn default() -> Self {
        Self {
            poll_interval_ms: 16_000,
            channel_capacity: 64,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ThingSpeakCfg {
    pub channel_id: String,
    pub read_api_key: String,
    pub base_url: String,
    /// HTTP request timeout (ms).
    pub timeout_ms: u64,
    pub voltage_field: String,
    pub current_field: String,
    pub temperature_field: String,
}

impl Default for ThingSpeakCfg {
    fn default() -> Self {
        Self {
            channel_id: String::new(),
            read_api_key: String::new(),
            base_url: "https://api.thingspeak.com".to_string(),
            timeout_ms: 10_000,
            voltage_field: "field1".to_string(),
            current_field: "field2".to_string(),
            temperature_field: "field3".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub artifacts: Artifacts,
    #[serde(default)]
    pub window: WindowCfg,
    #[serde(default)]
    pub runner: RunnerCfg,
    /// Only required by the `bridge` command.
    #[serde(default)]
    pub thingspeak: Option<ThingSpeakCfg>,
    #[serde(default)]
    pub logging: Logging,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

/// Load every row of a readings CSV, in file order.
pub fn load_readings_csv(path: &std::path::Path) -> eyre::Result<Vec<ReadingRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open readings CSV {:?}: {}", path, e))?;

    // Enforce exact headers
    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["voltage", "current", "temperature"];
    let actual: Vec<String> = headers.iter().map(ToString::to_string).collect();
    if actual != expected {
        eyre::bail!(
            "readings CSV must have headers 'voltage,current,temperature', got: {}",
            actual.join(",")
        );
    }

    let mut rows = Vec::new();
    for (idx, rec) in rdr.deserialize::<ReadingRow>().enumerate() {
        match rec {
            Ok(row) => rows.push(row),
            Err(e) => {
                eyre::bail!("invalid CSV row {}: {}", idx + 2, e);
            }
        }
    }
    Ok(rows)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Artifacts
        if self.artifacts.model.as_os_str().is_empty() {
            eyre::bail!("artifacts.model must not be empty");
        }
        if self.artifacts.scaler_x.as_os_str().is_empty() {
            eyre::bail!("artifacts.scaler_x must not be empty");
        }
        if self.artifacts.scaler_y.as_os_str().is_empty() {
            eyre::bail!("artifacts.scaler_y must not be empty");
        }

        // Window
        if self.window.size == 0 {
            eyre::bail!("window.size must be >= 1");
        }
        if self.window.size > 10_000 {
            eyre::bail!("window.size is unreasonably large (>10000)");
        }

        // Runner
        if self.runner.channel_capacity == 0 {
            eyre::bail!("runner.channel_capacity must be >= 1");
        }
        if self.runner.poll_interval_ms > 24 * 60 * 60 * 1000 {
            eyre::bail!("runner.poll_interval_ms is unreasonably large (>24h)");
        }

        // ThingSpeak (optional table)
        if let Some(ts) = &self.thingspeak {
            if ts.channel_id.trim().is_empty() {
                eyre::bail!("thingspeak.channel_id must not be empty");
            }
            if ts.timeout_ms == 0 {
                eyre::bail!("thingspeak.timeout_ms must be >= 1");
            }
            if !(ts.base_url.starts_with("http://") || ts.base_url.starts_with("https://")) {
                eyre::bail!("thingspeak.base_url must start with http:// or https://");
            }
            for (name, field) in [
                ("voltage_field", &ts.voltage_field),
                ("current_field", &ts.current_field),
                ("temperature_field", &ts.temperature_field),
            ] {
                if field.trim().is_empty() {
                    eyre::bail!("thingspeak.{name} must not be empty");
                }
            }
        }

        // Logging
        if let Some(rot) = self.logging.rotation.as_deref()
            && !matches!(rot, "never" | "daily" | "hourly")
        {
            eyre::bail!("logging.rotation must be one of never|daily|hourly");
        }

        Ok(())
    }
}
