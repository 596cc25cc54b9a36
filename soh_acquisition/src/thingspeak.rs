//! ThingSpeak channel poller.
//!
//! Each `next_sample` fetches `feeds/last.json` once. Pacing between polls is
//! the caller's job (the public API allows one request per 15 s).

use std::time::Duration;

use soh_traits::{BoxError, RawSample, ReadingSource};

use crate::error::{AcqError, Result};

/// Which channel fields carry which measurement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    pub voltage: String,
    pub current: String,
    pub temperature: String,
}

impl Default for FieldMap {
    fn default() -> Self {
        Self {
            voltage: "field1".into(),
            current: "field2".into(),
            temperature: "field3".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ThingSpeakParams {
    pub base_url: String,
    pub channel_id: String,
    pub read_api_key: String,
    pub timeout: Duration,
    pub fields: FieldMap,
}

/// One decoded feed entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedEntry {
    pub entry_id: Option<u64>,
    pub sample: RawSample,
}

fn field_value(obj: &serde_json::Map<String, serde_json::Value>, name: &str) -> Result<f64> {
    match obj.get(name) {
        Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s
            .trim()
            .parse::<f64>()
            .map_err(|e| AcqError::Parse(format!("{name}={s:?}: {e}"))),
        Some(serde_json::Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| AcqError::Parse(format!("{name}: number out of range"))),
        Some(serde_json::Value::String(_) | serde_json::Value::Null) | None => {
            Err(AcqError::Incomplete(name.to_string()))
        }
        Some(other) => Err(AcqError::Parse(format!("{name}: unexpected value {other}"))),
    }
}

/// Decode a `feeds/last.json` body.
///
/// Values stay as delivered; finiteness is checked by the core when the
/// reading is pushed.
pub fn parse_feed(body: &str, fields: &FieldMap) -> Result<FeedEntry> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| AcqError::Parse(e.to_string()))?;
    // An unknown channel or bad key answers with a bare `-1`.
    let obj = value
        .as_object()
        .ok_or_else(|| AcqError::Parse(format!("expected a JSON object, got {value}")))?;

    let voltage = field_value(obj, &fields.voltage)?;
    let current = field_value(obj, &fields.current)?;
    let temperature = field_value(obj, &fields.temperature)?;
    let entry_id = obj.get("entry_id").and_then(serde_json::Value::as_u64);

    Ok(FeedEntry {
        entry_id,
        sample: RawSample::new(voltage, current, temperature),
    })
}

/// Decode an HTTP answer; anything outside 2xx is `AcqError::Http`.
pub fn decode_response(status: u16, body: &str, fields: &FieldMap) -> Result<FeedEntry> {
    if !(200..300).contains(&status) {
        return Err(AcqError::Http(status));
    }
    parse_feed(body, fields)
}

pub struct ThingSpeakSource {
    client: reqwest::blocking::Client,
    params: ThingSpeakParams,
}

impl core::fmt::Debug for ThingSpeakSource {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ThingSpeakSource")
            .field("url", &self.redacted_url())
            .field("timeout", &self.params.timeout)
            .finish()
    }
}

impl ThingSpeakSource {
    pub fn new(params: ThingSpeakParams) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(params.timeout)
            .build()?;
        Ok(Self { client, params })
    }

    fn feed_url(&self) -> String {
        format!(
            "{}/channels/{}/feeds/last.json",
            self.params.base_url.trim_end_matches('/'),
            self.params.channel_id
        )
    }

    /// Endpoint with the API key masked, for logs.
    pub fn redacted_url(&self) -> String {
        format!("{}?api_key=***", self.feed_url())
    }

    /// Fetch and decode the latest channel entry.
    pub fn fetch(&self) -> Result<FeedEntry> {
        let resp = self
            .client
            .get(self.feed_url())
            .query(&[("api_key", self.params.read_api_key.as_str())])
            .send()?;
        let status = resp.status().as_u16();
        let body = resp.text()?;
        let entry = decode_response(status, &body, &self.params.fields)?;
        tracing::debug!(entry_id = ?entry.entry_id, "thingspeak entry");
        Ok(entry)
    }
}

impl ReadingSource for ThingSpeakSource {
    fn next_sample(&mut self) -> std::result::Result<Option<RawSample>, BoxError> {
        Ok(Some(self.fetch()?.sample))
    }
}
