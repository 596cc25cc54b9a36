use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

/// Zero-weight LSTM whose dense head emits `bias`; with the output scaler
/// fitted on [60, 100] the decoded SOH is `60 + 40 * bias`.
fn model_json(window: usize, bias: f64) -> String {
    format!(
        r#"{{
  "window_size": {window}, "n_features": 3,
  "layers": [
    {{"type":"lstm","units":1,
     "kernel":[[0,0,0,0],[0,0,0,0],[0,0,0,0]],
     "recurrent_kernel":[[0,0,0,0]],
     "bias":[0,0,0,0]}},
    {{"type":"dropout","rate":0.2}},
    {{"type":"dense","units":1,"kernel":[[0]],"bias":[{bias}]}}
  ]
}}"#
    )
}

// Build a minimal valid config plus artifacts next to it.
fn write_setup(dir: &tempfile::TempDir, model_window: usize, window: usize, bias: f64) -> PathBuf {
    fs::write(dir.path().join("model.json"), model_json(model_window, bias)).unwrap();
    fs::write(
        dir.path().join("scaler_x.json"),
        r#"{"kind":"min_max","data_min":[2.5,-5.0,0.0],"data_max":[4.2,5.0,60.0]}"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("scaler_y.json"),
        r#"{"kind":"min_max","data_min":[60.0],"data_max":[100.0]}"#,
    )
    .unwrap();
    let toml = format!(
        r#"
[artifacts]
model = "model.json"
scaler_x = "scaler_x.json"
scaler_y = "scaler_y.json"

[window]
size = {window}

[runner]
poll_interval_ms = 0
channel_capacity = 8
"#
    );
    let path = dir.path().join("cfg.toml");
    fs::write(&path, toml).unwrap();
    path
}

fn write_csv(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("readings.csv");
    fs::write(&path, body).unwrap();
    path
}

fn soh(cfg: &PathBuf) -> Command {
    let mut cmd = Command::cargo_bin("soh").unwrap();
    cmd.arg("--config").arg(cfg).arg("--log-level").arg("warn");
    cmd
}

#[test]
fn help_lists_commands() {
    Command::cargo_bin("soh")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:").and(predicate::str::contains("replay")));
}

#[test]
fn config_log_level_applies_without_flag() {
    let dir = tempdir().unwrap();
    let cfg = write_setup(&dir, 3, 3, 0.5);
    let mut text = fs::read_to_string(&cfg).unwrap();
    text.push_str("\n[logging]\nlevel = \"debug\"\n");
    fs::write(&cfg, text).unwrap();

    Command::cargo_bin("soh")
        .unwrap()
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(&cfg)
        .arg("self-check")
        .assert()
        .success()
        .stderr(predicate::str::contains("config loaded"));
}

#[test]
fn log_level_flag_overrides_config() {
    let dir = tempdir().unwrap();
    let cfg = write_setup(&dir, 3, 3, 0.5);
    let mut text = fs::read_to_string(&cfg).unwrap();
    text.push_str("\n[logging]\nlevel = \"debug\"\n");
    fs::write(&cfg, text).unwrap();

    Command::cargo_bin("soh")
        .unwrap()
        .env_remove("RUST_LOG")
        .arg("--config")
        .arg(&cfg)
        .arg("--log-level")
        .arg("warn")
        .arg("self-check")
        .assert()
        .success()
        .stderr(predicate::str::contains("config loaded").not());
}

#[test]
fn self_check_passes_with_matching_artifacts() {
    let dir = tempdir().unwrap();
    let cfg = write_setup(&dir, 3, 3, 0.5);
    soh(&cfg)
        .arg("self-check")
        .assert()
        .success()
        .stdout(predicate::str::contains("ok (window_size=3)"));
}

#[test]
fn replay_buffers_then_predicts() {
    let dir = tempdir().unwrap();
    let cfg = write_setup(&dir, 3, 3, 0.5);
    let csv = write_csv(
        &dir,
        "voltage,current,temperature\n4.10,-1.5,24.0\n4.05,-1.5,24.2\n4.00,-1.5,24.4\n3.95,-1.5,24.6\n",
    );
    let out = soh(&cfg)
        .arg("replay")
        .arg("--csv")
        .arg(&csv)
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8(out.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "buffering (1/3)",
            "buffering (2/3)",
            "SOH: 80.00%",
            "SOH: 80.00%",
            "samples=4 predictions=2 clamped=0 rejected=0 source_errors=0 inference_errors=0",
        ]
    );
}

#[test]
fn replay_skips_non_finite_rows() {
    let dir = tempdir().unwrap();
    let cfg = write_setup(&dir, 2, 2, 0.5);
    let csv = write_csv(
        &dir,
        "voltage,current,temperature\n4.10,-1.5,24.0\nNaN,-1.5,24.2\n4.00,-1.5,24.4\n",
    );
    soh(&cfg)
        .arg("replay")
        .arg("--csv")
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("rejected=1").and(predicate::str::contains("predictions=1")))
        .stderr(predicate::str::contains("skipped reading"));
}

#[test]
fn simulate_flags_clamped_estimates() {
    let dir = tempdir().unwrap();
    let cfg = write_setup(&dir, 2, 2, 1.1);
    soh(&cfg)
        .args(["simulate", "--count", "5"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("SOH: 100.00% (clamped)")
                .and(predicate::str::contains("predictions=4 clamped=4")),
        );
}

#[test]
fn json_mode_emits_one_object_per_line() {
    let dir = tempdir().unwrap();
    let cfg = write_setup(&dir, 2, 2, 0.25);
    let out = soh(&cfg)
        .args(["--json", "simulate", "--count", "3"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let stdout = String::from_utf8(out.stdout).unwrap();
    let objs: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(objs.len(), 4);
    assert_eq!(objs[0]["event"], "buffering");
    assert_eq!(objs[0]["filled"], 1);
    assert_eq!(objs[1]["event"], "estimate");
    assert!((objs[1]["soh"].as_f64().unwrap() - 70.0).abs() < 1e-9);
    assert_eq!(objs[1]["clamped"], false);
    assert_eq!(objs[3]["event"], "summary");
    assert_eq!(objs[3]["predictions"], 2);
    assert_eq!(objs[3]["stopped"], "SourceExhausted");
}

#[rstest]
#[case::window_mismatch(3, 4, 4, "do not match")]
#[case::zero_window(3, 0, 2, "window.size must be >= 1")]
fn setup_errors_have_stable_exit_codes(
    #[case] model_window: usize,
    #[case] window: usize,
    #[case] code: i32,
    #[case] needle: &str,
) {
    let dir = tempdir().unwrap();
    let cfg = write_setup(&dir, model_window, window, 0.5);
    soh(&cfg)
        .arg("self-check")
        .assert()
        .code(code)
        .stderr(predicate::str::contains(needle));
}

#[test]
fn missing_artifact_exits_with_artifact_code() {
    let dir = tempdir().unwrap();
    let cfg = write_setup(&dir, 3, 3, 0.5);
    fs::remove_file(dir.path().join("scaler_y.json")).unwrap();
    soh(&cfg)
        .arg("self-check")
        .assert()
        .code(3)
        .stderr(predicate::str::contains("scaler_y.json"));
}

#[test]
fn bad_csv_headers_are_explained() {
    let dir = tempdir().unwrap();
    let cfg = write_setup(&dir, 3, 3, 0.5);
    let csv = write_csv(&dir, "v,i,t\n4.1,-1.5,24.0\n");
    soh(&cfg)
        .arg("replay")
        .arg("--csv")
        .arg(&csv)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Expected 'voltage,current,temperature'"));
}

#[test]
fn bridge_requires_thingspeak_table() {
    let dir = tempdir().unwrap();
    let cfg = write_setup(&dir, 3, 3, 0.5);
    soh(&cfg)
        .arg("bridge")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("[thingspeak]"));
}

#[test]
fn json_errors_are_structured() {
    let dir = tempdir().unwrap();
    let cfg = write_setup(&dir, 3, 5, 0.5);
    let out = soh(&cfg).args(["--json", "self-check"]).output().unwrap();
    assert_eq!(out.status.code(), Some(4));
    let stderr = String::from_utf8(out.stderr).unwrap();
    let line = stderr
        .lines()
        .rev()
        .find(|l| l.contains("\"reason\""))
        .unwrap();
    let v: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(v["reason"], "ShapeMismatch");
    assert_eq!(v["details"]["expected"], serde_json::json!([5, 3]));
    assert_eq!(v["details"]["actual"], serde_json::json!([3, 3]));
}
