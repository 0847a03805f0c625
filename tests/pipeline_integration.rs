/// Integration tests for the offline half of the pipeline
///
/// These tests verify:
/// 1. A response with a bad record still produces all three outputs
/// 2. CSV / JSON / map contents agree with the in-memory readings
/// 3. One failing writer does not stop the others
///
/// No network access is needed: records are parsed from canned API bodies
/// and fed to `pipeline::process`.
///
/// Run with: cargo test --test pipeline_integration

use aqmon::config::FileSettings;
use aqmon::error::OutputError;
use aqmon::ingest::moenv;
use aqmon::output::{OutputKind, OutputPaths};
use aqmon::{AppConfig, AqmonError, StationReading};

use chrono::{DateTime, Local, TimeZone};
use std::path::Path;

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const RESPONSE_WITH_BAD_RECORD: &str = r#"{
    "success": true,
    "records": [
        {"sitename": "基隆", "county": "基隆市", "aqi": "41", "pollutant": "",
         "status": "良好", "pm2.5": "9", "wind_speed": "2.4", "wind_direc": "54",
         "publishtime": "2024/05/01 13:00:00", "siteid": "1",
         "latitude": "25.129167", "longitude": "121.760056"},
        {"sitename": "中山", "county": "臺北市", "aqi": "75", "pollutant": "細懸浮微粒",
         "status": "普通", "pm2.5": "23.5", "wind_speed": "", "wind_direc": "",
         "publishtime": "2024/05/01 13:00:00", "siteid": "12",
         "latitude": "25.062361", "longitude": "121.526528"},
        {"sitename": "前鎮", "county": "高雄市", "aqi": "156", "pollutant": "臭氧八小時",
         "status": "對所有族群不健康", "pm2.5": "51", "wind_speed": "3.1", "wind_direc": "270",
         "publishtime": "2024/05/01 13:00:00", "siteid": "58",
         "longitude": "120.307564"},
        {"sitename": "無名", "county": "", "aqi": "30"}
    ]
}"#;

fn config_for(dir: &Path) -> AppConfig {
    let output_dir = dir.to_string_lossy().to_string();
    AppConfig::from_sources(FileSettings::default(), move |key| match key {
        "MOENV_API_KEY" => Some("test-key".to_string()),
        "AQMON_OUTPUT_DIR" => Some(output_dir.clone()),
        _ => None,
    })
    .expect("test config should be valid")
}

fn generated_at() -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 5, 1, 13, 5, 0).unwrap()
}

// ---------------------------------------------------------------------------
// End-to-end (offline)
// ---------------------------------------------------------------------------

#[test]
fn test_bad_record_is_skipped_and_run_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());

    let raw = moenv::parse_response(RESPONSE_WITH_BAD_RECORD).unwrap();
    let report = aqmon::process(&config, &raw, &generated_at());

    assert_eq!(report.fetched, 4);
    assert_eq!(report.readings.len(), 3, "record without site id is dropped");
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].index, 3);
    assert!(report.outputs.failures().is_empty());

    let report = report.into_result().expect("partial skips still succeed");
    assert_eq!(report.outputs.written().len(), 3);
}

#[test]
fn test_classification_is_applied_to_every_reading() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());

    let raw = moenv::parse_response(RESPONSE_WITH_BAD_RECORD).unwrap();
    let report = aqmon::process(&config, &raw, &generated_at());

    let pairs: Vec<(&str, &str)> = report
        .readings
        .iter()
        .map(|r| (r.status.as_str(), r.color.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![("Good", "green"), ("Moderate", "yellow"), ("Unhealthy", "red")]
    );

    assert_eq!(report.summary.valid_aqi, 3);
    assert_eq!(report.summary.max_aqi, Some(156));
    assert_eq!(report.summary.unmapped, 1);
}

#[test]
fn test_output_files_match_readings() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());

    let raw = moenv::parse_response(RESPONSE_WITH_BAD_RECORD).unwrap();
    let report = aqmon::process(&config, &raw, &generated_at());
    let paths = OutputPaths::for_run(dir.path(), &generated_at());

    // CSV: header + one row per reading, including the one with no latitude
    let csv = std::fs::read_to_string(&paths.csv).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("site_id,site_name,county,latitude,longitude,aqi"));
    assert!(lines[3].starts_with("58,前鎮,高雄市,,120.307564,156,51.0,Unhealthy,red"));

    // JSON: lossless round trip
    let json = std::fs::read_to_string(&paths.json).unwrap();
    let back: Vec<StationReading> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, report.readings);

    // Map: only stations with coordinates get markers
    let html = std::fs::read_to_string(&paths.map).unwrap();
    assert_eq!(html.matches("\"site_id\":").count(), 2);
    assert!(html.contains("\"site_id\":\"1\""));
    assert!(html.contains("\"site_id\":\"12\""));
    assert!(!html.contains("\"site_id\":\"58\""));
    assert!(html.contains("<b>Not mapped:</b> 1"));

    assert_eq!(report.outputs.path_of(OutputKind::Map), Some(paths.map.as_path()));
}

#[test]
fn test_json_output_reads_back_full_precision_values() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());

    let body = r#"[{"siteid": "33", "sitename": "小港", "aqi": "88",
                    "pm2.5": "117.54621790330661",
                    "latitude": "22.565747", "longitude": "120.337736",
                    "wind_speed": "0.30000000000000004"}]"#;
    let raw = moenv::parse_response(body).unwrap();
    let report = aqmon::process(&config, &raw, &generated_at());
    assert_eq!(report.readings[0].pm25, Some(117.54621790330661));

    let paths = OutputPaths::for_run(dir.path(), &generated_at());
    let json = std::fs::read_to_string(&paths.json).unwrap();
    let back: Vec<StationReading> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, report.readings);
}

#[test]
fn test_empty_response_still_writes_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());

    let raw = moenv::parse_response(r#"{"success": true, "records": []}"#).unwrap();
    let report = aqmon::process(&config, &raw, &generated_at());

    assert!(report.readings.is_empty());
    let paths = OutputPaths::for_run(dir.path(), &generated_at());
    assert_eq!(std::fs::read_to_string(&paths.json).unwrap().trim(), "[]");
    assert_eq!(std::fs::read_to_string(&paths.csv).unwrap().lines().count(), 1);
    assert!(paths.map.exists());
}

// ---------------------------------------------------------------------------
// Writer isolation
// ---------------------------------------------------------------------------

#[test]
fn test_one_failing_writer_does_not_stop_the_others() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_for(dir.path());
    let paths = OutputPaths::for_run(dir.path(), &generated_at());

    // A directory squatting on the CSV file name makes only that writer fail.
    std::fs::create_dir(&paths.csv).unwrap();

    let raw = moenv::parse_response(RESPONSE_WITH_BAD_RECORD).unwrap();
    let report = aqmon::process(&config, &raw, &generated_at());

    let failures = report.outputs.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].kind(), OutputKind::Csv);
    assert!(matches!(failures[0], OutputError::Io { .. }));

    assert!(paths.json.is_file());
    assert!(paths.map.is_file());

    let err = report.into_result().unwrap_err();
    assert!(matches!(err, AqmonError::Output { failed: 1 }));
    assert_eq!(err.exit_code(), 5);
}

#[test]
fn test_unwritable_output_dir_reports_every_writer() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, b"x").unwrap();
    let config = config_for(&blocker);

    let raw = moenv::parse_response(RESPONSE_WITH_BAD_RECORD).unwrap();
    let report = aqmon::process(&config, &raw, &generated_at());

    let kinds: Vec<OutputKind> = report.outputs.failures().iter().map(|e| e.kind()).collect();
    assert_eq!(kinds, vec![OutputKind::Csv, OutputKind::Json, OutputKind::Map]);
}

// ---------------------------------------------------------------------------
// Live API
// ---------------------------------------------------------------------------

/// Hits the real MOENV endpoint. Needs MOENV_API_KEY in the environment or .env.
///
/// Run with: cargo test --test pipeline_integration -- --ignored
#[test]
#[ignore]
fn test_live_api_returns_stations() {
    let config = AppConfig::load().expect("MOENV_API_KEY must be set");
    let client = moenv::build_client(&config).expect("Failed to create HTTP client");

    let records = moenv::fetch_records(&client, &config)
        .expect("MOENV API request failed - check network connectivity and API key");

    println!("✓ MOENV API returned {} station records", records.len());
    assert!(!records.is_empty(), "Should receive at least one station");

    let normalized = aqmon::analysis::normalize::normalize_all(&records);
    assert!(
        normalized.skipped.len() < records.len(),
        "At least some records should normalize"
    );
}
