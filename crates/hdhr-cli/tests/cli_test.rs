#![allow(clippy::unwrap_used)]
#![allow(missing_docs)]

use std::path::Path;

use assert_cmd::cargo_bin_cmd;
use predicates::prelude::predicate;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn write_config(dir: &Path, server: &MockServer) -> std::path::PathBuf {
    let config = dir.join("config.toml");
    std::fs::write(
        &config,
        format!(
            r#"
[devices]
discover_urls = ["{uri}/discover.json"]

[api]
guide_url = "{uri}/api/guide.php"
min_interval_ms = 0
max_retries = 0
retry_delay_ms = 0
"#,
            uri = server.uri()
        ),
    )
    .unwrap();
    config
}

#[test]
fn test_help_lists_flags() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("hdhr2iptv");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output-directory"))
        .stdout(predicate::str::contains("--cache-directory"))
        .stdout(predicate::str::contains("--log-file"))
        .stdout(predicate::str::contains("--run-daily-hour"))
        .stdout(predicate::str::contains("--favorites-only"));
}

#[test]
fn test_version() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("hdhr2iptv");
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_run_daily_hour_out_of_range() {
    // Arrange & Act & Assert
    let mut cmd = cargo_bin_cmd!("hdhr2iptv");
    cmd.args(["-s", "24"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--run-daily-hour"));
}

#[test]
fn test_invalid_config_file() {
    // Arrange
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(&config, "[output\ndir = ").unwrap();

    // Act & Assert
    let mut cmd = cargo_bin_cmd!("hdhr2iptv");
    cmd.arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse"));
}

#[tokio::test]
async fn test_generates_guide_and_playlist() {
    // Arrange
    let server = MockServer::start().await;
    let discover = include_str!("../../../fixtures/hdhr/discover_device.json")
        .replace("http://192.168.1.20", &server.uri());
    Mock::given(method("GET"))
        .and(path("/discover.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(discover))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lineup.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(include_str!("../../../fixtures/hdhr/lineup.json")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/guide.php"))
        .and(query_param("Channel", "5.1"))
        .and(query_param_is_missing("Start"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(include_str!("../../../fixtures/hdhr/guide_5_1.json")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/guide.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server);
    let out = dir.path().join("out");
    let cache = dir.path().join("cache");

    // Act
    let mut cmd = cargo_bin_cmd!("hdhr2iptv");
    cmd.arg("--config")
        .arg(&config)
        .arg("-o")
        .arg(&out)
        .arg("-c")
        .arg(&cache);
    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();

    // Assert
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let xml = std::fs::read_to_string(out.join("hdhr.xml")).unwrap();
    assert!(xml.starts_with("<?xml"));
    assert!(xml.contains(r#"<channel id="5.1">"#));
    assert!(xml.contains("Harbor Lights"));
    let m3u = std::fs::read_to_string(out.join("1052ABCD.m3u")).unwrap();
    assert!(m3u.starts_with("#EXTM3U\r\n"));
    let log = std::fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .find(|name| name.starts_with("hdhr2iptv.") && name.ends_with(".log"));
    assert!(log.is_some());
}

#[tokio::test]
async fn test_no_devices_succeeds_without_output() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(dir.path(), &server);
    let out = dir.path().join("out");

    // Act
    let mut cmd = cargo_bin_cmd!("hdhr2iptv");
    cmd.arg("--config").arg(&config).arg("-o").arg(&out);
    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();

    // Assert
    assert!(output.status.success());
    assert!(!out.join("hdhr.xml").exists());
}

#[tokio::test]
async fn test_discovery_failure_exits_non_zero_and_is_logged() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/discover"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(
        &config,
        format!(
            r#"
[api]
discover_url = "{uri}/discover"
min_interval_ms = 0
max_retries = 0
retry_delay_ms = 0
"#,
            uri = server.uri()
        ),
    )
    .unwrap();
    let out = dir.path().join("out");

    // Act
    let mut cmd = cargo_bin_cmd!("hdhr2iptv");
    cmd.arg("--config")
        .arg(&config)
        .arg("-o")
        .arg(&out)
        .arg("-c")
        .arg(dir.path().join("cache"));
    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();

    // Assert
    assert!(!output.status.success());
    assert!(!out.join("hdhr.xml").exists());
    let log_path = std::fs::read_dir(&out)
        .unwrap()
        .map(|e| e.unwrap().path())
        .find(|p| p.extension().is_some_and(|ext| ext == "log"))
        .unwrap();
    let log = std::fs::read_to_string(log_path).unwrap();
    assert!(log.contains("Run failed"));
    assert!(log.contains("device discovery failed"));
}
