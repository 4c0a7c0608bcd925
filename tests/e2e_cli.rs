//! CLI end-to-end tests
//!
//! Runs the plexsync binary with a scrubbed environment so local `.env`
//! files and exported tokens cannot leak in.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use std::process::Command;
use tempfile::{tempdir, TempDir};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Get a command for the plexsync binary, running in an empty directory.
#[allow(deprecated)]
fn plexsync_cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("plexsync").unwrap();
    cmd.env_clear().current_dir(dir.path());
    cmd
}

#[test]
fn test_cli_no_args_shows_help() {
    let dir = tempdir().unwrap();
    plexsync_cmd(&dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_lists_subcommands() {
    let dir = tempdir().unwrap();
    plexsync_cmd(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scan-sd"))
        .stdout(predicate::str::contains("sync-shares"))
        .stdout(predicate::str::contains("migrate"));
}

#[test]
fn test_scan_without_credentials_exits_2() {
    let dir = tempdir().unwrap();
    plexsync_cmd(&dir)
        .args(["scan-sd", "Movies"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("PLEX_URL"));
}

#[test]
fn test_migrate_without_credentials_exits_2() {
    let dir = tempdir().unwrap();
    plexsync_cmd(&dir)
        .args(["migrate", "--dest-url", "http://127.0.0.1:1", "--dest-token", "t"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Source URL and token are required"));
}

#[test]
fn test_sync_shares_without_account_exits_2() {
    let dir = tempdir().unwrap();
    plexsync_cmd(&dir)
        .args(["sync-shares", "--non-interactive"])
        .assert()
        .code(2);
}

#[test]
fn test_unreachable_server_exits_3() {
    let dir = tempdir().unwrap();
    plexsync_cmd(&dir)
        .args([
            "scan-sd",
            "Movies",
            "--url",
            "http://127.0.0.1:1",
            "--token",
            "t",
        ])
        .assert()
        .code(3);
}

#[test]
fn test_invalid_filter_pattern_exits_1() {
    let dir = tempdir().unwrap();
    plexsync_cmd(&dir)
        .args([
            "migrate",
            "--source-url",
            "http://127.0.0.1:1",
            "--source-token",
            "a",
            "--dest-url",
            "http://127.0.0.1:1",
            "--dest-token",
            "b",
            "--include",
            "(",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid include pattern"));
}

#[test]
fn test_env_file_supplies_credentials() {
    let dir = tempdir().unwrap();
    std::fs::write(
        dir.path().join(".env"),
        "PLEX_URL=http://127.0.0.1:1\nPLEX_API_TOKEN=from-dotenv\n",
    )
    .unwrap();

    // credentials found, so the failure is the connection, not exit 2
    plexsync_cmd(&dir)
        .args(["scan-sd", "Movies"])
        .assert()
        .code(3);
}

async fn movie_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "MediaContainer": {"friendlyName": "attic", "machineIdentifier": "abc123"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/library/sections"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "MediaContainer": {
                "Directory": [{"key": "1", "title": "Movies", "type": "movie"}]
            }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/library/sections/1/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "MediaContainer": {
                "size": 2,
                "totalSize": 2,
                "Metadata": [
                    {
                        "ratingKey": "1",
                        "title": "Alien",
                        "year": 1979,
                        "type": "movie",
                        "Media": [{"height": 480, "Part": [{"file": "/media/Alien.avi"}]}]
                    },
                    {
                        "ratingKey": "2",
                        "title": "Heat",
                        "year": 1995,
                        "type": "movie",
                        "Media": [{"height": 1080, "Part": [{"file": "/media/Heat.mkv"}]}]
                    }
                ]
            }
        })))
        .mount(&server)
        .await;
    server
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_library_exits_4() {
    let server = movie_server().await;
    let dir = tempdir().unwrap();
    plexsync_cmd(&dir)
        .args(["scan-sd", "Cartoons", "--url", &server.uri(), "--token", "t"])
        .assert()
        .code(4);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_scan_prints_and_exports_sd_items() {
    let server = movie_server().await;
    let dir = tempdir().unwrap();
    let csv = dir.path().join("sd.csv");

    plexsync_cmd(&dir)
        .args(["scan-sd", "movies", "--url", &server.uri(), "--token", "t", "--csv"])
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "[MOVIE] Alien (1979) - max height 480 - ratingKey 1",
        ))
        .stdout(predicate::str::contains("Heat").not());

    let text = std::fs::read_to_string(&csv).unwrap();
    assert_eq!(text.lines().count(), 2);
    assert!(text.contains("/library/metadata/1"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_paths_only_output() {
    let server = movie_server().await;
    let dir = tempdir().unwrap();

    plexsync_cmd(&dir)
        .args(["scan-sd", "Movies", "--paths-only", "--url", &server.uri(), "--token", "t"])
        .assert()
        .success()
        .stdout("/media/Alien.avi\n");
}
