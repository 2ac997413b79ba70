use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

#[test]
fn test_download_data_uri_saves_file() {
    let home = tempdir().unwrap();
    let out = tempdir().unwrap();

    cargo_bin_cmd!("parley")
        .env("PARLEY_HOME", home.path())
        .args([
            "download",
            "--source",
            "data:text/plain;base64,aGVsbG8=",
            "--name",
            "hello.txt",
            "--out",
        ])
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Saved"));

    let saved = fs::read_to_string(out.path().join("hello.txt")).unwrap();
    assert_eq!(saved, "hello");
}

#[tokio::test]
async fn test_download_url_fetches_then_saves() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = tempdir().unwrap();
    let out = tempdir().unwrap();
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files/report.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"a,b\n1,2\n".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let url = format!("{}/files/report.csv", mock_server.uri());
    cargo_bin_cmd!("parley")
        .env("PARLEY_HOME", home.path())
        .args(["download", "--source", &url, "--name", "report.csv", "--out"])
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("report.csv"));

    let saved = fs::read(out.path().join("report.csv")).unwrap();
    assert_eq!(saved, b"a,b\n1,2\n");
}
