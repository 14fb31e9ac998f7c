//! Common test utilities for commons-archivist E2E tests

#![allow(dead_code)]

use commons_archivist::Config;
use serde_json::{Value, json};
use std::path::Path;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// API path served by the mock
pub const API_PATH: &str = "/w/api.php";

/// Configuration pointing at `server`
pub fn mock_config(server: &MockServer) -> Config {
    Config {
        api_url: format!("{}{}", server.uri(), API_PATH),
        ..Default::default()
    }
}

/// One page entry of a `query.pages` object, with its file served by `server`
pub fn page_json(server: &MockServer, filename: &str, artist: &str, license: &str) -> Value {
    json!({
        "ns": 6,
        "title": format!("File:{filename}"),
        "imageinfo": [{
            "url": format!("{}/files/{}", server.uri(), urlencoding::encode(filename)),
            "descriptionurl": format!("https://commons.test/wiki/File:{filename}"),
            "extmetadata": {
                "Artist": {"value": artist, "source": "commons-desc-page"},
                "LicenseShortName": {"value": license, "source": "commons-desc-page"}
            }
        }]
    })
}

/// Answer every query with `pages` (id -> page), in the given order
pub async fn mount_query(server: &MockServer, pages: Vec<(&str, Value)>) {
    let pages: serde_json::Map<String, Value> = pages
        .into_iter()
        .map(|(id, page)| (id.to_string(), page))
        .collect();
    Mock::given(method("GET"))
        .and(path(API_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"query": {"pages": pages}})),
        )
        .mount(server)
        .await;
}

/// Serve `body` for `filename`
pub async fn mount_file(server: &MockServer, filename: &str, body: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/files/{}", urlencoding::encode(filename))))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(server)
        .await;
}

/// Read a file that the test expects to exist
pub fn read(path: &Path) -> Vec<u8> {
    std::fs::read(path).unwrap_or_else(|e| panic!("{} should exist: {e}", path.display()))
}
