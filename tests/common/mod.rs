// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use sotapics::config::Config;
use sotapics::AppState;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Region listing for EA3/GI as served by the SOTA API.
#[allow(dead_code)]
pub fn gi_region_body() -> serde_json::Value {
    serde_json::json!({
        "region": { "associationCode": "EA3", "regionCode": "GI" },
        "summits": [
            { "summitCode": "EA3/GI-002", "name": "Pic de Pales", "altM": 1134, "points": 6 },
            { "summitCode": "EA3/GI-003", "name": "Puigsacalm", "altM": 1515, "points": 8 },
            { "summitCode": "ea3/gi-010", "name": "Montsolis", "altM": null }
        ]
    })
}

/// Mount the EA3/GI region, answered `times` times (wiremock verifies on drop).
#[allow(dead_code)]
pub async fn mount_gi_region(server: &MockServer, times: u64) {
    Mock::given(method("GET"))
        .and(path("/api/regions/EA3/GI"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gi_region_body()))
        .expect(times)
        .mount(server)
        .await;
}

/// Configuration with all state under `dir` and the SOTA API at `server`.
#[allow(dead_code)]
pub fn test_config(dir: &Path, server: &MockServer) -> Config {
    Config {
        data_dir: dir.join("data"),
        state_dir: dir.join("state"),
        sota_api_url: format!("{}/api", server.uri()),
        sota_timeout: Duration::from_millis(500),
        ..Config::default()
    }
}

/// Fully wired state over a temp dir and a mock SOTA API.
#[allow(dead_code)]
pub async fn create_test_state(dir: &Path, server: &MockServer) -> AppState {
    AppState::open(test_config(dir, server))
        .await
        .expect("Failed to open test state")
}

/// A small solid-color JPEG.
#[allow(dead_code)]
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb([30, 90, 160]));
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut out, ImageFormat::Jpeg)
        .expect("Failed to encode test JPEG");
    out.into_inner()
}

/// Contact log with one row per station.
#[allow(dead_code)]
pub fn contact_log(stations: &[&str]) -> String {
    let mut log = String::from("TO STATION,DATE,FREQ,MODE,RST\n");
    for station in stations {
        log.push_str(&format!("{},2025-06-01,14.285,SSB,59\n", station));
    }
    log
}
