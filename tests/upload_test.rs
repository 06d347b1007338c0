//! Integration tests for the upload route: classification, duplicate
//! suppression, and staging cleanup.

mod common;

use common::TestHarness;
use reqwest::multipart::{Form, Part};
use serde_json::json;

fn media_form(file_name: &str, mime: &str, data: Vec<u8>) -> Form {
    Form::new().part(
        "file",
        Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .unwrap(),
    )
}

fn visible_files(dir: &std::path::Path) -> Vec<String> {
    if !dir.exists() {
        return Vec::new();
    }
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|n| !n.starts_with('.'))
        .collect()
}

#[tokio::test]
async fn upload_classifies_and_stores() {
    let (h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/api/upload"))
        .multipart(media_form(
            "The Great Adventure (2023) 1080p x264.mp4",
            "video/mp4",
            b"movie bytes".to_vec(),
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    let entry: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(entry["category"], "movie");
    assert_eq!(entry["origin"], "upload");
    assert_eq!(entry["size_bytes"], b"movie bytes".len());
    assert_eq!(entry["extracted_metadata"]["year"], 2023);
    assert_eq!(entry["extracted_metadata"]["quality_tier"], "1080p");
    assert_eq!(entry["extracted_metadata"]["codec"], "H.264");
    assert!(entry["content_hash"].is_string());

    // Exactly one durable file, no staging leftovers.
    let files = visible_files(&h.media_dir());
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with(".mp4"));
}

#[tokio::test]
async fn duplicate_content_is_rejected_regardless_of_name() {
    let (h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();

    let data = b"identical content".to_vec();

    let first = client
        .post(format!("http://{addr}/api/upload"))
        .multipart(media_form("First Name.mp4", "video/mp4", data.clone()))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 201);

    let second = client
        .post(format!("http://{addr}/api/upload"))
        .multipart(media_form("Totally Different.mkv", "video/x-matroska", data))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 409);
    let body: serde_json::Value = second.json().await.unwrap();
    assert_eq!(body["code"], "duplicate_content");

    // The rejection left no orphaned file behind.
    assert_eq!(visible_files(&h.media_dir()).len(), 1);

    // And no second catalog row.
    let list: serde_json::Value = client
        .get(format!("http://{addr}/api/entries"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list["total_count"], 1);
}

#[tokio::test]
async fn unsupported_extension_is_rejected() {
    let (h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("http://{addr}/api/upload"))
        .multipart(media_form(
            "malware.exe",
            "application/octet-stream",
            b"nope".to_vec(),
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 415);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "unsupported_format");

    assert!(visible_files(&h.media_dir()).is_empty());
}

#[tokio::test]
async fn uploaded_tv_episode_carries_series_info() {
    let (_h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();

    let entry: serde_json::Value = client
        .post(format!("http://{addr}/api/upload"))
        .multipart(media_form(
            "Amazing Series S01E02 1080p x264.mkv",
            "video/x-matroska",
            b"episode bytes".to_vec(),
        ))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(entry["category"], "tv_episode");
    assert_eq!(entry["series_info"]["series_key"], "amazing series_s01");
    assert_eq!(entry["series_info"]["season"], 1);
    assert_eq!(entry["series_info"]["episode"], 2);
}

#[tokio::test]
async fn backfilled_scan_hash_blocks_matching_upload() {
    let (h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();

    // Catalog a file via scan and backfill its content hash.
    let root = h.scratch_dir().join("library");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join("original.mp4"), b"shared bytes").unwrap();
    client
        .post(format!("http://{addr}/api/scan"))
        .json(&json!({"root": root.to_str().unwrap(), "backfill_hashes": true}))
        .send()
        .await
        .unwrap();

    // Uploading the same bytes is now a duplicate across ingest routes.
    let resp = client
        .post(format!("http://{addr}/api/upload"))
        .multipart(media_form("renamed.mp4", "video/mp4", b"shared bytes".to_vec()))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "duplicate_content");
}

#[tokio::test]
async fn uploaded_file_streams_back() {
    let (_h, addr) = TestHarness::with_server().await;
    let client = reqwest::Client::new();

    let data: Vec<u8> = (0..=255u8).cycle().take(1000).collect();
    let entry: serde_json::Value = client
        .post(format!("http://{addr}/api/upload"))
        .multipart(media_form("roundtrip.mp4", "video/mp4", data.clone()))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = entry["id"].as_str().unwrap();

    let resp = client
        .get(format!("http://{addr}/api/entries/{id}/stream"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.bytes().await.unwrap().as_ref(), data.as_slice());
}
