//! Exercises the tracker RPC + storage-node surface against an in-process
//! server, one random port per test, rather than the teacher's
//! `server/tests/endpoints.rs` pattern of hitting an already-running
//! `127.0.0.1:8080`.

use std::net::SocketAddr;
use std::sync::Arc;

use reqwest::{Client, StatusCode};
use serde_json::json;

use mock_tracker::{build_router, AppState};

async fn spawn() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let base = format!("http://{addr}");
    let state = Arc::new(AppState::new(addr.to_string()));
    let app = build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    base
}

#[tokio::test]
async fn health_ok() {
    let base = spawn().await;
    let resp = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn list_root_is_empty_initially() {
    let base = spawn().await;
    let resp = reqwest::get(format!("{base}/list")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Vec<serde_json::Value> = resp.json().await.unwrap();
    assert!(body.is_empty());
}

#[tokio::test]
async fn create_write_and_read_a_file() {
    let base = spawn().await;
    let client = Client::new();

    let open: serde_json::Value = client
        .post(format!("{base}/create_open"))
        .json(&json!({ "domain": "d", "class": "default", "key": "/a/b.txt" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let fid = open["fid"].as_u64().unwrap();
    let url = open["url"].as_str().unwrap();
    assert!(url.ends_with(&format!("/storage/{fid}")));

    let put_resp = client.put(url).body("hello world").send().await.unwrap();
    assert_eq!(put_resp.status(), StatusCode::OK);

    let close_resp = client
        .post(format!("{base}/create_close"))
        .json(&json!({
            "fid": fid,
            "devid": 1,
            "domain": "d",
            "key": "/a/b.txt",
            "path": url,
            "size": 11,
            "plugin.meta.value0": 1_700_000_000i64,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(close_resp.status(), StatusCode::OK);

    let paths: Vec<String> = client
        .get(format!("{base}/paths/a/b.txt"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(paths, vec![url.to_string()]);

    let get_resp = client.get(&paths[0]).send().await.unwrap();
    assert_eq!(get_resp.status(), StatusCode::OK);
    assert_eq!(get_resp.text().await.unwrap(), "hello world");

    let listing: Vec<serde_json::Value> = client
        .get(format!("{base}/list/a"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listing.len(), 1);
    assert_eq!(listing[0]["name"], "b.txt");
}

#[tokio::test]
async fn ranged_get_past_end_is_range_not_satisfiable() {
    let base = spawn().await;
    let client = Client::new();

    let open: serde_json::Value = client
        .post(format!("{base}/create_open"))
        .json(&json!({ "domain": "d", "class": "default", "key": "/c.txt" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let url = open["url"].as_str().unwrap().to_string();
    client.put(&url).body("abc").send().await.unwrap();

    let resp = client
        .get(&url)
        .header("Range", "bytes=10-20")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
}

#[tokio::test]
async fn delete_and_rename_roundtrip() {
    let base = spawn().await;
    let client = Client::new();

    let open: serde_json::Value = client
        .post(format!("{base}/create_open"))
        .json(&json!({ "domain": "d", "class": "default", "key": "/x.txt" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let fid = open["fid"].as_u64().unwrap();
    client.put(open["url"].as_str().unwrap()).body("x").send().await.unwrap();
    client
        .post(format!("{base}/create_close"))
        .json(&json!({
            "fid": fid, "devid": 1, "domain": "d", "key": "/x.txt",
            "path": "", "size": 1, "plugin.meta.value0": 1i64,
        }))
        .send()
        .await
        .unwrap();

    let rename_resp = client
        .post(format!("{base}/rename"))
        .json(&json!({ "old": "/x.txt", "new": "/y.txt" }))
        .send()
        .await
        .unwrap();
    assert_eq!(rename_resp.status(), StatusCode::OK);

    let missing = client.get(format!("{base}/file_info/x.txt")).send().await.unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let present: serde_json::Value = client
        .get(format!("{base}/file_info/y.txt"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(present["size"], 1);

    let delete_resp = client.delete(format!("{base}/key/y.txt")).send().await.unwrap();
    assert_eq!(delete_resp.status(), StatusCode::OK);

    let delete_again = client.delete(format!("{base}/key/y.txt")).send().await.unwrap();
    assert_eq!(delete_again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn devices_reports_one_writeable_device() {
    let base = spawn().await;
    let devices: Vec<serde_json::Value> = reqwest::get(format!("{base}/devices"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0]["status"], "alive");
    assert_eq!(devices[0]["observed_state"], "writeable");
}
