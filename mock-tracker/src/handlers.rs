//! Tracker RPC + storage-node endpoints emulating the surface
//! `mogfs-fuse`'s `HttpTrackerClient`/`HttpTransport` expect. Grounded in
//! the teacher's `handlers.rs` (axum extractors, one function per route),
//! generalized from a generic file server to MogileFS's key/fid split:
//! a logical path resolves to a fid, and bytes live under `/storage/:fid`
//! independent of the path that currently names it.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::state::{AppState, CommittedObject};

fn not_found(errstr: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "errcode": "unknown_key", "errstr": errstr }))).into_response()
}

fn normalize_dir(path: &str) -> String {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

fn normalize_key(path: &str) -> String {
    format!("/{}", path.trim_matches('/'))
}

#[derive(Serialize)]
struct DirEntryOut {
    name: String,
    size: u64,
    modified: i64,
    is_directory: bool,
}

pub async fn list_root(State(state): State<Arc<AppState>>) -> Response {
    list_dir_impl(state, "/".to_string())
}

pub async fn list_path(State(state): State<Arc<AppState>>, Path(path): Path<String>) -> Response {
    list_dir_impl(state, normalize_dir(&path))
}

fn list_dir_impl(state: Arc<AppState>, dir: String) -> Response {
    let db = state.db.lock().unwrap();
    let mut seen = std::collections::BTreeMap::new();
    for (key, obj) in db.objects.iter() {
        let Some(rest) = key.strip_prefix(&dir) else { continue };
        if rest.is_empty() {
            continue;
        }
        match rest.split_once('/') {
            None => {
                seen.entry(rest.to_string()).or_insert(DirEntryOut {
                    name: rest.to_string(),
                    size: obj.size,
                    modified: obj.mtime,
                    is_directory: false,
                });
            }
            Some((child_dir, _)) => {
                seen.entry(child_dir.to_string()).or_insert(DirEntryOut {
                    name: child_dir.to_string(),
                    size: 0,
                    modified: 0,
                    is_directory: true,
                });
            }
        }
    }
    Json(seen.into_values().collect::<Vec<_>>()).into_response()
}

pub async fn get_paths(State(state): State<Arc<AppState>>, Path(key): Path<String>) -> Response {
    let key = normalize_key(&key);
    let db = state.db.lock().unwrap();
    match db.objects.get(&key) {
        Some(obj) => Json(vec![format!("http://{}/storage/{}", state.self_addr, obj.fid)]).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

#[derive(Deserialize)]
pub struct FileInfoQuery {
    #[serde(default)]
    #[allow(dead_code)]
    pub devices: u8,
}

#[derive(Serialize)]
struct FileInfoOut {
    size: u64,
    class: Option<String>,
    checksum: Option<String>,
}

pub async fn file_info(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Query(_q): Query<FileInfoQuery>,
) -> Response {
    let key = normalize_key(&key);
    let db = state.db.lock().unwrap();
    match db.objects.get(&key) {
        Some(obj) => Json(FileInfoOut {
            size: obj.size,
            class: obj.class.clone(),
            checksum: obj.checksum.clone(),
        })
        .into_response(),
        None => not_found(&format!("no such key {key}")),
    }
}

#[derive(Deserialize)]
pub struct CreateOpenReq {
    #[allow(dead_code)]
    pub domain: String,
    pub class: Option<String>,
    #[allow(dead_code)]
    pub key: String,
}

#[derive(Serialize)]
struct CreateOpenOut {
    fid: u64,
    devid: u32,
    url: String,
}

pub async fn create_open(State(state): State<Arc<AppState>>, Json(req): Json<CreateOpenReq>) -> Response {
    let fid = state.alloc_fid();
    {
        let mut db = state.db.lock().unwrap();
        db.blobs.insert(fid, Vec::new());
    }
    let _ = req.class;
    Json(CreateOpenOut {
        fid,
        devid: 1,
        url: format!("http://{}/storage/{}", state.self_addr, fid),
    })
    .into_response()
}

#[derive(Deserialize)]
pub struct CreateCloseReq {
    pub fid: u64,
    #[allow(dead_code)]
    pub devid: u32,
    #[allow(dead_code)]
    pub domain: String,
    pub key: String,
    #[allow(dead_code)]
    pub path: String,
    pub size: u64,
    #[serde(rename = "plugin.meta.value0")]
    pub mtime: i64,
    #[serde(default)]
    pub checksum: Option<String>,
}

pub async fn create_close(State(state): State<Arc<AppState>>, Json(req): Json<CreateCloseReq>) -> Response {
    let mut db = state.db.lock().unwrap();
    if req.key.is_empty() {
        db.blobs.remove(&req.fid);
        return StatusCode::OK.into_response();
    }
    let class = db.objects.get(&req.key).and_then(|o| o.class.clone());
    db.objects.insert(
        req.key,
        CommittedObject {
            fid: req.fid,
            size: req.size,
            mtime: req.mtime,
            class,
            checksum: req.checksum,
        },
    );
    StatusCode::OK.into_response()
}

pub async fn delete_key(State(state): State<Arc<AppState>>, Path(key): Path<String>) -> Response {
    let key = normalize_key(&key);
    let mut db = state.db.lock().unwrap();
    match db.objects.remove(&key) {
        Some(obj) => {
            db.blobs.remove(&obj.fid);
            StatusCode::OK.into_response()
        }
        None => not_found(&format!("no such key {key}")),
    }
}

#[derive(Deserialize)]
pub struct RenameReq {
    pub old: String,
    pub new: String,
}

pub async fn rename(State(state): State<Arc<AppState>>, Json(req): Json<RenameReq>) -> Response {
    let mut db = state.db.lock().unwrap();
    match db.objects.remove(&req.old) {
        Some(obj) => {
            db.objects.insert(req.new, obj);
            StatusCode::OK.into_response()
        }
        None => not_found(&format!("no such key {}", req.old)),
    }
}

#[derive(Deserialize)]
pub struct UpdateClassReq {
    pub key: String,
    pub class: String,
}

pub async fn update_class(State(state): State<Arc<AppState>>, Json(req): Json<UpdateClassReq>) -> Response {
    let mut db = state.db.lock().unwrap();
    match db.objects.get_mut(&req.key) {
        Some(obj) => {
            obj.class = Some(req.class);
            StatusCode::OK.into_response()
        }
        None => not_found(&format!("no such key {}", req.key)),
    }
}

#[derive(Serialize)]
struct DeviceOut {
    devid: u32,
    status: String,
    observed_state: String,
    mb_free: u64,
    mb_total: u64,
}

pub async fn devices() -> Response {
    Json(vec![DeviceOut {
        devid: 1,
        status: "alive".to_string(),
        observed_state: "writeable".to_string(),
        mb_free: 100_000,
        mb_total: 200_000,
    }])
    .into_response()
}

fn parse_range(header: &str, total: u64) -> Option<(u64, u64)> {
    let spec = header.strip_prefix("bytes=")?;
    let (start, end) = spec.split_once('-')?;
    let start: u64 = start.parse().ok()?;
    let end: u64 = if end.is_empty() {
        total.saturating_sub(1)
    } else {
        end.parse().ok()?
    };
    Some((start, end))
}

pub async fn storage_get(State(state): State<Arc<AppState>>, Path(fid): Path<u64>, headers: HeaderMap) -> Response {
    let db = state.db.lock().unwrap();
    let Some(blob) = db.blobs.get(&fid) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let total = blob.len() as u64;
    let Some(range_header) = headers.get(axum::http::header::RANGE).and_then(|v| v.to_str().ok()) else {
        return (StatusCode::OK, Bytes::copy_from_slice(blob)).into_response();
    };
    match parse_range(range_header, total) {
        Some((start, end)) if start < total => {
            let end = end.min(total.saturating_sub(1));
            let slice = &blob[start as usize..=(end as usize)];
            (StatusCode::PARTIAL_CONTENT, Bytes::copy_from_slice(slice)).into_response()
        }
        _ => StatusCode::RANGE_NOT_SATISFIABLE.into_response(),
    }
}

fn parse_content_range(header: &str) -> Option<u64> {
    let spec = header.strip_prefix("bytes ")?;
    let (range, _) = spec.split_once('/')?;
    let (start, _) = range.split_once('-')?;
    start.parse().ok()
}

pub async fn storage_put(
    State(state): State<Arc<AppState>>,
    Path(fid): Path<u64>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut db = state.db.lock().unwrap();
    let blob = db.blobs.entry(fid).or_default();
    let offset = headers
        .get(axum::http::header::CONTENT_RANGE)
        .and_then(|v| v.to_str().ok())
        .and_then(parse_content_range);

    match offset {
        None => {
            blob.clear();
            blob.extend_from_slice(&body);
        }
        Some(offset) => {
            let end = offset as usize + body.len();
            if end > blob.len() {
                blob.resize(end, 0);
            }
            blob[offset as usize..end].copy_from_slice(&body);
        }
    }
    StatusCode::OK.into_response()
}
