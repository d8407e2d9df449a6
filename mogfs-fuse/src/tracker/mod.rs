//! Tracker client adapter (§4.1).
//!
//! Thin typed wrapper around the tracker RPC verbs the core consumes. Two
//! backends exist: [`HttpTrackerClient`], the default JSON-over-HTTP
//! backend, and [`FilePathsTrackerClient`], a decorator that guarantees
//! every [`DirEntry`] it returns carries full metadata (the "FilePaths"
//! tracker extension from the glossary), falling back to `file_info` for
//! any entry a wrapped backend left bare.

mod file_paths;
mod http_tracker;

pub use file_paths::FilePathsTrackerClient;
pub use http_tracker::HttpTrackerClient;

use crate::error::FsResult;
use async_trait::async_trait;
use serde::Deserialize;

/// A single entry as returned by `list(dir)`, matching the FilePaths
/// extension's `{name, size, modified, is_directory}` shape.
#[derive(Debug, Clone, Deserialize)]
pub struct DirEntry {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modified: i64,
    #[serde(default)]
    pub is_directory: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FileInfo {
    pub size: u64,
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub checksum: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateOpen {
    pub fid: u64,
    pub devid: u32,
    pub url: String,
}

/// Arguments for `create_close`; `key` empty asks the tracker to discard
/// the temporary object (§4.3 Flush, §7 sticky-error commit).
pub struct CreateCloseArgs<'a> {
    pub fid: u64,
    pub devid: u32,
    pub domain: &'a str,
    pub key: &'a str,
    pub path: &'a str,
    pub size: u64,
    pub mtime: i64,
    pub checksum: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceInfo {
    pub devid: u32,
    pub status: String,
    pub observed_state: String,
    pub mb_free: u64,
    pub mb_total: u64,
}

#[async_trait]
pub trait TrackerClient: Send + Sync {
    async fn list(&self, dir: &str) -> FsResult<Vec<DirEntry>>;
    async fn get_paths(&self, key: &str) -> FsResult<Vec<String>>;
    async fn file_info(&self, key: &str, devices: bool) -> FsResult<FileInfo>;
    async fn create_open(&self, domain: &str, class: Option<&str>, key: &str) -> FsResult<CreateOpen>;
    async fn create_close(&self, args: CreateCloseArgs<'_>) -> FsResult<()>;
    async fn delete(&self, key: &str) -> FsResult<()>;
    async fn rename(&self, old_key: &str, new_key: &str) -> FsResult<()>;
    async fn update_class(&self, key: &str, class: &str) -> FsResult<()>;
    async fn get_devices(&self) -> FsResult<Vec<DeviceInfo>>;
}
