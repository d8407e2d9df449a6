//! Decorator that guarantees `list()` entries carry full metadata, per the
//! "FilePaths" tracker plugin in the glossary. Some trackers only return
//! bare names for `list`; this wrapper backfills size/mtime/kind with a
//! `file_info` call per bare entry so callers above never see a partial
//! `DirEntry`.

use async_trait::async_trait;

use super::{CreateCloseArgs, CreateOpen, DeviceInfo, DirEntry, FileInfo, TrackerClient};
use crate::error::FsResult;

pub struct FilePathsTrackerClient<T: TrackerClient> {
    inner: T,
}

impl<T: TrackerClient> FilePathsTrackerClient<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    fn is_bare(entry: &DirEntry) -> bool {
        !entry.is_directory && entry.size == 0 && entry.modified == 0
    }

    async fn backfill(&self, dir: &str, entry: DirEntry) -> DirEntry {
        if !Self::is_bare(&entry) {
            return entry;
        }
        let key = format!("{}/{}", dir.trim_end_matches('/'), entry.name);
        match self.inner.file_info(&key, false).await {
            Ok(info) => DirEntry {
                name: entry.name,
                size: info.size,
                modified: entry.modified,
                is_directory: entry.is_directory,
            },
            Err(_) => entry,
        }
    }
}

#[async_trait]
impl<T: TrackerClient> TrackerClient for FilePathsTrackerClient<T> {
    async fn list(&self, dir: &str) -> FsResult<Vec<DirEntry>> {
        let entries = self.inner.list(dir).await?;
        let mut out = Vec::with_capacity(entries.len());
        for entry in entries {
            out.push(self.backfill(dir, entry).await);
        }
        Ok(out)
    }

    async fn get_paths(&self, key: &str) -> FsResult<Vec<String>> {
        self.inner.get_paths(key).await
    }

    async fn file_info(&self, key: &str, devices: bool) -> FsResult<FileInfo> {
        self.inner.file_info(key, devices).await
    }

    async fn create_open(&self, domain: &str, class: Option<&str>, key: &str) -> FsResult<CreateOpen> {
        self.inner.create_open(domain, class, key).await
    }

    async fn create_close(&self, args: CreateCloseArgs<'_>) -> FsResult<()> {
        self.inner.create_close(args).await
    }

    async fn delete(&self, key: &str) -> FsResult<()> {
        self.inner.delete(key).await
    }

    async fn rename(&self, old_key: &str, new_key: &str) -> FsResult<()> {
        self.inner.rename(old_key, new_key).await
    }

    async fn update_class(&self, key: &str, class: &str) -> FsResult<()> {
        self.inner.update_class(key, class).await
    }

    async fn get_devices(&self) -> FsResult<Vec<DeviceInfo>> {
        self.inner.get_devices().await
    }
}
