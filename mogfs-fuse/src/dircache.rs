//! TTL directory-listing cache (§4.6). Grounded in the teacher's
//! `fs/cache.rs` `AttributeCache` (an `lru::LruCache` wrapped with
//! expiry bookkeeping); generalized here from per-inode attributes to
//! per-directory listings, keyed by the tracker's own `DirEntry` shape.

use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::error::FsResult;
use crate::path::{normalize_dir, parent_dir};
use crate::tracker::{DirEntry, TrackerClient};

struct Entry {
    expires_at: Instant,
    files: HashMap<String, DirEntry>,
}

pub struct DirCache {
    entries: Mutex<LruCache<String, Entry>>,
    ttl: Duration,
    enabled: bool,
}

impl DirCache {
    pub fn new(ttl: Duration, enabled: bool) -> Self {
        let capacity = NonZeroUsize::new(4096).unwrap();
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            enabled,
        }
    }

    /// Cached listing for `dir`, refreshing via `tracker.list` on a miss
    /// or an expired entry.
    pub async fn list(&self, dir: &str, tracker: &dyn TrackerClient) -> FsResult<Vec<DirEntry>> {
        let key = normalize_dir(dir);
        if self.enabled {
            if let Some(files) = self.get_fresh(&key) {
                return Ok(files.into_values().collect());
            }
        }
        let entries = tracker.list(dir).await?;
        if self.enabled {
            let files = entries.iter().cloned().map(|e| (e.name.clone(), e)).collect();
            self.entries.lock().unwrap().put(
                key,
                Entry {
                    expires_at: Instant::now() + self.ttl,
                    files,
                },
            );
        }
        Ok(entries)
    }

    fn get_fresh(&self, key: &str) -> Option<HashMap<String, DirEntry>> {
        let mut guard = self.entries.lock().unwrap();
        match guard.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.files.clone()),
            Some(_) => {
                guard.pop(key);
                None
            }
            None => None,
        }
    }

    /// Flushes `dir`'s entry and recursively flushes its parent, per any
    /// mutating operation touching `dir` (`create`, `unlink`, `rename`, …).
    pub fn invalidate(&self, dir: &str) {
        let mut guard = self.entries.lock().unwrap();
        guard.pop(&normalize_dir(dir));
        let parent = parent_dir(dir);
        guard.pop(&parent);
        drop(guard);
        if parent != "/" {
            self.invalidate(&parent);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::{CreateCloseArgs, CreateOpen, DeviceInfo, FileInfo};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingTracker {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl TrackerClient for CountingTracker {
        async fn list(&self, _dir: &str) -> FsResult<Vec<DirEntry>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![DirEntry {
                name: "f".into(),
                size: 1,
                modified: 0,
                is_directory: false,
            }])
        }
        async fn get_paths(&self, _key: &str) -> FsResult<Vec<String>> {
            Ok(vec![])
        }
        async fn file_info(&self, _key: &str, _devices: bool) -> FsResult<FileInfo> {
            unimplemented!()
        }
        async fn create_open(&self, _domain: &str, _class: Option<&str>, _key: &str) -> FsResult<CreateOpen> {
            unimplemented!()
        }
        async fn create_close(&self, _args: CreateCloseArgs<'_>) -> FsResult<()> {
            unimplemented!()
        }
        async fn delete(&self, _key: &str) -> FsResult<()> {
            unimplemented!()
        }
        async fn rename(&self, _old_key: &str, _new_key: &str) -> FsResult<()> {
            unimplemented!()
        }
        async fn update_class(&self, _key: &str, _class: &str) -> FsResult<()> {
            unimplemented!()
        }
        async fn get_devices(&self) -> FsResult<Vec<DeviceInfo>> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn hit_avoids_second_tracker_call() {
        let tracker = CountingTracker { calls: AtomicUsize::new(0) };
        let cache = DirCache::new(Duration::from_secs(2), true);
        cache.list("/x", &tracker).await.unwrap();
        cache.list("/x", &tracker).await.unwrap();
        assert_eq!(tracker.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let tracker = CountingTracker { calls: AtomicUsize::new(0) };
        let cache = DirCache::new(Duration::from_secs(2), true);
        cache.list("/x", &tracker).await.unwrap();
        cache.invalidate("/x");
        cache.list("/x", &tracker).await.unwrap();
        assert_eq!(tracker.calls.load(Ordering::SeqCst), 2);
    }
}
