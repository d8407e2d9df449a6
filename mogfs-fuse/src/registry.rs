//! Per-mount registry of live file handles (§4.7), guarded by a single
//! registry lock held only across lookup/insert/remove.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::core::FileHandle;

pub struct HandleRegistry {
    next_id: AtomicU64,
    handles: Mutex<HashMap<u64, Arc<FileHandle>>>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            handles: Mutex::new(HashMap::new()),
        }
    }

    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    pub fn insert(&self, handle: Arc<FileHandle>) {
        self.handles.lock().unwrap().insert(handle.id, handle);
    }

    pub fn get(&self, id: u64) -> Option<Arc<FileHandle>> {
        self.handles.lock().unwrap().get(&id).cloned()
    }

    pub fn remove(&self, id: u64) -> Option<Arc<FileHandle>> {
        self.handles.lock().unwrap().remove(&id)
    }

    /// All still-registered handles, for best-effort release at unmount.
    pub fn drain(&self) -> Vec<Arc<FileHandle>> {
        self.handles.lock().unwrap().drain().map(|(_, h)| h).collect()
    }
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new()
    }
}
