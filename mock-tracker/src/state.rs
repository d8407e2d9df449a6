//! In-memory tracker + storage-node state backing the mock endpoints.
//! Grounded in the teacher's `handlers.rs`, which kept a real `data/`
//! directory on disk; here the filesystem is replaced with two maps
//! since the fixture never needs to survive a process restart.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

#[derive(Clone)]
pub struct CommittedObject {
    pub fid: u64,
    pub size: u64,
    pub mtime: i64,
    pub class: Option<String>,
    pub checksum: Option<String>,
}

#[derive(Default)]
pub struct TrackerDb {
    /// Logical path -> committed object metadata.
    pub objects: HashMap<String, CommittedObject>,
    /// fid -> raw bytes, for both pending (uncommitted) and committed
    /// objects; a `create_open` reserves a fid here before `create_close`
    /// ever associates it with a path.
    pub blobs: HashMap<u64, Vec<u8>>,
}

pub struct AppState {
    pub db: Mutex<TrackerDb>,
    pub next_fid: AtomicU64,
    /// `host:port` this server is bound to, used to build absolute
    /// storage-node URLs for `create_open`/`get_paths` responses.
    pub self_addr: String,
}

impl AppState {
    pub fn new(self_addr: String) -> Self {
        Self {
            db: Mutex::new(TrackerDb::default()),
            next_fid: AtomicU64::new(1),
            self_addr,
        }
    }

    pub fn alloc_fid(&self) -> u64 {
        self.next_fid.fetch_add(1, Ordering::SeqCst)
    }
}
