//! The `Mount`: owns config, the handle registry, the directory cache,
//! and the inode table, and dispatches work onto each worker thread's
//! thread-local tracker client / HTTP transport / runtime (§4.7, §5).
//!
//! Grounded in the teacher's `fs/mod.rs` `RemoteFS` (one struct holding
//! every cache plus a `tokio::runtime::Runtime` for `block_on`), split
//! here into a shared `Mount` plus per-thread [`WorkerResources`] because
//! the tracker client and HTTP agent are not safely shareable across
//! threads in this design (§9 design notes).

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::config::Config;
use crate::dircache::DirCache;
use crate::registry::HandleRegistry;
use crate::transport::HttpTransport;
use crate::tracker::{FilePathsTrackerClient, HttpTrackerClient, TrackerClient};

pub const ROOT_INODE: u64 = 1;

struct InodeTable {
    path_to_ino: HashMap<String, u64>,
    ino_to_path: HashMap<u64, String>,
    next_ino: u64,
}

impl InodeTable {
    fn new() -> Self {
        let mut t = Self {
            path_to_ino: HashMap::new(),
            ino_to_path: HashMap::new(),
            next_ino: ROOT_INODE + 1,
        };
        t.path_to_ino.insert("/".to_string(), ROOT_INODE);
        t.ino_to_path.insert(ROOT_INODE, "/".to_string());
        t
    }

    fn ino_for_path(&mut self, path: &str) -> u64 {
        if let Some(ino) = self.path_to_ino.get(path) {
            return *ino;
        }
        let ino = self.next_ino;
        self.next_ino += 1;
        self.path_to_ino.insert(path.to_string(), ino);
        self.ino_to_path.insert(ino, path.to_string());
        ino
    }

    fn path_for_ino(&self, ino: u64) -> Option<String> {
        self.ino_to_path.get(&ino).cloned()
    }

    fn rename(&mut self, old: &str, new: &str) {
        if let Some(ino) = self.path_to_ino.remove(old) {
            self.path_to_ino.insert(new.to_string(), ino);
            self.ino_to_path.insert(ino, new.to_string());
        }
    }

    fn forget(&mut self, path: &str) {
        if let Some(ino) = self.path_to_ino.remove(path) {
            self.ino_to_path.remove(&ino);
        }
    }
}

pub struct Mount {
    pub id: u64,
    pub config: Config,
    pub registry: HandleRegistry,
    pub dircache: DirCache,
    inodes: Mutex<InodeTable>,
    mounted: AtomicBool,
    /// Path -> id of its most recently opened writable handle, so `getattr`
    /// can synthesize size from live handle state (the "fgetattr" case in
    /// §4.7) without the kernel passing an `fh` through `getattr` itself.
    open_by_path: Mutex<HashMap<String, u64>>,
}

static NEXT_MOUNT_ID: AtomicU64 = AtomicU64::new(1);

impl Mount {
    pub fn new(config: Config) -> Self {
        let dircache = DirCache::new(Duration::from_secs(config.dircache_duration_secs), config.dircache);
        Self {
            id: NEXT_MOUNT_ID.fetch_add(1, Ordering::SeqCst),
            config,
            registry: HandleRegistry::new(),
            dircache,
            inodes: Mutex::new(InodeTable::new()),
            mounted: AtomicBool::new(false),
            open_by_path: Mutex::new(HashMap::new()),
        }
    }

    pub fn register_open_path(&self, path: &str, id: u64) {
        self.open_by_path.lock().unwrap().insert(path.to_string(), id);
    }

    pub fn forget_open_path(&self, path: &str, id: u64) {
        let mut guard = self.open_by_path.lock().unwrap();
        if guard.get(path) == Some(&id) {
            guard.remove(path);
        }
    }

    pub fn open_handle_for_path(&self, path: &str) -> Option<u64> {
        self.open_by_path.lock().unwrap().get(path).copied()
    }

    /// Enforces "mounted once" (§3 Mount lifecycle).
    pub fn mark_mounted(&self) -> bool {
        self.mounted.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).is_ok()
    }

    pub fn ino_for_path(&self, path: &str) -> u64 {
        self.inodes.lock().unwrap().ino_for_path(path)
    }

    pub fn path_for_ino(&self, ino: u64) -> Option<String> {
        self.inodes.lock().unwrap().path_for_ino(ino)
    }

    pub fn rename_inode(&self, old: &str, new: &str) {
        self.inodes.lock().unwrap().rename(old, new);
    }

    pub fn forget_inode(&self, path: &str) {
        self.inodes.lock().unwrap().forget(path);
    }

    /// Runs `f` to build a future against this thread's tracker client and
    /// HTTP transport, then drives it to completion on this thread's
    /// runtime. Safe to call from any dispatcher callback.
    pub fn dispatch<F, Fut, R>(&self, f: F) -> R
    where
        F: FnOnce(&dyn TrackerClient, &HttpTransport) -> Fut,
        Fut: Future<Output = R>,
    {
        with_worker(self, |resources| {
            let fut = f(resources.tracker.as_ref(), &resources.transport);
            resources.runtime.block_on(fut)
        })
    }
}

struct WorkerResources {
    runtime: tokio::runtime::Runtime,
    tracker: Box<dyn TrackerClient>,
    transport: HttpTransport,
}

thread_local! {
    static WORKER: RefCell<Option<(u64, Rc<WorkerResources>)>> = RefCell::new(None);
}

fn with_worker<R>(mount: &Mount, f: impl FnOnce(&WorkerResources) -> R) -> R {
    WORKER.with(|cell| {
        let mut slot = cell.borrow_mut();
        let stale = !matches!(&*slot, Some((id, _)) if *id == mount.id);
        if stale {
            *slot = Some((mount.id, Rc::new(build_worker_resources(&mount.config))));
        }
        let resources = slot.as_ref().map(|(_, r)| Rc::clone(r)).unwrap();
        drop(slot);
        f(&resources)
    })
}

fn build_worker_resources(config: &Config) -> WorkerResources {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build per-worker tokio runtime");
    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .expect("transport client config is static and always valid");
    let base_url = format!("http://{}", pick_tracker(config));
    let tracker: Box<dyn TrackerClient> =
        Box::new(FilePathsTrackerClient::new(HttpTrackerClient::new(http_client, base_url)));
    WorkerResources {
        runtime,
        tracker,
        transport: HttpTransport::new(),
    }
}

fn pick_tracker(config: &Config) -> String {
    use std::sync::atomic::AtomicUsize;
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let idx = COUNTER.fetch_add(1, Ordering::Relaxed) % config.trackers.len().max(1);
    config.trackers.get(idx).cloned().unwrap_or_default()
}
