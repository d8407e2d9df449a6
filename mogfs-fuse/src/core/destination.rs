//! The remote object a writable handle is staging writes into (§4.3 "Lazy
//! destination allocation"). `size` and `error` are updated independently
//! of the lazy-init lock that guards first allocation.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

pub struct Destination {
    pub fid: u64,
    pub devid: u32,
    pub url: String,
    size: AtomicU64,
    error: AtomicBool,
}

impl Destination {
    pub fn new(fid: u64, devid: u32, url: String) -> Self {
        Self {
            fid,
            devid,
            url,
            size: AtomicU64::new(0),
            error: AtomicBool::new(false),
        }
    }

    pub fn size(&self) -> u64 {
        self.size.load(Ordering::SeqCst)
    }

    /// `dest.size = max(dest.size, offset+len)`, performed atomically.
    pub fn bump_size(&self, at_least: u64) {
        self.size.fetch_max(at_least, Ordering::SeqCst);
    }

    pub fn set_size(&self, size: u64) {
        self.size.store(size, Ordering::SeqCst);
    }

    pub fn mark_error(&self) {
        self.error.store(true, Ordering::SeqCst);
    }

    pub fn has_error(&self) -> bool {
        self.error.load(Ordering::SeqCst)
    }
}
