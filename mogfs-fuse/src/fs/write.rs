//! `write`, `flush`, `release`, `fsync` (§4.3, §4.7). Grounded in the
//! teacher's `fs/write.rs`, generalized from a whole-buffer-then-PUT
//! strategy to the core [`FileHandle`]'s COW + write-buffer pipeline.
//!
//! The kernel's `flush` callback (can fire many times per descriptor,
//! e.g. once per `dup`'d fd on `close`) is distinct from the commit that
//! happens in this module's `release`: per §4.3.1 the object is only
//! promoted to the tracker once, when the last reference closes.

use super::prelude::*;
use crate::path;

pub fn write(mount: &Mount, _req: &Request<'_>, _ino: u64, fh: u64, offset: i64, data: &[u8], _write_flags: u32, _flags: i32, _lock_owner: Option<u64>, reply: ReplyWrite) {
    let Some(handle) = mount.registry.get(fh) else {
        reply.error(libc::EBADF);
        return;
    };
    if !handle.writable {
        reply.error(EACCES);
        return;
    }
    let offset = offset.max(0) as u64;
    let buf = Bytes::copy_from_slice(data);
    let result = mount.dispatch(move |tracker, transport| async move { handle.write(buf, offset, tracker, transport).await });
    match result {
        Ok(n) => reply.written(n as u32),
        Err(e) => reply.error(errno_for(&e)),
    }
}

/// FUSE `flush`: per §4.3.1 this is a fence for buffered writes, not a
/// commit. Drains the write buffer so a concurrent reader on the same
/// handle sees up-to-date bytes; the tracker commit happens on `release`.
pub fn flush(mount: &Mount, _req: &Request<'_>, _ino: u64, fh: u64, _lock_owner: u64, reply: ReplyEmpty) {
    let Some(handle) = mount.registry.get(fh) else {
        reply.error(libc::EBADF);
        return;
    };
    let result = mount.dispatch(move |tracker, transport| async move { handle.drain_buffer(tracker, transport).await });
    match result {
        Ok(()) => reply.ok(),
        Err(e) => reply.error(errno_for(&e)),
    }
}

pub fn fsync(mount: &Mount, _req: &Request<'_>, _ino: u64, fh: u64, _datasync: bool, reply: ReplyEmpty) {
    let Some(handle) = mount.registry.get(fh) else {
        reply.error(libc::EBADF);
        return;
    };
    let result = mount.dispatch(move |tracker, transport| async move { handle.drain_buffer(tracker, transport).await });
    match result {
        Ok(()) => reply.ok(),
        Err(e) => reply.error(errno_for(&e)),
    }
}

pub fn release(mount: &Mount, _req: &Request<'_>, _ino: u64, fh: u64, _flags: i32, _lock_owner: Option<u64>, _flush: bool, reply: ReplyEmpty) {
    let Some(handle) = mount.registry.remove(fh) else {
        reply.ok();
        return;
    };

    let path = handle.path.clone();
    mount.forget_open_path(&path, fh);

    if handle.writable {
        let result = mount.dispatch(move |tracker, transport| async move { handle.flush(tracker, transport).await });
        if let Err(e) = result {
            tracing::warn!(path = %path, error = %e, "commit on release failed");
        }
        mount.dircache.invalidate(&path::parent_dir(&path));
    }
    reply.ok();
}
