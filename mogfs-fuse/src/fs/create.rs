//! `create`, `mkdir` (§4.7). Grounded in the teacher's `fs/create.rs`,
//! generalized from a direct PUT against a generic file server to the
//! tracker-backed open/release cycle that materializes a MogileFS object.

use super::prelude::*;
use crate::core::{FileHandle, OpenFlags};
use crate::path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

fn child_path(mount: &Mount, parent: u64, name: &OsStr) -> Option<String> {
    let parent_path = mount.path_for_ino(parent)?;
    let name = name.to_string_lossy();
    Some(path::normalize(&format!("{}/{}", parent_path.trim_end_matches('/'), name)))
}

pub fn create(mount: &Mount, _req: &Request<'_>, parent: u64, name: &OsStr, _mode: u32, _umask: u32, _flags: i32, reply: ReplyCreate) {
    if mount.config.readonly {
        reply.error(EACCES);
        return;
    }
    let Some(full_path) = child_path(mount, parent, name) else {
        reply.error(ENOENT);
        return;
    };

    let domain = mount.config.domain.clone();
    let class = mount.config.class.clone();
    let path_for_probe = full_path.clone();

    // Materialize an empty object via open+release (§4.7 `create`).
    let probe = mount.dispatch(move |tracker, transport| async move {
        let handle = FileHandle::open(0, path_for_probe, domain, class, OpenFlags::write_only(), false, false, tracker).await?;
        handle.flush(tracker, transport).await
    });
    if let Err(e) = probe {
        reply.error(errno_for(&e));
        return;
    }

    mount.dircache.invalidate(&path::parent_dir(&full_path));

    let id = mount.registry.next_id();
    let domain = mount.config.domain.clone();
    let class = mount.config.class.clone();
    let buffered = mount.config.buffered;
    let checksums = mount.config.checksums && !mount.config.threaded;
    let path_for_open = full_path.clone();

    let handle = mount.dispatch(move |tracker, _t| {
        FileHandle::open(id, path_for_open, domain, class, OpenFlags::read_write(), buffered, checksums, tracker)
    });

    match handle {
        Ok(handle) => {
            let handle = Arc::new(handle);
            mount.registry.insert(handle.clone());
            mount.register_open_path(&full_path, id);
            let ino = mount.ino_for_path(&full_path);
            let attr = super::attr::synth_attr(ino, FileType::RegularFile, 0, 0, mount.config.readonly);
            reply.created(&ENTRY_TTL, &attr, 0, id, 0);
        }
        Err(e) => reply.error(errno_for(&e)),
    }
}

/// `mknod`: materializes the empty object directly, the same way `create`
/// does before it opens a handle — but `mknod` returns no file handle, so
/// no [`FileHandle`] is registered (§3 "created in open/create/mknod").
pub fn mknod(mount: &Mount, _req: &Request<'_>, parent: u64, name: &OsStr, _mode: u32, _umask: u32, reply: ReplyEntry) {
    if mount.config.readonly {
        reply.error(EACCES);
        return;
    }
    let Some(full_path) = child_path(mount, parent, name) else {
        reply.error(ENOENT);
        return;
    };

    let domain = mount.config.domain.clone();
    let class = mount.config.class.clone();
    let path_for_probe = full_path.clone();
    let result = mount.dispatch(move |tracker, transport| async move {
        let handle = FileHandle::open(0, path_for_probe, domain, class, OpenFlags::write_only(), false, false, tracker).await?;
        handle.flush(tracker, transport).await
    });
    if let Err(e) = result {
        reply.error(errno_for(&e));
        return;
    }

    mount.dircache.invalidate(&path::parent_dir(&full_path));
    let ino = mount.ino_for_path(&full_path);
    let attr = super::attr::synth_attr(ino, FileType::RegularFile, 0, 0, mount.config.readonly);
    reply.entry(&ENTRY_TTL, &attr, 0);
}

static PROBE_COUNTER: AtomicU64 = AtomicU64::new(0);

/// `mkdir`: MogileFS has no directory object, so materialization is forced
/// by creating and immediately deleting a probe file under `path` (§4.7).
pub fn mkdir(mount: &Mount, _req: &Request<'_>, parent: u64, name: &OsStr, _mode: u32, _umask: u32, reply: ReplyEntry) {
    if mount.config.readonly {
        reply.error(EACCES);
        return;
    }
    let Some(full_path) = child_path(mount, parent, name) else {
        reply.error(ENOENT);
        return;
    };

    let n = PROBE_COUNTER.fetch_add(1, Ordering::Relaxed);
    let probe_path = format!("{}/.mkdir_probe_{}", full_path.trim_end_matches('/'), n);

    let domain = mount.config.domain.clone();
    let class = mount.config.class.clone();
    let probe_for_create = probe_path.clone();
    let result = mount.dispatch(move |tracker, transport| async move {
        let handle = FileHandle::open(0, probe_for_create, domain, class, OpenFlags::write_only(), false, false, tracker).await?;
        handle.flush(tracker, transport).await?;
        tracker.delete(&probe_path).await
    });
    if let Err(e) = result {
        reply.error(errno_for(&e));
        return;
    }

    mount.dircache.invalidate(&full_path);
    mount.dircache.invalidate(&path::parent_dir(&full_path));

    let ino = mount.ino_for_path(&full_path);
    let attr = super::attr::synth_attr(ino, FileType::Directory, 0, 0, mount.config.readonly);
    reply.entry(&ENTRY_TTL, &attr, 0);
}
