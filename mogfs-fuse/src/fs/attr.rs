//! `getattr`/`setattr`/`statfs` (§4.7). Grounded in the teacher's
//! `fs/attr.rs` `fetch_and_cache_attributes`, generalized from a flat
//! attribute cache keyed by inode to attributes synthesized on the fly
//! from the directory cache plus a live handle's size when one is open.

use super::prelude::*;
use crate::core::{FileHandle, OpenFlags};
use crate::path;
use crate::tracker::DirEntry;

pub fn synth_attr(ino: u64, kind: FileType, size: u64, mtime_unix: i64, readonly: bool) -> FileAttr {
    let mut perm = 0o444u16;
    if !readonly {
        perm |= 0o222;
    }
    if kind == FileType::Directory {
        perm |= 0o111;
    }
    let mtime = if mtime_unix > 0 {
        UNIX_EPOCH + Duration::from_secs(mtime_unix as u64)
    } else {
        SystemTime::now()
    };
    const BLKSIZE: u64 = 1024;
    FileAttr {
        ino,
        size,
        blocks: size.div_ceil(BLKSIZE),
        atime: SystemTime::now(),
        mtime,
        ctime: mtime,
        crtime: mtime,
        kind,
        perm,
        nlink: 1,
        uid: 0,
        gid: 0,
        rdev: 0,
        flags: 0,
        blksize: BLKSIZE as u32,
    }
}

fn root_attr(readonly: bool) -> FileAttr {
    synth_attr(crate::mount::ROOT_INODE, FileType::Directory, 0, 0, readonly)
}

/// Resolves `ino`'s attributes by listing its parent directory (or its
/// own live handle, if one is open and writable-dirty).
fn resolve(mount: &Mount, ino: u64) -> Option<FileAttr> {
    if ino == crate::mount::ROOT_INODE {
        return Some(root_attr(mount.config.readonly));
    }
    let path = mount.path_for_ino(ino)?;

    if let Some(handle_id) = mount.open_handle_for_path(&path) {
        if let Some(handle) = mount.registry.get(handle_id) {
            if handle.writable && handle.is_dirty() {
                let size = mount.dispatch(move |tracker, _t| async move { handle.size(tracker).await });
                if let Ok(size) = size {
                    return Some(synth_attr(ino, FileType::RegularFile, size, 0, mount.config.readonly));
                }
            }
        }
    }

    let parent_dir = path::parent_dir(&path);
    let name = path.rsplit('/').next().unwrap_or(&path).to_string();
    let entries: Vec<DirEntry> = mount
        .dispatch(move |tracker, _t| async move { mount.dircache.list(&parent_dir, tracker).await })
        .ok()?;
    let entry = entries.into_iter().find(|e| e.name == name)?;
    let kind = if entry.is_directory { FileType::Directory } else { FileType::RegularFile };
    Some(synth_attr(ino, kind, entry.size, entry.modified, mount.config.readonly))
}

pub fn getattr(mount: &Mount, _req: &Request, ino: u64, reply: ReplyAttr) {
    match resolve(mount, ino) {
        Some(attr) => reply.attr(&ENTRY_TTL, &attr),
        None => reply.error(ENOENT),
    }
}

pub fn setattr(
    mount: &Mount,
    _req: &Request<'_>,
    ino: u64,
    _mode: Option<u32>,
    _uid: Option<u32>,
    _gid: Option<u32>,
    size: Option<u64>,
    _atime: Option<TimeOrNow>,
    _mtime: Option<TimeOrNow>,
    _ctime: Option<SystemTime>,
    fh: Option<u64>,
    _crtime: Option<SystemTime>,
    _chgtime: Option<SystemTime>,
    _bkuptime: Option<SystemTime>,
    _flags: Option<u32>,
    reply: ReplyAttr,
) {
    if mount.config.readonly {
        reply.error(EACCES);
        return;
    }
    if let Some(new_size) = size {
        let handle_id = fh.or_else(|| mount.path_for_ino(ino).and_then(|p| mount.open_handle_for_path(&p)));
        let result = match handle_id {
            Some(handle_id) => {
                let Some(handle) = mount.registry.get(handle_id) else {
                    reply.error(ENOENT);
                    return;
                };
                mount.dispatch(move |tracker, transport| async move { handle.truncate(new_size, tracker, transport).await })
            }
            // Plain truncate(2) on a file with no open handle: open
            // write-only, truncate, flush, release (§4.7).
            None => {
                let Some(path) = mount.path_for_ino(ino) else {
                    reply.error(ENOENT);
                    return;
                };
                let domain = mount.config.domain.clone();
                let class = mount.config.class.clone();
                mount.dispatch(move |tracker, transport| async move {
                    let handle = FileHandle::open(0, path, domain, class, OpenFlags::write_only(), false, false, tracker).await?;
                    handle.truncate(new_size, tracker, transport).await?;
                    handle.flush(tracker, transport).await
                })
            }
        };
        if let Err(e) = result {
            reply.error(errno_for(&e));
            return;
        }
    }
    match resolve(mount, ino) {
        Some(attr) => reply.attr(&ENTRY_TTL, &attr),
        None => reply.error(ENOENT),
    }
}

pub fn statfs(mount: &Mount, _req: &Request, _ino: u64, reply: ReplyStatfs) {
    const BLOCK_SIZE: u32 = 1024 * 1024;
    let devices = mount.dispatch(|tracker, _transport| async move { tracker.get_devices().await });
    let devices = match devices {
        Ok(d) => d,
        Err(e) => {
            reply.error(errno_for(&e));
            return;
        }
    };
    let total_mb: u64 = devices.iter().map(|d| d.mb_total).sum();
    let free_mb: u64 = devices
        .iter()
        .filter(|d| d.status == "alive" && d.observed_state == "writeable")
        .map(|d| d.mb_free)
        .sum();
    reply.statfs(
        total_mb,
        free_mb,
        free_mb,
        0,
        0,
        BLOCK_SIZE,
        255,
        BLOCK_SIZE,
    );
}
