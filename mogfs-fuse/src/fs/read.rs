//! `lookup`, `readdir`, `open`, `read` (§4.7). Grounded in the teacher's
//! `fs/read.rs`, generalized from a single-server inode map to the
//! tracker-backed directory cache and core [`FileHandle`].

use super::prelude::*;
use crate::core::{FileHandle, OpenFlags};
use crate::path;
use std::sync::Arc;

pub fn lookup(mount: &Mount, _req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
    let Some(parent_path) = mount.path_for_ino(parent) else {
        reply.error(ENOENT);
        return;
    };
    let name_str = name.to_string_lossy().to_string();
    let full_path = path::normalize(&format!("{}/{}", parent_path.trim_end_matches('/'), name_str));

    let entries = mount
        .dispatch(move |tracker, _t| async move { mount.dircache.list(&parent_path, tracker).await });
    let entries = match entries {
        Ok(e) => e,
        Err(_) => {
            reply.error(ENOENT);
            return;
        }
    };
    match entries.into_iter().find(|e| e.name == name_str) {
        Some(entry) => {
            let ino = mount.ino_for_path(&full_path);
            let kind = if entry.is_directory { FileType::Directory } else { FileType::RegularFile };
            let attr = super::attr::synth_attr(ino, kind, entry.size, entry.modified, mount.config.readonly);
            reply.entry(&ENTRY_TTL, &attr, 0);
        }
        None => reply.error(ENOENT),
    }
}

pub fn readdir(mount: &Mount, _req: &Request, ino: u64, _fh: u64, offset: i64, mut reply: ReplyDirectory) {
    let Some(dir_path) = mount.path_for_ino(ino) else {
        reply.error(ENOENT);
        return;
    };

    let mut rows: Vec<(u64, FileType, String)> = Vec::new();
    rows.push((ino, FileType::Directory, ".".to_string()));
    let parent_ino = mount.ino_for_path(&path::parent_dir(&dir_path));
    rows.push((parent_ino, FileType::Directory, "..".to_string()));

    let trimmed = dir_path.trim_end_matches('/').to_string();
    let dir_path_for_list = dir_path.clone();
    let entries = mount.dispatch(move |tracker, _t| async move { mount.dircache.list(&dir_path_for_list, tracker).await });
    if let Ok(entries) = entries {
        for entry in entries {
            let child_path = path::normalize(&format!("{}/{}", trimmed, entry.name));
            let child_ino = mount.ino_for_path(&child_path);
            let kind = if entry.is_directory { FileType::Directory } else { FileType::RegularFile };
            rows.push((child_ino, kind, entry.name));
        }
    }

    for (i, (row_ino, kind, name)) in rows.into_iter().enumerate().skip(offset as usize) {
        if reply.add(row_ino, (i + 1) as i64, kind, &name) {
            break;
        }
    }
    reply.ok();
}

pub fn open(mount: &Mount, _req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
    let Some(path) = mount.path_for_ino(ino) else {
        reply.error(ENOENT);
        return;
    };

    let write_access = (flags & libc::O_WRONLY != 0) || (flags & libc::O_RDWR != 0);
    if write_access && mount.config.readonly {
        reply.error(EACCES);
        return;
    }
    let open_flags = if flags & libc::O_RDWR != 0 {
        OpenFlags::read_write()
    } else if write_access {
        OpenFlags::write_only()
    } else {
        OpenFlags::read_only()
    };

    let id = mount.registry.next_id();
    let domain = mount.config.domain.clone();
    let class = mount.config.class.clone();
    let buffered = mount.config.buffered;
    let checksums = mount.config.checksums && !mount.config.threaded;
    let path_for_open = path.clone();

    let handle = mount.dispatch(move |tracker, _t| {
        FileHandle::open(id, path_for_open, domain, class, open_flags, buffered, checksums, tracker)
    });

    match handle {
        Ok(handle) => {
            let handle = Arc::new(handle);
            mount.registry.insert(handle.clone());
            if open_flags.write {
                mount.register_open_path(&path, id);
            }
            reply.opened(id, 0);
        }
        Err(e) => reply.error(errno_for(&e)),
    }
}

pub fn read(mount: &Mount, _req: &Request<'_>, _ino: u64, fh: u64, offset: i64, size: u32, _flags: i32, _lock_owner: Option<u64>, reply: ReplyData) {
    let Some(handle) = mount.registry.get(fh) else {
        reply.error(libc::EBADF);
        return;
    };
    let offset = offset.max(0) as u64;
    let result = mount.dispatch(move |tracker, transport| async move { handle.read(size as u64, offset, tracker, transport).await });
    match result {
        Ok(bytes) => reply.data(&bytes),
        Err(e) => reply.error(errno_for(&e)),
    }
}
