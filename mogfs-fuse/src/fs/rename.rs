//! `rename` (§4.7). Grounded in the teacher's `fs/rename.rs`, replacing
//! its client-side recursive copy+delete with the tracker's atomic
//! `rename(old, new)` verb — the tracker owns key bookkeeping, so no
//! content needs to move through this process at all.

use super::prelude::*;
use crate::path;

pub fn rename(mount: &Mount, _req: &Request<'_>, parent: u64, name: &OsStr, newparent: u64, newname: &OsStr, _flags: u32, reply: ReplyEmpty) {
    if mount.config.readonly {
        reply.error(EACCES);
        return;
    }
    let Some(parent_path) = mount.path_for_ino(parent) else {
        reply.error(ENOENT);
        return;
    };
    let Some(new_parent_path) = mount.path_for_ino(newparent) else {
        reply.error(ENOENT);
        return;
    };

    let old_path = path::normalize(&format!("{}/{}", parent_path.trim_end_matches('/'), name.to_string_lossy()));
    let new_path = path::normalize(&format!("{}/{}", new_parent_path.trim_end_matches('/'), newname.to_string_lossy()));

    let old_for_rpc = old_path.clone();
    let new_for_rpc = new_path.clone();
    let result = mount.dispatch(move |tracker, _t| async move { tracker.rename(&old_for_rpc, &new_for_rpc).await });
    if let Err(e) = result {
        reply.error(errno_for(&e));
        return;
    }

    mount.rename_inode(&old_path, &new_path);
    mount.dircache.invalidate(&path::parent_dir(&old_path));
    mount.dircache.invalidate(&path::parent_dir(&new_path));
    reply.ok();
}
