//! `unlink`, `rmdir` (§4.7). Grounded in the teacher's `fs/delete.rs`,
//! generalized from client-side recursive deletion to a single atomic
//! tracker `delete` RPC — MogileFS has no directory object to recurse
//! into, and directory removal beyond unlink is an explicit Non-goal.

use super::prelude::*;
use crate::path;

pub fn unlink(mount: &Mount, _req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
    if mount.config.readonly {
        reply.error(EACCES);
        return;
    }
    let Some(parent_path) = mount.path_for_ino(parent) else {
        reply.error(ENOENT);
        return;
    };
    let full_path = path::normalize(&format!("{}/{}", parent_path.trim_end_matches('/'), name.to_string_lossy()));

    let path_for_delete = full_path.clone();
    let result = mount.dispatch(move |tracker, _t| async move { tracker.delete(&path_for_delete).await });
    if let Err(e) = result {
        reply.error(errno_for(&e));
        return;
    }

    mount.forget_inode(&full_path);
    mount.dircache.invalidate(&path::parent_dir(&full_path));
    reply.ok();
}

/// Directory removal beyond the unlink path is not modeled; MogileFS has
/// no real directory object to drop (§1 Non-goals, §6).
pub fn rmdir(_mount: &Mount, _req: &Request<'_>, _parent: u64, _name: &OsStr, reply: ReplyEmpty) {
    reply.error(EOPNOTSUPP);
}
