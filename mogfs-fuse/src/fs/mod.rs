//! The root of the FUSE filesystem implementation (§4.7).
//!
//! [`FsWrapper`] is the dispatcher: every kernel callback lands here and
//! is immediately forwarded to the matching function in a sub-module.
//! Grounded in the teacher's `fs/mod.rs` `RemoteFS`/`FsWrapper` split, but
//! `RemoteFS`'s per-instance `HashMap`s and `Mutex` wrapper are replaced by
//! [`crate::mount::Mount`], whose own fields are independently locked, so
//! `FsWrapper` needs no outer mutex at all.

use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;

use fuser::{
    Filesystem, ReplyAttr, ReplyCreate, ReplyData, ReplyDirectory, ReplyEmpty, ReplyEntry,
    ReplyOpen, ReplyStatfs, ReplyWrite, ReplyXattr, Request, TimeOrNow,
};

use crate::mount::Mount;

pub mod attr;
pub mod prelude;
mod create;
mod delete;
mod read;
mod rename;
mod write;
mod xattr;

#[derive(Clone)]
pub struct FsWrapper(pub Arc<Mount>);

impl Filesystem for FsWrapper {
    fn lookup(&mut self, req: &Request, parent: u64, name: &OsStr, reply: ReplyEntry) {
        tracing::debug!(op = "lookup", parent, name = %name.to_string_lossy());
        read::lookup(&self.0, req, parent, name, reply);
    }

    fn getattr(&mut self, req: &Request, ino: u64, reply: ReplyAttr) {
        tracing::debug!(op = "getattr", ino);
        attr::getattr(&self.0, req, ino, reply);
    }

    #[allow(clippy::too_many_arguments)]
    fn setattr(
        &mut self,
        req: &Request<'_>,
        ino: u64,
        mode: Option<u32>,
        uid: Option<u32>,
        gid: Option<u32>,
        size: Option<u64>,
        atime: Option<TimeOrNow>,
        mtime: Option<TimeOrNow>,
        ctime: Option<std::time::SystemTime>,
        fh: Option<u64>,
        crtime: Option<std::time::SystemTime>,
        chgtime: Option<std::time::SystemTime>,
        bkuptime: Option<std::time::SystemTime>,
        flags: Option<u32>,
        reply: ReplyAttr,
    ) {
        tracing::debug!(op = "setattr", ino, ?size);
        attr::setattr(&self.0, req, ino, mode, uid, gid, size, atime, mtime, ctime, fh, crtime, chgtime, bkuptime, flags, reply);
    }

    fn readlink(&mut self, req: &Request, ino: u64, reply: ReplyData) {
        tracing::debug!(op = "readlink", ino);
        xattr::readlink(&self.0, req, ino, reply);
    }

    fn readdir(&mut self, req: &Request, ino: u64, fh: u64, offset: i64, reply: ReplyDirectory) {
        tracing::debug!(op = "readdir", ino, offset);
        read::readdir(&self.0, req, ino, fh, offset, reply);
    }

    fn open(&mut self, req: &Request<'_>, ino: u64, flags: i32, reply: ReplyOpen) {
        tracing::debug!(op = "open", ino, flags);
        read::open(&self.0, req, ino, flags, reply);
    }

    #[allow(clippy::too_many_arguments)]
    fn read(&mut self, req: &Request<'_>, ino: u64, fh: u64, offset: i64, size: u32, flags: i32, lock_owner: Option<u64>, reply: ReplyData) {
        tracing::debug!(op = "read", ino, fh, offset, size);
        read::read(&self.0, req, ino, fh, offset, size, flags, lock_owner, reply);
    }

    #[allow(clippy::too_many_arguments)]
    fn write(&mut self, req: &Request<'_>, ino: u64, fh: u64, offset: i64, data: &[u8], write_flags: u32, flags: i32, lock_owner: Option<u64>, reply: ReplyWrite) {
        tracing::debug!(op = "write", ino, fh, offset, bytes = data.len());
        write::write(&self.0, req, ino, fh, offset, data, write_flags, flags, lock_owner, reply);
    }

    fn flush(&mut self, req: &Request<'_>, ino: u64, fh: u64, lock_owner: u64, reply: ReplyEmpty) {
        tracing::debug!(op = "flush", ino, fh);
        write::flush(&self.0, req, ino, fh, lock_owner, reply);
    }

    fn release(&mut self, req: &Request<'_>, ino: u64, fh: u64, flags: i32, lock_owner: Option<u64>, flush: bool, reply: ReplyEmpty) {
        tracing::debug!(op = "release", ino, fh);
        write::release(&self.0, req, ino, fh, flags, lock_owner, flush, reply);
    }

    fn fsync(&mut self, req: &Request<'_>, ino: u64, fh: u64, datasync: bool, reply: ReplyEmpty) {
        tracing::debug!(op = "fsync", ino, fh);
        write::fsync(&self.0, req, ino, fh, datasync, reply);
    }

    fn statfs(&mut self, req: &Request, ino: u64, reply: ReplyStatfs) {
        tracing::debug!(op = "statfs", ino);
        attr::statfs(&self.0, req, ino, reply);
    }

    fn mkdir(&mut self, req: &Request<'_>, parent: u64, name: &OsStr, mode: u32, umask: u32, reply: ReplyEntry) {
        tracing::debug!(op = "mkdir", parent, name = %name.to_string_lossy());
        create::mkdir(&self.0, req, parent, name, mode, umask, reply);
    }

    #[allow(clippy::too_many_arguments)]
    fn create(&mut self, req: &Request<'_>, parent: u64, name: &OsStr, mode: u32, umask: u32, flags: i32, reply: ReplyCreate) {
        tracing::debug!(op = "create", parent, name = %name.to_string_lossy());
        create::create(&self.0, req, parent, name, mode, umask, flags, reply);
    }

    fn unlink(&mut self, req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        tracing::debug!(op = "unlink", parent, name = %name.to_string_lossy());
        delete::unlink(&self.0, req, parent, name, reply);
    }

    fn rmdir(&mut self, req: &Request<'_>, parent: u64, name: &OsStr, reply: ReplyEmpty) {
        tracing::debug!(op = "rmdir", parent, name = %name.to_string_lossy());
        delete::rmdir(&self.0, req, parent, name, reply);
    }

    fn rename(&mut self, req: &Request<'_>, parent: u64, name: &OsStr, newparent: u64, newname: &OsStr, flags: u32, reply: ReplyEmpty) {
        tracing::debug!(op = "rename", parent, newparent, name = %name.to_string_lossy());
        rename::rename(&self.0, req, parent, name, newparent, newname, flags, reply);
    }

    fn link(&mut self, _req: &Request<'_>, _ino: u64, _newparent: u64, _newname: &OsStr, reply: ReplyEntry) {
        reply.error(libc::EOPNOTSUPP);
    }

    fn symlink(&mut self, _req: &Request<'_>, _parent: u64, _link_name: &OsStr, _target: &Path, reply: ReplyEntry) {
        reply.error(libc::EOPNOTSUPP);
    }

    fn mknod(&mut self, req: &Request<'_>, parent: u64, name: &OsStr, mode: u32, umask: u32, _rdev: u32, reply: ReplyEntry) {
        tracing::debug!(op = "mknod", parent, name = %name.to_string_lossy());
        create::mknod(&self.0, req, parent, name, mode, umask, reply);
    }

    fn getxattr(&mut self, req: &Request<'_>, ino: u64, name: &OsStr, size: u32, reply: ReplyXattr) {
        tracing::debug!(op = "getxattr", ino, name = %name.to_string_lossy());
        xattr::getxattr(&self.0, req, ino, name, size, reply);
    }

    fn listxattr(&mut self, req: &Request<'_>, ino: u64, size: u32, reply: ReplyXattr) {
        tracing::debug!(op = "listxattr", ino);
        xattr::listxattr(&self.0, req, ino, size, reply);
    }

    fn setxattr(&mut self, req: &Request<'_>, ino: u64, name: &OsStr, value: &[u8], flags: i32, position: u32, reply: ReplyEmpty) {
        tracing::debug!(op = "setxattr", ino, name = %name.to_string_lossy(), bytes = value.len());
        xattr::setxattr(&self.0, req, ino, name, value, flags, position, reply);
    }

    fn removexattr(&mut self, req: &Request<'_>, ino: u64, name: &OsStr, reply: ReplyEmpty) {
        tracing::debug!(op = "removexattr", ino, name = %name.to_string_lossy());
        xattr::removexattr(&self.0, req, ino, name, reply);
    }
}
