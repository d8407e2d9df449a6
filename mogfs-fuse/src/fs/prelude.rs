//! Shared imports for the `fs` submodules, mirroring the teacher's
//! `fs/prelude.rs` grouping.

pub use fuser::{
    FileAttr, FileType, ReplyAttr, ReplyCreate, ReplyData, ReplyDirectory, ReplyEmpty,
    ReplyEntry, ReplyOpen, ReplyStatfs, ReplyWrite, ReplyXattr, Request, TimeOrNow,
};

pub use libc::{EACCES, EEXIST, EIO, ENOENT, ENOTEMPTY, EOPNOTSUPP};

pub use std::ffi::OsStr;
pub use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub use bytes::Bytes;

pub use crate::error::FsError;
pub use crate::mount::Mount;

pub const ENTRY_TTL: Duration = Duration::from_secs(1);

pub fn errno_for(err: &FsError) -> i32 {
    err.to_errno()
}
