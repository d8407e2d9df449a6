//! `getxattr`/`listxattr`/`setxattr`/`readlink` (§4.7, §6). New module —
//! the teacher's generic file server had no extended-attribute surface
//! at all, so this is grounded directly in spec §6's two well-known names
//! rather than any teacher file.

use super::prelude::*;

const CLASS_ATTR: &str = "MogileFS.class";
const CHECKSUM_ATTR: &str = "MogileFS.checksum";

fn encode(reply_size: u32, value: &str, reply: ReplyXattr) {
    let bytes = value.as_bytes();
    if reply_size == 0 {
        reply.size(bytes.len() as u32);
    } else if (reply_size as usize) < bytes.len() {
        reply.error(libc::ERANGE);
    } else {
        reply.data(bytes);
    }
}

pub fn getxattr(mount: &Mount, _req: &Request<'_>, ino: u64, name: &OsStr, size: u32, reply: ReplyXattr) {
    let Some(path) = mount.path_for_ino(ino) else {
        reply.error(ENOENT);
        return;
    };
    let attr_name = name.to_string_lossy();
    if attr_name != CLASS_ATTR && attr_name != CHECKSUM_ATTR {
        reply.error(EOPNOTSUPP);
        return;
    }

    let path_for_info = path.clone();
    let info = mount.dispatch(move |tracker, _t| async move { tracker.file_info(&path_for_info, false).await });
    let info = match info {
        Ok(i) => i,
        Err(e) => {
            reply.error(errno_for(&e));
            return;
        }
    };

    let value = if attr_name == CLASS_ATTR {
        info.class.unwrap_or_default()
    } else {
        info.checksum.unwrap_or_default()
    };
    encode(size, &value, reply);
}

pub fn listxattr(_mount: &Mount, _req: &Request<'_>, _ino: u64, size: u32, reply: ReplyXattr) {
    let listing = format!("{CHECKSUM_ATTR}\0{CLASS_ATTR}\0");
    let bytes = listing.as_bytes();
    if size == 0 {
        reply.size(bytes.len() as u32);
    } else if (size as usize) < bytes.len() {
        reply.error(libc::ERANGE);
    } else {
        reply.data(bytes);
    }
}

pub fn setxattr(mount: &Mount, _req: &Request<'_>, ino: u64, name: &OsStr, value: &[u8], _flags: i32, _position: u32, reply: ReplyEmpty) {
    if mount.config.readonly {
        reply.error(EACCES);
        return;
    }
    let Some(path) = mount.path_for_ino(ino) else {
        reply.error(ENOENT);
        return;
    };
    if name.to_string_lossy() != CLASS_ATTR {
        reply.error(EOPNOTSUPP);
        return;
    }
    let class = String::from_utf8_lossy(value).to_string();
    let result = mount.dispatch(move |tracker, _t| async move { tracker.update_class(&path, &class).await });
    match result {
        Ok(()) => reply.ok(),
        Err(e) => reply.error(errno_for(&e)),
    }
}

pub fn removexattr(_mount: &Mount, _req: &Request<'_>, _ino: u64, _name: &OsStr, reply: ReplyEmpty) {
    reply.error(EOPNOTSUPP);
}

/// Non-goal per §1/§6: returns success with an empty target rather than
/// `-EOPNOTSUPP`, matching the spec's explicit "inert" readlink behavior.
pub fn readlink(_mount: &Mount, _req: &Request<'_>, _ino: u64, reply: ReplyData) {
    reply.data(&[]);
}
