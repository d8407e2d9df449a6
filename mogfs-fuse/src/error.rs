//! Error types shared by every layer of the core: tracker adapter, HTTP
//! transport, file handle state machine, and the FUSE dispatcher.
//!
//! The dispatcher (`fs::mod`) is the only place a `FsError` is converted to
//! a raw errno; everywhere else it propagates with `?`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FsError {
    #[error("no such entry")]
    NotFound,
    #[error("entry already exists")]
    Exists,
    #[error("operation not permitted on a read-only mount")]
    AccessDenied,
    #[error("operation not supported")]
    Unsupported,
    #[error("tracker error {errcode}: {errstr}")]
    Tracker { errcode: String, errstr: String },
    #[error("i/o error: {0}")]
    Io(String),
}

impl FsError {
    /// Maps an abstract error kind to the negative errno the dispatcher
    /// hands back to the kernel, per the propagation policy in §7.
    pub fn to_errno(&self) -> i32 {
        match self {
            FsError::NotFound => libc::ENOENT,
            FsError::Exists => libc::EEXIST,
            FsError::AccessDenied => libc::EACCES,
            FsError::Unsupported => libc::EOPNOTSUPP,
            FsError::Tracker { .. } => libc::EIO,
            FsError::Io(_) => libc::EIO,
        }
    }
}

pub type FsResult<T> = Result<T, FsError>;

impl From<reqwest::Error> for FsError {
    fn from(e: reqwest::Error) -> Self {
        FsError::Io(e.to_string())
    }
}
