//! Tracing setup, grounded in the teacher server's `main.rs`
//! (`tracing_subscriber::registry()` + `EnvFilter` + `fmt::layer()`).
//! Here the filter is driven by the mount's `loglevel` config instead of
//! a hardcoded directive string.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LogLevel;

/// `RUST_LOG` always wins if set; otherwise the mount's `loglevel` picks
/// a directive matching the OFF/NOTICE/ERROR/DEBUG/DEBUG_BACKEND/DEBUG_FUSE
/// ladder in §6.
pub fn init(level: LogLevel) {
    let default_directive = match level {
        LogLevel::Off => "off",
        LogLevel::Notice => "mogfs_fuse=info",
        LogLevel::Error => "mogfs_fuse=error",
        LogLevel::Debug => "mogfs_fuse=debug",
        LogLevel::DebugBackend => "mogfs_fuse=debug,reqwest=debug",
        LogLevel::DebugFuse => "mogfs_fuse=trace,fuser=debug",
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_directive.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
