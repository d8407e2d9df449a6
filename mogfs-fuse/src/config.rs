//! Mount configuration (§6). Grounded in the teacher's `config.rs`:
//! a `serde`-derived struct with a `Default` impl, loaded from a TOML
//! file, here merged with CLI overrides from `clap`.

use std::fs;
use std::path::Path;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Off = -1,
    Notice = 0,
    Error = 1,
    Debug = 2,
    DebugBackend = 3,
    DebugFuse = 4,
}

impl LogLevel {
    pub fn from_i32(v: i32) -> Self {
        match v {
            i32::MIN..=-1 => LogLevel::Off,
            0 => LogLevel::Notice,
            1 => LogLevel::Error,
            2 => LogLevel::Debug,
            3 => LogLevel::DebugBackend,
            _ => LogLevel::DebugFuse,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct FileConfig {
    pub trackers: Option<Vec<String>>,
    pub domain: Option<String>,
    pub class: Option<String>,
    pub mountpoint: Option<String>,
    pub mountopts: Option<String>,
    pub threaded: Option<bool>,
    pub readonly: Option<bool>,
    pub buffered: Option<bool>,
    pub checksums: Option<bool>,
    pub loglevel: Option<i32>,
    #[serde(rename = "filepaths.dircache")]
    pub dircache: Option<bool>,
    #[serde(rename = "filepaths.dircache.duration")]
    pub dircache_duration: Option<u64>,
}

/// Fully resolved, immutable configuration. Cheap to clone; each worker
/// thread may hold a local copy for lock-free reads (§3 "Config").
#[derive(Debug, Clone)]
pub struct Config {
    pub trackers: Vec<String>,
    pub domain: String,
    pub class: Option<String>,
    pub mountpoint: String,
    pub mountopts: Option<String>,
    pub threaded: bool,
    pub readonly: bool,
    pub buffered: bool,
    pub checksums: bool,
    pub loglevel: LogLevel,
    pub dircache: bool,
    pub dircache_duration_secs: u64,
}

impl Config {
    /// Loads `path` if present (missing file is not an error — falls back
    /// to an all-default `FileConfig`), then layers `overrides` on top.
    pub fn load(path: Option<&Path>, overrides: FileConfig) -> Result<Self, String> {
        let file_config = match path {
            Some(p) if p.exists() => {
                let content = fs::read_to_string(p).map_err(|e| format!("reading {}: {}", p.display(), e))?;
                toml::from_str(&content).map_err(|e| format!("parsing {}: {}", p.display(), e))?
            }
            _ => FileConfig::default(),
        };
        Self::merge(file_config, overrides)
    }

    fn merge(base: FileConfig, over: FileConfig) -> Result<Self, String> {
        let trackers = over.trackers.or(base.trackers).ok_or("missing required config: trackers")?;
        let domain = over.domain.or(base.domain).ok_or("missing required config: domain")?;
        let mountpoint = over.mountpoint.or(base.mountpoint).ok_or("missing required config: mountpoint")?;
        Ok(Self {
            trackers,
            domain,
            class: over.class.or(base.class),
            mountpoint,
            mountopts: over.mountopts.or(base.mountopts),
            threaded: over.threaded.or(base.threaded).unwrap_or(false),
            readonly: over.readonly.or(base.readonly).unwrap_or(false),
            buffered: over.buffered.or(base.buffered).unwrap_or(true),
            checksums: over.checksums.or(base.checksums).unwrap_or(false),
            loglevel: LogLevel::from_i32(over.loglevel.or(base.loglevel).unwrap_or(0)),
            dircache: over.dircache.or(base.dircache).unwrap_or(true),
            dircache_duration_secs: over.dircache_duration.or(base.dircache_duration).unwrap_or(2),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_overrides_win_over_file() {
        let base = FileConfig {
            trackers: Some(vec!["tracker-a:7001".into()]),
            domain: Some("files".into()),
            mountpoint: Some("/mnt/a".into()),
            readonly: Some(false),
            ..Default::default()
        };
        let over = FileConfig {
            readonly: Some(true),
            ..Default::default()
        };
        let cfg = Config::merge(base, over).unwrap();
        assert!(cfg.readonly);
        assert_eq!(cfg.domain, "files");
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let err = Config::merge(FileConfig::default(), FileConfig::default()).unwrap_err();
        assert!(err.contains("trackers"));
    }
}
