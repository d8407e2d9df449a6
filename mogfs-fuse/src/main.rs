//! CLI / init-teardown wrapper (§2 item 8, §6). Grounded in the teacher's
//! trivial `env::args` + `fuser::mount2` `main.rs`, generalized into a
//! `clap`-derived CLI with config-file + override merging, optional
//! daemonization, and best-effort handle release after unmount.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use fuser::MountOption;

use mogfs_fuse::config::{Config, FileConfig};
use mogfs_fuse::fs::FsWrapper;
use mogfs_fuse::logging;
use mogfs_fuse::mount::Mount;

#[derive(Parser, Debug)]
#[command(name = "mogfs-fuse", about = "Mount a MogileFS domain as a FUSE filesystem")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Mountpoint; overrides the config file.
    #[arg(long)]
    mountpoint: Option<String>,

    /// Tracker host:port, repeatable; overrides the config file.
    #[arg(long = "tracker")]
    trackers: Vec<String>,

    #[arg(long)]
    domain: Option<String>,

    #[arg(long)]
    class: Option<String>,

    #[arg(long)]
    readonly: bool,

    #[arg(long)]
    loglevel: Option<i32>,

    /// Run attached to the terminal instead of daemonizing.
    #[arg(long)]
    foreground: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let overrides = FileConfig {
        trackers: if cli.trackers.is_empty() { None } else { Some(cli.trackers.clone()) },
        domain: cli.domain.clone(),
        class: cli.class.clone(),
        mountpoint: cli.mountpoint.clone(),
        readonly: if cli.readonly { Some(true) } else { None },
        loglevel: cli.loglevel,
        ..Default::default()
    };

    let config = match Config::load(cli.config.as_deref(), overrides) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init(config.loglevel);

    if !cli.foreground {
        if let Err(e) = daemonize::Daemonize::new().start() {
            tracing::error!(error = %e, "failed to daemonize");
            return ExitCode::FAILURE;
        }
    }

    let mountpoint = config.mountpoint.clone();
    let readonly = config.readonly;
    let mount = Arc::new(Mount::new(config));
    if !mount.mark_mounted() {
        tracing::error!("mount already used");
        return ExitCode::FAILURE;
    }

    let mut options = vec![MountOption::FSName("mogfs".to_string())];
    if readonly {
        options.push(MountOption::RO);
    }
    if let Some(opts) = &mount.config.mountopts {
        for opt in opts.split(',').filter(|s| !s.is_empty()) {
            options.push(MountOption::CUSTOM(opt.to_string()));
        }
    }

    tracing::info!(mountpoint = %mountpoint, "mounting");
    let fs_wrapper = FsWrapper(mount.clone());
    let result = fuser::mount2(fs_wrapper, &mountpoint, &options);

    // Best-effort release of whatever handles the kernel never closed
    // (§5 "Cancellation and timeouts").
    for handle in mount.registry.drain() {
        if handle.writable {
            let outcome = mount.dispatch(move |tracker, transport| async move { handle.flush(tracker, transport).await });
            if let Err(e) = outcome {
                tracing::warn!(error = %e, "best-effort release failed at unmount");
            }
        }
    }

    match result {
        Ok(()) => {
            tracing::info!("unmounted cleanly");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "fuse mount failed");
            ExitCode::FAILURE
        }
    }
}
