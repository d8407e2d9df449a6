//! The open-file state machine (§4.3, §4.3.1). One [`FileHandle`] per
//! kernel `open`/`create`; registered under [`crate::registry::HandleRegistry`]
//! by `id` for the lifetime of the descriptor.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use tokio::sync::Mutex;

use crate::core::buffer::WriteBuffer;
use crate::core::checksum::Checksumer;
use crate::core::destination::Destination;
use crate::error::{FsError, FsResult};
use crate::transport::{HttpTransport, RangeStatus};
use crate::tracker::{CreateCloseArgs, TrackerClient};

const COW_CHUNK: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy)]
pub struct OpenFlags {
    pub read: bool,
    pub write: bool,
}

impl OpenFlags {
    pub fn read_only() -> Self {
        Self { read: true, write: false }
    }

    pub fn write_only() -> Self {
        Self { read: false, write: true }
    }

    pub fn read_write() -> Self {
        Self { read: true, write: true }
    }
}

pub struct FileHandle {
    pub id: u64,
    pub path: String,
    pub domain: String,
    pub class: Option<String>,
    pub writable: bool,

    input_paths: Mutex<Vec<String>>,
    dest: Mutex<Option<Arc<Destination>>>,
    cow_ptr: Mutex<Option<u64>>,
    dirty: AtomicBool,
    buffer: Option<Mutex<WriteBuffer>>,
    checksum: Option<Mutex<Checksumer>>,
}

impl FileHandle {
    /// Construction per §4.3. For a read-only open, an empty `get_paths`
    /// result is surfaced to the caller as [`FsError::NotFound`].
    pub async fn open(
        id: u64,
        path: String,
        domain: String,
        class: Option<String>,
        flags: OpenFlags,
        buffered: bool,
        checksums: bool,
        tracker: &dyn TrackerClient,
    ) -> FsResult<Self> {
        let paths = tracker.get_paths(&path).await.unwrap_or_default();

        if !flags.write {
            if paths.is_empty() {
                return Err(FsError::NotFound);
            }
            return Ok(Self {
                id,
                path,
                domain,
                class,
                writable: false,
                input_paths: Mutex::new(paths),
                dest: Mutex::new(None),
                cow_ptr: Mutex::new(None),
                dirty: AtomicBool::new(false),
                buffer: None,
                checksum: None,
            });
        }

        let has_prior = !paths.is_empty();
        Ok(Self {
            id,
            path,
            domain,
            class,
            writable: true,
            input_paths: Mutex::new(paths),
            dest: Mutex::new(None),
            cow_ptr: Mutex::new(if has_prior { Some(0) } else { None }),
            dirty: AtomicBool::new(!has_prior),
            buffer: if buffered { Some(Mutex::new(WriteBuffer::new())) } else { None },
            checksum: if checksums { Some(Mutex::new(Checksumer::new())) } else { None },
        })
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    async fn get_dest(&self, tracker: &dyn TrackerClient, transport: &HttpTransport) -> FsResult<Arc<Destination>> {
        let mut guard = self.dest.lock().await;
        if let Some(d) = guard.as_ref() {
            return Ok(d.clone());
        }
        let co = tracker.create_open(&self.domain, self.class.as_deref(), &self.path).await?;
        let dest = Arc::new(Destination::new(co.fid, co.devid, co.url));
        if let Err(e) = transport.put_empty(&dest.url).await {
            dest.mark_error();
            *guard = Some(dest);
            return Err(e);
        }
        *guard = Some(dest.clone());
        Ok(dest)
    }

    async fn raw_read(
        &self,
        offset: u64,
        len: u64,
        from_output: bool,
        transport: &HttpTransport,
    ) -> FsResult<Bytes> {
        if len == 0 {
            return Ok(Bytes::new());
        }
        let targets: Vec<String> = if from_output {
            let guard = self.dest.lock().await;
            match guard.as_ref() {
                Some(d) => vec![d.url.clone()],
                None => return Ok(Bytes::new()),
            }
        } else {
            self.input_paths.lock().await.clone()
        };

        for url in &targets {
            match transport.get_range(url, offset, len).await {
                Ok(RangeStatus::Ok(bytes)) => return Ok(bytes),
                Ok(RangeStatus::NotSatisfiable) => return Ok(Bytes::new()),
                Err(_) => continue,
            }
        }
        if targets.is_empty() {
            return Ok(Bytes::new());
        }
        Err(FsError::Io(format!("all source URLs failed for {}", self.path)))
    }

    async fn raw_write(&self, offset: u64, bytes: Bytes, tracker: &dyn TrackerClient, transport: &HttpTransport) -> FsResult<u64> {
        if bytes.is_empty() {
            return Ok(0);
        }
        let len = bytes.len() as u64;
        let dest = self.get_dest(tracker, transport).await?;
        match transport.put_range(&dest.url, offset, bytes).await {
            Ok(n) => {
                dest.bump_size(offset + n);
                Ok(n)
            }
            Err(e) => {
                dest.mark_error();
                Err(e)
            }
        }
    }

    /// Advances `cow_ptr` toward `target`, copying up to 1 MiB (or `limit`,
    /// whichever is smaller) per round. Clears `cow_ptr` once the old
    /// object is exhausted.
    async fn cow_advance(&self, target: u64, limit: Option<u64>, tracker: &dyn TrackerClient, transport: &HttpTransport) -> FsResult<()> {
        let chunk_cap = limit.map(|l| l.min(COW_CHUNK)).unwrap_or(COW_CHUNK);
        loop {
            let ptr = match *self.cow_ptr.lock().await {
                Some(p) => p,
                None => return Ok(()),
            };
            if ptr >= target {
                return Ok(());
            }
            let chunk = self.raw_read(ptr, chunk_cap, false, transport).await?;
            if chunk.is_empty() {
                *self.cow_ptr.lock().await = None;
                return Ok(());
            }
            let n = chunk.len() as u64;
            self.raw_write(ptr, chunk, tracker, transport).await?;
            *self.cow_ptr.lock().await = Some(ptr + n);
        }
    }

    pub async fn write(&self, buf: Bytes, offset: u64, tracker: &dyn TrackerClient, transport: &HttpTransport) -> FsResult<u64> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.dirty.store(true, Ordering::SeqCst);
        self.cow_advance(offset + buf.len() as u64, None, tracker, transport).await?;

        if let Some(checksum) = &self.checksum {
            checksum.lock().await.on_write(offset, &buf);
        }

        if let Some(buffer) = &self.buffer {
            let flushed = buffer.lock().await.write(offset, &buf);
            if let Some(run) = flushed {
                self.raw_write(run.offset, Bytes::from(run.bytes), tracker, transport).await?;
            }
            Ok(buf.len() as u64)
        } else {
            self.raw_write(offset, buf, tracker, transport).await
        }
    }

    pub async fn read(&self, len: u64, offset: u64, tracker: &dyn TrackerClient, transport: &HttpTransport) -> FsResult<Bytes> {
        if self.writable && self.is_dirty() {
            self.cow_advance(offset + len, None, tracker, transport).await?;
            if let Some(buffer) = &self.buffer {
                let run = buffer.lock().await.take();
                if let Some(run) = run {
                    self.raw_write(run.offset, Bytes::from(run.bytes), tracker, transport).await?;
                }
            }
            self.raw_read(offset, len, true, transport).await
        } else {
            self.raw_read(offset, len, false, transport).await
        }
    }

    /// Fails if `cow_ptr` is already cleared, or already past `size` — a
    /// clean/committed handle cannot be resized without a fresh write.
    pub async fn truncate(&self, size: u64, tracker: &dyn TrackerClient, transport: &HttpTransport) -> FsResult<()> {
        {
            let guard = self.cow_ptr.lock().await;
            match *guard {
                None => return Err(FsError::Io("truncate: no cow cursor on this handle".into())),
                Some(ptr) if ptr > size => return Err(FsError::Io("truncate: cannot shrink past promoted bytes".into())),
                _ => {}
            }
        }
        self.dirty.store(true, Ordering::SeqCst);
        self.cow_advance(size, Some(size), tracker, transport).await?;
        *self.cow_ptr.lock().await = None;
        Ok(())
    }

    /// Drains the write buffer, equivalent to fsync: does not commit.
    pub async fn drain_buffer(&self, tracker: &dyn TrackerClient, transport: &HttpTransport) -> FsResult<()> {
        if let Some(buffer) = &self.buffer {
            let run = buffer.lock().await.take();
            if let Some(run) = run {
                self.raw_write(run.offset, Bytes::from(run.bytes), tracker, transport).await?;
            }
        }
        Ok(())
    }

    /// Commits the staged destination under `path`, per §4.3 "Flush". No-op
    /// unless writable and dirty. On success, reinitializes the handle so
    /// it may be reused, re-COWing from the object it just committed.
    pub async fn flush(&self, tracker: &dyn TrackerClient, transport: &HttpTransport) -> FsResult<()> {
        if !self.writable || !self.is_dirty() {
            return Ok(());
        }
        self.drain_buffer(tracker, transport).await?;
        let checksum_value = match &self.checksum {
            Some(c) => c.lock().await.finish(),
            None => None,
        };

        let dest = self.get_dest(tracker, transport).await?;
        self.cow_advance(u64::MAX, None, tracker, transport).await?;

        let size = dest.size();
        let mtime = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64;
        let sticky_error = dest.has_error();
        let commit_key = if sticky_error { String::new() } else { self.path.clone() };

        let commit_result = tracker
            .create_close(CreateCloseArgs {
                fid: dest.fid,
                devid: dest.devid,
                domain: &self.domain,
                key: &commit_key,
                path: &dest.url,
                size,
                mtime,
                checksum: checksum_value,
            })
            .await;

        if sticky_error {
            self.reset_after_commit(vec![]).await;
            return Err(FsError::Io(format!("destination for {} had a sticky write error; object discarded", self.path)));
        }
        commit_result?;
        self.reset_after_commit(vec![dest.url.clone()]).await;
        Ok(())
    }

    async fn reset_after_commit(&self, new_input_paths: Vec<String>) {
        *self.input_paths.lock().await = new_input_paths.clone();
        *self.dest.lock().await = None;
        *self.cow_ptr.lock().await = if new_input_paths.is_empty() { None } else { Some(0) };
        self.dirty.store(false, Ordering::SeqCst);
        if let Some(buffer) = &self.buffer {
            buffer.lock().await.take();
        }
        if let Some(checksum) = &self.checksum {
            checksum.lock().await.reset();
        }
    }

    /// Destination size if writable-dirty, else the prior object's size.
    pub async fn size(&self, tracker: &dyn TrackerClient) -> FsResult<u64> {
        if self.writable {
            if let Some(dest) = self.dest.lock().await.as_ref() {
                return Ok(dest.size());
            }
        }
        match tracker.file_info(&self.path, false).await {
            Ok(info) => Ok(info.size),
            Err(FsError::NotFound) => Ok(0),
            Err(e) => Err(e),
        }
    }
}
