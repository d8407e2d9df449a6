//! Write-coalescing buffer (§4.4). Pure data structure; it decides when a
//! prior run must be flushed but performs no I/O itself — the handle reads
//! the decision back and issues the raw write.

pub const MAX_BUFFER: usize = 64 * 1024;

#[derive(Default)]
pub struct WriteBuffer {
    start: u64,
    end: u64,
    bytes: Vec<u8>,
}

/// A contiguous run ready to be flushed to the raw write path.
pub struct FlushRun {
    pub offset: u64,
    pub bytes: Vec<u8>,
}

impl WriteBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Appends `buf` at `offset`. If the buffer holds a prior run that must
    /// be flushed first — because `offset` is non-adjacent to `end`, or the
    /// run would exceed [`MAX_BUFFER`] — returns that run, already removed
    /// from the buffer, before accepting the new bytes.
    pub fn write(&mut self, offset: u64, buf: &[u8]) -> Option<FlushRun> {
        let must_flush = !self.is_empty()
            && (offset != self.end || self.bytes.len() + buf.len() > MAX_BUFFER);
        let flushed = if must_flush { self.take() } else { None };

        if self.is_empty() {
            self.start = offset;
            self.end = offset;
        }
        self.bytes.extend_from_slice(buf);
        self.end = offset + buf.len() as u64;
        flushed
    }

    /// Removes and returns the current run, leaving the buffer empty.
    pub fn take(&mut self) -> Option<FlushRun> {
        if self.is_empty() {
            return None;
        }
        let run = FlushRun {
            offset: self.start,
            bytes: std::mem::take(&mut self.bytes),
        };
        self.start = 0;
        self.end = 0;
        Some(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacent_writes_coalesce() {
        let mut buf = WriteBuffer::new();
        assert!(buf.write(0, b"hello").is_none());
        assert!(buf.write(5, b" world").is_none());
        let run = buf.take().unwrap();
        assert_eq!(run.offset, 0);
        assert_eq!(run.bytes, b"hello world");
    }

    #[test]
    fn non_adjacent_write_flushes_prior_run() {
        let mut buf = WriteBuffer::new();
        assert!(buf.write(0, b"abc").is_none());
        let flushed = buf.write(10, b"xyz").expect("non-adjacent write must flush");
        assert_eq!(flushed.offset, 0);
        assert_eq!(flushed.bytes, b"abc");
        let run = buf.take().unwrap();
        assert_eq!(run.offset, 10);
        assert_eq!(run.bytes, b"xyz");
    }

    #[test]
    fn full_buffer_flushes_before_overflow() {
        let mut buf = WriteBuffer::new();
        let chunk = vec![0u8; MAX_BUFFER - 1];
        assert!(buf.write(0, &chunk).is_none());
        let flushed = buf
            .write((MAX_BUFFER - 1) as u64, b"ab")
            .expect("overflowing write must flush prior run");
        assert_eq!(flushed.bytes.len(), MAX_BUFFER - 1);
    }
}
