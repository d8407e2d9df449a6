//! Streaming checksum mixin (§4.5). Folds sequential write bytes into a
//! running digest; any non-sequential write disables it permanently for
//! the handle's lifetime (one-shot, never re-enabled mid-handle).

use md5::{Digest, Md5};

pub struct Checksumer {
    hasher: Md5,
    pos: u64,
    enabled: bool,
}

impl Checksumer {
    pub fn new() -> Self {
        Self {
            hasher: Md5::new(),
            pos: 0,
            enabled: true,
        }
    }

    pub fn on_write(&mut self, offset: u64, buf: &[u8]) {
        if !self.enabled {
            return;
        }
        if offset == self.pos {
            self.hasher.update(buf);
            self.pos += buf.len() as u64;
        } else {
            self.enabled = false;
        }
    }

    /// `"<KIND>:<hex>"` if the stream stayed sequential, else `None`.
    pub fn finish(&self) -> Option<String> {
        if !self.enabled {
            return None;
        }
        let digest = self.hasher.clone().finalize();
        Some(format!("MD5:{:x}", digest))
    }

    /// Re-arms the digest for handle reuse after a successful commit.
    pub fn reset(&mut self) {
        self.hasher = Md5::new();
        self.pos = 0;
        self.enabled = true;
    }
}

impl Default for Checksumer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_writes_match_full_digest() {
        let mut c = Checksumer::new();
        c.on_write(0, b"hello ");
        c.on_write(6, b"world");
        let got = c.finish().unwrap();

        let mut whole = Md5::new();
        whole.update(b"hello world");
        let want = format!("MD5:{:x}", whole.finalize());
        assert_eq!(got, want);
    }

    #[test]
    fn non_sequential_write_disables_permanently() {
        let mut c = Checksumer::new();
        c.on_write(0, b"abc");
        c.on_write(10, b"skip");
        assert!(c.finish().is_none());
        c.on_write(3, b"def");
        assert!(c.finish().is_none());
    }
}
