//! Storage-node HTTP transport (§4.2).
//!
//! One synchronous-looking primitive over a pooled `reqwest::Client`: GET
//! with `Range:` and PUT with `Content-Range:` against a storage node URL.
//! Grounded in the teacher's `api_client.rs`, which built one reqwest
//! client per worker and reused it across calls; generalized here to the
//! byte-range verbs storage nodes expose instead of whole-file verbs.

use std::time::Duration;

use bytes::Bytes;

use crate::error::{FsError, FsResult};

/// Outcome of a ranged GET, distinguishing "no more bytes at this offset"
/// from a genuine transport failure so callers can treat it as end-of-object.
pub enum RangeStatus {
    Ok(Bytes),
    NotSatisfiable,
}

pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        let client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .timeout(Duration::from_secs(5))
            .build()
            .expect("transport client config is static and always valid");
        Self { client }
    }

    /// GET `url` for `[offset, offset+len)`. A 416 is reported as
    /// [`RangeStatus::NotSatisfiable`], never as an error.
    pub async fn get_range(&self, url: &str, offset: u64, len: u64) -> FsResult<RangeStatus> {
        if len == 0 {
            return Ok(RangeStatus::Ok(Bytes::new()));
        }
        let range = format!("bytes={}-{}", offset, offset + len - 1);
        let resp = self
            .client
            .get(url)
            .header(reqwest::header::RANGE, range)
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::RANGE_NOT_SATISFIABLE {
            return Ok(RangeStatus::NotSatisfiable);
        }
        if !resp.status().is_success() {
            return Err(FsError::Io(format!(
                "GET {} -> {}",
                url,
                resp.status()
            )));
        }
        Ok(RangeStatus::Ok(resp.bytes().await?))
    }

    /// PUT `bytes` to `url` at `[offset, offset+bytes.len())`.
    pub async fn put_range(&self, url: &str, offset: u64, bytes: Bytes) -> FsResult<u64> {
        if bytes.is_empty() {
            return Ok(0);
        }
        let len = bytes.len() as u64;
        let content_range = format!("bytes {}-{}/*", offset, offset + len - 1);
        let resp = self
            .client
            .put(url)
            .header(reqwest::header::CONTENT_RANGE, content_range)
            .body(bytes)
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(FsError::Io(format!(
                "PUT {} -> {}",
                url,
                resp.status()
            )));
        }
        Ok(len)
    }

    /// Materializes a brand-new zero-length object at `url`, used by
    /// `create()` to probe-commit an empty file before the real open.
    pub async fn put_empty(&self, url: &str) -> FsResult<()> {
        let resp = self.client.put(url).body(Bytes::new()).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(FsError::Io(format!("PUT {} -> {}", url, resp.status())))
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}
