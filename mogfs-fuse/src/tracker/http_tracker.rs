//! Default tracker backend: talks to a MogileFS-style tracker over a thin
//! JSON-RPC-over-HTTP surface. Grounded in the teacher's `api_client.rs`
//! (reqwest + serde, one function per verb), generalized from a generic
//! file server to the tracker verbs in §4.1.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{CreateCloseArgs, CreateOpen, DeviceInfo, DirEntry, FileInfo, TrackerClient};
use crate::error::{FsError, FsResult};

pub struct HttpTrackerClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTrackerClient {
    pub fn new(client: reqwest::Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    async fn tracker_error_or<T>(resp: reqwest::Response) -> FsResult<T>
    where
        T: for<'de> Deserialize<'de>,
    {
        if resp.status().is_success() {
            Ok(resp.json::<T>().await?)
        } else {
            Err(Self::parse_tracker_error(resp).await)
        }
    }

    async fn parse_tracker_error(resp: reqwest::Response) -> FsError {
        #[derive(Deserialize)]
        struct TrackerErrorBody {
            errcode: String,
            errstr: String,
        }
        match resp.json::<TrackerErrorBody>().await {
            Ok(body) => FsError::Tracker {
                errcode: body.errcode,
                errstr: body.errstr,
            },
            Err(e) => FsError::Io(e.to_string()),
        }
    }
}

#[async_trait]
impl TrackerClient for HttpTrackerClient {
    async fn list(&self, dir: &str) -> FsResult<Vec<DirEntry>> {
        let url = format!("{}/list{}", self.base_url, dir);
        let resp = self.client.get(&url).send().await?;
        Self::tracker_error_or(resp).await
    }

    async fn get_paths(&self, key: &str) -> FsResult<Vec<String>> {
        let url = format!("{}/paths{}", self.base_url, key);
        let resp = self.client.get(&url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        Self::tracker_error_or(resp).await
    }

    async fn file_info(&self, key: &str, devices: bool) -> FsResult<FileInfo> {
        let url = format!("{}/file_info{}?devices={}", self.base_url, key, devices as u8);
        let resp = self.client.get(&url).send().await?;
        Self::tracker_error_or(resp).await
    }

    async fn create_open(&self, domain: &str, class: Option<&str>, key: &str) -> FsResult<CreateOpen> {
        #[derive(Deserialize)]
        struct Resp {
            fid: u64,
            devid: u32,
            url: String,
        }
        let url = format!("{}/create_open", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&json!({ "domain": domain, "class": class, "key": key }))
            .send()
            .await?;
        let r: Resp = Self::tracker_error_or(resp).await?;
        Ok(CreateOpen {
            fid: r.fid,
            devid: r.devid,
            url: r.url,
        })
    }

    async fn create_close(&self, args: CreateCloseArgs<'_>) -> FsResult<()> {
        #[derive(Serialize)]
        struct Body<'a> {
            fid: u64,
            devid: u32,
            domain: &'a str,
            key: &'a str,
            path: &'a str,
            size: u64,
            #[serde(rename = "plugin.meta.keys")]
            meta_keys: u32,
            #[serde(rename = "plugin.meta.key0")]
            meta_key0: &'static str,
            #[serde(rename = "plugin.meta.value0")]
            meta_value0: i64,
            #[serde(skip_serializing_if = "Option::is_none")]
            checksum: Option<&'a str>,
            #[serde(skip_serializing_if = "Option::is_none")]
            checksumverify: Option<u32>,
        }
        let body = Body {
            fid: args.fid,
            devid: args.devid,
            domain: args.domain,
            key: args.key,
            path: args.path,
            size: args.size,
            meta_keys: 1,
            meta_key0: "mtime",
            meta_value0: args.mtime,
            checksum: args.checksum.as_deref(),
            checksumverify: args.checksum.as_ref().map(|_| 1),
        };
        let url = format!("{}/create_close", self.base_url);
        let resp = self.client.post(&url).json(&body).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::parse_tracker_error(resp).await)
        }
    }

    async fn delete(&self, key: &str) -> FsResult<()> {
        let url = format!("{}/key{}", self.base_url, key);
        let resp = self.client.delete(&url).send().await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::parse_tracker_error(resp).await)
        }
    }

    async fn rename(&self, old_key: &str, new_key: &str) -> FsResult<()> {
        let url = format!("{}/rename", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&json!({ "old": old_key, "new": new_key }))
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::parse_tracker_error(resp).await)
        }
    }

    async fn update_class(&self, key: &str, class: &str) -> FsResult<()> {
        let url = format!("{}/update_class", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&json!({ "key": key, "class": class }))
            .send()
            .await?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(Self::parse_tracker_error(resp).await)
        }
    }

    async fn get_devices(&self) -> FsResult<Vec<DeviceInfo>> {
        let url = format!("{}/devices", self.base_url);
        let resp = self.client.get(&url).send().await?;
        Self::tracker_error_or(resp).await
    }
}
