//! Peer-side client for the tracker's HTTP surface. Mirrors the shape of
//! the teacher's `tracker_comms_http.rs`: a small struct wrapping a
//! `reqwest::Client`, one method per tracker operation.

use mt_core::constants::TRACKER_REQUEST_TIMEOUT;
use mt_core::proto::{
    AnnounceRequest, FileInfoResponse, GenerateFileIdRequest, GenerateFileIdResponse, ListResponse,
};
use mt_core::FileId;

#[derive(Clone)]
pub struct TrackerClient {
    http: reqwest::Client,
    base_url: String,
}

impl TrackerClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(TRACKER_REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client builder should not fail with no TLS config");
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub async fn announce(&self, req: &AnnounceRequest) -> anyhow::Result<()> {
        let resp = self
            .http
            .post(format!("{}/announce", self.base_url))
            .json(req)
            .send()
            .await?;
        if !resp.status().is_success() {
            anyhow::bail!("announce failed: {}", resp.status());
        }
        Ok(())
    }

    pub async fn list(&self) -> anyhow::Result<ListResponse> {
        let resp = self
            .http
            .get(format!("{}/list", self.base_url))
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    pub async fn get_file(&self, file_id: &FileId) -> anyhow::Result<FileInfoResponse> {
        let resp = self
            .http
            .get(format!("{}/file/{}", self.base_url, file_id))
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }

    pub async fn generate_file_id(&self, filename: &str, size: u64) -> anyhow::Result<FileId> {
        let req = GenerateFileIdRequest {
            filename: filename.to_string(),
            size,
        };
        let resp: GenerateFileIdResponse = self
            .http
            .post(format!("{}/generate_file_id", self.base_url))
            .json(&req)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(resp.file_id)
    }
}
