use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::LocalMediaEngine;

/// Local media engine reached over WHIP (`POST /<path>/whip`, `application/sdp`)
pub struct WhipMediaEngine {
    http: reqwest::Client,
    base_url: Url,
}

impl WhipMediaEngine {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| DomainError::InvalidUrl(format!("{base_url}: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::LocalMediaEngine(e.to_string()))?;
        Ok(Self { http, base_url })
    }

    fn whip_url(&self, path: &str) -> Result<Url> {
        if path.is_empty() || path.contains('/') {
            return Err(DomainError::InvalidMediaPath(path.to_string()));
        }
        let mut url = self.base_url.clone();
        url.set_path(&format!("/{path}/whip"));
        Ok(url)
    }
}

#[async_trait]
impl LocalMediaEngine for WhipMediaEngine {
    async fn publish_offer(&self, path_hint: &str, offer_sdp: &str) -> Result<String> {
        let url = self.whip_url(path_hint)?;
        tracing::debug!(url = %url, "Posting offer to local media engine");

        let response = self
            .http
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/sdp")
            .body(offer_sdp.to_string())
            .send()
            .await
            .map_err(|e| DomainError::LocalMediaEngine(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DomainError::LocalMediaEngine(format!("{status}: {body}")));
        }
        Ok(path_hint.to_string())
    }
}
