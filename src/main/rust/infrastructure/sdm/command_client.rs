use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{
    AccessTokenProvider, DeviceCommandApi, RtspStreamGrant, StreamExtension, WebRtcStreamGrant,
};

const COMMAND_PREFIX: &str = "sdm.devices.commands.CameraLiveStream";

#[derive(Debug, Deserialize)]
struct CommandResponse<T> {
    results: Option<T>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StreamUrls {
    rtsp_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RtspResults {
    #[serde(default)]
    stream_extension_token: String,
    #[serde(default)]
    stream_urls: StreamUrls,
    expires_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebRtcResults {
    #[serde(default)]
    answer_sdp: String,
    #[serde(default)]
    media_session_id: String,
    expires_at: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtensionResults {
    stream_extension_token: Option<String>,
    media_session_id: Option<String>,
    expires_at: Option<String>,
}

/// Device command API client over the SDM `executeCommand` endpoint
pub struct SdmCommandClient {
    http: reqwest::Client,
    base_url: Url,
    tokens: Arc<dyn AccessTokenProvider>,
}

impl SdmCommandClient {
    pub fn new(base_url: &str, tokens: Arc<dyn AccessTokenProvider>, timeout: Duration) -> Result<Self> {
        let base_url =
            Url::parse(base_url).map_err(|e| DomainError::InvalidUrl(format!("{base_url}: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::remote("client", e))?;
        Ok(Self {
            http,
            base_url,
            tokens,
        })
    }

    fn command_url(&self, device_name: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/v1/{device_name}:executeCommand"))
            .map_err(|e| DomainError::InvalidUrl(format!("{device_name}: {e}")))
    }

    async fn execute<T: DeserializeOwned + Default>(
        &self,
        device_name: &str,
        command: &str,
        params: Value,
        redirect_hint: Option<&str>,
    ) -> Result<T> {
        let url = self.command_url(device_name)?;
        let token = self.tokens.access_token(redirect_hint).await?;
        let qualified = format!("{COMMAND_PREFIX}.{command}");

        tracing::debug!(device = %device_name, command = %command, "Executing device command");
        let response = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&json!({ "command": qualified, "params": params }))
            .send()
            .await
            .map_err(|e| DomainError::remote(command, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(device = %device_name, command = %command, status = %status, "Device command rejected");
            return Err(DomainError::remote(command, format!("{status}: {body}")));
        }

        let body: CommandResponse<T> = response
            .json()
            .await
            .map_err(|e| DomainError::remote(command, format!("invalid response: {e}")))?;
        Ok(body.results.unwrap_or_default())
    }
}

#[async_trait]
impl DeviceCommandApi for SdmCommandClient {
    async fn generate_rtsp_stream(
        &self,
        device_name: &str,
        redirect_hint: Option<&str>,
    ) -> Result<RtspStreamGrant> {
        let results: RtspResults = self
            .execute(device_name, "GenerateRtspStream", json!({}), redirect_hint)
            .await?;
        Ok(RtspStreamGrant {
            stream_extension_token: results.stream_extension_token,
            stream_url: results.stream_urls.rtsp_url,
            expires_at: results.expires_at,
        })
    }

    async fn generate_webrtc_stream(
        &self,
        device_name: &str,
        offer_sdp: &str,
        redirect_hint: Option<&str>,
    ) -> Result<WebRtcStreamGrant> {
        let results: WebRtcResults = self
            .execute(
                device_name,
                "GenerateWebRtcStream",
                json!({ "offerSdp": offer_sdp }),
                redirect_hint,
            )
            .await?;
        Ok(WebRtcStreamGrant {
            answer_sdp: results.answer_sdp,
            media_session_id: results.media_session_id,
            expires_at: results.expires_at,
        })
    }

    async fn extend_rtsp_stream(
        &self,
        device_name: &str,
        stream_extension_token: &str,
        redirect_hint: Option<&str>,
    ) -> Result<StreamExtension> {
        let results: ExtensionResults = self
            .execute(
                device_name,
                "ExtendRtspStream",
                json!({ "streamExtensionToken": stream_extension_token }),
                redirect_hint,
            )
            .await?;
        Ok(StreamExtension {
            token: results.stream_extension_token,
            expires_at: results.expires_at,
        })
    }

    async fn extend_webrtc_stream(
        &self,
        device_name: &str,
        media_session_id: &str,
        redirect_hint: Option<&str>,
    ) -> Result<StreamExtension> {
        let results: ExtensionResults = self
            .execute(
                device_name,
                "ExtendWebRtcStream",
                json!({ "mediaSessionId": media_session_id }),
                redirect_hint,
            )
            .await?;
        Ok(StreamExtension {
            token: results.media_session_id,
            expires_at: results.expires_at,
        })
    }
}

/// Access token supplied through configuration
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl AccessTokenProvider for StaticTokenProvider {
    async fn access_token(&self, _redirect_hint: Option<&str>) -> Result<String> {
        if self.token.is_empty() {
            return Err(DomainError::remote("credentials", "no access token configured"));
        }
        Ok(self.token.clone())
    }
}
