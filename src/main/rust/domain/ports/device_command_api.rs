use async_trait::async_trait;

use crate::domain::errors::Result;

/// Result of a generate-RTSP-stream command
#[derive(Debug, Clone, PartialEq)]
pub struct RtspStreamGrant {
    pub stream_extension_token: String,
    /// Authentication-bearing RTSP URL
    pub stream_url: Option<String>,
    pub expires_at: Option<String>,
}

/// Result of a generate-WebRTC-stream command
#[derive(Debug, Clone, PartialEq)]
pub struct WebRtcStreamGrant {
    pub answer_sdp: String,
    pub media_session_id: String,
    pub expires_at: Option<String>,
}

/// Result of an extend command; an absent or empty token is a rejection
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StreamExtension {
    pub token: Option<String>,
    pub expires_at: Option<String>,
}

/// Port for the cloud device command API.
///
/// `redirect_hint` selects the credential used for the call.
#[async_trait]
pub trait DeviceCommandApi: Send + Sync {
    async fn generate_rtsp_stream(
        &self,
        device_name: &str,
        redirect_hint: Option<&str>,
    ) -> Result<RtspStreamGrant>;

    async fn generate_webrtc_stream(
        &self,
        device_name: &str,
        offer_sdp: &str,
        redirect_hint: Option<&str>,
    ) -> Result<WebRtcStreamGrant>;

    async fn extend_rtsp_stream(
        &self,
        device_name: &str,
        stream_extension_token: &str,
        redirect_hint: Option<&str>,
    ) -> Result<StreamExtension>;

    async fn extend_webrtc_stream(
        &self,
        device_name: &str,
        media_session_id: &str,
        redirect_hint: Option<&str>,
    ) -> Result<StreamExtension>;
}
