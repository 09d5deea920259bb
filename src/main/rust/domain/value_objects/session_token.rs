use super::StreamProtocol;

/// Protocol-specific continuation credential for a live stream
#[derive(Debug, Clone, PartialEq)]
pub enum SessionToken {
    Rtsp {
        stream_extension_token: String,
        stream_url: Option<String>,
    },
    WebRtc {
        media_session_id: String,
        answer_sdp: String,
    },
}

impl SessionToken {
    pub fn protocol(&self) -> StreamProtocol {
        match self {
            SessionToken::Rtsp { .. } => StreamProtocol::Rtsp,
            SessionToken::WebRtc { .. } => StreamProtocol::WebRtc,
        }
    }

    /// The value the command API expects back on extension
    pub fn value(&self) -> &str {
        match self {
            SessionToken::Rtsp {
                stream_extension_token,
                ..
            } => stream_extension_token,
            SessionToken::WebRtc {
                media_session_id, ..
            } => media_session_id,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.value().is_empty()
    }

    /// Merge a refreshed token value, keeping the stream URL or answer
    pub fn merged(&self, refreshed: String) -> Self {
        match self {
            SessionToken::Rtsp { stream_url, .. } => SessionToken::Rtsp {
                stream_extension_token: refreshed,
                stream_url: stream_url.clone(),
            },
            SessionToken::WebRtc { answer_sdp, .. } => SessionToken::WebRtc {
                media_session_id: refreshed,
                answer_sdp: answer_sdp.clone(),
            },
        }
    }

    pub fn stream_url(&self) -> Option<&str> {
        match self {
            SessionToken::Rtsp { stream_url, .. } => stream_url.as_deref(),
            SessionToken::WebRtc { .. } => None,
        }
    }

    pub fn answer_sdp(&self) -> Option<&str> {
        match self {
            SessionToken::Rtsp { .. } => None,
            SessionToken::WebRtc { answer_sdp, .. } => Some(answer_sdp),
        }
    }
}
