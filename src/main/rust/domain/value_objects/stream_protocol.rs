use std::fmt;

use serde::{Deserialize, Serialize};

/// Streaming protocol advertised by a cloud camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamProtocol {
    #[serde(rename = "RTSP")]
    Rtsp,
    #[serde(rename = "WEB_RTC")]
    WebRtc,
}

impl StreamProtocol {
    /// Name used by the device management API in `supportedProtocols`
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamProtocol::Rtsp => "RTSP",
            StreamProtocol::WebRtc => "WEB_RTC",
        }
    }

    pub fn from_capability(value: &str) -> Option<Self> {
        match value {
            "RTSP" => Some(StreamProtocol::Rtsp),
            "WEB_RTC" => Some(StreamProtocol::WebRtc),
            _ => None,
        }
    }
}

impl fmt::Display for StreamProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rtsp => write!(f, "RTSP"),
            Self::WebRtc => write!(f, "WEBRTC"),
        }
    }
}
