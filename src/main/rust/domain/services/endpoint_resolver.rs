use url::Url;

use crate::domain::errors::{DomainError, Result};

const DEFAULT_HOST: &str = "localhost";

/// Playback surfaces exposed by the local media server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointProtocol {
    RtspTcp,
    RtspUdpRtp,
    RtspUdpRtcp,
    Rtmp,
    Hls,
    HlsM3u8,
    WebRtc,
    Srt,
}

impl EndpointProtocol {
    fn scheme(&self) -> &'static str {
        match self {
            Self::RtspTcp | Self::RtspUdpRtp | Self::RtspUdpRtcp => "rtsp",
            Self::Rtmp => "rtmp",
            Self::Hls | Self::HlsM3u8 | Self::WebRtc => "http",
            Self::Srt => "srt",
        }
    }
}

/// Listening ports of the local media server; zero or negative disables a protocol
#[derive(Debug, Clone, PartialEq)]
pub struct EndpointPorts {
    pub rtsp_tcp: i32,
    pub rtsp_udp_rtp: i32,
    pub rtsp_udp_rtcp: i32,
    pub rtmp: i32,
    pub hls: i32,
    pub webrtc: i32,
    pub srt: i32,
}

impl EndpointPorts {
    pub fn port_for(&self, protocol: EndpointProtocol) -> i32 {
        match protocol {
            EndpointProtocol::RtspTcp => self.rtsp_tcp,
            EndpointProtocol::RtspUdpRtp => self.rtsp_udp_rtp,
            EndpointProtocol::RtspUdpRtcp => self.rtsp_udp_rtcp,
            EndpointProtocol::Rtmp => self.rtmp,
            EndpointProtocol::Hls | EndpointProtocol::HlsM3u8 => self.hls,
            EndpointProtocol::WebRtc => self.webrtc,
            EndpointProtocol::Srt => self.srt,
        }
    }
}

impl Default for EndpointPorts {
    fn default() -> Self {
        Self {
            rtsp_tcp: 8554,
            rtsp_udp_rtp: 8000,
            rtsp_udp_rtcp: 8001,
            rtmp: 1935,
            hls: 8888,
            webrtc: 8889,
            srt: 8890,
        }
    }
}

/// Every playback URL for one media path
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PublicEndpoints {
    pub rtsp_tcp: Option<String>,
    pub rtsp_udp_rtp: Option<String>,
    pub rtsp_udp_rtcp: Option<String>,
    pub rtmp: Option<String>,
    pub hls: Option<String>,
    pub hls_m3u8: Option<String>,
    pub webrtc: Option<String>,
    pub srt: Option<String>,
}

/// Builds playback URLs for streams served by the local media server
#[derive(Debug, Clone)]
pub struct EndpointResolver {
    host: String,
    ports: EndpointPorts,
}

impl EndpointResolver {
    pub fn new(host: Option<String>, ports: EndpointPorts) -> Self {
        let host = host
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        Self { host, ports }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn ports(&self) -> &EndpointPorts {
        &self.ports
    }

    /// URL for `media_path` over `protocol` on an explicit port.
    ///
    /// Returns `None` when the path is unset or the port is not positive.
    pub fn resolve(
        &self,
        media_path: Option<&str>,
        protocol: EndpointProtocol,
        port: i32,
    ) -> Option<String> {
        let path = media_path.filter(|p| !p.is_empty())?;
        if port <= 0 {
            return None;
        }

        let (pathname, query) = match protocol {
            EndpointProtocol::HlsM3u8 => (format!("/{path}/index.m3u8"), None),
            EndpointProtocol::Srt => (String::new(), Some(format!("streamid=read:{path}"))),
            _ => (format!("/{path}"), None),
        };

        let base = format!("{}://{}:{}", protocol.scheme(), self.host, port);
        let mut url = match Url::parse(&base) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(base = %base, error = %e, "Cannot build public endpoint");
                return None;
            }
        };
        url.set_path(&pathname);
        url.set_query(query.as_deref());
        Some(url.to_string())
    }

    /// URL for `media_path` over `protocol` on its configured port
    pub fn endpoint(&self, media_path: Option<&str>, protocol: EndpointProtocol) -> Option<String> {
        self.resolve(media_path, protocol, self.ports.port_for(protocol))
    }

    pub fn endpoints(&self, media_path: Option<&str>) -> PublicEndpoints {
        PublicEndpoints {
            rtsp_tcp: self.endpoint(media_path, EndpointProtocol::RtspTcp),
            rtsp_udp_rtp: self.endpoint(media_path, EndpointProtocol::RtspUdpRtp),
            rtsp_udp_rtcp: self.endpoint(media_path, EndpointProtocol::RtspUdpRtcp),
            rtmp: self.endpoint(media_path, EndpointProtocol::Rtmp),
            hls: self.endpoint(media_path, EndpointProtocol::Hls),
            hls_m3u8: self.endpoint(media_path, EndpointProtocol::HlsM3u8),
            webrtc: self.endpoint(media_path, EndpointProtocol::WebRtc),
            srt: self.endpoint(media_path, EndpointProtocol::Srt),
        }
    }
}

/// Where transcoding helpers publish a camera's stream into the media server
#[derive(Debug, Clone, PartialEq)]
pub struct PublishTarget {
    base_url: String,
    username: Option<String>,
    password: Option<String>,
}

impl PublishTarget {
    pub fn new(base_url: String) -> Result<Self> {
        Url::parse(&base_url).map_err(|e| DomainError::InvalidUrl(format!("{base_url}: {e}")))?;
        Ok(Self {
            base_url,
            username: None,
            password: None,
        })
    }

    pub fn with_credentials(mut self, username: Option<String>, password: Option<String>) -> Self {
        self.username = username.filter(|u| !u.is_empty());
        self.password = password.filter(|p| !p.is_empty());
        self
    }

    /// Publish URL for `path`, credentials embedded when configured
    pub fn destination(&self, path: &str) -> Result<String> {
        if path.is_empty() || path.contains('/') {
            return Err(DomainError::InvalidMediaPath(path.to_string()));
        }

        let mut url = Url::parse(&self.base_url)
            .map_err(|e| DomainError::InvalidUrl(format!("{}: {e}", self.base_url)))?;
        url.set_path(&format!("/{path}"));
        if let Some(username) = &self.username {
            url.set_username(username)
                .map_err(|_| DomainError::InvalidUrl(self.base_url.clone()))?;
        }
        if let Some(password) = &self.password {
            url.set_password(Some(password))
                .map_err(|_| DomainError::InvalidUrl(self.base_url.clone()))?;
        }
        Ok(url.to_string())
    }
}
