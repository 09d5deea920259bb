use std::collections::BTreeMap;
use std::fmt;

pub const CRLF: &str = "\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setup {
    Active,
    Passive,
    ActPass,
}

impl Setup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Setup::Active => "active",
            Setup::Passive => "passive",
            Setup::ActPass => "actpass",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    SendRecv,
    SendOnly,
    RecvOnly,
    Inactive,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::SendRecv => "sendrecv",
            Direction::SendOnly => "sendonly",
            Direction::RecvOnly => "recvonly",
            Direction::Inactive => "inactive",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IceInfo {
    pub ufrag: String,
    pub pwd: String,
    pub lite: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DtlsInfo {
    pub setup: Setup,
    pub algorithm: String,
    pub fingerprint: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateInfo {
    pub foundation: String,
    pub component: u8,
    pub transport: String,
    pub priority: u32,
    pub address: String,
    pub port: u16,
    pub candidate_type: String,
    pub tcp_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CodecInfo {
    pub name: String,
    pub payload_type: u8,
    pub clock_rate: u32,
    pub channels: u8,
    pub parameters: BTreeMap<String, String>,
    /// `(type, parameter)` pairs, parameter may be empty
    pub rtcp_feedback: Vec<(String, String)>,
    pub rtx: Option<RtxInfo>,
}

/// Retransmission stream bound to a codec's primary SSRC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtxInfo {
    pub primary_ssrc: Option<u32>,
    pub rtx_ssrc: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RidInfo {
    pub id: String,
    pub formats: Vec<u8>,
    /// Ordered `key=value` restrictions
    pub params: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataChannelInfo {
    pub port: u16,
    pub max_message_size: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaInfo {
    pub mid: String,
    pub kind: String,
    pub direction: Direction,
    /// Bits per second
    pub bitrate: Option<u32>,
    pub extensions: Vec<(u8, String)>,
    pub codecs: Vec<CodecInfo>,
    pub rids: Vec<RidInfo>,
    pub simulcast: Vec<String>,
    pub candidates: Vec<CandidateInfo>,
    pub data_channel: Option<DataChannelInfo>,
}

impl MediaInfo {
    pub fn new(mid: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            mid: mid.into(),
            kind: kind.into(),
            direction: Direction::SendRecv,
            bitrate: None,
            extensions: Vec::new(),
            codecs: Vec::new(),
            rids: Vec::new(),
            simulcast: Vec::new(),
            candidates: Vec::new(),
            data_channel: None,
        }
    }

    fn is_application(&self) -> bool {
        self.kind == "application"
    }
}

/// Structured session description, rendered with CRLF line endings
#[derive(Debug, Clone, PartialEq)]
pub struct SessionDescription {
    pub version: u64,
    pub ice: Option<IceInfo>,
    pub dtls: Vec<DtlsInfo>,
    pub media: Vec<MediaInfo>,
}

impl SessionDescription {
    pub fn new(version: u64) -> Self {
        Self {
            version,
            ice: None,
            dtls: Vec::new(),
            media: Vec::new(),
        }
    }
}

impl fmt::Display for SessionDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v=0{CRLF}")?;
        write!(
            f,
            "o=- {} {} IN IP4 127.0.0.1{CRLF}",
            self.version, self.version
        )?;
        write!(f, "s=-{CRLF}t=0 0{CRLF}")?;

        if let Some(ice) = &self.ice {
            if ice.lite {
                write!(f, "a=ice-lite{CRLF}")?;
            }
            write!(f, "a=ice-ufrag:{}{CRLF}", ice.ufrag)?;
            write!(f, "a=ice-pwd:{}{CRLF}", ice.pwd)?;
        }
        for dtls in &self.dtls {
            write!(f, "a=fingerprint:{} {}{CRLF}", dtls.algorithm, dtls.fingerprint)?;
        }
        if let Some(dtls) = self.dtls.first() {
            write!(f, "a=setup:{}{CRLF}", dtls.setup.as_str())?;
        }
        if !self.media.is_empty() {
            let mids: Vec<&str> = self.media.iter().map(|m| m.mid.as_str()).collect();
            write!(f, "a=group:BUNDLE {}{CRLF}", mids.join(" "))?;
        }
        write!(f, "a=msid-semantic: WMS *{CRLF}")?;

        for media in &self.media {
            write!(f, "{media}")?;
        }
        Ok(())
    }
}

impl fmt::Display for MediaInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_application() {
            write!(f, "m=application 9 UDP/DTLS/SCTP webrtc-datachannel{CRLF}")?;
        } else {
            let formats: Vec<String> = self
                .codecs
                .iter()
                .map(|c| c.payload_type.to_string())
                .collect();
            write!(
                f,
                "m={} 9 UDP/TLS/RTP/SAVPF {}{CRLF}",
                self.kind,
                formats.join(" ")
            )?;
        }
        write!(f, "c=IN IP4 0.0.0.0{CRLF}")?;
        if let Some(bitrate) = self.bitrate {
            write!(f, "b=AS:{}{CRLF}", bitrate / 1000)?;
        }
        write!(f, "a=mid:{}{CRLF}", self.mid)?;
        for (id, uri) in &self.extensions {
            write!(f, "a=extmap:{id} {uri}{CRLF}")?;
        }
        write!(f, "a={}{CRLF}", self.direction.as_str())?;

        if !self.is_application() {
            write!(f, "a=rtcp-mux{CRLF}a=rtcp-rsize{CRLF}")?;
        }

        for codec in &self.codecs {
            write!(f, "{codec}")?;
        }

        for rid in &self.rids {
            let formats: Vec<String> = rid.formats.iter().map(u8::to_string).collect();
            write!(f, "a=rid:{} send pt={}", rid.id, formats.join(","))?;
            for (key, value) in &rid.params {
                write!(f, ";{key}={value}")?;
            }
            write!(f, "{CRLF}")?;
        }
        if !self.simulcast.is_empty() {
            write!(f, "a=simulcast:send {}{CRLF}", self.simulcast.join(";"))?;
        }

        if let Some(data) = &self.data_channel {
            write!(f, "a=sctp-port:{}{CRLF}", data.port)?;
            write!(f, "a=max-message-size:{}{CRLF}", data.max_message_size)?;
        }

        for candidate in &self.candidates {
            write!(
                f,
                "a=candidate:{} {} {} {} {} {} typ {}",
                candidate.foundation,
                candidate.component,
                candidate.transport,
                candidate.priority,
                candidate.address,
                candidate.port,
                candidate.candidate_type
            )?;
            if let Some(tcp_type) = &candidate.tcp_type {
                write!(f, " tcptype {tcp_type}")?;
            }
            write!(f, "{CRLF}")?;
        }
        if !self.candidates.is_empty() {
            write!(f, "a=end-of-candidates{CRLF}")?;
        }
        Ok(())
    }
}

impl fmt::Display for CodecInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pt = self.payload_type;
        write!(f, "a=rtpmap:{pt} {}/{}", self.name, self.clock_rate)?;
        if self.channels > 1 {
            write!(f, "/{}", self.channels)?;
        }
        write!(f, "{CRLF}")?;

        if !self.parameters.is_empty() {
            let params: Vec<String> = self
                .parameters
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            write!(f, "a=fmtp:{pt} {}{CRLF}", params.join(";"))?;
        }
        for (fb_type, fb_param) in &self.rtcp_feedback {
            if fb_param.is_empty() {
                write!(f, "a=rtcp-fb:{pt} {fb_type}{CRLF}")?;
            } else {
                write!(f, "a=rtcp-fb:{pt} {fb_type} {fb_param}{CRLF}")?;
            }
        }
        if let Some(rtx) = &self.rtx {
            if let Some(primary) = rtx.primary_ssrc {
                write!(f, "a=ssrc-group:FID {primary} {}{CRLF}", rtx.rtx_ssrc)?;
            }
            write!(f, "a=ssrc:{} cname:{}-rtx{CRLF}", rtx.rtx_ssrc, self.name)?;
        }
        Ok(())
    }
}
