use std::collections::BTreeMap;

/// ICE credentials of the local media engine endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct IceParameters {
    pub username_fragment: String,
    pub password: String,
    pub ice_lite: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IceCandidate {
    pub foundation: String,
    pub priority: u32,
    pub address: String,
    /// `udp` or `tcp`
    pub protocol: String,
    pub port: u16,
    /// `host`, `srflx`, `relay`, ...
    pub candidate_type: String,
    pub tcp_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DtlsRole {
    #[default]
    Auto,
    Client,
    Server,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DtlsFingerprint {
    pub algorithm: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DtlsParameters {
    pub role: DtlsRole,
    pub fingerprints: Vec<DtlsFingerprint>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SctpParameters {
    pub port: u16,
    pub max_message_size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Audio,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Audio => "audio",
            MediaKind::Video => "video",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RtcpFeedback {
    pub feedback_type: String,
    pub parameter: Option<String>,
}

impl RtcpFeedback {
    pub fn new(feedback_type: &str) -> Self {
        Self {
            feedback_type: feedback_type.to_string(),
            parameter: None,
        }
    }

    pub fn with_parameter(feedback_type: &str, parameter: &str) -> Self {
        Self {
            feedback_type: feedback_type.to_string(),
            parameter: Some(parameter.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RtpCodec {
    /// e.g. `audio/opus`, `video/H264`
    pub mime_type: String,
    pub payload_type: u8,
    pub clock_rate: u32,
    pub channels: Option<u8>,
    pub parameters: BTreeMap<String, String>,
    pub rtcp_feedback: Vec<RtcpFeedback>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RtpHeaderExtension {
    pub id: u8,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RtpEncoding {
    pub ssrc: Option<u32>,
    pub rid: Option<String>,
    pub codec_payload_type: Option<u8>,
    pub rtx_ssrc: Option<u32>,
    pub scalability_mode: Option<String>,
    /// Bits per second
    pub max_bitrate: Option<u32>,
    pub max_framerate: Option<u32>,
    pub adaptive_ptime: Option<bool>,
}

/// One RTP producer on the local transport
#[derive(Debug, Clone, PartialEq)]
pub struct RtpProducer {
    pub mid: String,
    pub kind: MediaKind,
    pub codecs: Vec<RtpCodec>,
    pub header_extensions: Vec<RtpHeaderExtension>,
    pub encodings: Vec<RtpEncoding>,
}

impl RtpProducer {
    /// Opus producer the bridge registers for camera audio
    pub fn bridge_audio() -> Self {
        Self {
            mid: "audio".to_string(),
            kind: MediaKind::Audio,
            codecs: vec![RtpCodec {
                mime_type: "audio/opus".to_string(),
                payload_type: 111,
                clock_rate: 48000,
                channels: Some(2),
                parameters: BTreeMap::from([
                    ("minptime".to_string(), "10".to_string()),
                    ("useinbandfec".to_string(), "1".to_string()),
                ]),
                rtcp_feedback: vec![RtcpFeedback::new("transport-cc")],
            }],
            header_extensions: Vec::new(),
            encodings: vec![RtpEncoding {
                ssrc: Some(1111),
                ..Default::default()
            }],
        }
    }

    /// H.264 baseline producer the bridge registers for camera video
    pub fn bridge_video() -> Self {
        Self {
            mid: "video".to_string(),
            kind: MediaKind::Video,
            codecs: vec![RtpCodec {
                mime_type: "video/H264".to_string(),
                payload_type: 100,
                clock_rate: 90000,
                channels: None,
                parameters: BTreeMap::from([
                    ("level-asymmetry-allowed".to_string(), "1".to_string()),
                    ("packetization-mode".to_string(), "1".to_string()),
                    ("profile-level-id".to_string(), "42001f".to_string()),
                ]),
                rtcp_feedback: vec![
                    RtcpFeedback::new("nack"),
                    RtcpFeedback::with_parameter("nack", "pli"),
                    RtcpFeedback::new("transport-cc"),
                ],
            }],
            header_extensions: Vec::new(),
            encodings: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataProducer {
    pub mid: String,
    pub label: String,
    pub stream_id: u16,
}

impl DataProducer {
    pub fn bridge_data() -> Self {
        Self {
            mid: "data".to_string(),
            label: "data".to_string(),
            stream_id: 1,
        }
    }
}

/// Description of one real-time endpoint on the local media engine.
///
/// Built once per session attempt and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalTransportDescriptor {
    ice_parameters: IceParameters,
    ice_candidates: Vec<IceCandidate>,
    dtls_parameters: DtlsParameters,
    sctp_parameters: Option<SctpParameters>,
    audio: RtpProducer,
    video: RtpProducer,
    data: DataProducer,
}

impl LocalTransportDescriptor {
    pub fn new(
        ice_parameters: IceParameters,
        ice_candidates: Vec<IceCandidate>,
        dtls_parameters: DtlsParameters,
    ) -> Self {
        Self {
            ice_parameters,
            ice_candidates,
            dtls_parameters,
            sctp_parameters: None,
            audio: RtpProducer::bridge_audio(),
            video: RtpProducer::bridge_video(),
            data: DataProducer::bridge_data(),
        }
    }

    pub fn with_sctp(mut self, sctp: SctpParameters) -> Self {
        self.sctp_parameters = Some(sctp);
        self
    }

    pub fn with_audio(mut self, audio: RtpProducer) -> Self {
        self.audio = audio;
        self
    }

    pub fn with_video(mut self, video: RtpProducer) -> Self {
        self.video = video;
        self
    }

    pub fn with_data(mut self, data: DataProducer) -> Self {
        self.data = data;
        self
    }

    pub fn ice_parameters(&self) -> &IceParameters {
        &self.ice_parameters
    }

    pub fn ice_candidates(&self) -> &[IceCandidate] {
        &self.ice_candidates
    }

    pub fn dtls_parameters(&self) -> &DtlsParameters {
        &self.dtls_parameters
    }

    pub fn sctp_parameters(&self) -> Option<&SctpParameters> {
        self.sctp_parameters.as_ref()
    }

    pub fn audio(&self) -> &RtpProducer {
        &self.audio
    }

    pub fn video(&self) -> &RtpProducer {
        &self.video
    }

    pub fn data(&self) -> &DataProducer {
        &self.data
    }
}
