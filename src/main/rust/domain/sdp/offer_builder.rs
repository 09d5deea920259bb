use super::session_description::{
    CandidateInfo, CodecInfo, DataChannelInfo, Direction, DtlsInfo, IceInfo, MediaInfo, RidInfo,
    RtxInfo, SessionDescription, Setup,
};
use crate::domain::value_objects::{
    DataProducer, DtlsParameters, DtlsRole, IceCandidate, LocalTransportDescriptor, RtpProducer,
    SctpParameters,
};

const SESSION_VERSION: u64 = 1;

pub struct TransportDescriptionBuilder;

impl TransportDescriptionBuilder {
    /// Render the offer the local media engine is asked to answer
    pub fn build_offer(descriptor: &LocalTransportDescriptor) -> String {
        Self::describe(descriptor).to_string()
    }

    /// Structured form of [`Self::build_offer`]
    pub fn describe(descriptor: &LocalTransportDescriptor) -> SessionDescription {
        let mut sdp = SessionDescription::new(SESSION_VERSION);

        let ice = descriptor.ice_parameters();
        sdp.ice = Some(IceInfo {
            ufrag: ice.username_fragment.clone(),
            pwd: ice.password.clone(),
            lite: ice.ice_lite,
        });
        sdp.dtls = Self::dtls_infos(descriptor.dtls_parameters());

        let candidates: Vec<CandidateInfo> = descriptor
            .ice_candidates()
            .iter()
            .map(Self::candidate_info)
            .collect();

        for producer in [descriptor.audio(), descriptor.video()] {
            let mut media = Self::media_info(producer);
            media.candidates = candidates.clone();
            sdp.media.push(media);
        }

        let mut data = Self::data_info(descriptor.data(), descriptor.sctp_parameters());
        data.candidates = candidates;
        sdp.media.push(data);

        sdp
    }

    fn setup_for(role: DtlsRole) -> Setup {
        match role {
            DtlsRole::Client => Setup::Active,
            DtlsRole::Server => Setup::Passive,
            DtlsRole::Auto => Setup::ActPass,
        }
    }

    fn dtls_infos(dtls: &DtlsParameters) -> Vec<DtlsInfo> {
        let setup = Self::setup_for(dtls.role);
        dtls.fingerprints
            .iter()
            .map(|fp| DtlsInfo {
                setup,
                algorithm: fp.algorithm.clone(),
                fingerprint: fp.value.clone(),
            })
            .collect()
    }

    fn candidate_info(candidate: &IceCandidate) -> CandidateInfo {
        CandidateInfo {
            foundation: candidate.foundation.clone(),
            component: 1,
            transport: candidate.protocol.clone(),
            priority: candidate.priority,
            address: candidate.address.clone(),
            port: candidate.port,
            candidate_type: candidate.candidate_type.clone(),
            tcp_type: candidate.tcp_type.clone(),
        }
    }

    fn media_info(producer: &RtpProducer) -> MediaInfo {
        let kind = producer.kind.as_str();
        let mut media = MediaInfo::new(producer.mid.clone(), kind);

        media.extensions = producer
            .header_extensions
            .iter()
            .map(|ext| (ext.id, ext.uri.clone()))
            .collect();

        let formats: Vec<u8> = producer.codecs.iter().map(|c| c.payload_type).collect();
        for encoding in &producer.encodings {
            let Some(rid) = &encoding.rid else {
                continue;
            };

            let mut params = Vec::new();
            if let Some(ssrc) = encoding.ssrc {
                params.push(("ssrc".to_string(), ssrc.to_string()));
            }
            if let Some(mode) = &encoding.scalability_mode {
                params.push(("scalability-mode".to_string(), mode.clone()));
            }
            if let Some(max_bitrate) = encoding.max_bitrate {
                params.push(("max-bitrate".to_string(), max_bitrate.to_string()));
            }
            if let Some(max_framerate) = encoding.max_framerate {
                params.push(("max-framerate".to_string(), max_framerate.to_string()));
            }
            if let Some(adaptive_ptime) = encoding.adaptive_ptime {
                params.push(("adaptive-ptime".to_string(), adaptive_ptime.to_string()));
            }

            media.rids.push(RidInfo {
                id: rid.clone(),
                formats: formats.clone(),
                params,
            });
        }
        if producer.encodings.len() > 1 {
            media.simulcast = media.rids.iter().map(|r| r.id.clone()).collect();
        }

        let prefix = format!("{kind}/");
        media.codecs = producer
            .codecs
            .iter()
            .map(|codec| {
                let rtx = producer
                    .encodings
                    .iter()
                    .find(|e| e.codec_payload_type == Some(codec.payload_type))
                    .and_then(|e| {
                        e.rtx_ssrc.map(|rtx_ssrc| RtxInfo {
                            primary_ssrc: e.ssrc,
                            rtx_ssrc,
                        })
                    });

                CodecInfo {
                    name: codec
                        .mime_type
                        .strip_prefix(&prefix)
                        .unwrap_or(&codec.mime_type)
                        .to_string(),
                    payload_type: codec.payload_type,
                    clock_rate: codec.clock_rate,
                    channels: codec.channels.unwrap_or(1),
                    parameters: codec.parameters.clone(),
                    rtcp_feedback: codec
                        .rtcp_feedback
                        .iter()
                        .map(|fb| {
                            (
                                fb.feedback_type.clone(),
                                fb.parameter.clone().unwrap_or_default(),
                            )
                        })
                        .collect(),
                    rtx,
                }
            })
            .collect();

        media.bitrate = producer
            .encodings
            .iter()
            .filter_map(|e| e.max_bitrate)
            .max();

        // The local engine only consumes camera media on this path
        media.direction = Direction::RecvOnly;
        media
    }

    fn data_info(producer: &DataProducer, sctp: Option<&SctpParameters>) -> MediaInfo {
        let mut media = MediaInfo::new(producer.mid.clone(), "application");
        media.direction = Direction::SendRecv;
        media.data_channel = sctp.map(|sctp| DataChannelInfo {
            port: sctp.port,
            max_message_size: sctp.max_message_size,
        });
        media
    }
}
