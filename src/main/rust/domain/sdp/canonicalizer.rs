use super::session_description::CRLF;

/// Data-channel section the device API requires in every WebRTC offer
pub const APPLICATION_SECTION_TEMPLATE: [&str; 10] = [
    "m=application 9 UDP/DTLS/SCTP webrtc-datachannel",
    "c=IN IP4 0.0.0.0",
    "a=ice-ufrag:6ReD",
    "a=ice-pwd:QBmcZYd/t+InpMVkxQEEXnE4",
    "a=ice-options:trickle",
    "a=fingerprint:sha-256 DD:7E:6F:CD:B8:13:4E:37:D2:92:6D:8E:30:FB:FE:13:29:C9:F8:FD:78:0B:C4:59:42:61:BC:CF:02:91:6B:3C",
    "a=setup:actpass",
    "a=mid:2",
    "a=sctp-port:5000",
    "a=max-message-size:262144",
];

const SECTION_ORDER: [&str; 3] = ["audio", "video", "application"];

/// One `m=` section and the attribute lines that follow it
#[derive(Debug, Clone, PartialEq)]
struct Section<'a> {
    media_type: &'a str,
    lines: Vec<&'a str>,
}

#[derive(Debug, Default)]
struct SplitSdp<'a> {
    preamble: Vec<&'a str>,
    sections: Vec<Section<'a>>,
}

fn split(sdp: &str) -> SplitSdp<'_> {
    let mut split = SplitSdp::default();

    for line in sdp.lines().filter(|l| !l.trim().is_empty()) {
        if let Some(rest) = line.strip_prefix("m=") {
            let media_type = rest.split_whitespace().next().unwrap_or_default();
            split.sections.push(Section {
                media_type,
                lines: vec![line],
            });
        } else if let Some(section) = split.sections.last_mut() {
            section.lines.push(line);
        } else {
            split.preamble.push(line);
        }
    }
    split
}

/// Whether the SDP already carries a data-channel section
pub fn has_application_section(sdp: &str) -> bool {
    split(sdp)
        .sections
        .iter()
        .any(|s| s.media_type == "application")
}

/// Rewrite an offer into preamble, audio, video, application order.
///
/// Section types outside that set are dropped and only the first section of
/// each type is kept. A missing application section is filled in from
/// [`APPLICATION_SECTION_TEMPLATE`]. The output always ends with CRLF and
/// canonicalizing it again yields the same text.
pub fn canonicalize_offer(sdp: &str) -> String {
    let split = split(sdp);

    let template = Section {
        media_type: "application",
        lines: APPLICATION_SECTION_TEMPLATE.to_vec(),
    };

    let mut ordered: Vec<&Section<'_>> = Vec::with_capacity(SECTION_ORDER.len());
    for media_type in SECTION_ORDER {
        match split.sections.iter().find(|s| s.media_type == media_type) {
            Some(section) => ordered.push(section),
            None if media_type == "application" => ordered.push(&template),
            None => {}
        }
    }

    let kept = ordered
        .iter()
        .filter(|s| !std::ptr::eq(**s, &template))
        .count();
    if split.sections.len() > kept {
        tracing::debug!(
            dropped = split.sections.len() - kept,
            "Dropped duplicate or unsupported SDP sections"
        );
    }

    let mut out = String::with_capacity(sdp.len() + 512);
    for line in split
        .preamble
        .iter()
        .chain(ordered.iter().flat_map(|s| s.lines.iter()))
    {
        out.push_str(line);
        out.push_str(CRLF);
    }
    out
}

/// Media types of each `m=` section, in document order
pub fn section_order(sdp: &str) -> Vec<String> {
    split(sdp)
        .sections
        .iter()
        .map(|s| s.media_type.to_string())
        .collect()
}
