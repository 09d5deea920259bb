mod camera_id;
mod device_capabilities;
mod process_handle;
mod session_state;
mod session_token;
mod startup_mode;
mod stream_defaults;
mod stream_protocol;
mod transport_descriptor;

pub use camera_id::CameraId;
pub use device_capabilities::{DeviceCapabilities, Resolution};
pub use process_handle::ProcessHandle;
pub use session_state::SessionState;
pub use session_token::SessionToken;
pub use startup_mode::StartupMode;
pub use stream_defaults::{StreamDefaults, StreamOverrides};
pub use stream_protocol::StreamProtocol;
pub use transport_descriptor::{
    DataProducer, DtlsFingerprint, DtlsParameters, DtlsRole, IceCandidate, IceParameters,
    LocalTransportDescriptor, MediaKind, RtcpFeedback, RtpCodec, RtpEncoding,
    RtpHeaderExtension, RtpProducer, SctpParameters,
};
