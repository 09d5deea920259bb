mod access_token_provider;
mod device_command_api;
mod local_media_engine;
mod metrics_reporter;
mod session_event_publisher;
mod session_repository;
mod stream_teardown;

pub use access_token_provider::AccessTokenProvider;
pub use device_command_api::{DeviceCommandApi, RtspStreamGrant, StreamExtension, WebRtcStreamGrant};
pub use local_media_engine::LocalMediaEngine;
pub use metrics_reporter::MetricsReporter;
pub use session_event_publisher::{SessionEvent, SessionEventPublisher};
pub use session_repository::SessionRepository;
pub use stream_teardown::StreamTeardown;
