pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

// Re-exports for convenience
pub use application::services::{
    BusyPolicy, ExtendOptions, KeepAliveReport, KeepAliveService, LocalPublishService,
    OrchestratorSettings, SessionResult, StartOptions, StopOptions, StreamSessionOrchestrator,
};
pub use config::Config;
pub use domain::entities::{Camera, CameraStreamSession, StateTransition};
pub use domain::errors::{DomainError, Result};
pub use domain::ports::{
    AccessTokenProvider, DeviceCommandApi, LocalMediaEngine, MetricsReporter, RtspStreamGrant,
    SessionEvent, SessionEventPublisher, SessionRepository, StreamExtension, StreamTeardown,
    WebRtcStreamGrant,
};
pub use domain::sdp::{canonicalize_offer, SessionDescription, TransportDescriptionBuilder};
pub use domain::services::{
    EndpointPorts, EndpointProtocol, EndpointResolver, PublicEndpoints, PublishTarget,
    StreamParameters,
};
pub use domain::value_objects::{
    CameraId, DeviceCapabilities, LocalTransportDescriptor, SessionState, SessionToken,
    StartupMode, StreamDefaults, StreamOverrides, StreamProtocol,
};
pub use infrastructure::bridge::ProcessTeardown;
pub use infrastructure::events::BroadcastEventPublisher;
pub use infrastructure::media_engine::WhipMediaEngine;
pub use infrastructure::metrics::{serve_metrics, PrometheusReporter};
pub use infrastructure::persistence::InMemoryRepository;
pub use infrastructure::sdm::{SdmCommandClient, StaticTokenProvider};
