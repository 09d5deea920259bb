mod keepalive_service;
mod local_publish_service;
mod session_orchestrator;

pub use keepalive_service::{KeepAliveReport, KeepAliveService};
pub use local_publish_service::LocalPublishService;
pub use session_orchestrator::{
    BusyPolicy, ExtendOptions, OrchestratorSettings, SessionResult, StartOptions, StopOptions,
    StreamSessionOrchestrator,
};
