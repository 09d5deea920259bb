use crate::domain::value_objects::{SessionState, StreamProtocol};

/// Port for metrics reporting
pub trait MetricsReporter: Send + Sync {
    fn report_session_started(&self, protocol: StreamProtocol);
    fn report_session_extended(&self, protocol: StreamProtocol);
    fn report_extension_rejected(&self, protocol: StreamProtocol);
    fn report_session_stopped(&self, protocol: StreamProtocol, was_active: bool);
    fn report_session_failed(&self, protocol: StreamProtocol, was_active: bool);
    fn report_state_change(&self, camera_id: &str, state: SessionState);
}
