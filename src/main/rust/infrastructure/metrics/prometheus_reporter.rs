use lazy_static::lazy_static;
use prometheus::{Encoder, GaugeVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

use crate::domain::ports::MetricsReporter;
use crate::domain::value_objects::{SessionState, StreamProtocol};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref ACTIVE_SESSIONS: IntGauge = IntGauge::new(
        "bridge_active_sessions",
        "Number of camera stream sessions currently active"
    ).expect("metric can be created");
    pub static ref SESSIONS_STARTED: IntCounterVec = IntCounterVec::new(
        Opts::new("bridge_sessions_started_total", "Streams started, by protocol"),
        &["protocol"]
    ).expect("metric can be created");
    pub static ref SESSIONS_EXTENDED: IntCounterVec = IntCounterVec::new(
        Opts::new("bridge_sessions_extended_total", "Stream extensions accepted, by protocol"),
        &["protocol"]
    ).expect("metric can be created");
    pub static ref EXTENSIONS_REJECTED: IntCounterVec = IntCounterVec::new(
        Opts::new("bridge_extensions_rejected_total", "Stream extensions rejected, by protocol"),
        &["protocol"]
    ).expect("metric can be created");
    pub static ref SESSIONS_STOPPED: IntCounterVec = IntCounterVec::new(
        Opts::new("bridge_sessions_stopped_total", "Streams stopped, by protocol"),
        &["protocol"]
    ).expect("metric can be created");
    pub static ref SESSIONS_FAILED: IntCounterVec = IntCounterVec::new(
        Opts::new("bridge_sessions_failed_total", "Start or extend failures, by protocol"),
        &["protocol"]
    ).expect("metric can be created");
    // 0=Inactive, 1=Starting, 2=Active, 3=Extending, 4=Stopping, 5=Failed
    pub static ref SESSION_STATE: GaugeVec = GaugeVec::new(
        Opts::new("bridge_session_state", "Current session state per camera"),
        &["camera_id"]
    ).expect("metric can be created");
}

pub struct PrometheusReporter;

impl PrometheusReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn init_metrics() -> Result<(), prometheus::Error> {
        REGISTRY.register(Box::new(ACTIVE_SESSIONS.clone()))?;
        REGISTRY.register(Box::new(SESSIONS_STARTED.clone()))?;
        REGISTRY.register(Box::new(SESSIONS_EXTENDED.clone()))?;
        REGISTRY.register(Box::new(EXTENSIONS_REJECTED.clone()))?;
        REGISTRY.register(Box::new(SESSIONS_STOPPED.clone()))?;
        REGISTRY.register(Box::new(SESSIONS_FAILED.clone()))?;
        REGISTRY.register(Box::new(SESSION_STATE.clone()))?;
        Ok(())
    }

    pub fn gather_metrics() -> Vec<u8> {
        let encoder = TextEncoder::new();
        let metric_families = REGISTRY.gather();
        let mut buffer = vec![];
        if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
            tracing::error!("Failed to encode metrics: {}", e);
            return b"# Error encoding metrics\n".to_vec();
        }
        buffer
    }
}

impl Default for PrometheusReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsReporter for PrometheusReporter {
    fn report_session_started(&self, protocol: StreamProtocol) {
        ACTIVE_SESSIONS.inc();
        SESSIONS_STARTED.with_label_values(&[protocol.as_str()]).inc();
    }

    fn report_session_extended(&self, protocol: StreamProtocol) {
        SESSIONS_EXTENDED.with_label_values(&[protocol.as_str()]).inc();
    }

    fn report_extension_rejected(&self, protocol: StreamProtocol) {
        EXTENSIONS_REJECTED.with_label_values(&[protocol.as_str()]).inc();
    }

    fn report_session_stopped(&self, protocol: StreamProtocol, was_active: bool) {
        if was_active {
            ACTIVE_SESSIONS.dec();
        }
        SESSIONS_STOPPED.with_label_values(&[protocol.as_str()]).inc();
    }

    fn report_session_failed(&self, protocol: StreamProtocol, was_active: bool) {
        if was_active {
            ACTIVE_SESSIONS.dec();
        }
        SESSIONS_FAILED.with_label_values(&[protocol.as_str()]).inc();
    }

    fn report_state_change(&self, camera_id: &str, state: SessionState) {
        SESSION_STATE
            .with_label_values(&[camera_id])
            .set(state.as_metric());
    }
}
