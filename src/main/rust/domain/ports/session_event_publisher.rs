use crate::domain::value_objects::{CameraId, StreamProtocol};

/// Lifecycle transition emitted for external fan-out
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SessionStarted {
        camera_id: CameraId,
        protocol: StreamProtocol,
    },
    SessionExtended {
        camera_id: CameraId,
        protocol: StreamProtocol,
    },
    SessionStopped {
        camera_id: CameraId,
    },
    SessionFailed {
        camera_id: CameraId,
        reason: String,
    },
}

impl SessionEvent {
    pub fn camera_id(&self) -> &CameraId {
        match self {
            SessionEvent::SessionStarted { camera_id, .. }
            | SessionEvent::SessionExtended { camera_id, .. }
            | SessionEvent::SessionStopped { camera_id }
            | SessionEvent::SessionFailed { camera_id, .. } => camera_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::SessionStarted { .. } => "sessionStarted",
            SessionEvent::SessionExtended { .. } => "sessionExtended",
            SessionEvent::SessionStopped { .. } => "sessionStopped",
            SessionEvent::SessionFailed { .. } => "sessionFailed",
        }
    }
}

/// Port for lifecycle notifications; delivery is fire-and-forget
pub trait SessionEventPublisher: Send + Sync {
    fn publish(&self, event: SessionEvent);
}
