use thiserror::Error;

use crate::domain::value_objects::{CameraId, StreamProtocol};

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Camera {0} does not support any streaming protocols")]
    UnsupportedProtocol(CameraId),

    #[error("Camera {0} already has an active stream")]
    AlreadyActive(CameraId),

    #[error("Camera {0} is not active")]
    NotActive(CameraId),

    #[error("Missing information on camera {0} stream to extend")]
    MissingSessionInfo(CameraId),

    #[error("Camera {camera_id} {protocol} stream extension rejected: {reason}")]
    ExtensionRejected {
        camera_id: CameraId,
        protocol: StreamProtocol,
        reason: String,
    },

    #[error("Remote command {command} failed: {reason}")]
    RemoteCallFailed { command: String, reason: String },

    #[error("Camera {0} already has a lifecycle operation in flight")]
    SessionBusy(CameraId),

    #[error("Camera {0} requires an offer SDP to start a WebRTC stream")]
    MissingOffer(CameraId),

    #[error("Unknown camera: {0}")]
    UnknownCamera(CameraId),

    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Local media engine failure: {0}")]
    LocalMediaEngine(String),

    #[error("Invalid media path: {0}")]
    InvalidMediaPath(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl DomainError {
    pub fn remote(command: impl Into<String>, reason: impl ToString) -> Self {
        DomainError::RemoteCallFailed {
            command: command.into(),
            reason: reason.to_string(),
        }
    }

    /// Local precondition failures that a caller should not retry blindly
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            DomainError::UnsupportedProtocol(_)
                | DomainError::AlreadyActive(_)
                | DomainError::NotActive(_)
                | DomainError::MissingSessionInfo(_)
                | DomainError::MissingOffer(_)
                | DomainError::UnknownCamera(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DomainError>;
