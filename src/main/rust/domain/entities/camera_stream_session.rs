use std::collections::VecDeque;
use std::time::Instant;

use uuid::Uuid;

use crate::domain::errors::{DomainError, Result};
use crate::domain::value_objects::{CameraId, SessionState, SessionToken, StreamProtocol};

/// Transitions kept per session; older entries are discarded
pub const MAX_HISTORY: usize = 32;

/// State transition record
#[derive(Debug, Clone)]
pub struct StateTransition {
    pub from: SessionState,
    pub to: SessionState,
    pub timestamp: Instant,
    pub reason: Option<String>,
}

/// Live or attempted stream session of one camera.
///
/// A token is held only while the session is `Active` or `Extending`.
#[derive(Debug, Clone)]
pub struct CameraStreamSession {
    camera_id: CameraId,
    protocol: StreamProtocol,
    state: SessionState,
    token: Option<SessionToken>,
    expires_hint: Option<String>,
    last_error: Option<String>,
    redirect_hint: Option<String>,
    attempt_id: Option<String>,
    started_at: Option<Instant>,
    history: VecDeque<StateTransition>,
}

impl CameraStreamSession {
    pub fn new(camera_id: CameraId, protocol: StreamProtocol) -> Self {
        Self {
            camera_id,
            protocol,
            state: SessionState::Inactive,
            token: None,
            expires_hint: None,
            last_error: None,
            redirect_hint: None,
            attempt_id: None,
            started_at: None,
            history: VecDeque::with_capacity(MAX_HISTORY),
        }
    }

    pub fn camera_id(&self) -> &CameraId {
        &self.camera_id
    }

    pub fn protocol(&self) -> StreamProtocol {
        self.protocol
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn token(&self) -> Option<&SessionToken> {
        self.token.as_ref()
    }

    /// Informational only; the command API owns expiry
    pub fn expires_hint(&self) -> Option<&str> {
        self.expires_hint.as_deref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn redirect_hint(&self) -> Option<&str> {
        self.redirect_hint.as_deref()
    }

    /// Identifier of the current start attempt
    pub fn attempt_id(&self) -> Option<&str> {
        self.attempt_id.as_deref()
    }

    pub fn uptime(&self) -> Option<std::time::Duration> {
        self.started_at.map(|start| start.elapsed())
    }

    /// Most recent transitions, oldest first
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    pub fn last_transition(&self) -> Option<&StateTransition> {
        self.history.back()
    }

    pub fn ensure_startable(&self) -> Result<()> {
        if self.state.is_startable() {
            Ok(())
        } else {
            Err(DomainError::AlreadyActive(self.camera_id.clone()))
        }
    }

    /// Token to present on extension, if the session can be extended
    pub fn ensure_extendable(&self) -> Result<&SessionToken> {
        if self.state != SessionState::Active {
            return Err(DomainError::NotActive(self.camera_id.clone()));
        }
        match &self.token {
            Some(token) if !token.is_empty() => Ok(token),
            _ => Err(DomainError::MissingSessionInfo(self.camera_id.clone())),
        }
    }

    pub fn begin_start(&mut self, redirect_hint: Option<String>) {
        self.token = None;
        self.expires_hint = None;
        self.redirect_hint = redirect_hint;
        self.attempt_id = Some(Uuid::new_v4().to_string());
        self.record_transition(SessionState::Starting, None);
    }

    pub fn activate(&mut self, token: SessionToken, expires_hint: Option<String>) {
        self.token = Some(token);
        self.expires_hint = expires_hint;
        self.last_error = None;
        self.started_at = Some(Instant::now());
        self.record_transition(SessionState::Active, None);
    }

    pub fn begin_extend(&mut self) {
        self.record_transition(SessionState::Extending, None);
    }

    pub fn complete_extend(&mut self, refreshed: String, expires_hint: Option<String>) {
        self.token = self.token.as_ref().map(|t| t.merged(refreshed));
        if expires_hint.is_some() {
            self.expires_hint = expires_hint;
        }
        self.last_error = None;
        self.record_transition(SessionState::Active, None);
    }

    /// Back to `Active` with the stale token still in place
    pub fn reject_extension(&mut self, reason: String) {
        self.last_error = Some(reason.clone());
        self.record_transition(SessionState::Active, Some(reason));
    }

    pub fn fail(&mut self, reason: String) {
        self.token = None;
        self.started_at = None;
        self.last_error = Some(reason.clone());
        self.record_transition(SessionState::Failed, Some(reason));
    }

    pub fn begin_stop(&mut self) {
        self.record_transition(SessionState::Stopping, None);
    }

    pub fn mark_inactive(&mut self, reason: Option<String>) {
        self.token = None;
        self.expires_hint = None;
        self.started_at = None;
        self.record_transition(SessionState::Inactive, reason);
    }

    fn record_transition(&mut self, new_state: SessionState, reason: Option<String>) {
        let transition = StateTransition {
            from: self.state,
            to: new_state,
            timestamp: Instant::now(),
            reason,
        };

        if self.history.len() == MAX_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(transition);
        self.state = new_state;
    }
}
