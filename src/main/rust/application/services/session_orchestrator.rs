use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::entities::{Camera, CameraStreamSession};
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{
    DeviceCommandApi, MetricsReporter, SessionEvent, SessionEventPublisher, SessionRepository,
    StreamTeardown,
};
use crate::domain::sdp::{canonicalize_offer, has_application_section};
use crate::domain::value_objects::{
    CameraId, ProcessHandle, SessionState, SessionToken, StreamProtocol,
};

const GENERATE_RTSP_STREAM: &str = "GenerateRtspStream";
const GENERATE_WEBRTC_STREAM: &str = "GenerateWebRtcStream";
const EXTEND_RTSP_STREAM: &str = "ExtendRtspStream";
const EXTEND_WEBRTC_STREAM: &str = "ExtendWebRtcStream";
const TEARDOWN: &str = "Teardown";

/// What a second lifecycle call does while one is in flight for the same camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BusyPolicy {
    #[default]
    Queue,
    FailFast,
}

#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub busy_policy: BusyPolicy,
    /// Deadline applied to remote calls when the caller supplies none
    pub command_timeout: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            busy_policy: BusyPolicy::Queue,
            command_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    /// Stop a running session first instead of failing with `AlreadyActive`
    pub force_restart: bool,
    pub redirect_hint: Option<String>,
    pub deadline: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct ExtendOptions {
    /// Falls back to the hint recorded at start
    pub redirect_hint: Option<String>,
    pub deadline: Option<Duration>,
}

#[derive(Debug, Clone, Default)]
pub struct StopOptions {
    pub allow_already_inactive: bool,
    pub deadline: Option<Duration>,
}

/// Snapshot of a session after a lifecycle call
#[derive(Debug, Clone, PartialEq)]
pub struct SessionResult {
    pub camera_id: CameraId,
    pub protocol: StreamProtocol,
    pub state: SessionState,
    pub token: Option<SessionToken>,
    pub expires_hint: Option<String>,
    pub last_error: Option<String>,
}

impl SessionResult {
    pub fn answer_sdp(&self) -> Option<&str> {
        self.token.as_ref().and_then(SessionToken::answer_sdp)
    }

    pub fn stream_url(&self) -> Option<&str> {
        self.token.as_ref().and_then(SessionToken::stream_url)
    }
}

impl From<&CameraStreamSession> for SessionResult {
    fn from(session: &CameraStreamSession) -> Self {
        Self {
            camera_id: session.camera_id().clone(),
            protocol: session.protocol(),
            state: session.state(),
            token: session.token().cloned(),
            expires_hint: session.expires_hint().map(str::to_string),
            last_error: session.last_error().map(str::to_string),
        }
    }
}

/// Drives camera stream sessions through start, extend and stop.
///
/// Calls for one camera are serialized; different cameras run concurrently.
/// Sessions are persisted after reaching `Active`, `Inactive` or `Failed`.
pub struct StreamSessionOrchestrator {
    commands: Arc<dyn DeviceCommandApi>,
    repository: Arc<dyn SessionRepository>,
    teardown: Arc<dyn StreamTeardown>,
    events: Arc<dyn SessionEventPublisher>,
    metrics: Arc<dyn MetricsReporter>,
    settings: OrchestratorSettings,
    locks: Mutex<HashMap<CameraId, Arc<Mutex<()>>>>,
}

impl StreamSessionOrchestrator {
    pub fn new(
        commands: Arc<dyn DeviceCommandApi>,
        repository: Arc<dyn SessionRepository>,
        teardown: Arc<dyn StreamTeardown>,
        events: Arc<dyn SessionEventPublisher>,
        metrics: Arc<dyn MetricsReporter>,
        settings: OrchestratorSettings,
    ) -> Self {
        Self {
            commands,
            repository,
            teardown,
            events,
            metrics,
            settings,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Start a stream, RTSP when the camera supports it, WebRTC otherwise.
    ///
    /// WebRTC requires `offer_sdp`; it is canonicalized before it is sent.
    pub async fn start(
        &self,
        camera_id: &CameraId,
        offer_sdp: Option<&str>,
        options: StartOptions,
    ) -> Result<SessionResult> {
        let camera = self.load_camera(camera_id)?;
        let _guard = self.acquire(camera_id).await?;

        let Some(protocol) = camera.capabilities().preferred_protocol() else {
            tracing::warn!(camera_id = %camera_id, "Camera does not support any streaming protocols");
            return Err(DomainError::UnsupportedProtocol(camera_id.clone()));
        };

        let offer = match protocol {
            StreamProtocol::WebRtc => Some(Self::prepare_offer(camera_id, offer_sdp)?),
            StreamProtocol::Rtsp => None,
        };

        let mut session = self
            .repository
            .load_session(camera_id)?
            .unwrap_or_else(|| CameraStreamSession::new(camera_id.clone(), protocol));
        if let Err(e) = session.ensure_startable() {
            if !options.force_restart {
                return Err(e);
            }
            tracing::info!(camera_id = %camera_id, state = %session.state(), "Force restart requested");
            self.stop_session(&mut session, options.deadline).await?;
        }
        if session.protocol() != protocol {
            tracing::info!(
                camera_id = %camera_id,
                from = %session.protocol(),
                to = %protocol,
                "Camera protocol changed, starting a new session"
            );
            session = CameraStreamSession::new(camera_id.clone(), protocol);
        }

        session.begin_start(options.redirect_hint.clone());
        self.metrics
            .report_state_change(camera_id.as_str(), session.state());
        tracing::info!(
            camera_id = %camera_id,
            protocol = %protocol,
            attempt_id = session.attempt_id().unwrap_or_default(),
            "Starting stream"
        );

        let deadline = self.deadline(options.deadline);
        let hint = options.redirect_hint.as_deref();
        let outcome = match offer {
            None => self
                .call_with_deadline(
                    GENERATE_RTSP_STREAM,
                    deadline,
                    self.commands.generate_rtsp_stream(camera.device_name(), hint),
                )
                .await
                .and_then(|grant| {
                    if grant.stream_extension_token.is_empty() {
                        return Err(DomainError::remote(
                            GENERATE_RTSP_STREAM,
                            "response carried no stream extension token",
                        ));
                    }
                    let token = SessionToken::Rtsp {
                        stream_extension_token: grant.stream_extension_token,
                        stream_url: grant.stream_url,
                    };
                    Ok((token, grant.expires_at))
                }),
            Some(offer) => self
                .call_with_deadline(
                    GENERATE_WEBRTC_STREAM,
                    deadline,
                    self.commands
                        .generate_webrtc_stream(camera.device_name(), &offer, hint),
                )
                .await
                .and_then(|grant| {
                    if grant.media_session_id.is_empty() {
                        return Err(DomainError::remote(
                            GENERATE_WEBRTC_STREAM,
                            "response carried no media session id",
                        ));
                    }
                    let token = SessionToken::WebRtc {
                        media_session_id: grant.media_session_id,
                        answer_sdp: grant.answer_sdp,
                    };
                    Ok((token, grant.expires_at))
                }),
        };

        match outcome {
            Ok((token, expires_at)) => {
                session.activate(token, expires_at);
                self.repository.save_session(session.clone())?;
                self.metrics.report_session_started(protocol);
                self.metrics
                    .report_state_change(camera_id.as_str(), session.state());
                self.events.publish(SessionEvent::SessionStarted {
                    camera_id: camera_id.clone(),
                    protocol,
                });
                tracing::info!(camera_id = %camera_id, protocol = %protocol, "Stream active");
                Ok(SessionResult::from(&session))
            }
            Err(e) => {
                self.record_failure(&mut session, false, &e)?;
                Err(e)
            }
        }
    }

    /// Refresh the session token of an active stream
    pub async fn extend(&self, camera_id: &CameraId, options: ExtendOptions) -> Result<SessionResult> {
        let camera = self.load_camera(camera_id)?;
        let _guard = self.acquire(camera_id).await?;
        let mut session = self
            .repository
            .load_session(camera_id)?
            .ok_or_else(|| DomainError::NotActive(camera_id.clone()))?;

        let token = session.ensure_extendable()?.clone();
        let protocol = session.protocol();
        let hint = options
            .redirect_hint
            .or_else(|| session.redirect_hint().map(str::to_string));

        session.begin_extend();
        tracing::debug!(camera_id = %camera_id, protocol = %protocol, "Extending stream");

        let deadline = self.deadline(options.deadline);
        let outcome = match &token {
            SessionToken::Rtsp {
                stream_extension_token,
                ..
            } => {
                self.call_with_deadline(
                    EXTEND_RTSP_STREAM,
                    deadline,
                    self.commands.extend_rtsp_stream(
                        camera.device_name(),
                        stream_extension_token,
                        hint.as_deref(),
                    ),
                )
                .await
            }
            SessionToken::WebRtc {
                media_session_id, ..
            } => {
                self.call_with_deadline(
                    EXTEND_WEBRTC_STREAM,
                    deadline,
                    self.commands.extend_webrtc_stream(
                        camera.device_name(),
                        media_session_id,
                        hint.as_deref(),
                    ),
                )
                .await
            }
        };

        let extension = match outcome {
            Ok(extension) => extension,
            Err(e) => {
                self.record_failure(&mut session, true, &e)?;
                return Err(e);
            }
        };

        match extension.token.filter(|t| !t.is_empty()) {
            Some(refreshed) => {
                session.complete_extend(refreshed, extension.expires_at);
                self.repository.save_session(session.clone())?;
                self.metrics.report_session_extended(protocol);
                self.events.publish(SessionEvent::SessionExtended {
                    camera_id: camera_id.clone(),
                    protocol,
                });
                tracing::info!(camera_id = %camera_id, protocol = %protocol, "Stream extended");
                Ok(SessionResult::from(&session))
            }
            None => {
                let reason = "response carried no refreshed token".to_string();
                session.reject_extension(reason.clone());
                self.repository.save_session(session)?;
                self.metrics.report_extension_rejected(protocol);
                tracing::warn!(camera_id = %camera_id, protocol = %protocol, "Stream extension rejected");
                Err(DomainError::ExtensionRejected {
                    camera_id: camera_id.clone(),
                    protocol,
                    reason,
                })
            }
        }
    }

    /// Tear the stream down and mark the session inactive.
    ///
    /// A teardown failure is logged and does not keep the session alive.
    pub async fn stop(&self, camera_id: &CameraId, options: StopOptions) -> Result<()> {
        self.load_camera(camera_id)?;
        let _guard = self.acquire(camera_id).await?;
        let session = self
            .repository
            .load_session(camera_id)?
            .filter(|s| s.state() != SessionState::Inactive);

        let Some(mut session) = session else {
            if options.allow_already_inactive {
                tracing::debug!(camera_id = %camera_id, "Stream already inactive");
                return Ok(());
            }
            return Err(DomainError::NotActive(camera_id.clone()));
        };

        self.stop_session(&mut session, options.deadline).await
    }

    /// Record the helper process an external process manager started for a camera.
    ///
    /// The handle is cleared again when the camera's stream is stopped.
    pub fn attach_helper(&self, camera_id: &CameraId, handle: ProcessHandle) -> Result<()> {
        let mut camera = self.load_camera(camera_id)?;
        if let Some(previous) = camera.child_process() {
            tracing::warn!(camera_id = %camera_id, previous = %previous, "Replacing helper process handle");
        }
        camera.attach_process(handle);
        self.repository.save_camera(camera)
    }

    /// Current session of a camera, if one was ever started
    pub fn session(&self, camera_id: &CameraId) -> Result<Option<SessionResult>> {
        Ok(self
            .repository
            .load_session(camera_id)?
            .as_ref()
            .map(SessionResult::from))
    }

    async fn stop_session(
        &self,
        session: &mut CameraStreamSession,
        deadline: Option<Duration>,
    ) -> Result<()> {
        let camera_id = session.camera_id().clone();
        let protocol = session.protocol();
        let was_active = session.state().holds_token();

        session.begin_stop();
        let deadline = self.deadline(deadline);
        if let Err(e) = self
            .call_with_deadline(TEARDOWN, deadline, self.teardown.teardown(&camera_id, protocol))
            .await
        {
            tracing::warn!(
                camera_id = %camera_id,
                error = %e,
                "Stream teardown failed, marking session inactive"
            );
        }

        session.mark_inactive(None);
        self.repository.save_session(session.clone())?;
        self.detach_helper(&camera_id)?;
        self.metrics.report_session_stopped(protocol, was_active);
        self.metrics
            .report_state_change(camera_id.as_str(), session.state());
        self.events.publish(SessionEvent::SessionStopped {
            camera_id: camera_id.clone(),
        });
        tracing::info!(camera_id = %camera_id, protocol = %protocol, "Stream stopped");
        Ok(())
    }

    fn detach_helper(&self, camera_id: &CameraId) -> Result<()> {
        let Some(mut camera) = self.repository.load_camera(camera_id)? else {
            return Ok(());
        };
        if let Some(handle) = camera.detach_process() {
            tracing::debug!(camera_id = %camera_id, pid = %handle, "Helper process handle released");
            self.repository.save_camera(camera)?;
        }
        Ok(())
    }

    fn record_failure(
        &self,
        session: &mut CameraStreamSession,
        was_active: bool,
        error: &DomainError,
    ) -> Result<()> {
        let camera_id = session.camera_id().clone();
        let protocol = session.protocol();

        session.fail(error.to_string());
        self.repository.save_session(session.clone())?;
        self.metrics.report_session_failed(protocol, was_active);
        self.metrics
            .report_state_change(camera_id.as_str(), session.state());
        self.events.publish(SessionEvent::SessionFailed {
            camera_id: camera_id.clone(),
            reason: error.to_string(),
        });
        tracing::error!(camera_id = %camera_id, protocol = %protocol, error = %error, "Stream failed");
        Ok(())
    }

    fn prepare_offer(camera_id: &CameraId, offer_sdp: Option<&str>) -> Result<String> {
        let offer = offer_sdp
            .filter(|o| !o.trim().is_empty())
            .ok_or_else(|| DomainError::MissingOffer(camera_id.clone()))?;
        if !has_application_section(offer) {
            tracing::debug!(camera_id = %camera_id, "Offer lacks a data channel section");
        }
        Ok(canonicalize_offer(offer))
    }

    fn load_camera(&self, camera_id: &CameraId) -> Result<Camera> {
        self.repository
            .load_camera(camera_id)?
            .ok_or_else(|| DomainError::UnknownCamera(camera_id.clone()))
    }

    /// Per-camera lock; callers check the camera exists first so the map only
    /// holds registered cameras
    async fn acquire(&self, camera_id: &CameraId) -> Result<OwnedMutexGuard<()>> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(camera_id.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        match self.settings.busy_policy {
            BusyPolicy::Queue => Ok(lock.lock_owned().await),
            BusyPolicy::FailFast => lock
                .try_lock_owned()
                .map_err(|_| DomainError::SessionBusy(camera_id.clone())),
        }
    }

    fn deadline(&self, requested: Option<Duration>) -> Duration {
        requested.unwrap_or(self.settings.command_timeout)
    }

    async fn call_with_deadline<T>(
        &self,
        command: &str,
        deadline: Duration,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        match tokio::time::timeout(deadline, call).await {
            Ok(result) => result,
            Err(_) => Err(DomainError::remote(
                command,
                format!("deadline of {}ms exceeded", deadline.as_millis()),
            )),
        }
    }
}
