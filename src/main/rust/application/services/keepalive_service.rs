use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use super::session_orchestrator::{ExtendOptions, StartOptions, StopOptions, StreamSessionOrchestrator};
use crate::domain::entities::Camera;
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::SessionRepository;
use crate::domain::value_objects::{SessionState, StartupMode, StreamProtocol};

/// Outcome of one keep-alive pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeepAliveReport {
    pub extended: usize,
    pub restarted: usize,
    pub failed: usize,
}

/// Keeps active sessions alive and brings always-on cameras up and down
pub struct KeepAliveService {
    orchestrator: Arc<StreamSessionOrchestrator>,
    repository: Arc<dyn SessionRepository>,
    interval: Duration,
}

impl KeepAliveService {
    pub fn new(
        orchestrator: Arc<StreamSessionOrchestrator>,
        repository: Arc<dyn SessionRepository>,
        interval: Duration,
    ) -> Self {
        Self {
            orchestrator,
            repository,
            interval,
        }
    }

    /// Extend every active session each interval until `shutdown` flips to true
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        // The first tick completes immediately; sessions were just started.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.tick().await {
                        Ok(report) => tracing::debug!(
                            extended = report.extended,
                            restarted = report.restarted,
                            failed = report.failed,
                            "Keep-alive pass complete"
                        ),
                        Err(e) => tracing::error!(error = %e, "Keep-alive pass failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        tracing::info!("Keep-alive loop stopping");
                        return;
                    }
                }
            }
        }
    }

    /// Extend each active session once
    pub async fn tick(&self) -> Result<KeepAliveReport> {
        let mut report = KeepAliveReport::default();

        for camera in self.repository.list_cameras()? {
            let Some(session) = self.repository.load_session(camera.id())? else {
                continue;
            };
            if session.state() != SessionState::Active {
                continue;
            }

            match self
                .orchestrator
                .extend(camera.id(), ExtendOptions::default())
                .await
            {
                Ok(_) => report.extended += 1,
                Err(e @ (DomainError::ExtensionRejected { .. } | DomainError::RemoteCallFailed { .. }))
                    if Self::restarts_on_failure(&camera, session.protocol()) =>
                {
                    tracing::warn!(camera_id = %camera.id(), error = %e, "Extension failed, restarting stream");
                    match self.restart(&camera).await {
                        Ok(()) => report.restarted += 1,
                        Err(e) => {
                            tracing::error!(camera_id = %camera.id(), error = %e, "Restart failed");
                            report.failed += 1;
                        }
                    }
                }
                Err(DomainError::SessionBusy(_)) => {
                    tracing::debug!(camera_id = %camera.id(), "Session busy, skipping extension");
                }
                Err(e) if e.is_precondition() => {
                    tracing::debug!(camera_id = %camera.id(), error = %e, "Session changed since listing, skipping extension");
                }
                Err(e) => {
                    tracing::warn!(camera_id = %camera.id(), error = %e, "Extension failed");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }

    /// Start every always-on camera that can stream without a client offer
    pub async fn start_always_on(&self) -> Result<usize> {
        let mut started = 0;
        for camera in self.repository.list_cameras()? {
            if camera.startup_mode() != StartupMode::AlwaysOn {
                continue;
            }
            if camera.capabilities().preferred_protocol() != Some(StreamProtocol::Rtsp) {
                tracing::debug!(camera_id = %camera.id(), "Always-on camera needs a client offer, skipping");
                continue;
            }

            match self
                .orchestrator
                .start(camera.id(), None, StartOptions::default())
                .await
            {
                Ok(_) => started += 1,
                Err(DomainError::AlreadyActive(_)) => {}
                Err(e) => tracing::error!(camera_id = %camera.id(), error = %e, "Failed to start camera"),
            }
        }
        Ok(started)
    }

    /// Stop every session that is not already inactive
    pub async fn stop_all(&self) -> Result<usize> {
        let mut stopped = 0;
        for camera in self.repository.list_cameras()? {
            let options = StopOptions {
                allow_already_inactive: true,
                ..StopOptions::default()
            };
            let was_running = self
                .repository
                .load_session(camera.id())?
                .is_some_and(|s| s.state() != SessionState::Inactive);

            match self.orchestrator.stop(camera.id(), options).await {
                Ok(()) if was_running => stopped += 1,
                Ok(()) => {}
                Err(e) => tracing::warn!(camera_id = %camera.id(), error = %e, "Failed to stop camera"),
            }
        }
        Ok(stopped)
    }

    fn restarts_on_failure(camera: &Camera, protocol: StreamProtocol) -> bool {
        camera.startup_mode() == StartupMode::AlwaysOn && protocol == StreamProtocol::Rtsp
    }

    async fn restart(&self, camera: &Camera) -> Result<()> {
        let stop = StopOptions {
            allow_already_inactive: true,
            ..StopOptions::default()
        };
        self.orchestrator.stop(camera.id(), stop).await?;
        self.orchestrator
            .start(camera.id(), None, StartOptions::default())
            .await?;
        Ok(())
    }
}
