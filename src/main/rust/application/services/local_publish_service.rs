use std::sync::Arc;

use crate::domain::entities::Camera;
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::{LocalMediaEngine, SessionRepository};
use crate::domain::sdp::TransportDescriptionBuilder;
use crate::domain::services::{EndpointResolver, PublicEndpoints, PublishTarget};
use crate::domain::value_objects::{CameraId, LocalTransportDescriptor};

/// Exposes camera streams through the local media engine
pub struct LocalPublishService {
    engine: Arc<dyn LocalMediaEngine>,
    repository: Arc<dyn SessionRepository>,
    resolver: EndpointResolver,
    publish_target: Option<PublishTarget>,
}

impl LocalPublishService {
    pub fn new(
        engine: Arc<dyn LocalMediaEngine>,
        repository: Arc<dyn SessionRepository>,
        resolver: EndpointResolver,
    ) -> Self {
        Self {
            engine,
            repository,
            resolver,
            publish_target: None,
        }
    }

    pub fn with_publish_target(mut self, target: PublishTarget) -> Self {
        self.publish_target = Some(target);
        self
    }

    /// Offer a locally built transport to the media engine and record the
    /// path it serves the stream under
    pub async fn publish(
        &self,
        camera_id: &CameraId,
        descriptor: &LocalTransportDescriptor,
    ) -> Result<String> {
        let mut camera = self.load_camera(camera_id)?;
        let offer = TransportDescriptionBuilder::build_offer(descriptor);
        let path_hint = camera
            .media_path()
            .unwrap_or(camera_id.as_str())
            .to_string();

        let path = self.engine.publish_offer(&path_hint, &offer).await?;
        if path.is_empty() {
            return Err(DomainError::LocalMediaEngine(format!(
                "engine returned no path for camera {camera_id}"
            )));
        }

        tracing::info!(camera_id = %camera_id, path = %path, "Published local offer");
        camera.set_media_path(Some(path.clone()));
        self.repository.save_camera(camera)?;
        Ok(path)
    }

    /// Playback URLs for the camera's media path
    pub fn endpoints(&self, camera_id: &CameraId) -> Result<PublicEndpoints> {
        let camera = self.load_camera(camera_id)?;
        Ok(self.resolver.endpoints(camera.media_path()))
    }

    /// Where a transcoding helper should push this camera's stream
    pub fn publish_destination(&self, camera_id: &CameraId) -> Result<Option<String>> {
        let Some(target) = &self.publish_target else {
            return Ok(None);
        };
        let camera = self.load_camera(camera_id)?;
        let path = camera
            .media_path()
            .ok_or_else(|| DomainError::InvalidMediaPath(format!("camera {camera_id} has no path")))?;
        target.destination(path).map(Some)
    }

    fn load_camera(&self, camera_id: &CameraId) -> Result<Camera> {
        self.repository
            .load_camera(camera_id)?
            .ok_or_else(|| DomainError::UnknownCamera(camera_id.clone()))
    }
}
