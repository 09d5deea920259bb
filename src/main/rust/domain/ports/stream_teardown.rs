use async_trait::async_trait;

use crate::domain::errors::Result;
use crate::domain::value_objects::{CameraId, StreamProtocol};

/// Port for the media-bridge process manager that tears a stream down locally
#[async_trait]
pub trait StreamTeardown: Send + Sync {
    async fn teardown(&self, camera_id: &CameraId, protocol: StreamProtocol) -> Result<()>;
}
