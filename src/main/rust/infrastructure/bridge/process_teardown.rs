use std::collections::HashMap;

use async_trait::async_trait;
use tokio::process::Child;
use tokio::sync::Mutex;

use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::StreamTeardown;
use crate::domain::value_objects::{CameraId, ProcessHandle, StreamProtocol};

/// Tracks transcoding helper processes per camera and kills them on teardown
#[derive(Default)]
pub struct ProcessTeardown {
    children: Mutex<HashMap<CameraId, Child>>,
}

impl ProcessTeardown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a spawned helper; a previous helper for the camera is killed
    pub async fn register(&self, camera_id: CameraId, child: Child) -> Option<ProcessHandle> {
        let handle = child.id().map(ProcessHandle::new);
        let previous = self.children.lock().await.insert(camera_id.clone(), child);
        if let Some(mut previous) = previous {
            tracing::warn!(camera_id = %camera_id, "Replacing running helper process");
            if let Err(e) = previous.kill().await {
                tracing::warn!(camera_id = %camera_id, error = %e, "Failed to kill replaced helper");
            }
        }
        handle
    }

    pub async fn is_tracking(&self, camera_id: &CameraId) -> bool {
        self.children.lock().await.contains_key(camera_id)
    }
}

#[async_trait]
impl StreamTeardown for ProcessTeardown {
    async fn teardown(&self, camera_id: &CameraId, protocol: StreamProtocol) -> Result<()> {
        let child = self.children.lock().await.remove(camera_id);
        let Some(mut child) = child else {
            tracing::debug!(camera_id = %camera_id, "No helper process to tear down");
            return Ok(());
        };

        tracing::info!(
            camera_id = %camera_id,
            protocol = %protocol,
            pid = ?child.id(),
            "Stopping helper process"
        );
        child
            .kill()
            .await
            .map_err(|e| DomainError::remote("Teardown", e))
    }
}
