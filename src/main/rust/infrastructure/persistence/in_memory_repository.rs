use std::collections::HashMap;
use std::path::Path;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::entities::{Camera, CameraStreamSession};
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::SessionRepository;
use crate::domain::value_objects::CameraId;

/// Process-local camera and session store
#[derive(Default)]
pub struct InMemoryRepository {
    cameras: RwLock<HashMap<CameraId, Camera>>,
    sessions: RwLock<HashMap<CameraId, CameraStreamSession>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cameras(cameras: impl IntoIterator<Item = Camera>) -> Self {
        let cameras = cameras
            .into_iter()
            .map(|camera| (camera.id().clone(), camera))
            .collect();
        Self {
            cameras: RwLock::new(cameras),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Load the camera registry from a JSON array of camera records
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DomainError::Persistence(format!("{}: {e}", path.display())))?;
        let cameras: Vec<Camera> = serde_json::from_str(&raw)
            .map_err(|e| DomainError::Persistence(format!("{}: {e}", path.display())))?;

        tracing::info!(path = %path.display(), cameras = cameras.len(), "Loaded camera registry");
        Ok(Self::with_cameras(cameras))
    }

    fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
        lock.read()
            .map_err(|_| DomainError::Persistence("store lock poisoned".to_string()))
    }

    fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
        lock.write()
            .map_err(|_| DomainError::Persistence("store lock poisoned".to_string()))
    }
}

impl SessionRepository for InMemoryRepository {
    fn load_camera(&self, camera_id: &CameraId) -> Result<Option<Camera>> {
        Ok(Self::read(&self.cameras)?.get(camera_id).cloned())
    }

    fn list_cameras(&self) -> Result<Vec<Camera>> {
        let mut cameras: Vec<Camera> = Self::read(&self.cameras)?.values().cloned().collect();
        cameras.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(cameras)
    }

    fn save_camera(&self, camera: Camera) -> Result<()> {
        Self::write(&self.cameras)?.insert(camera.id().clone(), camera);
        Ok(())
    }

    fn load_session(&self, camera_id: &CameraId) -> Result<Option<CameraStreamSession>> {
        Ok(Self::read(&self.sessions)?.get(camera_id).cloned())
    }

    fn save_session(&self, session: CameraStreamSession) -> Result<()> {
        Self::write(&self.sessions)?.insert(session.camera_id().clone(), session);
        Ok(())
    }
}
