use crate::domain::entities::{Camera, CameraStreamSession};
use crate::domain::errors::Result;
use crate::domain::value_objects::CameraId;

/// Port for the persistence collaborator; last write wins
pub trait SessionRepository: Send + Sync {
    fn load_camera(&self, camera_id: &CameraId) -> Result<Option<Camera>>;

    fn list_cameras(&self) -> Result<Vec<Camera>>;

    fn save_camera(&self, camera: Camera) -> Result<()>;

    fn load_session(&self, camera_id: &CameraId) -> Result<Option<CameraStreamSession>>;

    fn save_session(&self, session: CameraStreamSession) -> Result<()>;
}
