mod camera;
mod camera_stream_session;

pub use camera::Camera;
pub use camera_stream_session::{CameraStreamSession, StateTransition};
