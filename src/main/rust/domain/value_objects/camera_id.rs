use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque camera identifier, stable for the camera's lifetime
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CameraId(String);

impl CameraId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CameraId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for CameraId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
