use serde::Deserialize;
use serde_json::Value;

use crate::domain::services::stream_parameters::{self, StreamParameters};
use crate::domain::value_objects::{
    CameraId, DeviceCapabilities, ProcessHandle, StartupMode, StreamDefaults, StreamOverrides,
};

/// A cloud camera registered with the bridge
#[derive(Debug, Clone, Deserialize)]
pub struct Camera {
    id: CameraId,
    /// Device resource name on the command API, e.g. `enterprises/p/devices/d`
    device_name: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    room: Option<String>,
    #[serde(default)]
    device_info: Value,
    #[serde(default)]
    media_path: Option<String>,
    #[serde(default)]
    startup_mode: StartupMode,
    #[serde(default, rename = "stream")]
    stream_overrides: StreamOverrides,
    #[serde(skip)]
    child_process: Option<ProcessHandle>,
}

impl Camera {
    pub fn new(id: CameraId, device_name: impl Into<String>, device_info: Value) -> Self {
        Self {
            id,
            device_name: device_name.into(),
            name: None,
            room: None,
            device_info,
            media_path: None,
            startup_mode: StartupMode::default(),
            stream_overrides: StreamOverrides::default(),
            child_process: None,
        }
    }

    pub fn with_media_path(mut self, path: impl Into<String>) -> Self {
        self.media_path = Some(path.into());
        self
    }

    pub fn with_startup_mode(mut self, mode: StartupMode) -> Self {
        self.startup_mode = mode;
        self
    }

    pub fn with_stream_overrides(mut self, overrides: StreamOverrides) -> Self {
        self.stream_overrides = overrides;
        self
    }

    pub fn id(&self) -> &CameraId {
        &self.id
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Configured name, then the device's custom name, then the id
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .filter(|n| !n.is_empty())
            .or_else(|| {
                self.device_info
                    .pointer("/traits/sdm.devices.traits.Info/customName")
                    .and_then(Value::as_str)
                    .filter(|n| !n.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| self.id.to_string())
    }

    pub fn room(&self) -> Option<&str> {
        self.room.as_deref()
    }

    pub fn device_info(&self) -> &Value {
        &self.device_info
    }

    pub fn media_path(&self) -> Option<&str> {
        self.media_path.as_deref()
    }

    pub fn set_media_path(&mut self, path: Option<String>) {
        self.media_path = path;
    }

    pub fn startup_mode(&self) -> StartupMode {
        self.startup_mode
    }

    pub fn stream_overrides(&self) -> &StreamOverrides {
        &self.stream_overrides
    }

    pub fn capabilities(&self) -> DeviceCapabilities {
        DeviceCapabilities::from_device_info(&self.device_info)
    }

    pub fn stream_parameters(&self, defaults: &StreamDefaults) -> Option<StreamParameters> {
        stream_parameters::derive(&self.capabilities(), &self.stream_overrides, defaults)
    }

    pub fn child_process(&self) -> Option<ProcessHandle> {
        self.child_process
    }

    pub fn attach_process(&mut self, handle: ProcessHandle) {
        self.child_process = Some(handle);
    }

    pub fn detach_process(&mut self) -> Option<ProcessHandle> {
        self.child_process.take()
    }
}
