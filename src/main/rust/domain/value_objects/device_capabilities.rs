use serde_json::{Map, Value};

use super::StreamProtocol;

const CAMERA_DEVICE_TYPE: &str = "sdm.devices.types.CAMERA";
const DOORBELL_DEVICE_TYPE: &str = "sdm.devices.types.DOORBELL";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Capabilities derived from a device management API device document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DeviceCapabilities {
    device_type: Option<String>,
    protocols: Vec<StreamProtocol>,
    resolution: Option<Resolution>,
}

impl DeviceCapabilities {
    pub fn new(protocols: Vec<StreamProtocol>) -> Self {
        Self {
            device_type: None,
            protocols,
            resolution: None,
        }
    }

    pub fn with_device_type(mut self, device_type: impl Into<String>) -> Self {
        self.device_type = Some(device_type.into());
        self
    }

    pub fn with_resolution(mut self, resolution: Resolution) -> Self {
        self.resolution = Some(resolution);
        self
    }

    /// Derive capabilities from the device's `traits` document.
    ///
    /// Traits are flattened across sections; a key repeated in a later
    /// section overrides the earlier one. Unknown protocol names are ignored.
    pub fn from_device_info(info: &Value) -> Self {
        let traits = flatten_traits(info);

        let protocols = traits
            .get("supportedProtocols")
            .and_then(Value::as_array)
            .map(|list| {
                list.iter()
                    .filter_map(Value::as_str)
                    .filter_map(StreamProtocol::from_capability)
                    .collect()
            })
            .unwrap_or_default();

        let resolution = traits.get("maxVideoResolution").and_then(|res| {
            let width = res.get("width")?.as_u64()?;
            let height = res.get("height")?.as_u64()?;
            Some(Resolution {
                width: u32::try_from(width).ok()?,
                height: u32::try_from(height).ok()?,
            })
        });

        Self {
            device_type: info
                .get("type")
                .and_then(Value::as_str)
                .map(str::to_string),
            protocols,
            resolution,
        }
    }

    pub fn protocols(&self) -> &[StreamProtocol] {
        &self.protocols
    }

    pub fn resolution(&self) -> Option<Resolution> {
        self.resolution
    }

    pub fn device_type(&self) -> Option<&str> {
        self.device_type.as_deref()
    }

    pub fn supports(&self, protocol: StreamProtocol) -> bool {
        self.protocols.contains(&protocol)
    }

    pub fn is_empty(&self) -> bool {
        !self.supports(StreamProtocol::Rtsp) && !self.supports(StreamProtocol::WebRtc)
    }

    /// Fixed precedence: RTSP when available, WebRTC otherwise
    pub fn preferred_protocol(&self) -> Option<StreamProtocol> {
        if self.supports(StreamProtocol::Rtsp) {
            Some(StreamProtocol::Rtsp)
        } else if self.supports(StreamProtocol::WebRtc) {
            Some(StreamProtocol::WebRtc)
        } else {
            None
        }
    }

    /// Dashboard icon for the device, `None` for unrecognised device types
    pub fn icon(&self) -> Option<&'static str> {
        let rtsp = self.supports(StreamProtocol::Rtsp);
        let webrtc = self.supports(StreamProtocol::WebRtc);
        match self.device_type.as_deref() {
            None => Some("camera.wired.indoor"),
            Some(CAMERA_DEVICE_TYPE) => Some(match (rtsp, webrtc) {
                (true, true) => "camera.wired",
                (false, true) => "camera.battery",
                _ => "camera.wired.indoor",
            }),
            Some(DOORBELL_DEVICE_TYPE) if rtsp => Some("doorbell.legacy"),
            Some(DOORBELL_DEVICE_TYPE) => Some("doorbell.wired"),
            Some(other) => {
                tracing::warn!(device_type = %other, "Unknown device type");
                None
            }
        }
    }
}

fn flatten_traits(info: &Value) -> Map<String, Value> {
    let mut flat = Map::new();
    if let Some(sections) = info.get("traits").and_then(Value::as_object) {
        for section in sections.values() {
            if let Some(entries) = section.as_object() {
                for (key, value) in entries {
                    flat.insert(key.clone(), value.clone());
                }
            }
        }
    }
    flat
}
