use super::bitrate_estimator;
use crate::domain::value_objects::{
    DeviceCapabilities, StreamDefaults, StreamOverrides, StreamProtocol,
};

/// Effective media parameters for a WebRTC camera stream
#[derive(Debug, Clone, PartialEq)]
pub struct StreamParameters {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    pub bitrate_k: f64,
}

/// Positive overrides win, then configured defaults; bitrate falls back to
/// the configured default and finally to the estimator.
///
/// Only WebRTC cameras have stream parameters.
pub fn derive(
    capabilities: &DeviceCapabilities,
    overrides: &StreamOverrides,
    defaults: &StreamDefaults,
) -> Option<StreamParameters> {
    if !capabilities.supports(StreamProtocol::WebRtc) {
        return None;
    }

    let positive = |v: Option<u32>| v.filter(|v| *v > 0);
    let width = positive(overrides.width).unwrap_or(defaults.width());
    let height = positive(overrides.height).unwrap_or(defaults.height());
    let fps = positive(overrides.fps).unwrap_or(defaults.fps());

    let bitrate_k = positive(overrides.bitrate_k)
        .or(defaults.bitrate_k())
        .map(f64::from)
        .unwrap_or_else(|| bitrate_estimator::estimate(Some(width), Some(height), Some(fps)));

    Some(StreamParameters {
        width,
        height,
        fps,
        bitrate_k,
    })
}
