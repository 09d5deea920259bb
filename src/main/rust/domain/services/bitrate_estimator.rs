/// Bitrate used when any input dimension is unknown
pub const FALLBACK_BITRATE_KBPS: f64 = 10000.0;

const BASE_BITRATE_KBPS: f64 = 4000.0;
const BASE_PIXELS: f64 = 1280.0 * 720.0;
const BASE_FPS: f64 = 30.0;
const RESOLUTION_SCALING_FACTOR: f64 = 0.67;
const FRAMERATE_SCALING_FACTOR: f64 = 1.5;

/// Default bitrate in kbps for a stream, scaled linearly from a 720p30 baseline.
///
/// Missing or zero dimensions yield [`FALLBACK_BITRATE_KBPS`]. The result is
/// not rounded.
pub fn estimate(width: Option<u32>, height: Option<u32>, fps: Option<u32>) -> f64 {
    let (Some(width), Some(height), Some(fps)) = (
        width.filter(|w| *w > 0),
        height.filter(|h| *h > 0),
        fps.filter(|f| *f > 0),
    ) else {
        return FALLBACK_BITRATE_KBPS;
    };

    let pixels = f64::from(width) * f64::from(height);
    BASE_BITRATE_KBPS
        * (pixels / BASE_PIXELS)
        * RESOLUTION_SCALING_FACTOR
        * (f64::from(fps) / BASE_FPS)
        * FRAMERATE_SCALING_FACTOR
}
