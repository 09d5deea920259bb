use serde::Deserialize;

/// Configured fallbacks for WebRTC stream dimensions
#[derive(Debug, Clone, PartialEq)]
pub struct StreamDefaults {
    width: u32,
    height: u32,
    fps: u32,
    bitrate_k: Option<u32>,
}

impl StreamDefaults {
    pub fn new(width: u32, height: u32, fps: u32) -> Self {
        Self {
            width,
            height,
            fps,
            bitrate_k: None,
        }
    }

    pub fn with_bitrate_k(mut self, bitrate_k: Option<u32>) -> Self {
        self.bitrate_k = bitrate_k.filter(|b| *b > 0);
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn bitrate_k(&self) -> Option<u32> {
        self.bitrate_k
    }
}

impl Default for StreamDefaults {
    fn default() -> Self {
        Self::new(1920, 1080, 30)
    }
}

/// Per-camera overrides; zero or absent values defer to the defaults
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StreamOverrides {
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub fps: Option<u32>,
    #[serde(default)]
    pub bitrate_k: Option<u32>,
}
