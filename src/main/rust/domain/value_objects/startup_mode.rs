use serde::{Deserialize, Serialize};

/// How the bridge brings a camera's stream up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartupMode {
    /// Started at boot and kept alive
    AlwaysOn,
    /// Started when a client asks for it
    #[default]
    OnDemand,
    Never,
}

impl StartupMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StartupMode::AlwaysOn => "always_on",
            StartupMode::OnDemand => "on_demand",
            StartupMode::Never => "never",
        }
    }
}
