use std::fmt;

/// Lifecycle states of a camera stream session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Inactive,
    Starting,
    Active,
    Extending,
    Stopping,
    /// Last start or extend attempt failed remotely
    Failed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inactive => write!(f, "INACTIVE"),
            Self::Starting => write!(f, "STARTING"),
            Self::Active => write!(f, "ACTIVE"),
            Self::Extending => write!(f, "EXTENDING"),
            Self::Stopping => write!(f, "STOPPING"),
            Self::Failed => write!(f, "FAILED"),
        }
    }
}

impl SessionState {
    /// Convert state to numeric value for metrics
    pub fn as_metric(&self) -> f64 {
        match self {
            Self::Inactive => 0.0,
            Self::Starting => 1.0,
            Self::Active => 2.0,
            Self::Extending => 3.0,
            Self::Stopping => 4.0,
            Self::Failed => 5.0,
        }
    }

    /// States in which a session token may be held
    pub fn holds_token(&self) -> bool {
        matches!(self, Self::Active | Self::Extending)
    }

    /// A start from these states begins a fresh attempt
    pub fn is_startable(&self) -> bool {
        matches!(self, Self::Inactive | Self::Failed)
    }
}
