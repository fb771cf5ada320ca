#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("Backend error: {0}")]
    Backend(#[from] anyhow::Error),

    #[error("Route service error: {0}")]
    Route(#[from] RouteError),

    #[error("Surface worker channel closed")]
    ChannelClosed,
}

/// Failures of the external route service. The map surface itself never draws
/// anything for these; surfacing them to the user is the caller's job.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error("Invalid route service base URL: {0}")]
    BaseUrl(#[from] url::ParseError),

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Requested coordinates are outside the supported region")]
    OutsideCampus,

    #[error("No path found between the requested points")]
    NoPathFound,

    #[error("Malformed route request: {0}")]
    MalformedRequest(String),

    #[error("Route service returned status {status}: {message}")]
    Status { status: u16, message: String },
}

/// Why a position fix could not be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PositionErrorKind {
    /// The environment has no geolocation capability. Surfaced once, never retried.
    #[error("Geolocation is not supported in this environment")]
    Unsupported,

    /// Not retried automatically; a fresh user-initiated request is allowed.
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Position currently unavailable")]
    Unavailable,

    #[error("Timed out waiting for a position fix")]
    Timeout,
}

impl PositionErrorKind {
    /// Whether the caller may reasonably retry. The surface itself places no
    /// limit on retries.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Unavailable | Self::Timeout)
    }
}
