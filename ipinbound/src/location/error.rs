use thiserror::Error;

/// Failure of the live positioning source.
///
/// Cloneable so one failure can be delivered to every subscriber of the
/// fused stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location unavailable: {0}")]
    Unavailable(String),

    #[error("Location source ended")]
    SourceEnded,
}
