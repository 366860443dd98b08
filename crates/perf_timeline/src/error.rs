//! Error types for the performance timeline.

use thiserror::Error;

/// Failures raised by host timing primitives.
///
/// The timeline never translates these; they reach the caller as-is.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The host does not expose the requested primitive
    #[error("Host primitive unavailable: {0}")]
    Unsupported(&'static str),

    /// A measurement referenced a mark that was never written
    #[error("No mark named '{0}' in the timing buffer")]
    MissingMark(String),

    /// The primitive rejected its arguments
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The host refused an observer registration
    #[error("Observer registration rejected: {0}")]
    ObserverRejected(String),
}

/// Result type for host primitives.
pub type HostResult<T> = Result<T, HostError>;

/// Errors surfaced by the timeline facade.
#[derive(Debug, Error)]
pub enum TimelineError {
    /// Host primitive failure, passed through unchanged
    #[error(transparent)]
    Host(#[from] HostError),

    /// A host entry did not have the shape of a timing entry
    #[error("Malformed timing entry: {0}")]
    MalformedEntry(#[from] serde_json::Error),
}

/// Result type for timeline operations.
pub type TimelineResult<T> = Result<T, TimelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HostError::MissingMark("mark_load_start".to_string());
        assert_eq!(
            err.to_string(),
            "No mark named 'mark_load_start' in the timing buffer"
        );

        let err = HostError::Unsupported("mark");
        assert_eq!(err.to_string(), "Host primitive unavailable: mark");
    }

    #[test]
    fn test_host_error_is_transparent() {
        let err: TimelineError = HostError::InvalidArgument("empty name".to_string()).into();
        assert_eq!(err.to_string(), "Invalid argument: empty name");
        assert!(matches!(err, TimelineError::Host(HostError::InvalidArgument(_))));
    }

    #[test]
    fn test_serialization_error_conversion() {
        let json_err: Result<(), serde_json::Error> = serde_json::from_str::<()>("not json");
        let err: TimelineError = json_err.unwrap_err().into();
        assert!(matches!(err, TimelineError::MalformedEntry(_)));
    }
}
