//! Error types for listeners, dispatch and the event registry

use thiserror::Error;

/// Result returned by every listener body.
pub type ListenerResult = std::result::Result<(), ListenerError>;

/// Failure of a single listener during a broadcast.
#[derive(Debug, Clone, Error)]
pub enum ListenerError {
    #[error("Listener target no longer exists: {0}")]
    StaleTarget(String),

    #[error("No method `{method}` on {type_name}")]
    MissingMethod { type_name: String, method: String },

    #[error("Method `{method}` on {type_name} is ambiguous")]
    AmbiguousMethod { type_name: String, method: String },

    #[error("Method `{method}` on {type_name} does not take {expected}")]
    SignatureMismatch {
        type_name: String,
        method: String,
        expected: String,
    },

    #[error("Listener failed: {0}")]
    Failed(String),

    #[error("Listener panicked: {0}")]
    Panicked(String),

    #[error("Forwarded event `{event}` failed: {source}")]
    Forwarded {
        event: String,
        source: Box<DispatchError>,
    },
}

impl ListenerError {
    /// Create a generic listener failure
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Whether the listener can never succeed again and should be pruned.
    ///
    /// Unresolvable methods count as stale: a binding that names a method its
    /// target does not expose is as dead as one whose target was destroyed.
    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            Self::StaleTarget(_)
                | Self::MissingMethod { .. }
                | Self::AmbiguousMethod { .. }
                | Self::SignatureMismatch { .. }
        )
    }
}

/// Failure of a whole broadcast
#[derive(Debug, Clone, Error)]
pub enum DispatchError {
    #[error("One or more listeners of `{event}` failed")]
    ListenersFailed {
        event: String,
        failures: Vec<ListenerError>,
    },

    #[error("Event `{0}` is already dispatching on this thread")]
    CycleDetected(String),
}

impl DispatchError {
    /// Listener failures carried by this error (empty for cycles)
    pub fn failures(&self) -> &[ListenerError] {
        match self {
            Self::ListenersFailed { failures, .. } => failures,
            Self::CycleDetected(_) => &[],
        }
    }
}

/// Registry level errors
#[derive(Debug, Clone, Error)]
pub enum EventError {
    #[error("Could not find event {0}")]
    UnknownEvent(String),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

pub type Result<T> = std::result::Result<T, EventError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_classification() {
        assert!(ListenerError::StaleTarget("gone".into()).is_stale());
        assert!(
            ListenerError::MissingMethod {
                type_name: "Player".into(),
                method: "jump".into(),
            }
            .is_stale()
        );
        assert!(!ListenerError::failed("boom").is_stale());
        assert!(!ListenerError::Panicked("boom".into()).is_stale());
    }

    #[test]
    fn test_forwarded_message() {
        let inner = DispatchError::CycleDetected("loop".into());
        let err = ListenerError::Forwarded {
            event: "outer".into(),
            source: Box::new(inner),
        };

        assert_eq!(
            err.to_string(),
            "Forwarded event `outer` failed: Event `loop` is already dispatching on this thread"
        );
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_unknown_event_message() {
        let err = EventError::UnknownEvent("jump".into());
        assert_eq!(err.to_string(), "Could not find event jump");
    }
}
