use std::time::Duration;
use thiserror::Error;

/// The error returned by every recovery operation.
///
/// Each variant is a distinct failure shape, so callers can tell retry
/// exhaustion, a timeout and a failed fallback chain apart without parsing
/// messages. The `Display` text carries the context label given to the
/// operation.
#[derive(Debug, Error)]
pub enum RecoveryError<E> {
    /// Every attempt allowed by the retry budget failed. `source` is the error
    /// from the final attempt.
    #[error("{context} failed: {source}")]
    Exhausted {
        context: String,
        attempts: usize,
        source: E,
    },

    /// The retry condition rejected an error, so retrying stopped early.
    #[error("{context} failed after {attempts} attempt(s), not retryable: {source}")]
    Aborted {
        context: String,
        attempts: usize,
        source: E,
    },

    /// The operation did not settle before the timeout elapsed.
    #[error("{context} timed out after {}ms", .timeout.as_millis())]
    TimedOut { context: String, timeout: Duration },

    /// The operation settled in time but failed on its own.
    #[error("{0}")]
    Failed(E),

    /// Every option of a fallback chain failed. `errors` holds one error per
    /// option, in the order the options were tried.
    #[error("All {} fallback options failed for {context}", .errors.len())]
    FallbackExhausted { context: String, errors: Vec<E> },
}

impl<E> RecoveryError<E> {
    /// Returns true if the operation timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut { .. })
    }

    /// Returns true if a retry budget ran out.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// Returns true if every option of a fallback chain failed.
    pub fn is_fallback_exhausted(&self) -> bool {
        matches!(self, Self::FallbackExhausted { .. })
    }

    /// The context label of the failed operation, if this variant carries one.
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::Exhausted { context, .. }
            | Self::Aborted { context, .. }
            | Self::TimedOut { context, .. }
            | Self::FallbackExhausted { context, .. } => Some(context),
            Self::Failed(_) => None,
        }
    }

    /// The underlying operation errors, in the order they happened.
    ///
    /// Retry variants keep only the last error; a fallback chain keeps all of
    /// them; a timeout has none.
    pub fn errors(&self) -> &[E] {
        match self {
            Self::Exhausted { source, .. } | Self::Aborted { source, .. } => {
                std::slice::from_ref(source)
            }
            Self::Failed(source) => std::slice::from_ref(source),
            Self::FallbackExhausted { errors, .. } => errors,
            Self::TimedOut { .. } => &[],
        }
    }

    /// Consumes the error and returns the underlying operation errors.
    pub fn into_errors(self) -> Vec<E> {
        match self {
            Self::Exhausted { source, .. } | Self::Aborted { source, .. } => vec![source],
            Self::Failed(source) => vec![source],
            Self::FallbackExhausted { errors, .. } => errors,
            Self::TimedOut { .. } => Vec::new(),
        }
    }
}
