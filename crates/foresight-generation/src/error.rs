//! Generation error types

use foresight_core::WorkflowError;

/// Errors from a generation round trip
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// The text-generation service could not be reached or refused the request
    #[error("generation transport failed: {0}")]
    Transport(String),

    /// The store rejected the request or its result
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
}

impl GenerationError {
    /// Shorthand for a [`GenerationError::Transport`]
    #[inline]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Check if re-issuing the request may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Workflow(err) => err.is_retryable(),
        }
    }
}

/// Result alias for generation operations
pub type GenerationResult<T> = Result<T, GenerationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_and_malformed_are_retryable() {
        assert!(GenerationError::transport("timeout").is_retryable());
        assert!(GenerationError::from(WorkflowError::malformed("not json")).is_retryable());
        assert!(!GenerationError::from(WorkflowError::invalid_selection("x")).is_retryable());
    }
}
