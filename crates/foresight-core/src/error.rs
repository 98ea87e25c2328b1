//! Error types for the foresight workflow
//!
//! Provides error handling for:
//! - Rejected selections (duplicate axis drivers, unknown ids)
//! - External text-generation output that cannot be parsed
//! - Snapshots that violate entity invariants on restore
//! - Configuration loading

use crate::types::Quadrant;

/// Main workflow error type
///
/// Every variant is recoverable: the store is left untouched when one is
/// returned, and the user can retry or step back.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    /// Caller referenced an unknown id or made an impossible selection
    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    /// Text-generation output did not match the expected shape
    #[error("malformed external response: {0}")]
    MalformedExternalResponse(String),

    /// Restored state violates an invariant
    #[error("snapshot validation failed: {0}")]
    SnapshotValidationFailure(#[from] SnapshotError),

    /// Configuration could not be loaded
    #[error("configuration error: {0}")]
    Config(String),
}

impl WorkflowError {
    /// Shorthand for an [`WorkflowError::InvalidSelection`]
    #[inline]
    pub fn invalid_selection(message: impl Into<String>) -> Self {
        Self::InvalidSelection(message.into())
    }

    /// Shorthand for a [`WorkflowError::MalformedExternalResponse`]
    #[inline]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedExternalResponse(message.into())
    }

    /// Check if re-attempting the same action may succeed
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::MalformedExternalResponse(_))
    }
}

/// Snapshot validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    /// Snapshot JSON could not be decoded
    #[error("unreadable snapshot: {0}")]
    Parse(String),

    /// Snapshot was written by an unknown format version
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    /// Scenario set is neither empty nor a full matrix
    #[error("expected 0 or 4 scenarios, found {0}")]
    ScenarioCount(usize),

    /// Two scenarios claim the same quadrant
    #[error("quadrant {0} appears more than once")]
    DuplicateQuadrant(Quadrant),

    /// Identifier repeated within one collection
    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    /// Record references an id that does not exist
    #[error("{kind} references unknown id: {id}")]
    DanglingReference { kind: &'static str, id: String },

    /// Numeric field outside its allowed range
    #[error("{field} = {value} exceeds maximum {max}")]
    OutOfRange {
        field: &'static str,
        value: u8,
        max: u8,
    },

    /// Axis driver selection is inconsistent
    #[error("invalid axis selection: {0}")]
    AxisSelection(String),

    /// Scenario id does not match its axes and quadrant
    #[error("scenario {id} in quadrant {quadrant} should be {expected}")]
    ScenarioIdMismatch {
        id: String,
        quadrant: Quadrant,
        expected: String,
    },
}

/// Unknown PEST category label
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown PEST category: '{0}'")]
pub struct ParseCategoryError(pub String);

/// Result alias for workflow operations
pub type WorkflowResult<T> = Result<T, WorkflowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_malformed_responses_are_retryable() {
        assert!(WorkflowError::malformed("not json").is_retryable());
        assert!(!WorkflowError::invalid_selection("same force twice").is_retryable());
        assert!(!WorkflowError::from(SnapshotError::ScenarioCount(3)).is_retryable());
    }

    #[test]
    fn snapshot_error_messages_name_the_invariant() {
        let err = SnapshotError::DanglingReference {
            kind: "assessment",
            id: "s-1".to_string(),
        };
        assert_eq!(err.to_string(), "assessment references unknown id: s-1");
        assert_eq!(
            SnapshotError::DuplicateQuadrant(Quadrant::TopRight).to_string(),
            "quadrant TR appears more than once"
        );
    }
}
