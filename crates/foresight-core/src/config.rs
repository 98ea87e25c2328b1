//! Workflow configuration
//!
//! Defaults reproduce the standard exercise thresholds; a TOML file can
//! override them.

use crate::error::{WorkflowError, WorkflowResult};
use crate::types::{ASSESSMENT_DEFAULT, SCORE_MAX};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tunables for the workflow store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Narratives must be strictly longer than this many characters
    pub narrative_min_chars: usize,
    /// Initial score of each impact dimension for new scenarios
    pub assessment_default: u8,
    /// Generated force lists are truncated to this length
    pub max_generated_forces: usize,
}

impl WorkflowConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With narrative threshold
    #[inline]
    #[must_use]
    pub fn with_narrative_min_chars(mut self, chars: usize) -> Self {
        self.narrative_min_chars = chars;
        self
    }

    /// With initial assessment score (clamped to 0..=100)
    #[inline]
    #[must_use]
    pub fn with_assessment_default(mut self, score: u8) -> Self {
        self.assessment_default = score.min(SCORE_MAX);
        self
    }

    /// With generated force cap
    #[inline]
    #[must_use]
    pub fn with_max_generated_forces(mut self, max: usize) -> Self {
        self.max_generated_forces = max;
        self
    }

    /// Parse from TOML text
    pub fn from_toml_str(text: &str) -> WorkflowResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| WorkflowError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn load(path: impl AsRef<Path>) -> WorkflowResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| WorkflowError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// - `Config` if a value is out of range
    pub fn validate(&self) -> WorkflowResult<()> {
        if self.assessment_default > SCORE_MAX {
            return Err(WorkflowError::Config(format!(
                "assessment_default must be at most {SCORE_MAX}, got {}",
                self.assessment_default
            )));
        }
        if self.max_generated_forces == 0 {
            return Err(WorkflowError::Config(
                "max_generated_forces must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            narrative_min_chars: 50,
            assessment_default: ASSESSMENT_DEFAULT,
            max_generated_forces: 24,
        }
    }
}
