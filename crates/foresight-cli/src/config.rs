//! CLI configuration file
//!
//! ```toml
//! log_filter = "foresight_core=debug"
//! log_json = false
//!
//! [workflow]
//! narrative_min_chars = 50
//! assessment_default = 50
//! max_generated_forces = 24
//! ```

use anyhow::Context;
use foresight_core::WorkflowConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default filter when neither `RUST_LOG` nor the file sets one
pub const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    pub workflow: WorkflowConfig,
    pub log_filter: Option<String>,
    pub log_json: bool,
}

impl CliConfig {
    pub fn from_toml_str(text: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(text).context("invalid configuration")?;
        config.workflow.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("loading config {}", path.display()))
    }

    /// Load `path` if given, else defaults
    pub fn resolve(path: Option<&Path>) -> anyhow::Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}
