use crate::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

/// Knobs for one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Upper bound on full passes for every fixpoint. Hitting it leaves the result unconverged.
    pub max_iterations: usize,
    pub control_dependencies: bool,
    pub loop_dependencies: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            control_dependencies: true,
            loop_dependencies: true,
        }
    }
}

impl AnalysisConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn data_only(mut self) -> Self {
        self.control_dependencies = false;
        self.loop_dependencies = false;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(AnalysisError::InvalidConfig(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
