use super::config::ConfigError;
use crate::core::confidence::ConfidenceBin;
use crate::core::counts::Summary;
use std::fmt;
use thiserror::Error;

/// An independently attempted unit of a coloring pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassStep {
    RegisterColors,
    Bin(ConfidenceBin),
    CatalyticSelection,
    CatalyticHighlight,
    Surface,
    CatalyticPatch,
}

impl fmt::Display for PassStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassStep::RegisterColors => f.write_str("color registration"),
            PassStep::Bin(bin) => write!(f, "'{}' bin coloring", bin),
            PassStep::CatalyticSelection => f.write_str("catalytic selection"),
            PassStep::CatalyticHighlight => f.write_str("catalytic highlight"),
            PassStep::Surface => f.write_str("surface"),
            PassStep::CatalyticPatch => f.write_str("catalytic surface patch"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub step: PassStep,
    pub message: String,
}

impl fmt::Display for StepFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.step, self.message)
    }
}

#[derive(Debug, Error)]
pub enum PassError {
    #[error("Invalid coloring configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// At least one step failed after every independent step was attempted.
    /// The summary is present when all counting steps succeeded.
    #[error("{} of the coloring steps failed (first: {})", failures.len(), first_failure(failures))]
    StepsFailed {
        summary: Option<Summary>,
        failures: Vec<StepFailure>,
    },
}

fn first_failure(failures: &[StepFailure]) -> String {
    failures
        .first()
        .map_or_else(|| "none".to_string(), ToString::to_string)
}
