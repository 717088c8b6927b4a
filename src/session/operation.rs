use serde::{Deserialize, Serialize};

use crate::click::executor::ClickResult;
use crate::navigation::controller::{BacktrackOutcome, NavigationOutcome};

use super::session::StepOutcome;

/// Every entry point a driver (exploration loop, tool layer) can invoke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Click one element of the current state and record the outcome
    Click { state_id: String, element_id: String },
    /// Walk recorded edges from one state to another
    NavigateTo { from: String, to: String },
    /// Return to an earlier state through the backtrack cascade
    NavigateBack { target: String },
    /// Process the next pending element
    ExploreStep,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperationResult {
    Click(ClickResult),
    NavigateTo(NavigationOutcome),
    NavigateBack(BacktrackOutcome),
    ExploreStep(StepOutcome),
}
