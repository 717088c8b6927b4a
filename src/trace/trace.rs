use serde::Serialize;

use crate::click::executor::ClickResult;
use crate::graph::exit_strategy::now_ms;

/// One line of the exploration trace.
#[derive(Debug, Serialize)]
pub struct TraceEvent {
    pub timestamp_ms: u64,
    pub step: u64,

    /// State the session was in when the step started
    pub state: String,

    pub element: Option<String>,
    pub outcome: Option<String>,
    pub new_state: Option<String>,
    pub strategy: Option<String>,
    pub error: Option<String>,
}

impl TraceEvent {
    pub fn now(step: u64, state: &str) -> Self {
        Self {
            timestamp_ms: now_ms(),
            step,
            state: state.to_string(),
            element: None,
            outcome: None,
            new_state: None,
            strategy: None,
            error: None,
        }
    }

    pub fn with_element(mut self, element_id: &str) -> Self {
        self.element = Some(element_id.to_string());
        self
    }

    pub fn with_outcome(mut self, outcome: impl ToString) -> Self {
        self.outcome = Some(outcome.to_string());
        self
    }

    pub fn with_click(mut self, result: &ClickResult) -> Self {
        self.new_state = result.new_state_id.clone();
        self.error = result.error.clone();
        self
    }

    pub fn with_new_state(mut self, state_id: &str) -> Self {
        self.new_state = Some(state_id.to_string());
        self
    }

    pub fn with_strategy(mut self, strategy: impl ToString) -> Self {
        self.strategy = Some(strategy.to_string());
        self
    }

    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }
}
