use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// A procedure for leaving one state towards another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExitStrategy {
    ClickElement { element_id: String },
    /// Window-relative coordinates.
    ClickCoordinates { x: i32, y: i32 },
    KeySequence { keys: Vec<String> },
    /// The operator recovered without an observable click; not replayable.
    ManualNavigation,
}

impl ExitStrategy {
    pub fn label(&self) -> &'static str {
        match self {
            ExitStrategy::ClickElement { .. } => "click_element",
            ExitStrategy::ClickCoordinates { .. } => "click_coordinates",
            ExitStrategy::KeySequence { .. } => "key_sequence",
            ExitStrategy::ManualNavigation => "manual_navigation",
        }
    }
}

/// An exit strategy plus advisory usage metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedExit {
    pub strategy: ExitStrategy,
    #[serde(default)]
    pub attempts: u32,
    #[serde(default)]
    pub successes: u32,
    #[serde(default)]
    pub last_used_ms: Option<u64>,
}

impl LearnedExit {
    pub fn new(strategy: ExitStrategy) -> Self {
        Self {
            strategy,
            attempts: 0,
            successes: 0,
            last_used_ms: None,
        }
    }

    /// Fraction of replays that reached the target. A strategy that has
    /// never been replayed reports 1.0.
    pub fn success_rate(&self) -> f32 {
        if self.attempts == 0 {
            1.0
        } else {
            self.successes as f32 / self.attempts as f32
        }
    }

    pub fn record_use(&mut self, succeeded: bool) {
        self.attempts += 1;
        if succeeded {
            self.successes += 1;
        }
        self.last_used_ms = Some(now_ms());
    }
}

pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}
